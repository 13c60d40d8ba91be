use crate::{
    background::tasks::BackgroundTaskManager,
    core::{
        config::{MapConfig, MapProfile},
        geo::{FragmentCoord, Point},
        viewport::MapState,
        zoom::ZoomState,
    },
    fragment::{
        fragment::{BiomeId, Fragment},
        layer::LayerId,
        object::MapObject,
    },
    grid::{FragmentGrid, GridDimensions},
    rendering::surface::DrawSurface,
    tiles::provider::FragmentProvider,
    Result,
};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard};

/// Thread-safe handle to an infinite fragment map.
///
/// All structural work and every spatial query runs under one mutex, so any
/// number of threads may draw, pan, resize and recenter concurrently. The
/// zoom state is shared and only read, once per operation.
pub struct Map<P: FragmentProvider> {
    state: Arc<Mutex<MapState<P>>>,
    zoom: Arc<dyn ZoomState>,
    config: MapConfig,
    /// Started on the first background repaint
    workers: OnceCell<BackgroundTaskManager>,
}

fn lock_state<P: FragmentProvider>(state: &Mutex<MapState<P>>) -> MutexGuard<'_, MapState<P>> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("map lock was poisoned, continuing with the last consistent state");
            poisoned.into_inner()
        }
    }
}

impl<P: FragmentProvider> Map<P> {
    /// Creates a map with the default configuration
    pub fn new(provider: P, zoom: Arc<dyn ZoomState>) -> Self {
        Self::build(provider, zoom, MapConfig::default())
    }

    /// Creates a map from a validated configuration
    pub fn with_config(provider: P, zoom: Arc<dyn ZoomState>, config: MapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(provider, zoom, config))
    }

    pub fn from_profile(provider: P, zoom: Arc<dyn ZoomState>, profile: &MapProfile) -> Result<Self> {
        Self::with_config(provider, zoom, profile.resolve())
    }

    fn build(provider: P, zoom: Arc<dyn ZoomState>, config: MapConfig) -> Self {
        let state = MapState::new(
            provider,
            (config.viewport.width, config.viewport.height),
            config.grid.max_steps_per_draw,
        );
        Self {
            state: Arc::new(Mutex::new(state)),
            zoom,
            config,
            workers: OnceCell::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MapState<P>> {
        lock_state(&self.state)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn zoom(&self) -> &Arc<dyn ZoomState> {
        &self.zoom
    }

    pub fn scale(&self) -> f64 {
        self.zoom.current_scale()
    }

    /// Reconciles the grid with the viewer and zoom, then draws one frame.
    /// Returns the number of fragments drawn.
    pub fn draw(&self, surface: &mut dyn DrawSurface, time: f32) -> usize {
        let scale = self.scale();
        self.lock().draw(surface, time, scale)
    }

    /// Stores the viewer size; the grid follows on the next draw
    pub fn resize_viewport(&self, width: f64, height: f64) {
        self.lock().resize(width, height);
    }

    /// Moves the content by a screen delta; the grid follows on the next draw
    pub fn pan_by(&self, dx: f64, dy: f64) {
        self.lock().pan_by(dx, dy);
    }

    /// Collapses the grid and puts the world position at the viewer centre
    pub fn center_on(&self, world_x: i64, world_y: i64) {
        let scale = self.scale();
        self.lock().center_on(world_x, world_y, scale);
    }

    /// Coordinate of the fragment under a screen point
    pub fn fragment_at(&self, screen: Point) -> Option<FragmentCoord> {
        let scale = self.scale();
        self.lock()
            .fragment_at_screen(screen, scale)
            .map(|fragment| fragment.coord())
    }

    /// Runs `f` on the fragment under a screen point while the lock is held
    pub fn with_fragment_at<R>(&self, screen: Point, f: impl FnOnce(&P::Fragment) -> R) -> Option<R> {
        let scale = self.scale();
        self.lock().fragment_at_screen(screen, scale).map(f)
    }

    /// Nearest visible object strictly closer than `max_distance` pixels
    pub fn object_near(&self, screen: Point, max_distance: f64) -> Option<MapObject> {
        let scale = self.scale();
        self.lock().object_near(screen, max_distance, scale)
    }

    /// [`object_near`](Self::object_near) with the configured pick radius
    pub fn object_at(&self, screen: Point) -> Option<MapObject> {
        self.object_near(screen, self.config.interaction.object_pick_radius)
    }

    pub fn screen_to_world(&self, screen: Point) -> Option<Point> {
        let scale = self.scale();
        self.lock().screen_to_world(screen, scale)
    }

    pub fn world_to_screen(&self, world: Point) -> Option<Point> {
        let scale = self.scale();
        self.lock().world_to_screen(world, scale)
    }

    pub fn biome_at(&self, world: Point) -> Option<BiomeId> {
        self.lock().biome_at(world)
    }

    /// Pan delta that keeps the world point under `screen` still while the
    /// scale moves from `old_scale` to `new_scale`
    pub fn scaled_offset(&self, old_scale: f64, new_scale: f64, screen: Point) -> Point {
        self.lock().scaled_offset(old_scale, new_scale, screen)
    }

    /// Asks the provider to regenerate one layer on every resident
    /// fragment. Returns how many fragments were asked.
    pub fn repaint_layer(&self, layer: LayerId) -> usize {
        self.lock().repaint_layer(layer)
    }

    /// Queues [`repaint_layer`](Self::repaint_layer) on the map's worker
    /// pool. The task takes the map lock itself.
    pub fn repaint_layer_in_background(&self, layer: LayerId) -> Result<()> {
        let workers = self
            .workers
            .get_or_init(|| BackgroundTaskManager::new("map-repaint", &self.config.workers));
        let state = Arc::clone(&self.state);
        workers.submit_fn(format!("repaint {layer}"), move || {
            lock_state(&state).repaint_layer(layer);
        })
    }

    /// Background repaints finished so far
    pub fn completed_background_tasks(&self) -> usize {
        self.workers
            .get()
            .map_or(0, |workers| workers.completed_tasks())
    }

    pub fn set_selected_object(&self, object: Option<MapObject>) {
        self.lock().set_selected(object);
    }

    pub fn selected_object(&self) -> Option<MapObject> {
        self.lock().selected().cloned()
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.lock().dimensions()
    }

    pub fn origin(&self) -> Point {
        self.lock().origin()
    }

    pub fn viewer_size(&self) -> (f64, f64) {
        self.lock().viewer_size()
    }

    /// Runs `f` on the grid while the lock is held
    pub fn inspect_grid<R>(&self, f: impl FnOnce(&FragmentGrid<P::Fragment>) -> R) -> R {
        f(self.lock().grid())
    }

    /// Runs `f` on the provider while the lock is held
    pub fn with_provider<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(self.lock().provider_mut())
    }

    /// Returns every fragment to the provider and resets it. Draws are
    /// no-ops until the map is recentered.
    pub fn dispose(&self) {
        self.lock().dispose();
    }
}

impl<P: FragmentProvider> std::fmt::Debug for Map<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("state", &*self.lock())
            .field("scale", &self.scale())
            .field("workers", &self.workers.get())
            .finish()
    }
}
