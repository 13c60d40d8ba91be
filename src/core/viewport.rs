//! Lock-protected state of a [`Map`](crate::core::map::Map).
//!
//! Everything here assumes exclusive access; `Map` wraps it in one mutex.

use crate::core::{
    constants::{FRAGMENT_SIZE, OVERSCAN_TILES},
    geo::{FragmentCoord, Point},
    transform::AffineTransform,
};
use crate::fragment::{
    fragment::{BiomeId, Fragment},
    layer::LayerId,
    object::MapObject,
};
use crate::grid::{FragmentGrid, GridDimensions, GridEdge};
use crate::rendering::{
    pipeline::{grid_transform, render_grid, MapView},
    surface::DrawSurface,
};
use crate::tiles::provider::FragmentProvider;

pub struct MapState<P: FragmentProvider> {
    grid: FragmentGrid<P::Fragment>,
    provider: P,
    /// Screen offset of the first fragment
    origin: Point,
    viewer_size: (f64, f64),
    selected: Option<MapObject>,
    max_steps_per_draw: Option<usize>,
}

fn is_usable_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Fragments needed to cover `pixels` plus the overscan margin
fn overscanned(pixels: f64, scaled_size: f64) -> usize {
    (pixels.max(0.0) / scaled_size).ceil() as usize + OVERSCAN_TILES
}

impl<P: FragmentProvider> MapState<P> {
    /// Creates the state with a single fragment at the world origin
    pub fn new(provider: P, viewer_size: (f64, f64), max_steps_per_draw: Option<usize>) -> Self {
        let mut state = Self {
            grid: FragmentGrid::new(),
            provider,
            origin: Point::default(),
            viewer_size,
            selected: None,
            max_steps_per_draw,
        };
        state.grid.init(FragmentCoord::new(0, 0), &mut state.provider);
        state
    }

    pub fn grid(&self) -> &FragmentGrid<P::Fragment> {
        &self.grid
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.grid.dimensions()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn viewer_size(&self) -> (f64, f64) {
        self.viewer_size
    }

    pub fn selected(&self) -> Option<&MapObject> {
        self.selected.as_ref()
    }

    pub fn set_selected(&mut self, selected: Option<MapObject>) {
        self.selected = selected;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewer_size = (width, height);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.origin.x += dx;
        self.origin.y += dy;
    }

    /// Grid size needed to cover the viewer at `scale`
    pub fn desired_dimensions(&self, scale: f64) -> GridDimensions {
        let scaled_size = FRAGMENT_SIZE as f64 * scale;
        GridDimensions::new(
            overscanned(self.viewer_size.1, scaled_size),
            overscanned(self.viewer_size.0, scaled_size),
        )
    }

    /// Grows or shrinks the grid at its end edges toward the desired size.
    /// Returns whether the grid changed.
    pub fn reconcile(&mut self, scale: f64) -> bool {
        if self.grid.is_empty() || !is_usable_scale(scale) {
            return false;
        }
        let before = self.grid.dimensions();
        let desired = self.desired_dimensions(scale);
        let budget = self.max_steps_per_draw.unwrap_or(usize::MAX);

        let mut steps = 0;
        while self.grid.cols() < desired.cols && steps < budget {
            self.grid.add_column(GridEdge::End, &mut self.provider);
            steps += 1;
        }
        while self.grid.cols() > desired.cols && steps < budget {
            self.grid.remove_column(GridEdge::End, &mut self.provider);
            steps += 1;
        }

        let mut steps = 0;
        while self.grid.rows() < desired.rows && steps < budget {
            self.grid.add_row(GridEdge::End, &mut self.provider);
            steps += 1;
        }
        while self.grid.rows() > desired.rows && steps < budget {
            self.grid.remove_row(GridEdge::End, &mut self.provider);
            steps += 1;
        }

        let after = self.grid.dimensions();
        if after != before {
            log::debug!(
                "grid {}x{} -> {}x{} (desired {}x{})",
                before.rows,
                before.cols,
                after.rows,
                after.cols,
                desired.rows,
                desired.cols
            );
        }
        after != before
    }

    /// Shifts the grid by whole fragments until the origin lies in
    /// `(-scaled_size, 0]` on both axes. Returns `true` when the shift
    /// spanned the whole grid and it was re-anchored instead.
    pub fn normalize_origin(&mut self, scale: f64) -> bool {
        let Some(first) = self.grid.first().map(|fragment| fragment.coord()) else {
            return false;
        };
        if !is_usable_scale(scale) {
            return false;
        }
        let scaled_size = FRAGMENT_SIZE as f64 * scale;
        // positive shifts reveal fragments before the first one
        let shift_x = (self.origin.x / scaled_size).ceil() as i64;
        let shift_y = (self.origin.y / scaled_size).ceil() as i64;
        if shift_x == 0 && shift_y == 0 {
            return false;
        }
        self.origin.x -= shift_x as f64 * scaled_size;
        self.origin.y -= shift_y as f64 * scaled_size;

        let spans_grid = shift_x.unsigned_abs() >= self.grid.cols() as u64
            || shift_y.unsigned_abs() >= self.grid.rows() as u64;
        if spans_grid {
            let anchor = first.offset(-shift_x, -shift_y);
            log::debug!(
                "pan of ({}, {}) fragments re-anchors the grid at {}",
                -shift_x,
                -shift_y,
                anchor
            );
            self.grid.clear(&mut self.provider);
            self.grid.init(anchor, &mut self.provider);
            return true;
        }

        for _ in 0..shift_x.max(0) {
            self.grid.add_column(GridEdge::Start, &mut self.provider);
            self.grid.remove_column(GridEdge::End, &mut self.provider);
        }
        for _ in 0..(-shift_x).max(0) {
            self.grid.add_column(GridEdge::End, &mut self.provider);
            self.grid.remove_column(GridEdge::Start, &mut self.provider);
        }
        for _ in 0..shift_y.max(0) {
            self.grid.add_row(GridEdge::Start, &mut self.provider);
            self.grid.remove_row(GridEdge::End, &mut self.provider);
        }
        for _ in 0..(-shift_y).max(0) {
            self.grid.add_row(GridEdge::End, &mut self.provider);
            self.grid.remove_row(GridEdge::Start, &mut self.provider);
        }
        false
    }

    /// Reconciles the grid and draws one frame. Returns the number of
    /// fragments drawn per pass; zero when the grid is empty.
    pub fn draw(&mut self, surface: &mut dyn DrawSurface, time: f32, scale: f64) -> usize {
        if self.grid.is_empty() {
            log::trace!("draw skipped, grid is empty");
            return 0;
        }
        if !is_usable_scale(scale) {
            log::warn!("draw skipped, unusable scale {}", scale);
            return 0;
        }

        self.reconcile(scale);
        if self.normalize_origin(scale) {
            self.reconcile(scale);
        }

        let view = MapView {
            time,
            scale,
            origin: self.origin,
            viewer_size: self.viewer_size,
            anchor: self.grid.first().map(|fragment| fragment.coord()),
            selected: self.selected.as_ref(),
        };
        render_grid(&self.grid, &mut self.provider, surface, &view)
    }

    /// Collapses the grid to the fragment containing the world position and
    /// places that position at the centre of the viewer.
    pub fn center_on(&mut self, world_x: i64, world_y: i64, scale: f64) {
        let offset_x = world_x.rem_euclid(FRAGMENT_SIZE);
        let offset_y = world_y.rem_euclid(FRAGMENT_SIZE);

        if !self.grid.is_empty() {
            while self.grid.rows() > 1 {
                self.grid.remove_row(GridEdge::End, &mut self.provider);
            }
            while self.grid.cols() > 1 {
                self.grid.remove_column(GridEdge::End, &mut self.provider);
            }
            self.grid.clear(&mut self.provider);
        }

        self.origin = Point::new(
            self.viewer_size.0 / 2.0 - offset_x as f64 * scale,
            self.viewer_size.1 / 2.0 - offset_y as f64 * scale,
        );
        let anchor = FragmentCoord::new(world_x - offset_x, world_y - offset_y);
        self.grid.init(anchor, &mut self.provider);
        log::debug!("centered on ({}, {}) in fragment {}", world_x, world_y, anchor);
    }

    /// Returns every fragment to the provider and resets it. The state
    /// stays usable: `center_on` seeds a new grid.
    pub fn dispose(&mut self) {
        let released = self.grid.len();
        self.grid.clear(&mut self.provider);
        self.provider.reset();
        log::debug!("disposed map, released {} fragments", released);
    }

    /// Maps world positions to the screen: the frame's grid transform
    /// shifted back by the first fragment's world origin
    fn world_transform(&self, scale: f64) -> Option<AffineTransform> {
        let first = self.grid.first()?.coord();
        Some(
            grid_transform(&AffineTransform::identity(), self.origin, scale)
                .translated(-(first.x as f64), -(first.y as f64)),
        )
    }

    /// `None` on an empty grid or a zero scale
    pub fn screen_to_world(&self, screen: Point, scale: f64) -> Option<Point> {
        self.world_transform(scale)?.inverse_transform_point(screen)
    }

    pub fn world_to_screen(&self, world: Point, scale: f64) -> Option<Point> {
        Some(self.world_transform(scale)?.transform_point(world))
    }

    /// Resident fragment containing the world position
    pub fn fragment_at_world(&self, world: Point) -> Option<&P::Fragment> {
        let world = world.floor();
        self.grid
            .find(FragmentCoord::containing(world.x as i64, world.y as i64))
    }

    pub fn fragment_at_screen(&self, screen: Point, scale: f64) -> Option<&P::Fragment> {
        self.screen_to_world(screen, scale)
            .and_then(|world| self.fragment_at_world(world))
    }

    /// Nearest visible object strictly closer than `max_distance` screen
    /// pixels. On ties the first one in row-major order wins.
    pub fn object_near(&self, screen: Point, max_distance: f64, scale: f64) -> Option<MapObject> {
        let scaled_size = FRAGMENT_SIZE as f64 * scale;
        let mut closest: Option<MapObject> = None;
        let mut closest_distance = max_distance;

        for cell in self.grid.iter().positioned() {
            let fragment_origin = Point::new(
                self.origin.x + cell.col as f64 * scaled_size,
                self.origin.y + cell.row as f64 * scaled_size,
            );
            for object in cell.fragment.objects().iter().filter(|object| object.visible) {
                let position = object
                    .position_in_fragment()
                    .multiply(scale)
                    .add(&fragment_origin);
                let distance = position.distance_to(&screen);
                if distance < closest_distance {
                    closest_distance = distance;
                    closest = Some(object.clone());
                }
            }
        }
        closest
    }

    pub fn biome_at(&self, world: Point) -> Option<BiomeId> {
        let world = world.floor();
        let (x, y) = (world.x as i64, world.y as i64);
        let fragment = self.grid.find(FragmentCoord::containing(x, y))?;
        let coord = fragment.coord();
        fragment.biome_at(x - coord.x, y - coord.y)
    }

    /// Pan delta keeping the world point under `screen` in place when the
    /// scale changes from `old_scale` to `new_scale`
    pub fn scaled_offset(&self, old_scale: f64, new_scale: f64, screen: Point) -> Point {
        let base = screen.subtract(&self.origin);
        Point::new(
            base.x - (base.x / old_scale) * new_scale,
            base.y - (base.y / old_scale) * new_scale,
        )
    }

    /// Asks the provider to regenerate `layer` on every resident fragment.
    /// Returns the number of fragments visited.
    pub fn repaint_layer(&mut self, layer: LayerId) -> usize {
        let mut repainted = 0;
        for cell in self.grid.iter() {
            self.provider.repaint_layer(cell.fragment, layer);
            repainted += 1;
        }
        log::debug!("repainted {} on {} fragments", layer, repainted);
        repainted
    }
}

impl<P: FragmentProvider> std::fmt::Debug for MapState<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapState")
            .field("dimensions", &self.grid.dimensions())
            .field("origin", &self.origin)
            .field("viewer_size", &self.viewer_size)
            .finish()
    }
}
