#![allow(dead_code)]

use fragmap::constants::BIOME_SIZE;
use fragmap::prelude::*;
use fxhash::FxHashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const IMAGE_LAYER: LayerId = LayerId(0);
pub const LIVE_LAYER: LayerId = LayerId(1);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Source with scripted objects, a generation counter stamped into the
/// image layer and biome ids derived from world position
#[derive(Default)]
pub struct ScriptedSource {
    objects: FxHashMap<FragmentCoord, Vec<MapObject>>,
    pub generation: AtomicU32,
    pub renders: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places an object at a world position
    pub fn with_object(mut self, id: u64, world_x: i64, world_y: i64) -> Self {
        self.insert(MapObject::new(id, "village", 0, 0), world_x, world_y);
        self
    }

    pub fn with_hidden_object(mut self, id: u64, world_x: i64, world_y: i64) -> Self {
        self.insert(MapObject::new(id, "village", 0, 0).hidden(), world_x, world_y);
        self
    }

    fn insert(&mut self, mut object: MapObject, world_x: i64, world_y: i64) {
        let coord = FragmentCoord::containing(world_x, world_y);
        object.x_in_fragment = (world_x - coord.x) as i32;
        object.y_in_fragment = (world_y - coord.y) as i32;
        self.objects.entry(coord).or_default().push(object);
    }

    /// Biome id expected at a world position
    pub fn expected_biome(world_x: i64, world_y: i64) -> BiomeId {
        let sample_x = world_x.div_euclid(BIOME_SCALE);
        let sample_y = world_y.div_euclid(BIOME_SCALE);
        (sample_x + 3 * sample_y).rem_euclid(1000) as BiomeId
    }
}

impl FragmentSource for ScriptedSource {
    fn layers(&self) -> Vec<LayerDescriptor> {
        vec![
            LayerDescriptor::new(IMAGE_LAYER.0, LayerClass::Image, "biomes"),
            LayerDescriptor::new(LIVE_LAYER.0, LayerClass::Live, "player"),
        ]
    }

    fn render_layer(&self, _coord: FragmentCoord, layer: LayerId, time: f32) -> LayerImage {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let value = if layer == IMAGE_LAYER {
            self.generation.load(Ordering::SeqCst)
        } else {
            time as u32
        };
        LayerImage::solid(4, 4, value)
    }

    fn objects(&self, coord: FragmentCoord) -> Vec<MapObject> {
        self.objects.get(&coord).cloned().unwrap_or_default()
    }

    fn biomes(&self, coord: FragmentCoord) -> Option<Vec<BiomeId>> {
        let mut biomes = Vec::with_capacity(BIOME_SIZE * BIOME_SIZE);
        for row in 0..BIOME_SIZE as i64 {
            for col in 0..BIOME_SIZE as i64 {
                biomes.push(Self::expected_biome(
                    coord.x + col * BIOME_SCALE,
                    coord.y + row * BIOME_SCALE,
                ));
            }
        }
        Some(biomes)
    }
}

/// Provider that hands out empty fragments and panics on any double
/// request or stray recycle
#[derive(Debug, Default)]
pub struct StrictProvider {
    pub resident: FxHashMap<FragmentCoord, usize>,
    pub recycled: FxHashMap<FragmentCoord, usize>,
    pub resets: usize,
}

impl FragmentProvider for StrictProvider {
    type Fragment = BasicFragment;

    fn request_fragment(&mut self, coord: FragmentCoord) -> BasicFragment {
        let count = self.resident.entry(coord).or_default();
        assert_eq!(*count, 0, "{coord} requested twice");
        *count += 1;
        let fragment = BasicFragment::new(coord);
        fragment.write().mark_loaded();
        fragment
    }

    fn recycle_fragment(&mut self, fragment: BasicFragment) {
        let coord = fragment.coord();
        assert_eq!(
            self.resident.remove(&coord),
            Some(1),
            "{coord} recycled without being resident"
        );
        *self.recycled.entry(coord).or_default() += 1;
    }

    fn repaint_layer(&mut self, _fragment: &BasicFragment, _layer: LayerId) {}

    fn reset(&mut self) {
        self.resets += 1;
    }
}

pub fn pooled_map(
    source: ScriptedSource,
    scale: f64,
    config: MapConfig,
) -> (Map<PooledFragmentProvider<ScriptedSource>>, Arc<FixedZoom>) {
    let zoom = Arc::new(FixedZoom::new(scale));
    let provider = PooledFragmentProvider::from_config(Arc::new(source), &config);
    let map = Map::with_config(provider, zoom.clone(), config).expect("valid config");
    (map, zoom)
}

/// Polls `condition` until it holds or the timeout expires
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Small deterministic generator for randomized interaction sequences
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    /// Uniform value in `[low, high)`
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        low + (self.next_u32() as f64 / u32::MAX as f64) * (high - low)
    }
}
