use crate::core::geo::FragmentCoord;
use crate::fragment::{
    fragment::BiomeId,
    layer::{LayerDescriptor, LayerId, LayerImage},
    object::MapObject,
};

/// Produces fragment content on demand.
///
/// Called from worker threads, so implementations must be thread-safe and
/// deterministic for a given coordinate (and time, for live layers).
pub trait FragmentSource: Send + Sync + 'static {
    /// Layers every fragment carries
    fn layers(&self) -> Vec<LayerDescriptor>;

    /// Renders one layer of the fragment at `coord`. `time` is only
    /// meaningful for live layers.
    fn render_layer(&self, coord: FragmentCoord, layer: LayerId, time: f32) -> LayerImage;

    /// Points of interest inside the fragment
    fn objects(&self, _coord: FragmentCoord) -> Vec<MapObject> {
        Vec::new()
    }

    /// Row-major biome samples at biome resolution, if the source has them
    fn biomes(&self, _coord: FragmentCoord) -> Option<Vec<BiomeId>> {
        None
    }
}
