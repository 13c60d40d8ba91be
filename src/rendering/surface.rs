use crate::core::transform::AffineTransform;
use crate::fragment::{layer::LayerImage, object::MapObject};

/// Sampling used when raster content is scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Bilinear,
    /// Keeps zoomed pixels crisp
    NearestNeighbor,
}

/// Abstract 2D drawing target driven by affine transforms.
///
/// Implemented by rendering backends; the map never touches pixels itself.
pub trait DrawSurface {
    /// Base transform the map composes its own transforms onto
    fn transform(&self) -> AffineTransform;

    fn set_transform(&mut self, transform: AffineTransform);

    fn set_interpolation(&mut self, interpolation: Interpolation);

    /// Draws `image` with its pixel `(0, 0)` mapped through `transform`
    fn draw_image(&mut self, image: &LayerImage, transform: &AffineTransform);

    /// Draws a marker whose anchor is the origin of `transform`
    fn draw_marker(&mut self, object: &MapObject, transform: &AffineTransform, selected: bool);
}
