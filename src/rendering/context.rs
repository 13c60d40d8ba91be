use crate::core::{bounds::Bounds, geo::Point, transform::AffineTransform};
use crate::fragment::{
    layer::LayerImage,
    object::{MapObject, ObjectId},
};
use crate::rendering::surface::{DrawSurface, Interpolation};

/// Commands recorded by the render context
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Image {
        width: u32,
        height: u32,
        /// Screen bounds after clipping
        bounds: Bounds,
        interpolation: Interpolation,
    },
    Marker {
        id: ObjectId,
        kind: String,
        position: Point,
        selected: bool,
    },
}

/// Recording draw surface.
///
/// Keeps a queue of [`DrawCommand`]s for a backend to replay, and culls
/// anything falling completely outside the clip rectangle.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub width: f64,
    pub height: f64,
    transform: AffineTransform,
    interpolation: Interpolation,
    drawing_queue: Vec<DrawCommand>,
    /// Viewport clipping bounds in screen coordinates
    clip_bounds: Option<Bounds>,
    culled: usize,
}

impl RenderContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            transform: AffineTransform::identity(),
            interpolation: Interpolation::default(),
            drawing_queue: Vec::new(),
            clip_bounds: None,
            culled: 0,
        }
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
        self.culled = 0;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    pub fn image_count(&self) -> usize {
        self.drawing_queue
            .iter()
            .filter(|command| matches!(command, DrawCommand::Image { .. }))
            .count()
    }

    pub fn marker_count(&self) -> usize {
        self.drawing_queue
            .iter()
            .filter(|command| matches!(command, DrawCommand::Marker { .. }))
            .count()
    }

    /// Number of draws rejected by clipping since the frame began
    pub fn culled_count(&self) -> usize {
        self.culled
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_clip_bounds(&mut self, bounds: Bounds) {
        self.clip_bounds = Some(bounds);
    }

    /// Clip to the context's own size
    pub fn clip_to_viewer(&mut self) {
        self.clip_bounds = Some(Bounds::viewer(self.width, self.height));
    }

    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
    }

    /// Clip bounds to the viewport (returns None if completely outside)
    fn clip(&self, bounds: Bounds) -> Option<Bounds> {
        match &self.clip_bounds {
            Some(clip) => clip.intersection(&bounds),
            None => Some(bounds),
        }
    }
}

impl DrawSurface for RenderContext {
    fn transform(&self) -> AffineTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
    }

    fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    fn draw_image(&mut self, image: &LayerImage, transform: &AffineTransform) {
        let bounds =
            Bounds::of_transformed_rect(transform, image.width() as f64, image.height() as f64);
        match self.clip(bounds) {
            Some(bounds) => self.drawing_queue.push(DrawCommand::Image {
                width: image.width(),
                height: image.height(),
                bounds,
                interpolation: self.interpolation,
            }),
            None => self.culled += 1,
        }
    }

    fn draw_marker(&mut self, object: &MapObject, transform: &AffineTransform, selected: bool) {
        let position = transform.transform_point(Point::new(0.0, 0.0));
        let inside = self
            .clip_bounds
            .as_ref()
            .map_or(true, |clip| clip.contains(&position));
        if !inside {
            self.culled += 1;
            return;
        }
        self.drawing_queue.push(DrawCommand::Marker {
            id: object.id,
            kind: object.kind.clone(),
            position,
            selected,
        });
    }
}
