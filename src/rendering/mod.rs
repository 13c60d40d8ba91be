pub mod context;
pub mod pipeline;
pub mod surface;

pub use context::{DrawCommand, RenderContext};
pub use pipeline::{render_grid, MapView};
pub use surface::{DrawSurface, Interpolation};
