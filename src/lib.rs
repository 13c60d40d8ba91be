//! # fragmap
//!
//! Viewport manager for an infinite, fragment-tiled 2D world map.
//!
//! The map keeps a rectangular window of fixed-size fragments linked in
//! row-major order, grows and shrinks it to cover the viewer at the current
//! zoom, swaps edge rows and columns as the user pans, and draws every
//! fragment in three passes (image layers, live layers, object markers)
//! through an abstract [`DrawSurface`]. Fragment content comes from a
//! [`FragmentProvider`]; [`PooledFragmentProvider`] is the stock one.

pub mod background;
pub mod core;
pub mod fragment;
pub mod grid;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::{MapConfig, MapProfile},
    geo::{FragmentCoord, Point},
    map::Map,
    transform::AffineTransform,
    zoom::{FixedZoom, MapZoom, ZoomState},
};

pub use fragment::{BasicFragment, Fragment, LayerId, LayerImage, MapObject};

pub use grid::{FragmentGrid, GridDimensions};

pub use rendering::{
    context::RenderContext,
    pipeline::MapView,
    surface::{DrawSurface, Interpolation},
};

pub use tiles::{FragmentProvider, FragmentSource, PooledFragmentProvider};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Task queue is closed")]
    TaskQueueClosed,

    #[error("Task queue is full")]
    TaskQueueFull,
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initialise `env_logger` from `RUST_LOG`. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
