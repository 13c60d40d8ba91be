//! Prelude module for common fragmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use fragmap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{
        GridConfig, InteractionConfig, MapConfig, MapProfile, PoolConfig, ViewportConfig,
        ZoomConfig,
    },
    constants::{BIOME_SCALE, FRAGMENT_SIZE},
    geo::{FragmentCoord, Point},
    map::Map,
    transform::AffineTransform,
    zoom::{FixedZoom, MapZoom, ZoomState},
};

pub use crate::fragment::{
    BasicFragment, BiomeId, Fragment, FragmentContent, LayerClass, LayerDescriptor, LayerId,
    LayerImage, LayerPass, MapObject, ObjectId,
};

pub use crate::grid::{FragmentGrid, GridDimensions, GridEdge};

pub use crate::rendering::{DrawCommand, DrawSurface, Interpolation, MapView, RenderContext};

pub use crate::tiles::{FragmentProvider, FragmentSource, PoolStats, PooledFragmentProvider};

pub use crate::background::tasks::{BackgroundTask, BackgroundTaskManager, TaskManagerConfig};

pub use crate::{MapError, Result};
