//! Configuration for the fragment map
//!
//! A [`MapConfig`] groups the knobs of every component. It can be built from
//! one of the [`MapProfile`] presets, deserialized from JSON (missing fields
//! fall back to the defaults) or assembled by hand.

use crate::background::tasks::TaskManagerConfig;
use crate::core::constants::{DEFAULT_OBJECT_PICK_RADIUS, DEFAULT_VIEWER_SIZE};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum MapProfile {
    Balanced,
    LowMemory,
    /// Inline workers and a tiny recycle pool, for deterministic tests
    Testing,
    Custom(MapConfig),
}

impl MapProfile {
    pub fn resolve(&self) -> MapConfig {
        match self {
            Self::Balanced => MapConfig::default(),
            Self::LowMemory => MapConfig {
                workers: TaskManagerConfig {
                    max_concurrent_tasks: 1,
                    max_queue_size: Some(256),
                    test_mode: false,
                },
                pool: PoolConfig {
                    recycle_capacity: 16,
                },
                grid: GridConfig {
                    max_steps_per_draw: Some(1),
                },
                ..MapConfig::default()
            },
            Self::Testing => MapConfig {
                workers: TaskManagerConfig::for_testing(),
                pool: PoolConfig {
                    recycle_capacity: 8,
                },
                ..MapConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for MapProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub viewport: ViewportConfig,
    pub zoom: ZoomConfig,
    pub grid: GridConfig,
    pub interaction: InteractionConfig,
    pub workers: TaskManagerConfig,
    pub pool: PoolConfig,
}

impl MapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading map config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.viewport.width >= 0.0 && self.viewport.height >= 0.0) {
            return Err(MapError::Config(format!(
                "viewer size must be non-negative, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.zoom.min_level > self.zoom.max_level {
            return Err(MapError::Config(format!(
                "zoom.min_level {} exceeds zoom.max_level {}",
                self.zoom.min_level, self.zoom.max_level
            )));
        }
        if !(self.zoom.min_level..=self.zoom.max_level).contains(&self.zoom.initial_level) {
            return Err(MapError::Config(format!(
                "zoom.initial_level {} outside [{}, {}]",
                self.zoom.initial_level, self.zoom.min_level, self.zoom.max_level
            )));
        }
        if self.zoom.levels_per_doubling == 0 {
            return Err(MapError::Config("zoom.levels_per_doubling must be positive".into()));
        }
        if !(self.zoom.smoothing > 0.0 && self.zoom.smoothing <= 1.0) {
            return Err(MapError::Config(format!(
                "zoom.smoothing must be in (0, 1], got {}",
                self.zoom.smoothing
            )));
        }
        if self.grid.max_steps_per_draw == Some(0) {
            return Err(MapError::Config("grid.max_steps_per_draw must be positive".into()));
        }
        if self.interaction.object_pick_radius < 0.0 {
            return Err(MapError::Config("interaction.object_pick_radius is negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWER_SIZE.0,
            height: DEFAULT_VIEWER_SIZE.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_level: i32,
    pub max_level: i32,
    pub initial_level: i32,
    /// Zoom levels needed to double the scale
    pub levels_per_doubling: u32,
    /// Fraction of the remaining distance covered per `MapZoom::update`
    pub smoothing: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_level: -12,
            max_level: 12,
            initial_level: 0,
            levels_per_doubling: 4,
            smoothing: 0.2,
        }
    }
}

impl ZoomConfig {
    pub fn scale_for_level(&self, level: i32) -> f64 {
        2_f64.powf(level as f64 / self.levels_per_doubling as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Caps unit grow/shrink steps per axis in one draw; `None` converges in one draw
    pub max_steps_per_draw: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub object_pick_radius: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            object_pick_radius: DEFAULT_OBJECT_PICK_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Recycled fragments kept for reuse, keyed by coordinate
    pub recycle_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            recycle_capacity: 256,
        }
    }
}
