//! Zoom state consumed by the map.
//!
//! The map only ever reads the current scale through [`ZoomState`]. Whoever
//! drives user input owns the concrete state and mutates it.

use crate::core::config::ZoomConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Read-only view of the zoom factor
pub trait ZoomState: Send + Sync {
    /// Screen pixels per world unit
    fn current_scale(&self) -> f64;
}

/// Externally driven scale, e.g. from a host that animates zoom itself
#[derive(Debug)]
pub struct FixedZoom {
    bits: AtomicU64,
}

impl FixedZoom {
    /// Any value is stored. The map skips drawing while the scale is not
    /// a positive number.
    pub fn new(scale: f64) -> Self {
        warn_if_unusable(scale);
        Self {
            bits: AtomicU64::new(scale.to_bits()),
        }
    }

    pub fn set(&self, scale: f64) {
        warn_if_unusable(scale);
        self.bits.store(scale.to_bits(), Ordering::SeqCst);
    }
}

fn warn_if_unusable(scale: f64) {
    if !(scale > 0.0) {
        log::warn!("zoom scale {} is not positive, drawing is paused", scale);
    }
}

impl Default for FixedZoom {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ZoomState for FixedZoom {
    fn current_scale(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy)]
struct ZoomInner {
    level: i32,
    current: f64,
    target: f64,
}

/// Discrete zoom levels with an eased current scale.
///
/// `adjust` moves the target level; `update` is expected once per frame and
/// moves the current scale a fixed fraction of the way toward the target.
#[derive(Debug)]
pub struct MapZoom {
    config: ZoomConfig,
    inner: Mutex<ZoomInner>,
}

/// Below this the eased scale snaps to its target
const SNAP_EPSILON: f64 = 1e-4;

impl MapZoom {
    pub fn new(config: ZoomConfig) -> Self {
        let level = config
            .initial_level
            .clamp(config.min_level, config.max_level);
        let scale = config.scale_for_level(level);
        Self {
            config,
            inner: Mutex::new(ZoomInner {
                level,
                current: scale,
                target: scale,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ZoomInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn level(&self) -> i32 {
        self.lock().level
    }

    pub fn target_scale(&self) -> f64 {
        self.lock().target
    }

    /// Moves the target level by `notches`, clamped to the configured range
    pub fn adjust(&self, notches: i32) {
        let level = self.lock().level.saturating_add(notches);
        self.set_level(level);
    }

    pub fn set_level(&self, level: i32) {
        let mut inner = self.lock();
        inner.level = level.clamp(self.config.min_level, self.config.max_level);
        inner.target = self.config.scale_for_level(inner.level);
    }

    /// Advances the eased scale. Returns `(old, new)` when it changed.
    pub fn update(&self) -> Option<(f64, f64)> {
        let mut inner = self.lock();
        let old = inner.current;
        if old == inner.target {
            return None;
        }

        let mut next = old + (inner.target - old) * self.config.smoothing;
        if (inner.target - next).abs() < SNAP_EPSILON {
            next = inner.target;
        }
        inner.current = next;
        Some((old, next))
    }

    /// Jumps straight to the target scale
    pub fn skip_animation(&self) {
        let mut inner = self.lock();
        inner.current = inner.target;
    }
}

impl Default for MapZoom {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl ZoomState for MapZoom {
    fn current_scale(&self) -> f64 {
        self.lock().current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_zoom_can_be_changed() {
        let zoom = FixedZoom::new(1.0);
        zoom.set(0.5);
        assert_eq!(zoom.current_scale(), 0.5);
    }

    #[test]
    fn test_fixed_zoom_stores_unusable_scales() {
        let zoom = FixedZoom::new(0.0);
        assert_eq!(zoom.current_scale(), 0.0);
        zoom.set(-2.0);
        assert_eq!(zoom.current_scale(), -2.0);
        zoom.set(f64::NAN);
        assert!(zoom.current_scale().is_nan());
    }

    #[test]
    fn test_adjust_clamps_to_range() {
        let zoom = MapZoom::new(ZoomConfig {
            min_level: -2,
            max_level: 2,
            ..ZoomConfig::default()
        });

        zoom.adjust(10);
        assert_eq!(zoom.level(), 2);
        zoom.adjust(-10);
        assert_eq!(zoom.level(), -2);
    }

    #[test]
    fn test_update_eases_toward_target() {
        let zoom = MapZoom::default();
        assert_eq!(zoom.update(), None);

        zoom.adjust(4);
        assert_eq!(zoom.target_scale(), 2.0);

        let (old, new) = zoom.update().unwrap();
        assert_eq!(old, 1.0);
        assert!((new - 1.2).abs() < 1e-12);

        let mut frames = 1;
        while zoom.update().is_some() {
            frames += 1;
            assert!(frames < 200, "zoom never settled");
        }
        assert_eq!(zoom.current_scale(), 2.0);
    }

    #[test]
    fn test_skip_animation() {
        let zoom = MapZoom::default();
        zoom.adjust(-4);
        zoom.skip_animation();
        assert_eq!(zoom.current_scale(), 0.5);
        assert_eq!(zoom.update(), None);
    }
}
