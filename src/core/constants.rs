//! Core constants for the fragment grid.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Edge length of a fragment in world units.
pub const FRAGMENT_SIZE: i64 = 512;

/// `log2(FRAGMENT_SIZE)`.
pub const FRAGMENT_SIZE_SHIFT: u32 = 9;

/// World units covered by one biome sample.
pub const BIOME_SCALE: i64 = 4;

/// Biome samples along one fragment edge.
pub const BIOME_SIZE: usize = (FRAGMENT_SIZE / BIOME_SCALE) as usize;

/// Extra fragments kept per axis beyond the visible span.
pub const OVERSCAN_TILES: usize = 2;

/// Screen-space radius used when picking objects under the cursor.
pub const DEFAULT_OBJECT_PICK_RADIUS: f64 = 20.0;

/// Viewer size assumed until the host reports one.
pub const DEFAULT_VIEWER_SIZE: (f64, f64) = (800.0, 600.0);
