use crate::core::constants::{FRAGMENT_SIZE, FRAGMENT_SIZE_SHIFT};
use serde::{Deserialize, Serialize};

/// Represents a point in screen or world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// World-space origin of a fragment. Both components are multiples of
/// [`FRAGMENT_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FragmentCoord {
    pub x: i64,
    pub y: i64,
}

impl FragmentCoord {
    /// Creates a coordinate from an already aligned world origin.
    pub fn new(x: i64, y: i64) -> Self {
        debug_assert!(
            x.rem_euclid(FRAGMENT_SIZE) == 0 && y.rem_euclid(FRAGMENT_SIZE) == 0,
            "fragment origin ({x}, {y}) is not aligned"
        );
        Self { x, y }
    }

    /// Returns the fragment that contains the given world position.
    pub fn containing(world_x: i64, world_y: i64) -> Self {
        Self {
            x: world_x.div_euclid(FRAGMENT_SIZE) * FRAGMENT_SIZE,
            y: world_y.div_euclid(FRAGMENT_SIZE) * FRAGMENT_SIZE,
        }
    }

    /// Returns the neighbour `dx` fragments right and `dy` fragments down.
    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx * FRAGMENT_SIZE,
            y: self.y + dy * FRAGMENT_SIZE,
        }
    }

    /// Fragment index along x (world x divided by the fragment size).
    pub fn index_x(&self) -> i64 {
        self.x >> FRAGMENT_SIZE_SHIFT
    }

    /// Fragment index along y.
    pub fn index_y(&self) -> i64 {
        self.y >> FRAGMENT_SIZE_SHIFT
    }

    /// Checks if the world position lies inside this fragment
    pub fn contains(&self, world_x: i64, world_y: i64) -> bool {
        self.x <= world_x
            && self.y <= world_y
            && world_x < self.x + FRAGMENT_SIZE
            && world_y < self.y + FRAGMENT_SIZE
    }

    pub fn as_point(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

impl std::fmt::Display for FragmentCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}
