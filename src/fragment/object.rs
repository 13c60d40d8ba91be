use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// A point of interest (village, spawn, stronghold...) inside one fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub id: ObjectId,
    /// Marker kind, interpreted by the draw surface
    pub kind: String,
    /// Position relative to the owning fragment's origin, in world units
    pub x_in_fragment: i32,
    pub y_in_fragment: i32,
    pub visible: bool,
}

impl MapObject {
    pub fn new(id: u64, kind: impl Into<String>, x_in_fragment: i32, y_in_fragment: i32) -> Self {
        Self {
            id: ObjectId(id),
            kind: kind.into(),
            x_in_fragment,
            y_in_fragment,
            visible: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn position_in_fragment(&self) -> Point {
        Point::new(self.x_in_fragment as f64, self.y_in_fragment as f64)
    }
}
