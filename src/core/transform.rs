use crate::core::geo::Point;
use nalgebra::{Matrix3, Vector2, Vector3};

/// 2D affine transform in homogeneous form.
///
/// `translate` and `scale` post-multiply, so each call acts in the
/// coordinate system established by the previous ones. A render pass
/// builds `base · translate(origin) · scale(zoom) · translate(slot)` that way
/// and then maps fragment-local positions straight to the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            matrix: Matrix3::new_translation(&Vector2::new(tx, ty)),
        }
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.matrix *= Matrix3::new_translation(&Vector2::new(tx, ty));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.matrix *= Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy));
    }

    /// Returns a copy translated in the local coordinate system
    pub fn translated(&self, tx: f64, ty: f64) -> AffineTransform {
        let mut result = *self;
        result.translate(tx, ty);
        result
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let v = self.matrix * Vector3::new(point.x, point.y, 1.0);
        Point::new(v.x, v.y)
    }

    /// `None` when the transform is singular (e.g. a zero scale)
    pub fn inverse(&self) -> Option<AffineTransform> {
        self.matrix
            .try_inverse()
            .map(|matrix| AffineTransform { matrix })
    }

    pub fn inverse_transform_point(&self, point: Point) -> Option<Point> {
        self.inverse().map(|inverse| inverse.transform_point(point))
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}
