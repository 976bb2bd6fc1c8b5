//! Geometry primitives shared by every SkyBridge crate.
//!
//! All values are `f64`.  Quaternions use the Hamilton convention and are
//! stored as `(w, x, y, z)`; the identity rotation is `(1, 0, 0, 0)`.

use serde::{Deserialize, Serialize};

/// A 3-D vector (translation, linear or angular velocity, field strength, …).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A rotation quaternion `(w, x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  Use [`Quaternion::normalized`] when the source
    /// is not guaranteed to be unit length.
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation.
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `yaw` radians about +Z.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Self::new(half.cos(), 0.0, 0.0, half.sin())
    }

    /// Hamilton product: `self` followed by `rhs` in the rotated frame.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (the inverse of a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn norm(self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit-length copy of `self`.  A degenerate (zero or non-finite)
    /// quaternion normalizes to the identity.
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if !n.is_finite() || n <= f64::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Rotate `v` by this (unit) quaternion: the vector part of `q * v * q*`.
    pub fn rotate(self, v: Vector3) -> Vector3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let r = self.mul(p).mul(self.conjugate());
        Vector3::new(r.x, r.y, r.z)
    }

    /// Heading about +Z in radians, `(-π, π]`.
    pub fn yaw(self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    #[test]
    fn identity_rotate_is_noop() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let r = Quaternion::identity().rotate(v);
        assert!((r.x - 1.0).abs() < 1e-12);
        assert!((r.y - 2.0).abs() < 1e-12);
        assert!((r.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn quarter_turn_yaw_rotates_x_to_y() {
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let r = q.rotate(Vector3::new(1.0, 0.0, 0.0));
        assert!(r.x.abs() < 1e-12, "x should be ~0, got {}", r.x);
        assert!((r.y - 1.0).abs() < 1e-12, "y should be ~1, got {}", r.y);
        assert!(r.z.abs() < 1e-12);
    }

    #[test]
    fn from_yaw_matches_explicit_quaternion() {
        let q = Quaternion::from_yaw(FRAC_PI_2);
        assert!((q.w - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((q.z - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((q.yaw() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn conjugate_is_inverse() {
        let q = Quaternion::from_yaw(0.7);
        let prod = q.mul(q.conjugate());
        assert!((prod.w - 1.0).abs() < 1e-12);
        assert!(prod.x.abs() < 1e-12);
        assert!(prod.y.abs() < 1e-12);
        assert!(prod.z.abs() < 1e-12);
    }

    #[test]
    fn normalized_scales_to_unit_length() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 2.0).normalized();
        assert!((q.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_quaternion_normalizes_to_identity() {
        assert_eq!(
            Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized(),
            Quaternion::identity()
        );
        assert_eq!(
            Quaternion::new(f64::NAN, 0.0, 0.0, 0.0).normalized(),
            Quaternion::identity()
        );
    }

    #[test]
    fn default_quaternion_is_identity() {
        assert_eq!(Quaternion::default(), Quaternion::identity());
    }
}
