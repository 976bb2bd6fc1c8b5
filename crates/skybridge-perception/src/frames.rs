//! ENU ↔ FLU vector conversions.
//!
//! `orientation` is the vehicle attitude as reported by odometry: the
//! rotation that takes body (FLU) vectors into the world (ENU) frame.  A
//! world vector is brought into the body frame with the inverse rotation.
//!
//! Non-unit orientations are normalized first; a degenerate orientation is
//! treated as the identity.

use skybridge_types::{Quaternion, Vector3};

/// Express world-frame vector `v` in the body frame.
pub fn enu_to_flu(orientation: Quaternion, v: Vector3) -> Vector3 {
    orientation.normalized().conjugate().rotate(v)
}
