//! `skybridge-perception` – Frames & Transforms
//!
//! Spatial bookkeeping for the bridge.
//!
//! # Modules
//!
//! - [`frames`] – conversions between the world-fixed east-north-up frame and
//!   the vehicle's forward-left-up body frame.
//! - [`transform`] – [`TfTree`][transform::TfTree]: graph of the static
//!   sensor mounts, composing chains of mounts via BFS.

pub mod frames;
pub mod transform;

pub use frames::enu_to_flu;
pub use transform::{RigidTransform, TfTree};
