//! `skybridge-kernel` – Command Safety
//!
//! Decides whether a command may leave the bridge. It does not move anything
//! itself.
//!
//! # Modules
//!
//! - [`control_mode`] – [`ControlModeValidator`][control_mode::ControlModeValidator]:
//!   holds the accepted [`ControlMode`][skybridge_types::ControlMode] and
//!   rejects every combination other than yaw-rate velocity control in the
//!   local world or body frame.
//! - [`freshness`] – [`FreshnessGate`][freshness::FreshnessGate]: a
//!   single-consumption latch that lets one world-frame translation through
//!   per orientation update.

pub mod control_mode;
pub mod freshness;

pub use control_mode::{ControlModeValidator, is_supported};
pub use freshness::FreshnessGate;
