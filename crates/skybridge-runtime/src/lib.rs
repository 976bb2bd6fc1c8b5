//! `skybridge-runtime` – Bridge Runtime
//!
//! Wires the sensor layer, the command safety checks and the simulator link
//! into one running platform.
//!
//! # Modules
//!
//! - [`translator`] – [`CommandTranslator`][translator::CommandTranslator]:
//!   turns the commanded twist into the body-frame twist the vehicle
//!   expects, clamping the yaw rate on the world-frame path.
//! - [`platform`] – [`Platform`][platform::Platform]: owns all bridge state
//!   and runs it as a single actor over the inbound, request, timer and
//!   shutdown channels.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with optional OTLP span export.

pub mod platform;
pub mod telemetry;
pub mod translator;

pub use platform::{Platform, PlatformConfig, PlatformRequest, PlatformStatus};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
pub use translator::{CommandTranslator, DEFAULT_YAW_RATE_LIMIT};
