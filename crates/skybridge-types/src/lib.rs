//! `skybridge-types` – shared vocabulary of the SkyBridge workspace.
//!
//! - [`geometry`] – [`Vector3`][geometry::Vector3] and
//!   [`Quaternion`][geometry::Quaternion] in double precision.
//! - [`msgs`] – sensor and transform message shapes.
//! - Sensor descriptors, control modes, command twists, bus events and the
//!   workspace error type live at the crate root.

pub mod geometry;
pub mod msgs;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use geometry::{Quaternion, Vector3};
pub use msgs::{
    CameraInfo, FluidPressure, Header, Image, Imu, LaserScan, MagneticField, NavSatFix, Odometry,
    PointCloud, PoseStamped, SensorData, StaticMount, Stamped, TransformStamped,
};

// ────────────────────────────────────────────────────────────────────────────
// Sensor descriptors
// ────────────────────────────────────────────────────────────────────────────

/// Kind of a configurable simulator sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Camera,
    Lidar,
    Gps,
    Imu,
}

impl SensorKind {
    /// Exact, case-sensitive lookup of a descriptor kind field.
    pub fn from_descriptor(field: &str) -> Option<Self> {
        match field {
            "camera" => Some(SensorKind::Camera),
            "lidar" => Some(SensorKind::Lidar),
            "gps" => Some(SensorKind::Gps),
            "imu" => Some(SensorKind::Imu),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SensorKind::Camera => "camera",
            SensorKind::Lidar => "lidar",
            SensorKind::Gps => "gps",
            SensorKind::Imu => "imu",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed entry of the sensor configuration string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    /// Simulation world the sensor lives in.
    pub world: String,
    /// Model (vehicle) the sensor is attached to.
    pub model: String,
    /// Sensor name; key of the sensor handle within its kind.
    pub name: String,
    /// Simulator link / topic the sensor is published on.
    pub link: String,
    pub kind: SensorKind,
}

// ────────────────────────────────────────────────────────────────────────────
// Control mode
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YawMode {
    #[default]
    None,
    YawAngle,
    YawRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlModeKind {
    #[default]
    Unset,
    Hover,
    Position,
    Velocity,
    VelocityInAPlane,
    Attitude,
    Acro,
    Trajectory,
}

/// Frame a commanded twist is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFrame {
    #[default]
    Undefined,
    /// World-fixed east-north-up.
    LocalWorld,
    /// Vehicle-fixed forward-left-up.
    BodyFixed,
    GlobalWorld,
}

/// A `{yaw_mode, control_mode, reference_frame}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ControlMode {
    pub yaw_mode: YawMode,
    pub control_mode: ControlModeKind,
    pub reference_frame: ReferenceFrame,
}

impl ControlMode {
    pub const fn new(
        yaw_mode: YawMode,
        control_mode: ControlModeKind,
        reference_frame: ReferenceFrame,
    ) -> Self {
        Self {
            yaw_mode,
            control_mode,
            reference_frame,
        }
    }

    /// Velocity control with yaw-rate in `frame`.
    pub const fn velocity(frame: ReferenceFrame) -> Self {
        Self::new(YawMode::YawRate, ControlModeKind::Velocity, frame)
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{yaw: {:?}, control: {:?}, frame: {:?}}}",
            self.yaw_mode, self.control_mode, self.reference_frame
        )
    }
}

/// Outbound velocity command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    pub const fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }

    /// All six components zero.
    pub const fn zero() -> Self {
        Self::new(Vector3::zero(), Vector3::zero())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// Unified event wrapper for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"skybridge-hal::sensor/cam0"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` with a fresh id and timestamp.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// A relabeled measurement accepted by a sensor handle.
    Measurement { sensor: String, data: SensorData },
    /// Camera calibration stored on a camera handle.
    CameraParameters { sensor: String, info: CameraInfo },
    /// A sensor mount applied to a handle.
    StaticTransform(StaticMount),
    /// A twist handed to the simulator.
    Command(Twist),
    ControlModeChanged(ControlMode),
    Fault { component: String, message: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared by every SkyBridge crate.  None of these are fatal to
/// the process.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BridgeError {
    #[error("Unsupported control mode: {0}")]
    UnsupportedControlMode(ControlMode),

    #[error("Command not ready: {0}")]
    NotReady(String),

    #[error("Unknown sensor '{0}'")]
    UnknownSensor(String),

    #[error("Sensor '{name}' is already registered as {kind}")]
    DuplicateSensor { name: String, kind: SensorKind },

    #[error("Sensor '{sensor}' cannot accept {got} payloads (expects {expected})")]
    PayloadMismatch {
        sensor: String,
        expected: String,
        got: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
