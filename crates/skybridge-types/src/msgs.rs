//! Sensor and transform message shapes exchanged with the simulator.
//!
//! Only the fields the bridge touches (the header frame id) are
//! load-bearing; the remaining fields carry the measurement through
//! unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{Quaternion, Vector3};

/// Common message header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Coordinate frame the measurement is expressed in.
    pub frame_id: String,
    pub stamp: DateTime<Utc>,
}

impl Header {
    /// Header for `frame_id`, stamped now.
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp: Utc::now(),
        }
    }
}

/// Ground-truth vehicle pose.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseStamped {
    pub header: Header,
    pub position: Vector3,
    pub orientation: Quaternion,
}

/// Vehicle odometry.  `orientation` feeds the command translator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Odometry {
    pub header: Header,
    pub child_frame_id: String,
    pub position: Vector3,
    pub orientation: Quaternion,
    pub linear_velocity: Vector3,
    pub angular_velocity: Vector3,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Imu {
    pub header: Header,
    pub orientation: Quaternion,
    /// rad/s
    pub angular_velocity: Vector3,
    /// m/s²
    pub linear_acceleration: Vector3,
}

/// Barometer reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FluidPressure {
    pub header: Header,
    /// Pascals.
    pub fluid_pressure: f64,
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MagneticField {
    pub header: Header,
    /// Tesla.
    pub magnetic_field: Vector3,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Image {
    pub header: Header,
    pub width: u32,
    pub height: u32,
    /// e.g. `"rgb8"`.
    pub encoding: String,
    pub data: Vec<u8>,
}

/// Camera calibration, delivered alongside images.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraInfo {
    pub header: Header,
    pub width: u32,
    pub height: u32,
    /// Row-major 3×3 intrinsic matrix.
    pub k: [f64; 9],
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LaserScan {
    pub header: Header,
    pub angle_min: f32,
    pub angle_increment: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub ranges: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud {
    pub header: Header,
    pub width: u32,
    pub height: u32,
    /// Bytes per point.
    pub point_step: u32,
    pub data: Vec<u8>,
}

/// GNSS fix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavSatFix {
    pub header: Header,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// A static mounting transform as delivered by the simulator.
///
/// `header.frame_id` is the parent frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformStamped {
    pub header: Header,
    pub child_frame_id: String,
    pub translation: Vector3,
    pub rotation: Quaternion,
}

impl TransformStamped {
    pub fn new(
        parent_frame: impl Into<String>,
        child_frame: impl Into<String>,
        translation: Vector3,
        rotation: Quaternion,
    ) -> Self {
        Self {
            header: Header::new(parent_frame),
            child_frame_id: child_frame.into(),
            translation,
            rotation,
        }
    }
}

/// A resolved sensor mount, as applied to a sensor handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMount {
    pub child_frame: String,
    pub parent_frame: String,
    pub translation: Vector3,
    pub rotation: Quaternion,
    pub variance: f64,
}

impl StaticMount {
    /// Mount derived from a simulator transform with the given `variance`.
    pub fn from_transform(msg: &TransformStamped, variance: f64) -> Self {
        Self {
            child_frame: msg.child_frame_id.clone(),
            parent_frame: msg.header.frame_id.clone(),
            translation: msg.translation,
            rotation: msg.rotation,
            variance,
        }
    }

    /// Identity mount from `child_frame` to `parent_frame`.
    pub fn identity(
        child_frame: impl Into<String>,
        parent_frame: impl Into<String>,
        variance: f64,
    ) -> Self {
        Self {
            child_frame: child_frame.into(),
            parent_frame: parent_frame.into(),
            translation: Vector3::zero(),
            rotation: Quaternion::identity(),
            variance,
        }
    }
}

/// Messages that carry a [`Header`].
pub trait Stamped {
    fn header(&self) -> &Header;
    fn header_mut(&mut self) -> &mut Header;

    /// Overwrite the header frame id.
    fn relabel(&mut self, frame_id: impl Into<String>) {
        self.header_mut().frame_id = frame_id.into();
    }
}

macro_rules! impl_stamped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Stamped for $ty {
                fn header(&self) -> &Header {
                    &self.header
                }
                fn header_mut(&mut self) -> &mut Header {
                    &mut self.header
                }
            }
        )*
    };
}

impl_stamped!(
    PoseStamped,
    Odometry,
    Imu,
    FluidPressure,
    MagneticField,
    Image,
    CameraInfo,
    LaserScan,
    PointCloud,
    NavSatFix,
    TransformStamped,
);

/// Any measurement a sensor handle can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "msg")]
pub enum SensorData {
    Pose(PoseStamped),
    Odometry(Odometry),
    Imu(Imu),
    FluidPressure(FluidPressure),
    MagneticField(MagneticField),
    Image(Image),
    LaserScan(LaserScan),
    PointCloud(PointCloud),
    NavSatFix(NavSatFix),
}

macro_rules! impl_into_sensor_data {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SensorData {
                fn from(msg: $ty) -> Self {
                    SensorData::$variant(msg)
                }
            }
        )*
    };
}

impl_into_sensor_data!(
    PoseStamped => Pose,
    Odometry => Odometry,
    Imu => Imu,
    FluidPressure => FluidPressure,
    MagneticField => MagneticField,
    Image => Image,
    LaserScan => LaserScan,
    PointCloud => PointCloud,
    NavSatFix => NavSatFix,
);

impl SensorData {
    /// Short schema name used in logs and mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            SensorData::Pose(_) => "pose",
            SensorData::Odometry(_) => "odometry",
            SensorData::Imu(_) => "imu",
            SensorData::FluidPressure(_) => "fluid_pressure",
            SensorData::MagneticField(_) => "magnetic_field",
            SensorData::Image(_) => "image",
            SensorData::LaserScan(_) => "laser_scan",
            SensorData::PointCloud(_) => "point_cloud",
            SensorData::NavSatFix(_) => "nav_sat_fix",
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            SensorData::Pose(m) => m.header(),
            SensorData::Odometry(m) => m.header(),
            SensorData::Imu(m) => m.header(),
            SensorData::FluidPressure(m) => m.header(),
            SensorData::MagneticField(m) => m.header(),
            SensorData::Image(m) => m.header(),
            SensorData::LaserScan(m) => m.header(),
            SensorData::PointCloud(m) => m.header(),
            SensorData::NavSatFix(m) => m.header(),
        }
    }

    pub fn header_mut(&mut self) -> &mut Header {
        match self {
            SensorData::Pose(m) => m.header_mut(),
            SensorData::Odometry(m) => m.header_mut(),
            SensorData::Imu(m) => m.header_mut(),
            SensorData::FluidPressure(m) => m.header_mut(),
            SensorData::MagneticField(m) => m.header_mut(),
            SensorData::Image(m) => m.header_mut(),
            SensorData::LaserScan(m) => m.header_mut(),
            SensorData::PointCloud(m) => m.header_mut(),
            SensorData::NavSatFix(m) => m.header_mut(),
        }
    }

    /// Overwrite the header frame id.
    pub fn relabel(&mut self, frame_id: impl Into<String>) {
        self.header_mut().frame_id = frame_id.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relabel_overwrites_frame_id() {
        let mut data = SensorData::Imu(Imu {
            header: Header::new("sim/imu_link"),
            ..Default::default()
        });
        data.relabel("drone0/imu0");
        assert_eq!(data.header().frame_id, "drone0/imu0");
    }

    #[test]
    fn mount_from_transform_copies_frames() {
        let msg = TransformStamped::new(
            "drone0/base_link",
            "drone0/cam0",
            Vector3::new(0.1, 0.0, -0.05),
            Quaternion::identity(),
        );
        let mount = StaticMount::from_transform(&msg, 0.1);
        assert_eq!(mount.parent_frame, "drone0/base_link");
        assert_eq!(mount.child_frame, "drone0/cam0");
        assert_eq!(mount.translation, Vector3::new(0.1, 0.0, -0.05));
        assert!((mount.variance - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn sensor_data_serialization_roundtrip() {
        let data = SensorData::NavSatFix(NavSatFix {
            header: Header::new("wgs86"),
            latitude: 40.4,
            longitude: -3.7,
            altitude: 650.0,
        });
        let json = serde_json::to_string(&data).unwrap();
        let back: SensorData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
