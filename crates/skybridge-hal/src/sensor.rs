//! Sensor handles.
//!
//! A [`Sensor`] is the platform-side endpoint of one measurement stream: it
//! records the latest measurement, publishes it on the
//! [`EventBus`][skybridge_middleware::EventBus], and carries the sensor's
//! static mount once it is known.
//!
//! [`SensorHandle`] is the tagged union the rest of the bridge works with.
//! Every variant exposes the same three operations:
//!
//! | Operation | Supported by |
//! |---|---|
//! | [`SensorHandle::receive_data`] | every variant |
//! | [`SensorHandle::set_static_transform`] | every variant |
//! | [`SensorHandle::set_parameters`] | [`SensorHandle::Camera`] only |

use skybridge_middleware::{EventBus, Topic};
use skybridge_types::{
    BridgeError, CameraInfo, Event, EventPayload, FluidPressure, Image, Imu, LaserScan,
    MagneticField, NavSatFix, Odometry, PointCloud, PoseStamped, SensorData, SensorKind,
    StaticMount, Stamped,
};

/// Name suffix of the point-cloud half of a lidar.
pub const POINT_CLOUD_NAME_SUFFIX: &str = "/points";

/// Child-frame suffix applied to the point-cloud mount of a lidar.
pub const POINT_CLOUD_FRAME_SUFFIX: &str = "_cloud";

// ─────────────────────────────────────────────────────────────────────────────
// Sensor<M>
// ─────────────────────────────────────────────────────────────────────────────

/// A single typed measurement stream.
#[derive(Debug)]
pub struct Sensor<M> {
    name: String,
    bus: EventBus,
    latest: Option<M>,
    static_mount: Option<StaticMount>,
    update_count: u64,
}

impl<M> Sensor<M>
where
    M: Stamped + Clone + Into<SensorData>,
{
    /// Create a sensor publishing on `bus` under `name`.
    pub fn new(name: impl Into<String>, bus: EventBus) -> Self {
        Self {
            name: name.into(),
            bus,
            latest: None,
            static_mount: None,
            update_count: 0,
        }
    }

    /// Stable identifier, e.g. `"cam0"` or `"lidar0/points"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record and publish a new measurement.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Channel`] if the bus rejects the event.
    pub fn update_data(&mut self, msg: M) -> Result<(), BridgeError> {
        let event = Event::new(
            format!("skybridge-hal::sensor/{}", self.name),
            EventPayload::Measurement {
                sensor: self.name.clone(),
                data: msg.clone().into(),
            },
        );
        self.bus.publish_to(Topic::SensorMeasurements, event)?;
        self.latest = Some(msg);
        self.update_count += 1;
        Ok(())
    }

    /// Record and publish the sensor's static mount.  A later call replaces
    /// the stored mount.
    pub fn set_static_transform(&mut self, mount: StaticMount) -> Result<(), BridgeError> {
        let event = Event::new(
            format!("skybridge-hal::sensor/{}", self.name),
            EventPayload::StaticTransform(mount.clone()),
        );
        self.bus.publish_to(Topic::StaticTransforms, event)?;
        self.static_mount = Some(mount);
        Ok(())
    }

    /// The most recent measurement, if any.
    pub fn latest(&self) -> Option<&M> {
        self.latest.as_ref()
    }

    pub fn static_transform(&self) -> Option<&StaticMount> {
        self.static_mount.as_ref()
    }

    /// Number of measurements accepted so far.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Camera
// ─────────────────────────────────────────────────────────────────────────────

/// An image stream plus its calibration.
#[derive(Debug)]
pub struct Camera {
    image: Sensor<Image>,
    parameters: Option<CameraInfo>,
}

impl Camera {
    pub fn new(name: impl Into<String>, bus: EventBus) -> Self {
        Self {
            image: Sensor::new(name, bus),
            parameters: None,
        }
    }

    pub fn image(&self) -> &Sensor<Image> {
        &self.image
    }

    /// Latest calibration, if any has been received.
    pub fn parameters(&self) -> Option<&CameraInfo> {
        self.parameters.as_ref()
    }

    /// Store and publish the camera calibration.
    pub fn set_parameters(&mut self, info: CameraInfo) -> Result<(), BridgeError> {
        let event = Event::new(
            format!("skybridge-hal::sensor/{}", self.image.name()),
            EventPayload::CameraParameters {
                sensor: self.image.name().to_string(),
                info: info.clone(),
            },
        );
        self.image.bus.publish_to(Topic::SensorMeasurements, event)?;
        self.parameters = Some(info);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lidar
// ─────────────────────────────────────────────────────────────────────────────

/// A laser-scan stream and its companion point-cloud stream, mounted
/// together.
#[derive(Debug)]
pub struct Lidar {
    scan: Sensor<LaserScan>,
    cloud: Sensor<PointCloud>,
}

impl Lidar {
    pub fn new(name: impl Into<String>, bus: EventBus) -> Self {
        let name = name.into();
        let cloud_name = format!("{name}{POINT_CLOUD_NAME_SUFFIX}");
        Self {
            scan: Sensor::new(name, bus.clone()),
            cloud: Sensor::new(cloud_name, bus),
        }
    }

    pub fn scan(&self) -> &Sensor<LaserScan> {
        &self.scan
    }

    pub fn cloud(&self) -> &Sensor<PointCloud> {
        &self.cloud
    }

    /// Mount both halves from one transform.  The point cloud's child frame
    /// gets [`POINT_CLOUD_FRAME_SUFFIX`].
    ///
    /// Returns the first failure; callers must treat the lidar as unmounted
    /// unless this returns `Ok`.
    pub fn set_static_transform(&mut self, mount: StaticMount) -> Result<(), BridgeError> {
        let cloud_mount = StaticMount {
            child_frame: format!("{}{POINT_CLOUD_FRAME_SUFFIX}", mount.child_frame),
            ..mount.clone()
        };
        self.scan.set_static_transform(mount)?;
        self.cloud.set_static_transform(cloud_mount)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SensorHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Tagged union over every sensor the platform exposes.
#[derive(Debug)]
pub enum SensorHandle {
    Pose(Sensor<PoseStamped>),
    Odometry(Sensor<Odometry>),
    Imu(Sensor<Imu>),
    AirPressure(Sensor<FluidPressure>),
    Magnetometer(Sensor<MagneticField>),
    Camera(Camera),
    Lidar(Lidar),
    Gps(Sensor<NavSatFix>),
}

impl SensorHandle {
    /// Build the handle for a descriptor-configured sensor.
    pub fn for_kind(kind: SensorKind, name: impl Into<String>, bus: EventBus) -> Self {
        match kind {
            SensorKind::Camera => SensorHandle::Camera(Camera::new(name, bus)),
            SensorKind::Lidar => SensorHandle::Lidar(Lidar::new(name, bus)),
            SensorKind::Gps => SensorHandle::Gps(Sensor::new(name, bus)),
            SensorKind::Imu => SensorHandle::Imu(Sensor::new(name, bus)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SensorHandle::Pose(s) => s.name(),
            SensorHandle::Odometry(s) => s.name(),
            SensorHandle::Imu(s) => s.name(),
            SensorHandle::AirPressure(s) => s.name(),
            SensorHandle::Magnetometer(s) => s.name(),
            SensorHandle::Camera(c) => c.image.name(),
            SensorHandle::Lidar(l) => l.scan.name(),
            SensorHandle::Gps(s) => s.name(),
        }
    }

    /// Payload schema(s) this handle accepts, for error messages.
    fn accepts(&self) -> &'static str {
        match self {
            SensorHandle::Pose(_) => "pose",
            SensorHandle::Odometry(_) => "odometry",
            SensorHandle::Imu(_) => "imu",
            SensorHandle::AirPressure(_) => "fluid_pressure",
            SensorHandle::Magnetometer(_) => "magnetic_field",
            SensorHandle::Camera(_) => "image",
            SensorHandle::Lidar(_) => "laser_scan or point_cloud",
            SensorHandle::Gps(_) => "nav_sat_fix",
        }
    }

    /// Forward a measurement to the matching stream.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PayloadMismatch`] when the payload schema does
    /// not belong to this sensor.
    pub fn receive_data(&mut self, data: SensorData) -> Result<(), BridgeError> {
        match (self, data) {
            (SensorHandle::Pose(s), SensorData::Pose(m)) => s.update_data(m),
            (SensorHandle::Odometry(s), SensorData::Odometry(m)) => s.update_data(m),
            (SensorHandle::Imu(s), SensorData::Imu(m)) => s.update_data(m),
            (SensorHandle::AirPressure(s), SensorData::FluidPressure(m)) => s.update_data(m),
            (SensorHandle::Magnetometer(s), SensorData::MagneticField(m)) => s.update_data(m),
            (SensorHandle::Camera(c), SensorData::Image(m)) => c.image.update_data(m),
            (SensorHandle::Lidar(l), SensorData::LaserScan(m)) => l.scan.update_data(m),
            (SensorHandle::Lidar(l), SensorData::PointCloud(m)) => l.cloud.update_data(m),
            (SensorHandle::Gps(s), SensorData::NavSatFix(m)) => s.update_data(m),
            (handle, data) => Err(BridgeError::PayloadMismatch {
                sensor: handle.name().to_string(),
                expected: handle.accepts().to_string(),
                got: data.type_name().to_string(),
            }),
        }
    }

    /// Apply the sensor's static mount.
    pub fn set_static_transform(&mut self, mount: StaticMount) -> Result<(), BridgeError> {
        match self {
            SensorHandle::Pose(s) => s.set_static_transform(mount),
            SensorHandle::Odometry(s) => s.set_static_transform(mount),
            SensorHandle::Imu(s) => s.set_static_transform(mount),
            SensorHandle::AirPressure(s) => s.set_static_transform(mount),
            SensorHandle::Magnetometer(s) => s.set_static_transform(mount),
            SensorHandle::Camera(c) => c.image.set_static_transform(mount),
            SensorHandle::Lidar(l) => l.set_static_transform(mount),
            SensorHandle::Gps(s) => s.set_static_transform(mount),
        }
    }

    /// Apply camera calibration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PayloadMismatch`] for any non-camera handle.
    pub fn set_parameters(&mut self, info: CameraInfo) -> Result<(), BridgeError> {
        match self {
            SensorHandle::Camera(c) => c.set_parameters(info),
            other => Err(BridgeError::PayloadMismatch {
                sensor: other.name().to_string(),
                expected: other.accepts().to_string(),
                got: "camera_info".to_string(),
            }),
        }
    }

    /// The applied mount (for a lidar, the laser-scan half).
    pub fn static_transform(&self) -> Option<&StaticMount> {
        match self {
            SensorHandle::Pose(s) => s.static_transform(),
            SensorHandle::Odometry(s) => s.static_transform(),
            SensorHandle::Imu(s) => s.static_transform(),
            SensorHandle::AirPressure(s) => s.static_transform(),
            SensorHandle::Magnetometer(s) => s.static_transform(),
            SensorHandle::Camera(c) => c.image.static_transform(),
            SensorHandle::Lidar(l) => l.scan.static_transform(),
            SensorHandle::Gps(s) => s.static_transform(),
        }
    }

    /// Every mount currently applied to this handle; two for a mounted lidar.
    pub fn applied_mounts(&self) -> Vec<StaticMount> {
        match self {
            SensorHandle::Lidar(l) => [l.scan.static_transform(), l.cloud.static_transform()]
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            other => other.static_transform().cloned().into_iter().collect(),
        }
    }

    /// Measurements accepted so far (both halves for a lidar).
    pub fn update_count(&self) -> u64 {
        match self {
            SensorHandle::Pose(s) => s.update_count(),
            SensorHandle::Odometry(s) => s.update_count(),
            SensorHandle::Imu(s) => s.update_count(),
            SensorHandle::AirPressure(s) => s.update_count(),
            SensorHandle::Magnetometer(s) => s.update_count(),
            SensorHandle::Camera(c) => c.image.update_count(),
            SensorHandle::Lidar(l) => l.scan.update_count() + l.cloud.update_count(),
            SensorHandle::Gps(s) => s.update_count(),
        }
    }

    /// Header frame id of the most recent measurement.
    pub fn last_frame_id(&self) -> Option<&str> {
        fn frame<M: Stamped>(m: Option<&M>) -> Option<&str> {
            m.map(|m| m.header().frame_id.as_str())
        }
        match self {
            SensorHandle::Pose(s) => frame(s.latest()),
            SensorHandle::Odometry(s) => frame(s.latest()),
            SensorHandle::Imu(s) => frame(s.latest()),
            SensorHandle::AirPressure(s) => frame(s.latest()),
            SensorHandle::Magnetometer(s) => frame(s.latest()),
            SensorHandle::Camera(c) => frame(c.image.latest()),
            SensorHandle::Lidar(l) => frame(l.scan.latest()).or(frame(l.cloud.latest())),
            SensorHandle::Gps(s) => frame(s.latest()),
        }
    }
}
