//! [`SensorRegistry`] – per-kind sensor maps and inbound data dispatcher.
//!
//! The registry owns every [`SensorHandle`] of one vehicle.  Sensors come
//! from two places:
//!
//! * **Descriptor sensors** – one handle per parsed
//!   [`SensorDescriptor`][skybridge_types::SensorDescriptor], stored in the
//!   map of its [`SensorKind`] and keyed by sensor name.
//! * **Vehicle sensors** – the fixed [`VehicleSensor`] set.  `pose` and
//!   `odom` always exist; `imu`, `air_pressure` and `magnetometer` are added
//!   by [`SensorRegistry::register_world_sensors`] when a world is known.
//!
//! # Frame relabeling
//!
//! | Sensor | Frame id written into the payload |
//! |---|---|
//! | camera `cam0` | `{ns}/cam0/camera_link` |
//! | lidar `lidar0` (scan and cloud) | `{ns}/lidar0` |
//! | imu `imu0` | `{ns}/imu0` |
//! | gps | [`GPS_FRAME_ID`] |
//! | vehicle `odom`, `imu`, `air_pressure`, `magnetometer` | `{ns}/<name>` |
//! | vehicle `pose` | unchanged |

use std::collections::HashMap;

use skybridge_middleware::EventBus;
use skybridge_types::{
    BridgeError, CameraInfo, SensorData, SensorDescriptor, SensorKind, StaticMount, Stamped,
};
use tracing::{debug, warn};

use crate::sensor::{Sensor, SensorHandle};

/// Frame id written into every GPS fix.
pub const GPS_FRAME_ID: &str = "wgs86";

/// Link appended to a camera's name to form its frame id.
pub const CAMERA_LINK: &str = "camera_link";

/// Variance attached to every static mount the bridge applies.
pub const STATIC_TRANSFORM_VARIANCE: f64 = 0.1;

/// Vehicle body frame that auxiliary sensors are mounted on.
pub const BASE_LINK: &str = "base_link";

/// Namespaced frame name: `"{ns}/{frame}"`, ignoring a leading `/` on the
/// namespace.  An empty namespace yields `frame` unchanged.
pub fn tf_name(namespace: &str, frame: &str) -> String {
    let ns = namespace.strip_prefix('/').unwrap_or(namespace);
    if ns.is_empty() {
        frame.to_string()
    } else {
        format!("{ns}/{frame}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SensorMap
// ─────────────────────────────────────────────────────────────────────────────

/// Name-keyed handles of a single sensor kind.
#[derive(Debug, Default)]
pub struct SensorMap {
    handles: HashMap<String, SensorHandle>,
}

impl SensorMap {
    /// Insert `handle` under its own name.
    ///
    /// # Errors
    ///
    /// Returns `Err(existing_name)` when the name is already taken; the
    /// existing handle is kept.
    pub fn register(&mut self, handle: SensorHandle) -> Result<(), String> {
        let name = handle.name().to_string();
        if self.handles.contains_key(&name) {
            return Err(name);
        }
        self.handles.insert(name, handle);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&SensorHandle> {
        self.handles.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut SensorHandle> {
        self.handles.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Vehicle sensors
// ─────────────────────────────────────────────────────────────────────────────

/// Sensors that belong to the vehicle rather than to the descriptor string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleSensor {
    Pose,
    Odometry,
    Imu,
    AirPressure,
    Magnetometer,
}

impl VehicleSensor {
    /// The sensors registered against a configured world.
    pub const WORLD: [VehicleSensor; 3] = [
        VehicleSensor::Imu,
        VehicleSensor::AirPressure,
        VehicleSensor::Magnetometer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleSensor::Pose => "pose",
            VehicleSensor::Odometry => "odom",
            VehicleSensor::Imu => "imu",
            VehicleSensor::AirPressure => "air_pressure",
            VehicleSensor::Magnetometer => "magnetometer",
        }
    }

    fn handle(self, bus: EventBus) -> SensorHandle {
        let name = self.as_str();
        match self {
            VehicleSensor::Pose => SensorHandle::Pose(Sensor::new(name, bus)),
            VehicleSensor::Odometry => SensorHandle::Odometry(Sensor::new(name, bus)),
            VehicleSensor::Imu => SensorHandle::Imu(Sensor::new(name, bus)),
            VehicleSensor::AirPressure => SensorHandle::AirPressure(Sensor::new(name, bus)),
            VehicleSensor::Magnetometer => SensorHandle::Magnetometer(Sensor::new(name, bus)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SensorRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// All sensor handles of one vehicle.
#[derive(Debug)]
pub struct SensorRegistry {
    namespace: String,
    bus: EventBus,
    cameras: SensorMap,
    lidars: SensorMap,
    gps: SensorMap,
    imus: SensorMap,
    vehicle: HashMap<VehicleSensor, SensorHandle>,
    world: Option<String>,
}

impl SensorRegistry {
    /// Registry for vehicle `namespace` with the `pose` and `odom` sensors
    /// already in place.
    pub fn new(namespace: impl Into<String>, bus: EventBus) -> Self {
        let mut vehicle = HashMap::new();
        for sensor in [VehicleSensor::Pose, VehicleSensor::Odometry] {
            vehicle.insert(sensor, sensor.handle(bus.clone()));
        }
        Self {
            namespace: namespace.into(),
            bus,
            cameras: SensorMap::default(),
            lidars: SensorMap::default(),
            gps: SensorMap::default(),
            imus: SensorMap::default(),
            vehicle,
            world: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// World the auxiliary sensors were registered against, if any.
    pub fn world(&self) -> Option<&str> {
        self.world.as_deref()
    }

    fn map(&self, kind: SensorKind) -> &SensorMap {
        match kind {
            SensorKind::Camera => &self.cameras,
            SensorKind::Lidar => &self.lidars,
            SensorKind::Gps => &self.gps,
            SensorKind::Imu => &self.imus,
        }
    }

    fn map_mut(&mut self, kind: SensorKind) -> &mut SensorMap {
        match kind {
            SensorKind::Camera => &mut self.cameras,
            SensorKind::Lidar => &mut self.lidars,
            SensorKind::Gps => &mut self.gps,
            SensorKind::Imu => &mut self.imus,
        }
    }

    /// Register `handle` in the map of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DuplicateSensor`] if the name is already taken
    /// within that kind.  The first registration wins.
    pub fn register(&mut self, kind: SensorKind, handle: SensorHandle) -> Result<(), BridgeError> {
        self.map_mut(kind).register(handle).map_err(|name| {
            warn!(sensor = %name, %kind, "sensor already registered; keeping the first");
            BridgeError::DuplicateSensor { name, kind }
        })
    }

    /// Create and register the handle described by `descriptor`.
    pub fn register_descriptor(&mut self, descriptor: &SensorDescriptor) -> Result<(), BridgeError> {
        let handle = SensorHandle::for_kind(descriptor.kind, &descriptor.name, self.bus.clone());
        self.register(descriptor.kind, handle)?;
        debug!(sensor = %descriptor.name, kind = %descriptor.kind, "sensor registered");
        Ok(())
    }

    pub fn lookup(&self, kind: SensorKind, name: &str) -> Option<&SensorHandle> {
        self.map(kind).lookup(name)
    }

    pub fn lookup_mut(&mut self, kind: SensorKind, name: &str) -> Option<&mut SensorHandle> {
        self.map_mut(kind).lookup_mut(name)
    }

    /// Number of handles registered for `kind`.
    pub fn count(&self, kind: SensorKind) -> usize {
        self.map(kind).len()
    }

    pub fn names(&self, kind: SensorKind) -> Vec<&str> {
        self.map(kind).names()
    }

    pub fn vehicle(&self, sensor: VehicleSensor) -> Option<&SensorHandle> {
        self.vehicle.get(&sensor)
    }

    /// Frame id written into payloads of descriptor sensor `name`.
    pub fn frame_id(&self, kind: SensorKind, name: &str) -> String {
        match kind {
            SensorKind::Camera => tf_name(&self.namespace, &format!("{name}/{CAMERA_LINK}")),
            SensorKind::Gps => GPS_FRAME_ID.to_string(),
            SensorKind::Lidar | SensorKind::Imu => tf_name(&self.namespace, name),
        }
    }

    /// Relabel `data` and forward it to descriptor sensor `name`.  The kind
    /// is taken from the payload schema.
    ///
    /// Returns `Ok(false)` without touching anything when no sensor of that
    /// kind is registered under `name`.
    ///
    /// # Errors
    ///
    /// Propagates [`SensorHandle::receive_data`] failures.
    pub fn dispatch(&mut self, name: &str, mut data: SensorData) -> Result<bool, BridgeError> {
        let kind = match data {
            SensorData::Image(_) => SensorKind::Camera,
            SensorData::LaserScan(_) | SensorData::PointCloud(_) => SensorKind::Lidar,
            SensorData::NavSatFix(_) => SensorKind::Gps,
            SensorData::Imu(_) => SensorKind::Imu,
            _ => {
                debug!(sensor = %name, schema = data.type_name(), "no descriptor kind for payload");
                return Ok(false);
            }
        };
        let frame_id = self.frame_id(kind, name);
        let Some(handle) = self.map_mut(kind).lookup_mut(name) else {
            debug!(sensor = %name, %kind, "data for unregistered sensor ignored");
            return Ok(false);
        };
        data.relabel(frame_id);
        handle.receive_data(data)?;
        Ok(true)
    }

    /// Relabel camera calibration and store it on camera `name`.
    pub fn dispatch_camera_info(
        &mut self,
        name: &str,
        mut info: CameraInfo,
    ) -> Result<bool, BridgeError> {
        let frame_id = self.frame_id(SensorKind::Camera, name);
        let Some(handle) = self.cameras.lookup_mut(name) else {
            debug!(sensor = %name, "camera info for unregistered camera ignored");
            return Ok(false);
        };
        info.relabel(frame_id);
        handle.set_parameters(info)?;
        Ok(true)
    }

    /// Relabel `data` and forward it to a vehicle sensor.
    ///
    /// Returns `Ok(false)` when the sensor is not registered, which is the
    /// case for the world sensors until a world is configured.
    pub fn dispatch_vehicle(
        &mut self,
        sensor: VehicleSensor,
        mut data: SensorData,
    ) -> Result<bool, BridgeError> {
        let frame_id = tf_name(&self.namespace, sensor.as_str());
        let Some(handle) = self.vehicle.get_mut(&sensor) else {
            debug!(sensor = sensor.as_str(), "no world configured; data dropped");
            return Ok(false);
        };
        if sensor != VehicleSensor::Pose {
            data.relabel(frame_id);
        }
        handle.receive_data(data)?;
        Ok(true)
    }

    /// Apply `mount` to descriptor sensor `name` of `kind`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownSensor`] when no such sensor is registered, or
    /// the handle's own failure.
    pub fn apply_static_transform(
        &mut self,
        kind: SensorKind,
        name: &str,
        mount: StaticMount,
    ) -> Result<(), BridgeError> {
        match self.map_mut(kind).lookup_mut(name) {
            Some(handle) => handle.set_static_transform(mount),
            None => Err(BridgeError::UnknownSensor(name.to_string())),
        }
    }

    /// Register the world-level `imu`, `air_pressure` and `magnetometer`
    /// sensors and mount each on `{ns}/base_link` with an identity transform.
    ///
    /// Returns the applied mounts.  Calling it again for the same world is a
    /// no-op returning an empty list.
    pub fn register_world_sensors(
        &mut self,
        world: &str,
    ) -> Result<Vec<StaticMount>, BridgeError> {
        if let Some(existing) = &self.world {
            if existing != world {
                warn!(%existing, requested = %world, "world sensors already registered");
            }
            return Ok(Vec::new());
        }
        let parent = tf_name(&self.namespace, BASE_LINK);
        let mut mounts = Vec::with_capacity(VehicleSensor::WORLD.len());
        for sensor in VehicleSensor::WORLD {
            let mut handle = sensor.handle(self.bus.clone());
            let mount = StaticMount::identity(
                tf_name(&self.namespace, sensor.as_str()),
                parent.clone(),
                STATIC_TRANSFORM_VARIANCE,
            );
            handle.set_static_transform(mount.clone())?;
            self.vehicle.insert(sensor, handle);
            mounts.push(mount);
        }
        self.world = Some(world.to_string());
        debug!(%world, "world sensors registered");
        Ok(mounts)
    }
}
