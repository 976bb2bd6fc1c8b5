//! [`Platform`] – the bridge context and its actor loop.
//!
//! One `Platform` owns every piece of mutable bridge state: the sensor
//! registry, the static transform resolver, the transform tree, the latest
//! orientation, the freshness gate, the accepted control mode and the pending
//! command.  Nothing is global; handlers receive `&mut self`.
//!
//! [`Platform::run`] turns the context into an actor.  A single task
//! multiplexes
//!
//! * inbound simulator deliveries ([`BridgeMessage`]),
//! * control requests from the flight stack ([`PlatformRequest`]),
//! * the command timer (10 ms by default, missed ticks skipped), and
//! * the shutdown signal,
//!
//! so every handler runs to completion before the next one starts and the
//! freshness test-and-reset can never interleave with an odometry update.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skybridge_middleware::{BusLink, EventBus};
//! use skybridge_runtime::platform::{Platform, PlatformConfig};
//!
//! # async fn demo() -> Result<(), skybridge_types::BridgeError> {
//! let bus = EventBus::default();
//! let link = Arc::new(BusLink::new(bus.clone()));
//! let config = PlatformConfig {
//!     sensors: "w1,m1,cam0,topic0,camera".to_string(),
//!     ..PlatformConfig::default()
//! };
//! let platform = Platform::new(&config, bus, link)?;
//!
//! let (_inbound_tx, inbound_rx) = tokio::sync::mpsc::channel(256);
//! let (_requests_tx, requests_rx) = tokio::sync::mpsc::channel(16);
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! platform.run(inbound_rx, requests_rx, shutdown_rx).await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use skybridge_hal::{
    Resolution, SensorConfigParser, SensorRegistry, TransformResolver, VehicleSensor, world_name,
};
use skybridge_kernel::{ControlModeValidator, FreshnessGate};
use skybridge_middleware::{BridgeMessage, EventBus, SimulatorLink, Topic};
use skybridge_perception::TfTree;
use skybridge_types::{
    BridgeError, ControlMode, Event, EventPayload, Quaternion, SensorData, Twist,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::translator::{CommandTranslator, DEFAULT_YAW_RATE_LIMIT};

const SOURCE: &str = "skybridge-runtime::platform";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Construction parameters for [`Platform`].
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Vehicle namespace prefixed to every relabeled frame id.
    pub namespace: String,
    /// Sensor descriptor string, `world,model,name,link,kind` entries
    /// separated by `:`.
    pub sensors: String,
    /// Bound on the commanded yaw rate in the world frame, rad/s.
    pub yaw_rate_limit: f64,
    /// Command timer period.
    pub command_period: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            namespace: "drone0".to_string(),
            sensors: String::new(),
            yaw_rate_limit: DEFAULT_YAW_RATE_LIMIT,
            command_period: Duration::from_millis(10),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests & status
// ─────────────────────────────────────────────────────────────────────────────

/// Control requests accepted by the running actor.
#[derive(Debug)]
pub enum PlatformRequest {
    /// Replace the pending command.
    SetCommand(Twist),
    SetArmingState(bool),
    SetOffboard(bool),
    /// Validate and adopt a control mode; the outcome is sent on `reply`.
    SetControlMode {
        mode: ControlMode,
        reply: oneshot::Sender<Result<(), BridgeError>>,
    },
    Status(oneshot::Sender<PlatformStatus>),
}

/// Snapshot of the platform state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStatus {
    pub namespace: String,
    pub armed: bool,
    pub offboard: bool,
    pub control_mode: ControlMode,
    pub command: Twist,
    pub orientation: Quaternion,
    /// Heading derived from `orientation`, radians.
    pub heading: f64,
    pub pending_mounts: usize,
    pub static_transforms_subscribed: bool,
    pub static_mounts: usize,
    /// Frames joined by the applied static mounts, sorted.
    pub static_frames: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform
// ─────────────────────────────────────────────────────────────────────────────

pub struct Platform {
    bus: EventBus,
    link: Arc<dyn SimulatorLink>,
    parser: SensorConfigParser,
    registry: SensorRegistry,
    resolver: TransformResolver,
    tf: TfTree,
    translator: CommandTranslator,
    validator: ControlModeValidator,
    freshness: FreshnessGate,
    orientation: Quaternion,
    command: Twist,
    armed: bool,
    offboard: bool,
    command_period: Duration,
}

impl Platform {
    /// Build the platform and register the sensors named in
    /// `config.sensors`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Config`] for an invalid yaw-rate limit or a zero
    /// command period.  Bad sensor entries are logged and skipped, never
    /// fatal.
    pub fn new(
        config: &PlatformConfig,
        bus: EventBus,
        link: Arc<dyn SimulatorLink>,
    ) -> Result<Self, BridgeError> {
        let translator = CommandTranslator::new(config.yaw_rate_limit)?;
        if config.command_period.is_zero() {
            return Err(BridgeError::Config(
                "command_period must be greater than zero".to_string(),
            ));
        }
        let mut platform = Self {
            registry: SensorRegistry::new(config.namespace.clone(), bus.clone()),
            bus,
            link,
            parser: SensorConfigParser::new(),
            resolver: TransformResolver::new(),
            tf: TfTree::new(),
            translator,
            validator: ControlModeValidator::new(),
            freshness: FreshnessGate::new(),
            orientation: Quaternion::identity(),
            command: Twist::zero(),
            armed: false,
            offboard: false,
            command_period: config.command_period,
        };
        let registered = platform.configure_sensors(&config.sensors);
        info!(
            namespace = %config.namespace,
            sensors = registered,
            pending_mounts = platform.resolver.pending_count(),
            "platform configured"
        );
        Ok(platform)
    }

    /// Parse `descriptor` and register every valid sensor, tracking each for
    /// static-transform resolution.  When any entry names a world, the
    /// world sensors are registered and mounted as well.
    ///
    /// Returns the number of descriptor sensors registered.
    pub fn configure_sensors(&mut self, descriptor: &str) -> usize {
        let descriptors = self.parser.parse(descriptor);
        let mut registered = 0;
        for d in &descriptors {
            match self.registry.register_descriptor(d) {
                Ok(()) => {
                    self.resolver.track(&d.name, d.kind);
                    registered += 1;
                }
                Err(e) => warn!(sensor = %d.name, error = %e, "sensor not registered"),
            }
        }

        if let Some(world) = world_name(descriptor) {
            match self.registry.register_world_sensors(world) {
                Ok(mounts) => {
                    for mount in &mounts {
                        self.tf.insert_mount(mount);
                    }
                }
                Err(e) => warn!(%world, error = %e, "world sensors not mounted"),
            }
        }
        registered
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &TransformResolver {
        &self.resolver
    }

    pub fn tf(&self) -> &TfTree {
        &self.tf
    }

    pub fn orientation(&self) -> Quaternion {
        self.orientation
    }

    pub fn command(&self) -> Twist {
        self.command
    }

    pub fn control_mode(&self) -> ControlMode {
        self.validator.current()
    }

    pub fn status(&self) -> PlatformStatus {
        PlatformStatus {
            namespace: self.registry.namespace().to_string(),
            armed: self.armed,
            offboard: self.offboard,
            control_mode: self.validator.current(),
            command: self.command,
            orientation: self.orientation,
            heading: self.orientation.yaw(),
            pending_mounts: self.resolver.pending_count(),
            static_transforms_subscribed: self.link.static_transforms_subscribed(),
            static_mounts: self.tf.len(),
            static_frames: self.tf.frames().into_iter().map(String::from).collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Inbound data
    // -------------------------------------------------------------------------

    /// Route one simulator delivery.  Deliveries for unknown sensors are
    /// dropped silently.
    pub fn handle_message(&mut self, msg: BridgeMessage) -> Result<(), BridgeError> {
        match msg {
            BridgeMessage::Pose(pose) => {
                self.registry
                    .dispatch_vehicle(VehicleSensor::Pose, SensorData::Pose(pose))?;
            }
            BridgeMessage::Odometry(odom) => {
                self.orientation = odom.orientation;
                self.freshness.mark_fresh();
                self.registry
                    .dispatch_vehicle(VehicleSensor::Odometry, SensorData::Odometry(odom))?;
            }
            BridgeMessage::VehicleImu(imu) => {
                self.registry
                    .dispatch_vehicle(VehicleSensor::Imu, SensorData::Imu(imu))?;
            }
            BridgeMessage::AirPressure(baro) => {
                self.registry.dispatch_vehicle(
                    VehicleSensor::AirPressure,
                    SensorData::FluidPressure(baro),
                )?;
            }
            BridgeMessage::Magnetometer(mag) => {
                self.registry.dispatch_vehicle(
                    VehicleSensor::Magnetometer,
                    SensorData::MagneticField(mag),
                )?;
            }
            BridgeMessage::SensorData { sensor, data } => {
                self.registry.dispatch(&sensor, data)?;
            }
            BridgeMessage::CameraInfo { sensor, info } => {
                self.registry.dispatch_camera_info(&sensor, info)?;
            }
            BridgeMessage::StaticTransform { sensor, transform } => {
                let outcome = self.resolver.resolve_by_name(
                    &sensor,
                    &transform,
                    &mut self.registry,
                    self.link.as_ref(),
                )?;
                if let Resolution::Applied(mounts) = outcome {
                    for mount in &mounts {
                        self.tf.insert_mount(mount);
                    }
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Control requests
    // -------------------------------------------------------------------------

    /// Replace the pending command.  It is translated on every tick until
    /// replaced or reset.
    pub fn set_command(&mut self, twist: Twist) {
        self.command = twist;
    }

    pub fn set_arming_state(&mut self, armed: bool) {
        self.armed = armed;
        info!(armed, "arming state changed");
        self.reset_command();
    }

    pub fn set_offboard(&mut self, offboard: bool) {
        self.offboard = offboard;
        info!(offboard, "offboard mode changed");
        self.reset_command();
    }

    /// Adopt `mode` if supported.  On success the pending command is reset
    /// and the change is announced on [`Topic::SystemAlerts`].
    pub fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), BridgeError> {
        self.validator.request(mode)?;
        self.reset_command();
        self.publish_alert(EventPayload::ControlModeChanged(mode));
        Ok(())
    }

    fn handle_request(&mut self, request: PlatformRequest) {
        match request {
            PlatformRequest::SetCommand(twist) => self.set_command(twist),
            PlatformRequest::SetArmingState(armed) => self.set_arming_state(armed),
            PlatformRequest::SetOffboard(offboard) => self.set_offboard(offboard),
            PlatformRequest::SetControlMode { mode, reply } => {
                let result = self.set_control_mode(mode);
                if reply.send(result).is_err() {
                    debug!("control mode requester went away before the reply");
                }
            }
            PlatformRequest::Status(reply) => {
                if reply.send(self.status()).is_err() {
                    debug!("status requester went away before the reply");
                }
            }
        }
    }

    /// Zero the pending command and stop the vehicle right away.
    fn reset_command(&mut self) {
        self.command = Twist::zero();
        if let Err(e) = self.link.send_twist(&Twist::zero()) {
            warn!(error = %e, "failed to send zero twist");
        }
    }

    // -------------------------------------------------------------------------
    // Command tick
    // -------------------------------------------------------------------------

    /// One command period.
    ///
    /// Returns `Ok(None)` while no supported control mode is active, and the
    /// transmitted twist otherwise.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotReady`] when a world-frame command is waiting for a
    /// fresh orientation; nothing is sent.  Link failures are propagated.
    pub fn tick(&mut self) -> Result<Option<Twist>, BridgeError> {
        if !self.validator.is_active() {
            return Ok(None);
        }
        let mode = self.validator.current();
        let twist =
            self.translator
                .translate(&self.command, &mode, self.orientation, &self.freshness)?;
        self.link.send_twist(&twist)?;
        Ok(Some(twist))
    }

    fn on_tick(&mut self) {
        match self.tick() {
            Ok(_) => {}
            Err(BridgeError::NotReady(reason)) => debug!(%reason, "command not sent"),
            Err(e) => {
                warn!(error = %e, "command tick failed");
                self.publish_alert(EventPayload::Fault {
                    component: "command".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn publish_alert(&self, payload: EventPayload) {
        if let Err(e) = self
            .bus
            .publish_to(Topic::SystemAlerts, Event::new(SOURCE, payload))
        {
            warn!(error = %e, "failed to publish system alert");
        }
    }

    // -------------------------------------------------------------------------
    // Actor loop
    // -------------------------------------------------------------------------

    /// Run until `shutdown` flips to `true` (or its sender is dropped), then
    /// send a final zero twist and hand the context back.
    ///
    /// Closed `inbound` or `requests` channels are not fatal; the command
    /// timer keeps running.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<BridgeMessage>,
        mut requests: mpsc::Receiver<PlatformRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let mut interval = tokio::time::interval(self.command_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = self.command_period.as_millis() as u64, "platform running");

        if !*shutdown.borrow_and_update() {
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow_and_update() {
                            break;
                        }
                    }
                    Some(request) = requests.recv() => self.handle_request(request),
                    Some(msg) = inbound.recv() => {
                        if let Err(e) = self.handle_message(msg) {
                            warn!(error = %e, "inbound message rejected");
                            self.publish_alert(EventPayload::Fault {
                                component: "inbound".to_string(),
                                message: e.to_string(),
                            });
                        }
                    }
                    _ = interval.tick() => self.on_tick(),
                }
            }
        }

        if let Err(e) = self.link.send_twist(&Twist::zero()) {
            warn!(error = %e, "failed to send final zero twist");
        }
        info!("platform stopped");
        self
    }
}
