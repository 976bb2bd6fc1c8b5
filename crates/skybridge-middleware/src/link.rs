//! The simulator link seam.
//!
//! SkyBridge never speaks to the simulator transport directly.  Inbound
//! traffic arrives as [`BridgeMessage`] values on a channel; outbound traffic
//! leaves through a [`SimulatorLink`].  Swapping the transport means swapping
//! the link implementation, nothing else.
//!
//! - [`SimulatorLink`] – the trait every transport must implement.
//! - [`BusLink`] – publishes commands onto the [`EventBus`] and tracks the
//!   static-transform subscription locally.

use std::sync::atomic::{AtomicBool, Ordering};

use skybridge_types::{
    BridgeError, CameraInfo, Event, EventPayload, FluidPressure, Imu, MagneticField, Odometry,
    PoseStamped, SensorData, TransformStamped, Twist,
};
use tracing::{debug, info};

use crate::bus::{EventBus, Topic};

/// Outbound half of the simulator transport.
///
/// # Contract
///
/// * `send_twist` – hand a velocity command to the simulated vehicle.
/// * `unsubscribe_static_transforms` – stop delivering static-transform
///   messages.  Must be idempotent.
/// * `static_transforms_subscribed` – `false` once unsubscribed.
pub trait SimulatorLink: Send + Sync {
    fn send_twist(&self, twist: &Twist) -> Result<(), BridgeError>;

    fn unsubscribe_static_transforms(&self);

    fn static_transforms_subscribed(&self) -> bool;
}

/// One inbound delivery from the simulator.
#[derive(Debug, Clone)]
pub enum BridgeMessage {
    /// Ground-truth pose of the vehicle.
    Pose(PoseStamped),
    /// Vehicle odometry; refreshes the orientation estimate.
    Odometry(Odometry),
    /// World-level inertial sensor.
    VehicleImu(Imu),
    /// World-level barometer.
    AirPressure(FluidPressure),
    /// World-level magnetometer.
    Magnetometer(MagneticField),
    /// Data for a sensor registered from the descriptor string.
    SensorData { sensor: String, data: SensorData },
    /// Calibration for a registered camera.
    CameraInfo { sensor: String, info: CameraInfo },
    /// A static mounting transform for a registered sensor.
    StaticTransform {
        sensor: String,
        transform: TransformStamped,
    },
}

/// [`SimulatorLink`] that publishes every command on [`Topic::Commands`].
///
/// A transport adapter subscribes to the commands topic and forwards the
/// twists to the simulator.
#[derive(Debug)]
pub struct BusLink {
    bus: EventBus,
    static_tf_subscribed: AtomicBool,
}

impl BusLink {
    /// Create a link backed by `bus`, initially subscribed to static
    /// transforms.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            static_tf_subscribed: AtomicBool::new(true),
        }
    }
}

impl SimulatorLink for BusLink {
    fn send_twist(&self, twist: &Twist) -> Result<(), BridgeError> {
        let event = Event::new("skybridge-middleware::link/cmd_vel", EventPayload::Command(*twist));
        let delivered = self.bus.publish_to(Topic::Commands, event)?;
        debug!(delivered, ?twist, "twist published");
        Ok(())
    }

    fn unsubscribe_static_transforms(&self) {
        if self.static_tf_subscribed.swap(false, Ordering::AcqRel) {
            info!("all sensor mounts resolved; unsubscribed from static transforms");
        }
    }

    fn static_transforms_subscribed(&self) -> bool {
        self.static_tf_subscribed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybridge_types::Vector3;

    #[test]
    fn send_twist_publishes_on_commands_topic() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::Commands);
        let link = BusLink::new(bus);

        let twist = Twist::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.2));
        link.send_twist(&twist).unwrap();

        let event = rx.try_recv().expect("command event");
        match event.payload {
            EventPayload::Command(sent) => assert_eq!(sent, twist),
            other => panic!("expected Command, got {other:?}"),
        }
    }

    #[test]
    fn send_twist_without_listeners_succeeds() {
        let link = BusLink::new(EventBus::default());
        assert!(link.send_twist(&Twist::zero()).is_ok());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let link = BusLink::new(EventBus::default());
        assert!(link.static_transforms_subscribed());
        link.unsubscribe_static_transforms();
        assert!(!link.static_transforms_subscribed());
        link.unsubscribe_static_transforms();
        assert!(!link.static_transforms_subscribed());
    }
}
