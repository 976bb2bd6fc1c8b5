//! `skybridge-hal` – Sensor Abstraction
//!
//! Turns simulator sensor streams into platform sensor handles.
//!
//! # Modules
//!
//! - [`config_parser`] – [`SensorConfigParser`][config_parser::SensorConfigParser]:
//!   parses the `world,model,name,link,kind` descriptor string into
//!   [`SensorDescriptor`][skybridge_types::SensorDescriptor]s.
//! - [`sensor`] – [`SensorHandle`][sensor::SensorHandle]: one tagged union
//!   over every sensor variant (camera, lidar pair, gps, imu and the vehicle
//!   sensors).
//! - [`registry`] – [`SensorRegistry`][registry::SensorRegistry]: per-kind
//!   name maps, frame relabeling and data dispatch.
//! - [`resolver`] – [`TransformResolver`][resolver::TransformResolver]:
//!   applies each sensor's static mount exactly once and unsubscribes from
//!   the transform stream when nothing is left pending.

pub mod config_parser;
pub mod registry;
pub mod resolver;
pub mod sensor;

pub use config_parser::{SensorConfigParser, parse_sensor_config, world_name};
pub use registry::{
    GPS_FRAME_ID, STATIC_TRANSFORM_VARIANCE, SensorMap, SensorRegistry, VehicleSensor, tf_name,
};
pub use resolver::{MountState, Resolution, SensorId, TransformResolver};
pub use sensor::{Camera, Lidar, Sensor, SensorHandle};
