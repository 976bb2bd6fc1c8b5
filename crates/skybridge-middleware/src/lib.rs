//! `skybridge-middleware` – message plumbing between the simulator and the
//! platform.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.
//! - [`link`] – [`SimulatorLink`] seam for the outbound transport and the
//!   [`BridgeMessage`] shape of inbound deliveries.

pub mod bus;
pub mod link;

pub use bus::{EventBus, Topic, TopicReceiver};
pub use link::{BridgeMessage, BusLink, SimulatorLink};
