//! Static transform resolver.
//!
//! Every descriptor sensor starts [`MountState::Pending`].  The first static
//! transform delivered for it is applied to its handle and moves it to
//! [`MountState::Resolved`], which is terminal: later transforms for the same
//! sensor are discarded.
//!
//! Each incoming transform is handled in this order:
//!
//! 1. Nothing pending: unsubscribe from the transform stream and discard.
//! 2. Unknown sensor name: discard.
//! 3. Already resolved: discard.
//! 4. Otherwise apply the mount (both halves for a lidar) and mark the
//!    sensor resolved.  A failed apply leaves the sensor pending.
//!
//! Entries live in an index-addressed table; the name index is only consulted
//! to turn an incoming sensor name into a [`SensorId`].

use std::collections::HashMap;

use skybridge_middleware::SimulatorLink;
use skybridge_types::{BridgeError, SensorKind, StaticMount, TransformStamped};
use tracing::{debug, info, warn};

use crate::registry::{STATIC_TRANSFORM_VARIANCE, SensorRegistry};

/// Index of a tracked sensor in the resolver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Pending,
    Resolved,
}

/// Outcome of feeding one static transform to the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Mounts applied to the sensor handle(s).
    Applied(Vec<StaticMount>),
    /// The sensor was resolved earlier; message discarded.
    AlreadyResolved,
    /// No tracked sensor by that name; message discarded.
    UnknownSensor,
    /// Nothing left pending; the link was unsubscribed and the message
    /// discarded.
    Unsubscribed,
}

#[derive(Debug)]
struct Entry {
    name: String,
    kind: SensorKind,
    state: MountState,
}

/// Per-sensor `Pending → Resolved` state machines.
#[derive(Debug, Default)]
pub struct TransformResolver {
    entries: Vec<Entry>,
    index: HashMap<String, SensorId>,
    pending: usize,
}

impl TransformResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking sensor `name` as pending.
    ///
    /// Names are unique across kinds here because the simulator addresses
    /// transforms by name alone; tracking a name twice returns the existing
    /// id.
    pub fn track(&mut self, name: &str, kind: SensorKind) -> SensorId {
        if let Some(&id) = self.index.get(name) {
            let existing = self.entries[id.0].kind;
            warn!(sensor = %name, %existing, requested = %kind, "sensor already tracked");
            return id;
        }
        let id = SensorId(self.entries.len());
        self.entries.push(Entry {
            name: name.to_string(),
            kind,
            state: MountState::Pending,
        });
        self.index.insert(name.to_string(), id);
        self.pending += 1;
        id
    }

    pub fn id_of(&self, name: &str) -> Option<SensorId> {
        self.index.get(name).copied()
    }

    pub fn state(&self, id: SensorId) -> Option<MountState> {
        self.entries.get(id.0).map(|e| e.state)
    }

    pub fn state_of(&self, name: &str) -> Option<MountState> {
        self.id_of(name).and_then(|id| self.state(id))
    }

    /// Number of sensors still waiting for their mount.
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Apply `msg` to tracked sensor `id` unless it is already resolved.
    ///
    /// # Errors
    ///
    /// Propagates the registry failure; the sensor stays pending.
    pub fn resolve(
        &mut self,
        id: SensorId,
        msg: &TransformStamped,
        registry: &mut SensorRegistry,
    ) -> Result<Resolution, BridgeError> {
        let Some(entry) = self.entries.get_mut(id.0) else {
            return Ok(Resolution::UnknownSensor);
        };
        if entry.state == MountState::Resolved {
            debug!(sensor = %entry.name, "static transform already applied; discarded");
            return Ok(Resolution::AlreadyResolved);
        }

        let mount = StaticMount::from_transform(msg, STATIC_TRANSFORM_VARIANCE);
        registry.apply_static_transform(entry.kind, &entry.name, mount)?;
        let applied = registry
            .lookup(entry.kind, &entry.name)
            .map(|handle| handle.applied_mounts())
            .unwrap_or_default();

        entry.state = MountState::Resolved;
        self.pending -= 1;
        info!(
            sensor = %entry.name,
            kind = %entry.kind,
            parent = %msg.header.frame_id,
            child = %msg.child_frame_id,
            remaining = self.pending,
            "static transform applied"
        );
        Ok(Resolution::Applied(applied))
    }

    /// Handle a static transform addressed to sensor `name`.
    pub fn resolve_by_name(
        &mut self,
        name: &str,
        msg: &TransformStamped,
        registry: &mut SensorRegistry,
        link: &dyn SimulatorLink,
    ) -> Result<Resolution, BridgeError> {
        if self.pending == 0 {
            link.unsubscribe_static_transforms();
            return Ok(Resolution::Unsubscribed);
        }
        match self.id_of(name) {
            Some(id) => self.resolve(id, msg, registry),
            None => {
                debug!(sensor = %name, "static transform for untracked sensor discarded");
                Ok(Resolution::UnknownSensor)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use skybridge_middleware::EventBus;
    use skybridge_types::{Quaternion, SensorDescriptor, Twist, Vector3};

    #[derive(Default)]
    struct RecordingLink {
        unsubscribe_calls: AtomicUsize,
        unsubscribed: AtomicBool,
    }

    impl SimulatorLink for RecordingLink {
        fn send_twist(&self, _twist: &Twist) -> Result<(), BridgeError> {
            Ok(())
        }
        fn unsubscribe_static_transforms(&self) {
            self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
            self.unsubscribed.store(true, Ordering::SeqCst);
        }
        fn static_transforms_subscribed(&self) -> bool {
            !self.unsubscribed.load(Ordering::SeqCst)
        }
    }

    fn setup(sensors: &[(&str, SensorKind)]) -> (SensorRegistry, TransformResolver) {
        let mut registry = SensorRegistry::new("drone0", EventBus::default());
        let mut resolver = TransformResolver::new();
        for (name, kind) in sensors {
            registry
                .register_descriptor(&SensorDescriptor {
                    world: "w1".to_string(),
                    model: "m1".to_string(),
                    name: name.to_string(),
                    link: "t".to_string(),
                    kind: *kind,
                })
                .unwrap();
            resolver.track(name, *kind);
        }
        (registry, resolver)
    }

    fn transform(child: &str) -> TransformStamped {
        TransformStamped::new(
            "drone0/base_link",
            child,
            Vector3::new(0.1, 0.0, -0.05),
            Quaternion::from_yaw(0.3),
        )
    }

    #[test]
    fn lidar_transform_resolves_scan_and_cloud() {
        let (mut registry, mut resolver) = setup(&[("lidar0", SensorKind::Lidar)]);
        let link = RecordingLink::default();
        assert_eq!(resolver.pending_count(), 1);

        let outcome = resolver
            .resolve_by_name("lidar0", &transform("drone0/lidar0"), &mut registry, &link)
            .unwrap();

        let Resolution::Applied(mounts) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        let children: Vec<_> = mounts.iter().map(|m| m.child_frame.as_str()).collect();
        assert_eq!(children, vec!["drone0/lidar0", "drone0/lidar0_cloud"]);
        assert!(mounts
            .iter()
            .all(|m| (m.variance - STATIC_TRANSFORM_VARIANCE).abs() < f64::EPSILON));
        assert_eq!(resolver.state_of("lidar0"), Some(MountState::Resolved));
        assert_eq!(resolver.pending_count(), 0);
    }

    #[test]
    fn repeated_transform_is_noop() {
        let (mut registry, mut resolver) =
            setup(&[("cam0", SensorKind::Camera), ("gps0", SensorKind::Gps)]);
        let link = RecordingLink::default();

        let first = resolver
            .resolve_by_name("cam0", &transform("drone0/cam0"), &mut registry, &link)
            .unwrap();
        assert!(matches!(first, Resolution::Applied(ref m) if m.len() == 1));

        let mut moved = transform("drone0/cam0");
        moved.translation = Vector3::new(9.0, 9.0, 9.0);
        let second = resolver
            .resolve_by_name("cam0", &moved, &mut registry, &link)
            .unwrap();
        assert_eq!(second, Resolution::AlreadyResolved);

        let applied = registry
            .lookup(SensorKind::Camera, "cam0")
            .unwrap()
            .static_transform()
            .unwrap();
        assert_eq!(applied.translation, Vector3::new(0.1, 0.0, -0.05));
        assert_eq!(resolver.pending_count(), 1);
        assert_eq!(link.unsubscribe_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_sensor_is_discarded() {
        let (mut registry, mut resolver) = setup(&[("cam0", SensorKind::Camera)]);
        let link = RecordingLink::default();
        let outcome = resolver
            .resolve_by_name("ghost", &transform("drone0/ghost"), &mut registry, &link)
            .unwrap();
        assert_eq!(outcome, Resolution::UnknownSensor);
        assert_eq!(resolver.pending_count(), 1);
    }

    #[test]
    fn unsubscribes_once_nothing_is_pending() {
        let (mut registry, mut resolver) = setup(&[("imu0", SensorKind::Imu)]);
        let link = RecordingLink::default();

        resolver
            .resolve_by_name("imu0", &transform("drone0/imu0"), &mut registry, &link)
            .unwrap();
        assert!(link.static_transforms_subscribed());

        for _ in 0..2 {
            let outcome = resolver
                .resolve_by_name("imu0", &transform("drone0/imu0"), &mut registry, &link)
                .unwrap();
            assert_eq!(outcome, Resolution::Unsubscribed);
        }
        assert!(!link.static_transforms_subscribed());
        assert_eq!(link.unsubscribe_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_resolver_unsubscribes_immediately() {
        let (mut registry, mut resolver) = setup(&[]);
        let link = RecordingLink::default();
        let outcome = resolver
            .resolve_by_name("cam0", &transform("drone0/cam0"), &mut registry, &link)
            .unwrap();
        assert_eq!(outcome, Resolution::Unsubscribed);
        assert!(!link.static_transforms_subscribed());
    }

    #[test]
    fn failed_apply_keeps_sensor_pending() {
        let mut registry = SensorRegistry::new("drone0", EventBus::default());
        let mut resolver = TransformResolver::new();
        // Tracked but never registered in the registry.
        let id = resolver.track("cam9", SensorKind::Camera);

        let err = resolver
            .resolve(id, &transform("drone0/cam9"), &mut registry)
            .unwrap_err();
        assert_eq!(err, BridgeError::UnknownSensor("cam9".to_string()));
        assert_eq!(resolver.state(id), Some(MountState::Pending));
        assert_eq!(resolver.pending_count(), 1);
    }

    #[test]
    fn tracking_twice_returns_same_id() {
        let mut resolver = TransformResolver::new();
        let a = resolver.track("s0", SensorKind::Camera);
        let b = resolver.track("s0", SensorKind::Gps);
        assert_eq!(a, b);
        assert_eq!(resolver.pending_count(), 1);
        assert_eq!(resolver.id_of("s0"), Some(a));
        assert_eq!(resolver.id_of("s1"), None);
    }
}
