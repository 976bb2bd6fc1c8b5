//! Static transform tree.
//!
//! Keeps every sensor mount the bridge has applied as an edge
//! `parent → child` in a frame graph.  Each mount is also traversable in
//! reverse through its inverse, so any two connected frames can be related.
//! [`TfTree::lookup_transform`] runs BFS from the parent frame and composes
//! the edges along the shortest path.
//!
//! # Example
//!
//! ```rust
//! use skybridge_perception::transform::TfTree;
//! use skybridge_types::{Quaternion, StaticMount, Vector3};
//!
//! let mut tf = TfTree::new();
//! tf.insert_mount(&StaticMount {
//!     child_frame: "drone0/cam0".into(),
//!     parent_frame: "drone0/base_link".into(),
//!     translation: Vector3::new(0.2, 0.0, 0.0),
//!     rotation: Quaternion::identity(),
//!     variance: 0.1,
//! });
//!
//! let t = tf.lookup_transform("drone0/base_link", "drone0/cam0").unwrap();
//! assert!((t.translation.x - 0.2).abs() < 1e-9);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use skybridge_types::{Quaternion, StaticMount, Vector3};
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// RigidTransform
// ────────────────────────────────────────────────────────────────────────────

/// Pose of a child frame relative to its parent: a child-frame point maps
/// into the parent frame by rotating by `rotation` then adding
/// `translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub translation: Vector3,
    pub rotation: Quaternion,
}

impl RigidTransform {
    pub fn new(translation: Vector3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation: rotation.normalized(),
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zero(), Quaternion::identity())
    }

    /// `self` = T_A_B, `other` = T_B_C ⇒ T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translation = self.translation.add(self.rotation.rotate(other.translation));
        Self::new(translation, self.rotation.mul(other.rotation))
    }

    /// T_A_B ⇒ T_B_A.
    pub fn inverse(self) -> Self {
        let inv = self.rotation.conjugate();
        let t = inv.rotate(self.translation);
        Self::new(Vector3::new(-t.x, -t.y, -t.z), inv)
    }

    /// Map a child-frame point into the parent frame.
    pub fn apply(self, point: Vector3) -> Vector3 {
        self.translation.add(self.rotation.rotate(point))
    }
}

impl From<&StaticMount> for RigidTransform {
    fn from(mount: &StaticMount) -> Self {
        Self::new(mount.translation, mount.rotation)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TfTree
// ────────────────────────────────────────────────────────────────────────────

/// Graph of named frames related by static mounts.
#[derive(Debug, Default)]
pub struct TfTree {
    /// `edges[from][to]`; every mount contributes a forward and an inverse
    /// edge.
    edges: HashMap<String, HashMap<String, RigidTransform>>,
    mounts: usize,
}

impl TfTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `mount`.  A later mount for the same frame pair replaces the
    /// earlier one.
    pub fn insert_mount(&mut self, mount: &StaticMount) {
        let forward = RigidTransform::from(mount);
        let replaced = self
            .edges
            .entry(mount.parent_frame.clone())
            .or_default()
            .insert(mount.child_frame.clone(), forward)
            .is_some();
        self.edges
            .entry(mount.child_frame.clone())
            .or_default()
            .insert(mount.parent_frame.clone(), forward.inverse());
        if !replaced {
            self.mounts += 1;
        }
        debug!(
            parent = %mount.parent_frame,
            child = %mount.child_frame,
            replaced,
            "static mount recorded"
        );
    }

    /// Number of distinct mounts recorded.
    pub fn len(&self) -> usize {
        self.mounts
    }

    pub fn is_empty(&self) -> bool {
        self.mounts == 0
    }

    /// Known frame names, sorted.
    pub fn frames(&self) -> Vec<&str> {
        let mut frames: Vec<&str> = self.edges.keys().map(String::as_str).collect();
        frames.sort_unstable();
        frames
    }

    /// Pose of `child` expressed in `parent`, or `None` if the frames are not
    /// connected.
    pub fn lookup_transform(&self, parent: &str, child: &str) -> Option<RigidTransform> {
        if parent == child {
            return Some(RigidTransform::identity());
        }

        let mut queue: VecDeque<(&str, RigidTransform)> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();
        queue.push_back((parent, RigidTransform::identity()));
        visited.insert(parent);

        while let Some((current, accumulated)) = queue.pop_front() {
            let Some(neighbours) = self.edges.get(current) else {
                continue;
            };
            for (next, edge) in neighbours {
                if !visited.insert(next.as_str()) {
                    continue;
                }
                let composed = accumulated.compose(*edge);
                if next == child {
                    return Some(composed);
                }
                queue.push_back((next.as_str(), composed));
            }
        }
        None
    }
}
