//! [`FreshnessGate`] – one translation per orientation update.
//!
//! The odometry path calls [`FreshnessGate::mark_fresh`] after storing a new
//! orientation.  The command tick calls [`FreshnessGate::try_consume`],
//! which atomically tests and clears the flag, so a stale orientation is
//! never applied to two world-frame commands.
//!
//! The gate is `Sync`; share it behind an `Arc` when the odometry path and
//! the command tick run on different tasks.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct FreshnessGate {
    fresh: AtomicBool,
}

impl FreshnessGate {
    /// A closed gate; nothing passes until the first orientation arrives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate for one consumer.
    pub fn mark_fresh(&self) {
        self.fresh.store(true, Ordering::Release);
    }

    /// Close the gate and report whether it was open.
    pub fn try_consume(&self) -> bool {
        self.fresh.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming.
    pub fn is_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn starts_closed() {
        let gate = FreshnessGate::new();
        assert!(!gate.is_fresh());
        assert!(!gate.try_consume());
    }

    #[test]
    fn consumes_once_per_update() {
        let gate = FreshnessGate::new();
        gate.mark_fresh();
        assert!(gate.try_consume());
        assert!(!gate.try_consume(), "second consume without update must fail");

        gate.mark_fresh();
        gate.mark_fresh();
        assert!(gate.try_consume());
        assert!(!gate.try_consume());
    }

    #[test]
    fn concurrent_consumers_see_single_success() {
        let gate = Arc::new(FreshnessGate::new());
        gate.mark_fresh();
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    if gate.try_consume() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
