//! [`CommandTranslator`] – converts the commanded twist into the frame the
//! simulated vehicle expects.
//!
//! | Reference frame | Gate | Yaw-rate clamp | Linear velocity |
//! |---|---|---|---|
//! | `LocalWorld` | one fresh orientation per call | `±yaw_rate_limit` | rotated ENU → FLU |
//! | `BodyFixed` | none | none | unchanged |
//! | anything else | rejected | | |
//!
//! The translator never mutates the stored command; it returns a new twist
//! each call, so a command held across ticks is rotated from the world frame
//! every time rather than compounding.

use std::f64::consts::FRAC_PI_2;

use skybridge_kernel::FreshnessGate;
use skybridge_perception::enu_to_flu;
use skybridge_types::{BridgeError, ControlMode, Quaternion, ReferenceFrame, Twist};
use tracing::warn;

/// Default bound on the commanded yaw rate, rad/s.
pub const DEFAULT_YAW_RATE_LIMIT: f64 = FRAC_PI_2;

#[derive(Debug, Clone, Copy)]
pub struct CommandTranslator {
    yaw_rate_limit: f64,
}

impl Default for CommandTranslator {
    fn default() -> Self {
        Self {
            yaw_rate_limit: DEFAULT_YAW_RATE_LIMIT,
        }
    }
}

impl CommandTranslator {
    /// # Errors
    ///
    /// [`BridgeError::Config`] unless `yaw_rate_limit` is finite and
    /// positive.
    pub fn new(yaw_rate_limit: f64) -> Result<Self, BridgeError> {
        if !yaw_rate_limit.is_finite() || yaw_rate_limit <= 0.0 {
            return Err(BridgeError::Config(format!(
                "yaw_rate_limit must be a positive number of rad/s, got {yaw_rate_limit}"
            )));
        }
        Ok(Self { yaw_rate_limit })
    }

    pub fn yaw_rate_limit(&self) -> f64 {
        self.yaw_rate_limit
    }

    /// Bound `rate` to `±yaw_rate_limit`.  A NaN rate maps to zero; infinite
    /// rates saturate at the limit.
    pub fn clamp_yaw_rate(&self, rate: f64) -> f64 {
        if rate.is_nan() {
            warn!("commanded yaw rate is NaN; sending zero");
            return 0.0;
        }
        rate.clamp(-self.yaw_rate_limit, self.yaw_rate_limit)
    }

    /// Produce the twist to transmit for `command` under `mode`.
    ///
    /// # Errors
    ///
    /// * [`BridgeError::NotReady`] – world-frame command with no orientation
    ///   update since the previous world-frame translation.  Nothing is
    ///   consumed; retry on the next tick.
    /// * [`BridgeError::UnsupportedControlMode`] – reference frame is neither
    ///   local world nor body fixed.
    pub fn translate(
        &self,
        command: &Twist,
        mode: &ControlMode,
        orientation: Quaternion,
        gate: &FreshnessGate,
    ) -> Result<Twist, BridgeError> {
        match mode.reference_frame {
            ReferenceFrame::LocalWorld => {
                if !gate.try_consume() {
                    return Err(BridgeError::NotReady(
                        "no orientation update since the last world-frame command".to_string(),
                    ));
                }
                let mut angular = command.angular;
                angular.z = self.clamp_yaw_rate(angular.z);
                Ok(Twist::new(enu_to_flu(orientation, command.linear), angular))
            }
            ReferenceFrame::BodyFixed => Ok(*command),
            ReferenceFrame::Undefined | ReferenceFrame::GlobalWorld => {
                Err(BridgeError::UnsupportedControlMode(*mode))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybridge_types::Vector3;

    fn world() -> ControlMode {
        ControlMode::velocity(ReferenceFrame::LocalWorld)
    }

    fn fresh_gate() -> FreshnessGate {
        let gate = FreshnessGate::new();
        gate.mark_fresh();
        gate
    }

    #[test]
    fn world_frame_clamps_yaw_rate() {
        let t = CommandTranslator::default();
        let cmd = Twist::new(Vector3::zero(), Vector3::new(0.0, 0.0, 2.0));
        let out = t
            .translate(&cmd, &world(), Quaternion::identity(), &fresh_gate())
            .unwrap();
        assert!((out.angular.z - FRAC_PI_2).abs() < 1e-12);

        let cmd = Twist::new(Vector3::zero(), Vector3::new(0.0, 0.0, -7.5));
        let out = t
            .translate(&cmd, &world(), Quaternion::identity(), &fresh_gate())
            .unwrap();
        assert!((out.angular.z + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn non_finite_yaw_rate_stays_bounded() {
        let t = CommandTranslator::default();
        for (rate, expected) in [
            (f64::NAN, 0.0),
            (f64::INFINITY, FRAC_PI_2),
            (f64::NEG_INFINITY, -FRAC_PI_2),
        ] {
            let cmd = Twist::new(Vector3::zero(), Vector3::new(0.0, 0.0, rate));
            let out = t
                .translate(&cmd, &world(), Quaternion::from_yaw(0.7), &fresh_gate())
                .unwrap();
            assert!(out.angular.z.abs() <= FRAC_PI_2, "rate {rate} escaped the clamp");
            assert!((out.angular.z - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn in_range_yaw_rate_is_unchanged() {
        let t = CommandTranslator::default();
        for rate in [-FRAC_PI_2, -0.3, 0.0, 1.2, FRAC_PI_2] {
            let cmd = Twist::new(Vector3::zero(), Vector3::new(0.1, -0.2, rate));
            let out = t
                .translate(&cmd, &world(), Quaternion::identity(), &fresh_gate())
                .unwrap();
            assert_eq!(out.angular, Vector3::new(0.1, -0.2, rate));
        }
    }

    #[test]
    fn world_frame_rotates_linear_into_body() {
        let t = CommandTranslator::default();
        let cmd = Twist::new(Vector3::new(0.0, 1.0, 0.5), Vector3::zero());
        let out = t
            .translate(&cmd, &world(), Quaternion::from_yaw(FRAC_PI_2), &fresh_gate())
            .unwrap();
        assert!((out.linear.x - 1.0).abs() < 1e-9, "{out:?}");
        assert!(out.linear.y.abs() < 1e-9, "{out:?}");
        assert!((out.linear.z - 0.5).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn second_world_translation_without_update_is_not_ready() {
        let t = CommandTranslator::default();
        let gate = fresh_gate();
        let cmd = Twist::new(Vector3::new(1.0, 0.0, 0.0), Vector3::zero());
        assert!(t.translate(&cmd, &world(), Quaternion::identity(), &gate).is_ok());
        assert!(matches!(
            t.translate(&cmd, &world(), Quaternion::identity(), &gate),
            Err(BridgeError::NotReady(_))
        ));
    }

    #[test]
    fn body_frame_passes_through_without_gate() {
        let t = CommandTranslator::default();
        let gate = FreshnessGate::new();
        let cmd = Twist::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 5.0));
        let out = t
            .translate(
                &cmd,
                &ControlMode::velocity(ReferenceFrame::BodyFixed),
                Quaternion::from_yaw(1.0),
                &gate,
            )
            .unwrap();
        assert_eq!(out, cmd);
    }

    #[test]
    fn other_frames_are_rejected_and_gate_untouched() {
        let t = CommandTranslator::default();
        let gate = fresh_gate();
        let mode = ControlMode::velocity(ReferenceFrame::GlobalWorld);
        assert_eq!(
            t.translate(&Twist::zero(), &mode, Quaternion::identity(), &gate),
            Err(BridgeError::UnsupportedControlMode(mode))
        );
        assert!(gate.is_fresh());
    }

    #[test]
    fn invalid_limits_are_rejected() {
        assert!(CommandTranslator::new(0.0).is_err());
        assert!(CommandTranslator::new(-1.0).is_err());
        assert!(CommandTranslator::new(f64::NAN).is_err());
        let t = CommandTranslator::new(0.5).unwrap();
        assert!((t.clamp_yaw_rate(3.0) - 0.5).abs() < f64::EPSILON);
    }
}
