//! [`ControlModeValidator`] – gate for control-mode change requests.
//!
//! The bridge translates exactly one kind of command: a velocity twist with a
//! yaw-rate component, expressed in either the local world frame or the body
//! frame.
//!
//! | yaw mode | control mode | reference frame | accepted |
//! |---|---|---|---|
//! | `YawRate` | `Velocity` | `LocalWorld` | yes |
//! | `YawRate` | `Velocity` | `BodyFixed` | yes |
//! | anything else | | | no |
//!
//! A rejected request leaves the current mode untouched.

use skybridge_types::{BridgeError, ControlMode, ControlModeKind, ReferenceFrame, YawMode};
use tracing::{info, warn};

/// `true` for the two supported control-mode triples.
pub fn is_supported(mode: &ControlMode) -> bool {
    mode.yaw_mode == YawMode::YawRate
        && mode.control_mode == ControlModeKind::Velocity
        && matches!(
            mode.reference_frame,
            ReferenceFrame::LocalWorld | ReferenceFrame::BodyFixed
        )
}

/// Holds the currently accepted [`ControlMode`].
///
/// Starts out with the default (unset) mode, which no translation path
/// accepts; commands are held back until a supported mode is requested.
///
/// # Example
///
/// ```
/// use skybridge_kernel::ControlModeValidator;
/// use skybridge_types::{ControlMode, ReferenceFrame};
///
/// let mut validator = ControlModeValidator::new();
/// assert!(!validator.is_active());
///
/// validator.request(ControlMode::velocity(ReferenceFrame::BodyFixed)).unwrap();
/// assert!(validator.is_active());
///
/// assert!(validator.request(ControlMode::default()).is_err());
/// assert_eq!(validator.current().reference_frame, ReferenceFrame::BodyFixed);
/// ```
#[derive(Debug, Default)]
pub struct ControlModeValidator {
    current: ControlMode,
}

impl ControlModeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ControlMode {
        self.current
    }

    /// Whether a supported mode has been accepted.
    pub fn is_active(&self) -> bool {
        is_supported(&self.current)
    }

    /// Check `mode` without changing state.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnsupportedControlMode`] for any unsupported triple.
    pub fn validate(&self, mode: &ControlMode) -> Result<(), BridgeError> {
        if is_supported(mode) {
            Ok(())
        } else {
            Err(BridgeError::UnsupportedControlMode(*mode))
        }
    }

    /// Replace the current mode with `mode` if it is supported.
    ///
    /// Returns the previous mode on success.  The caller is responsible for
    /// zeroing the pending command.
    pub fn request(&mut self, mode: ControlMode) -> Result<ControlMode, BridgeError> {
        if let Err(err) = self.validate(&mode) {
            warn!(requested = %mode, current = %self.current, "control mode rejected");
            return Err(err);
        }
        let previous = std::mem::replace(&mut self.current, mode);
        info!(%previous, current = %mode, "control mode accepted");
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAW_MODES: [YawMode; 3] = [YawMode::None, YawMode::YawAngle, YawMode::YawRate];
    const CONTROL_MODES: [ControlModeKind; 8] = [
        ControlModeKind::Unset,
        ControlModeKind::Hover,
        ControlModeKind::Position,
        ControlModeKind::Velocity,
        ControlModeKind::VelocityInAPlane,
        ControlModeKind::Attitude,
        ControlModeKind::Acro,
        ControlModeKind::Trajectory,
    ];
    const FRAMES: [ReferenceFrame; 4] = [
        ReferenceFrame::Undefined,
        ReferenceFrame::LocalWorld,
        ReferenceFrame::BodyFixed,
        ReferenceFrame::GlobalWorld,
    ];

    #[test]
    fn only_yaw_rate_velocity_in_local_or_body_is_accepted() {
        let mut accepted = Vec::new();
        for yaw in YAW_MODES {
            for control in CONTROL_MODES {
                for frame in FRAMES {
                    let mode = ControlMode::new(yaw, control, frame);
                    if is_supported(&mode) {
                        accepted.push(mode);
                    }
                }
            }
        }
        assert_eq!(
            accepted,
            vec![
                ControlMode::velocity(ReferenceFrame::LocalWorld),
                ControlMode::velocity(ReferenceFrame::BodyFixed),
            ]
        );
    }

    #[test]
    fn rejected_request_leaves_state_unchanged() {
        let mut validator = ControlModeValidator::new();
        validator
            .request(ControlMode::velocity(ReferenceFrame::LocalWorld))
            .unwrap();

        for mode in [
            ControlMode::velocity(ReferenceFrame::GlobalWorld),
            ControlMode::new(
                YawMode::YawAngle,
                ControlModeKind::Velocity,
                ReferenceFrame::LocalWorld,
            ),
            ControlMode::new(
                YawMode::YawRate,
                ControlModeKind::Position,
                ReferenceFrame::BodyFixed,
            ),
        ] {
            assert_eq!(
                validator.request(mode),
                Err(BridgeError::UnsupportedControlMode(mode))
            );
            assert_eq!(
                validator.current(),
                ControlMode::velocity(ReferenceFrame::LocalWorld)
            );
        }
    }

    #[test]
    fn accepted_request_returns_previous_mode() {
        let mut validator = ControlModeValidator::new();
        assert!(!validator.is_active());

        let previous = validator
            .request(ControlMode::velocity(ReferenceFrame::BodyFixed))
            .unwrap();
        assert_eq!(previous, ControlMode::default());

        let previous = validator
            .request(ControlMode::velocity(ReferenceFrame::LocalWorld))
            .unwrap();
        assert_eq!(previous, ControlMode::velocity(ReferenceFrame::BodyFixed));
        assert!(validator.is_active());
    }

    #[test]
    fn validate_does_not_mutate() {
        let validator = ControlModeValidator::new();
        assert!(validator
            .validate(&ControlMode::velocity(ReferenceFrame::BodyFixed))
            .is_ok());
        assert_eq!(validator.current(), ControlMode::default());
    }
}
