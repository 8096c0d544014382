use thiserror::Error;

/// Configuration failures. These are the only errors that reach the user;
/// every other condition is absorbed and reported through [`FailureClass`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("segment set is empty")]
    EmptySegments,

    #[error("segment {id} has invalid weight {weight}")]
    InvalidWeight { id: String, weight: f64 },

    #[error("total segment weight must be positive")]
    ZeroTotalWeight,

    #[error("duplicate segment id {0}")]
    DuplicateSegmentId(String),

    #[error("no landable losing segment is flagged")]
    MissingLosingSegment,

    #[error("no segment set loaded")]
    NoSegmentSet,

    #[error("invalid reconciler configuration: {0}")]
    InvalidConfig(String),

    #[error("initial angle {0} is not finite")]
    InvalidAngle(f64),

    #[error("invalid reel strip: {0}")]
    InvalidReel(String),
}

impl ReconcileError {
    pub fn class(&self) -> FailureClass {
        FailureClass::Configuration
    }
}

/// Classification for every failure the wheel can run into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Degenerate segments or settings. Fatal to the attempt.
    Configuration,
    /// Outcome id did not match a landable segment; resolved by fallback.
    UnresolvableOutcome,
    /// Outcome for a superseded or already consumed request; dropped.
    StaleResponse,
    /// Second submit for a key that is still in flight; refused.
    DoubleSubmit,
    /// No outcome arrived before the request deadline. Terminal.
    Timeout,
}

impl FailureClass {
    pub fn surfaces_to_user(&self) -> bool {
        matches!(self, FailureClass::Configuration | FailureClass::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_and_timeout_surface() {
        assert!(FailureClass::Configuration.surfaces_to_user());
        assert!(FailureClass::Timeout.surfaces_to_user());
        assert!(!FailureClass::UnresolvableOutcome.surfaces_to_user());
        assert!(!FailureClass::StaleResponse.surfaces_to_user());
        assert!(!FailureClass::DoubleSubmit.surfaces_to_user());
    }

    #[test]
    fn test_error_messages() {
        let err = ReconcileError::InvalidWeight { id: "B".to_string(), weight: -1.0 };
        assert_eq!(err.to_string(), "segment B has invalid weight -1");
        assert_eq!(err.class(), FailureClass::Configuration);
    }
}
