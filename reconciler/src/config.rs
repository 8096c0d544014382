use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};
use wheel_shared::constants::*;

use crate::easing::Easing;
use crate::error::ReconcileError;

/// What to land on when an outcome id cannot be matched to a segment.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Losing segment if one is flagged, otherwise the first landable one.
    #[default]
    LosingOrFirst,
    /// Segment sets without a landable losing segment are rejected up front.
    RequireLosing,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[validate(schema(function = "validate_timing"))]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Direction of the pointer, measured in the same frame as segment angles.
    #[validate(range(min = 0.0, max = 359.999_999))]
    pub pointer_offset_deg: f64,
    #[validate(range(min = 1, max = 50))]
    pub full_turns: u32,
    #[validate(range(min = 0.0, max = 0.499_999))]
    pub edge_margin_ratio: f64,
    #[validate(range(min = 0.0))]
    pub edge_margin_cap_deg: f64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    pub request_timeout_ms: u64,
    pub easing: Easing,
    pub fallback: FallbackPolicy,
}

fn validate_timing(config: &ReconcilerConfig) -> Result<(), ValidationError> {
    if config.min_duration_ms == 0 {
        return Err(ValidationError::new("zero_spin_duration"));
    }
    if config.request_timeout_ms == 0 {
        return Err(ValidationError::new("zero_request_timeout"));
    }
    if config.min_duration_ms > config.max_duration_ms {
        return Err(ValidationError::new("min_duration_exceeds_max"));
    }
    Ok(())
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            pointer_offset_deg: 0.0,
            full_turns: DEFAULT_FULL_TURNS,
            edge_margin_ratio: DEFAULT_EDGE_MARGIN_RATIO,
            edge_margin_cap_deg: DEFAULT_EDGE_MARGIN_CAP_DEG,
            min_duration_ms: DEFAULT_MIN_SPIN_DURATION_MS,
            max_duration_ms: DEFAULT_MAX_SPIN_DURATION_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            easing: Easing::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

impl ReconcilerConfig {
    pub fn validated(self) -> Result<Self, ReconcileError> {
        self.validate()
            .map_err(|e| ReconcileError::InvalidConfig(e.to_string()))?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
