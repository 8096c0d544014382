// Defaults for wheel animation, mirrored by the reconciler configuration.
pub const FULL_CIRCLE_DEG: f64 = 360.0;
pub const DEFAULT_FULL_TURNS: u32 = 5;
pub const DEFAULT_EDGE_MARGIN_RATIO: f64 = 0.2;
pub const DEFAULT_EDGE_MARGIN_CAP_DEG: f64 = 8.0;
pub const DEFAULT_MIN_SPIN_DURATION_MS: u64 = 5000;
pub const DEFAULT_MAX_SPIN_DURATION_MS: u64 = 6500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

pub const SPIN_TIMEOUT_ERROR: &str = "The spin took too long to resolve. Please try again.";
pub const SPIN_FAILED_ERROR: &str = "The spin could not be completed. Please try again.";
