//! Outcome-to-animation reconciliation for prize wheels and reel strips.
//!
//! The server decides the prize before the wheel moves. This crate computes
//! a trajectory that lands on that prize, continues from whatever angle is on
//! screen, ignores responses for superseded requests, and reports completion
//! exactly once.

pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod reconciler;
pub mod reel;
pub mod trajectory;

pub use config::{FallbackPolicy, ReconcilerConfig};
pub use easing::Easing;
pub use error::{FailureClass, ReconcileError};
pub use geometry::{SegmentArc, WheelGeometry};
pub use reconciler::{
    Applied, Completion, DiscardReason, Frame, FrameEvent, OutcomeReconciler, Phase, Resolution,
    TrajectoryDescriptor,
};
pub use reel::ReelStrip;
pub use trajectory::{Trajectory, TrajectoryId};
