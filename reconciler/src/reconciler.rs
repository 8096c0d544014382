use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use wheel_shared::{Outcome, RequestToken, Segment};

use crate::config::{FallbackPolicy, ReconcilerConfig};
use crate::easing::Easing;
use crate::error::{FailureClass, ReconcileError};
use crate::geometry::WheelGeometry;
use crate::trajectory::{forward_target, Trajectory, TrajectoryId};

/// Lifecycle of the wheel. Only the reconciler's own operations move it.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    /// A spin request is in flight.
    Pending { request: RequestToken, issued_at: Duration },
    Animating(Trajectory),
    Completed { trajectory: TrajectoryId },
    /// Superseded before finishing; its completion never fires.
    Abandoned { trajectory: TrajectoryId },
    /// The request never resolved in time.
    Failed { request: RequestToken },
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Pending { .. } | Phase::Animating(_))
    }
}

/// How an outcome was mapped onto a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched,
    DeclaredLoss,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The outcome belongs to a request that was superseded or timed out.
    Stale,
    /// The outcome was already applied once.
    Duplicate,
}

impl DiscardReason {
    pub fn class(&self) -> FailureClass {
        FailureClass::StaleResponse
    }
}

/// What the rendering layer needs to animate a spin.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryDescriptor {
    pub id: TrajectoryId,
    pub request: RequestToken,
    pub segment_index: usize,
    pub segment_id: String,
    pub resolution: Resolution,
    /// Wheel-local angle the pointer will rest on.
    pub landing_angle: f64,
    pub start_angle: f64,
    pub target_angle: f64,
    pub duration: Duration,
    pub easing: Easing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Started(TrajectoryDescriptor),
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub trajectory: TrajectoryId,
    pub request: RequestToken,
    pub segment_index: usize,
    pub segment_id: String,
    pub final_angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    Completed(Completion),
    TimedOut(RequestToken),
}

/// Result of one clock tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub angle: f64,
    pub event: Option<FrameEvent>,
}

type CompletionHandler = Box<dyn FnMut(&Completion)>;

/// Turns server-declared outcomes into wheel trajectories that land on the
/// declared segment, continue from the displayed angle, and report
/// completion exactly once.
pub struct OutcomeReconciler<R = StdRng> {
    config: ReconcilerConfig,
    rng: R,
    geometry: Option<WheelGeometry>,
    phase: Phase,
    displayed_angle: f64,
    next_request: u64,
    next_trajectory: u64,
    active_request: Option<RequestToken>,
    last_consumed: Option<RequestToken>,
    on_complete: Option<CompletionHandler>,
}

impl OutcomeReconciler<StdRng> {
    pub fn new(config: ReconcilerConfig) -> Result<Self, ReconcileError> {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> OutcomeReconciler<R> {
    pub fn with_rng(config: ReconcilerConfig, rng: R) -> Result<Self, ReconcileError> {
        Ok(Self {
            config: config.validated()?,
            rng,
            geometry: None,
            phase: Phase::Idle,
            displayed_angle: 0.0,
            next_request: 0,
            next_trajectory: 0,
            active_request: None,
            last_consumed: None,
            on_complete: None,
        })
    }

    /// Starts from a previously displayed rotation instead of 0.
    pub fn with_initial_angle(mut self, angle: f64) -> Result<Self, ReconcileError> {
        if !angle.is_finite() {
            return Err(ReconcileError::InvalidAngle(angle));
        }
        self.displayed_angle = angle;
        Ok(self)
    }

    pub fn set_completion_handler(&mut self, handler: impl FnMut(&Completion) + 'static) {
        self.on_complete = Some(Box::new(handler));
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn geometry(&self) -> Option<&WheelGeometry> {
        self.geometry.as_ref()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn displayed_angle(&self) -> f64 {
        self.displayed_angle
    }

    pub fn active_request(&self) -> Option<RequestToken> {
        self.active_request
    }

    /// Segment currently under the pointer.
    pub fn segment_under_pointer(&self) -> Option<&Segment> {
        let geometry = self.geometry.as_ref()?;
        geometry.segments().get(geometry.segment_at(self.displayed_angle))
    }

    /// Replaces the segment set, e.g. when the user switches cases.
    ///
    /// An invalid set is rejected and leaves everything untouched. A valid
    /// one abandons the in-flight trajectory and invalidates the outstanding
    /// request, whose response will then be discarded as stale.
    pub fn set_segments(&mut self, segments: Vec<Segment>) -> Result<(), ReconcileError> {
        let geometry = WheelGeometry::new(segments, self.config.pointer_offset_deg)?;
        if self.config.fallback == FallbackPolicy::RequireLosing && geometry.losing_index().is_none() {
            return Err(ReconcileError::MissingLosingSegment);
        }

        self.abandon_in_flight();
        if let Some(request) = self.active_request.take() {
            log::info!("Segment set replaced, invalidating {}", request);
        }
        if matches!(self.phase, Phase::Pending { .. }) {
            self.phase = Phase::Idle;
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Issues the token for a new spin request. Any animation still running
    /// is abandoned where it stands and any older request is superseded.
    pub fn begin_request(&mut self, now: Duration) -> Result<RequestToken, ReconcileError> {
        if self.geometry.is_none() {
            return Err(ReconcileError::NoSegmentSet);
        }

        self.abandon_in_flight();
        self.next_request += 1;
        let request = RequestToken(self.next_request);
        if let Some(previous) = self.active_request.replace(request) {
            log::info!("{} superseded by {}", previous, request);
        }
        self.phase = Phase::Pending { request, issued_at: now };
        log::debug!("Issued {} at {:?}", request, now);
        Ok(request)
    }

    /// Starts the trajectory for `outcome` if it answers the active request.
    /// An outcome arriving after the request deadline is discarded even when
    /// no frame has ticked since the deadline passed.
    pub fn apply_outcome(&mut self, outcome: &Outcome, now: Duration) -> Result<Applied, ReconcileError> {
        let request = outcome.request_token;
        self.expire_if_due(now);
        if self.active_request != Some(request) {
            let reason = if self.last_consumed == Some(request) {
                DiscardReason::Duplicate
            } else {
                DiscardReason::Stale
            };
            log::warn!("Discarding outcome for {} ({:?})", request, reason);
            return Ok(Applied::Discarded(reason));
        }

        let geometry = self.geometry.as_ref().ok_or(ReconcileError::NoSegmentSet)?;
        let (segment_index, resolution) = resolve_target(geometry, outcome).ok_or(ReconcileError::ZeroTotalWeight)?;
        let (lo, hi) = geometry
            .landing_range(segment_index, self.config.edge_margin_ratio, self.config.edge_margin_cap_deg)
            .ok_or(ReconcileError::ZeroTotalWeight)?;
        let landing_angle = if hi > lo { self.rng.gen_range(lo..hi) } else { lo };
        let landing_rotation = geometry.rotation_for(landing_angle);
        let segment_id = geometry.segments()[segment_index].id.clone();

        let start_angle = self.displayed_angle;
        let target_angle = forward_target(start_angle, landing_rotation, self.config.full_turns);
        let duration = Duration::from_millis(
            self.rng.gen_range(self.config.min_duration_ms..=self.config.max_duration_ms),
        );

        self.next_trajectory += 1;
        let trajectory = Trajectory {
            id: TrajectoryId(self.next_trajectory),
            request,
            segment_index,
            segment_id: segment_id.clone(),
            start_angle,
            target_angle,
            start_time: now,
            duration,
            easing: self.config.easing,
        };
        log::debug!(
            "{} for {}: {:.2} -> {:.2} over {:?}, landing {:.2} in {}",
            trajectory.id,
            request,
            start_angle,
            target_angle,
            duration,
            landing_angle,
            segment_id
        );

        let descriptor = TrajectoryDescriptor {
            id: trajectory.id,
            request,
            segment_index,
            segment_id,
            resolution,
            landing_angle,
            start_angle,
            target_angle,
            duration,
            easing: trajectory.easing,
        };

        self.active_request = None;
        self.last_consumed = Some(request);
        self.phase = Phase::Animating(trajectory);
        Ok(Applied::Started(descriptor))
    }

    /// Advances the wheel to `now`. Emits at most one event per call, and
    /// each trajectory's completion at most once overall.
    pub fn tick(&mut self, now: Duration) -> Frame {
        if let Some(request) = self.expire_if_due(now) {
            return Frame {
                angle: self.displayed_angle,
                event: Some(FrameEvent::TimedOut(request)),
            };
        }

        let mut finished = false;
        if let Phase::Animating(trajectory) = &self.phase {
            self.displayed_angle = trajectory.angle_at(now);
            finished = trajectory.is_finished(now);
        }

        let event = if finished {
            self.finish().map(FrameEvent::Completed)
        } else {
            None
        };
        Frame {
            angle: self.displayed_angle,
            event,
        }
    }

    /// Ends the pending request after its transport failed. No-op (returning
    /// `false`) when `request` is not the one the wheel is waiting on.
    pub fn fail_request(&mut self, request: RequestToken) -> bool {
        match self.phase {
            Phase::Pending { request: pending, .. } if pending == request && self.active_request == Some(request) => {
                log::warn!("{} failed before an outcome arrived", request);
                self.active_request = None;
                self.phase = Phase::Failed { request };
                true
            }
            _ => false,
        }
    }

    /// Declares a trajectory finished from the rendering side. Returns
    /// `false` for unknown, abandoned or already completed trajectories.
    pub fn mark_complete(&mut self, id: TrajectoryId) -> bool {
        match &self.phase {
            Phase::Animating(trajectory) if trajectory.id == id => {
                self.displayed_angle = trajectory.target_angle;
            }
            _ => return false,
        }
        self.finish().is_some()
    }

    fn finish(&mut self) -> Option<Completion> {
        let trajectory = match &self.phase {
            Phase::Animating(trajectory) => trajectory.id,
            _ => return None,
        };
        let Phase::Animating(trajectory) =
            std::mem::replace(&mut self.phase, Phase::Completed { trajectory })
        else {
            return None;
        };

        self.displayed_angle = trajectory.target_angle;
        let completion = Completion {
            trajectory: trajectory.id,
            request: trajectory.request,
            segment_index: trajectory.segment_index,
            segment_id: trajectory.segment_id,
            final_angle: trajectory.target_angle,
        };
        log::info!(
            "{} landed on {} at {:.2}",
            completion.trajectory,
            completion.segment_id,
            completion.final_angle
        );
        if let Some(handler) = self.on_complete.as_mut() {
            handler(&completion);
        }
        Some(completion)
    }

    /// Moves a pending request past its deadline to `Failed`.
    fn expire_if_due(&mut self, now: Duration) -> Option<RequestToken> {
        let Phase::Pending { request, issued_at } = self.phase else {
            return None;
        };
        if now.saturating_sub(issued_at) < self.config.request_timeout() {
            return None;
        }
        log::warn!("{} timed out after {:?}", request, self.config.request_timeout());
        self.active_request = None;
        self.phase = Phase::Failed { request };
        Some(request)
    }

    fn abandon_in_flight(&mut self) {
        if let Phase::Animating(trajectory) = &self.phase {
            let id = trajectory.id;
            log::info!("Abandoning {} at {:.2}", id, self.displayed_angle);
            self.phase = Phase::Abandoned { trajectory: id };
        }
    }
}

/// Maps an outcome onto a landable segment. Never fails for a valid geometry.
pub fn resolve_target(geometry: &WheelGeometry, outcome: &Outcome) -> Option<(usize, Resolution)> {
    if outcome.declared_loss {
        if let Some(index) = geometry.losing_index() {
            return Some((index, Resolution::DeclaredLoss));
        }
    } else if let Some(id) = outcome.outcome_id.as_deref() {
        if let Some(index) = geometry.index_of(id).filter(|&i| geometry.is_landable(i)) {
            return Some((index, Resolution::Matched));
        }
    }

    let index = geometry
        .losing_index()
        .or_else(|| geometry.first_landable_index())?;
    log::info!(
        "Outcome {:?} for {} unresolvable ({:?}), falling back to {}",
        outcome.outcome_id,
        outcome.request_token,
        FailureClass::UnresolvableOutcome,
        geometry.segments()[index].id
    );
    Some((index, Resolution::Fallback))
}
