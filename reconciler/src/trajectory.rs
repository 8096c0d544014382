use std::fmt;
use std::time::Duration;
use wheel_shared::constants::FULL_CIRCLE_DEG;
use wheel_shared::RequestToken;

use crate::easing::Easing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrajectoryId(pub u64);

impl fmt::Display for TrajectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "traj#{}", self.0)
    }
}

/// Smallest forward target from `current` whose residue is `landing_rotation`,
/// plus `full_turns` whole turns.
///
/// The residue is added to an exact multiple of 360 rather than to `current`,
/// so repeated spins never accumulate drift.
pub fn forward_target(current: f64, landing_rotation: f64, full_turns: u32) -> f64 {
    let base = (current / FULL_CIRCLE_DEG).floor() * FULL_CIRCLE_DEG;
    let mut target = base + landing_rotation.rem_euclid(FULL_CIRCLE_DEG);
    if target < current {
        target += FULL_CIRCLE_DEG;
    }
    target + FULL_CIRCLE_DEG * full_turns as f64
}

/// One animation from `start_angle` to `target_angle`. Never mutated; a new
/// spin builds a new trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub id: TrajectoryId,
    pub request: RequestToken,
    pub segment_index: usize,
    pub segment_id: String,
    pub start_angle: f64,
    pub target_angle: f64,
    pub start_time: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Trajectory {
    pub fn end_time(&self) -> Duration {
        self.start_time + self.duration
    }

    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start_time);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.end_time()
    }

    pub fn angle_at(&self, now: Duration) -> f64 {
        if self.is_finished(now) {
            return self.target_angle;
        }
        let eased = self.easing.apply(self.progress(now));
        self.start_angle + (self.target_angle - self.start_angle) * eased
    }
}
