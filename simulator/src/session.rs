use anyhow::Context;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};
use wheel_reconciler::{Applied, Completion, FailureClass, FrameEvent, OutcomeReconciler, ReconcileError, ReelStrip};
use wheel_shared::constants::{SPIN_FAILED_ERROR, SPIN_TIMEOUT_ERROR};
use wheel_shared::{PrizeCase, RequestToken, SpinRequest, SpinResponse, SubmitGuard};

use crate::spin_api::{ScriptedSpinApi, SpinApiError};

/// Height of one symbol on the result ticker reel.
const TICKER_SYMBOL_HEIGHT: f64 = 64.0;
/// Full loops the ticker makes before settling on a result.
const TICKER_EXTRA_LOOPS: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Spin,
    SwitchCase(String),
}

/// One scripted user action, fired `after` the previous one.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub after: Duration,
    pub action: UserAction,
}

impl ScriptStep {
    pub fn new(after_ms: u64, action: UserAction) -> Self {
        Self {
            after: Duration::from_millis(after_ms),
            action,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionSummary {
    /// Segment ids the wheel came to rest on, in order.
    pub landed: Vec<String>,
    pub refused: usize,
    pub discarded: usize,
    /// Landings on the case's losing chance.
    pub losses: usize,
    /// Symbols the result ticker settled on, in order.
    pub ticker: Vec<String>,
    pub timed_out: usize,
    pub api_errors: usize,
}

type InFlight = LocalBoxFuture<'static, (RequestToken, Result<SpinResponse, SpinApiError>)>;

/// Drives one wheel the way the UI event loop does: frame ticks, user
/// actions and spin responses, all on one thread.
pub struct SpinSession<R: Rng> {
    reconciler: OutcomeReconciler<R>,
    guard: SubmitGuard<String>,
    api: ScriptedSpinApi,
    cases: HashMap<String, PrizeCase>,
    active_case: String,
    ticker: ReelStrip,
    ticker_offset: f64,
    frame_interval: Duration,
    started: Instant,
    summary: SessionSummary,
}

impl<R: Rng> SpinSession<R> {
    pub fn new(
        mut reconciler: OutcomeReconciler<R>,
        api: ScriptedSpinApi,
        cases: Vec<PrizeCase>,
        active_case: &str,
        frame_interval: Duration,
    ) -> anyhow::Result<Self> {
        let cases: HashMap<String, PrizeCase> =
            cases.into_iter().map(|case| (case.id.clone(), case)).collect();
        let case = cases
            .get(active_case)
            .with_context(|| format!("unknown case {}", active_case))?;
        reconciler
            .set_segments(case.segments())
            .with_context(|| format!("case {} cannot be shown", active_case))?;
        let ticker = ticker_for(case).with_context(|| format!("case {} has no ticker", active_case))?;

        Ok(Self {
            reconciler,
            guard: SubmitGuard::new(),
            api,
            cases,
            active_case: active_case.to_string(),
            ticker,
            ticker_offset: 0.0,
            frame_interval,
            started: Instant::now(),
            summary: SessionSummary::default(),
        })
    }

    fn now(&self) -> Duration {
        self.started.elapsed()
    }

    pub async fn run(mut self, script: Vec<ScriptStep>) -> SessionSummary {
        let mut steps = script.into_iter();
        let mut next_step = steps.next();
        let mut next_at = Instant::now() + next_step.as_ref().map_or(Duration::ZERO, |s| s.after);

        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();

        loop {
            if next_step.is_none() && in_flight.is_empty() && !self.reconciler.phase().is_busy() {
                break;
            }

            tokio::select! {
                _ = frames.tick() => self.on_frame(),
                _ = tokio::time::sleep_until(next_at), if next_step.is_some() => {
                    if let Some(step) = next_step.take() {
                        if let Some(request) = self.on_action(step.action) {
                            in_flight.push(request);
                        }
                    }
                    next_step = steps.next();
                    if let Some(step) = &next_step {
                        next_at = Instant::now() + step.after;
                    }
                }
                Some((token, result)) = in_flight.next() => self.on_response(token, result),
            }
        }

        self.summary
    }

    fn on_frame(&mut self) {
        let frame = self.reconciler.tick(self.now());
        match frame.event {
            Some(FrameEvent::Completed(completion)) => self.on_landed(completion),
            Some(FrameEvent::TimedOut(request)) => self.report_failure(request, FailureClass::Timeout),
            None => {}
        }
    }

    fn on_landed(&mut self, completion: Completion) {
        info!(
            case = %self.active_case,
            request = %completion.request,
            trajectory = %completion.trajectory,
            "Wheel stopped on {}",
            completion.segment_id
        );

        let losing = self
            .cases
            .get(&self.active_case)
            .and_then(PrizeCase::losing_chance)
            .map_or(false, |chance| chance.chance_id == completion.segment_id);
        if losing {
            info!(case = %self.active_case, "No prize this time");
            self.summary.losses += 1;
        }

        self.ticker_offset = self
            .ticker
            .target_offset(self.ticker_offset, &completion.segment_id, TICKER_EXTRA_LOOPS);
        self.summary.ticker.push(self.ticker.symbol_at(self.ticker_offset).to_string());
        self.summary.landed.push(completion.segment_id);
    }

    /// Counts a request that ended without an outcome and tells the user
    /// when its class calls for it.
    fn report_failure(&mut self, request: RequestToken, class: FailureClass) {
        if class == FailureClass::Timeout {
            self.summary.timed_out += 1;
        }
        if !class.surfaces_to_user() {
            info!(request = %request, "Spin ended without an outcome ({:?})", class);
            return;
        }
        let message = match class {
            FailureClass::Timeout => SPIN_TIMEOUT_ERROR,
            _ => SPIN_FAILED_ERROR,
        };
        warn!(case = %self.active_case, request = %request, "{}", message);
    }

    fn on_action(&mut self, action: UserAction) -> Option<InFlight> {
        match action {
            UserAction::Spin => self.start_spin(),
            UserAction::SwitchCase(case_id) => {
                let Some(case) = self.cases.get(&case_id) else {
                    warn!(case = %case_id, "Unknown case");
                    return None;
                };
                let switched = ticker_for(case)
                    .and_then(|ticker| self.reconciler.set_segments(case.segments()).map(|()| ticker));
                match switched {
                    Ok(ticker) => {
                        info!(case = %case_id, "Switched case");
                        self.ticker = ticker;
                        self.ticker_offset = 0.0;
                        self.active_case = case_id;
                    }
                    Err(e) => warn!(case = %case_id, "Case cannot be shown: {}", e),
                }
                None
            }
        }
    }

    fn start_spin(&mut self) -> Option<InFlight> {
        let Some(permit) = self.guard.acquire(self.active_case.clone()) else {
            info!(case = %self.active_case, "Spin ignored ({:?})", FailureClass::DoubleSubmit);
            self.summary.refused += 1;
            return None;
        };

        let token = match self.reconciler.begin_request(self.now()) {
            Ok(token) => token,
            Err(e) => {
                warn!(case = %self.active_case, "Cannot spin: {}", e);
                return None;
            }
        };

        let api = self.api.clone();
        let timeout = self.reconciler.config().request_timeout();
        let request = SpinRequest {
            case_id: self.active_case.clone(),
            timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
        };
        info!(case = %request.case_id, request = %token, "Spinning");

        Some(
            async move {
                // Held until the response (or its timeout) is in.
                let _permit = permit;
                (token, api.spin_with_timeout(request, timeout).await)
            }
            .boxed_local(),
        )
    }

    fn on_response(&mut self, token: RequestToken, result: Result<SpinResponse, SpinApiError>) {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(request = %token, "Spin request failed: {}", e);
                self.summary.api_errors += 1;
                if self.reconciler.fail_request(token) {
                    self.report_failure(token, e.class());
                }
                return;
            }
        };

        let outcome = response.into_outcome(token);
        match self.reconciler.apply_outcome(&outcome, self.now()) {
            Ok(Applied::Started(descriptor)) => info!(
                request = %token,
                trajectory = %descriptor.id,
                "Heading to {} ({:?}) over {:?}",
                descriptor.segment_id,
                descriptor.resolution,
                descriptor.duration
            ),
            Ok(Applied::Discarded(reason)) => {
                info!(request = %token, "Ignoring response ({:?}, {:?})", reason, reason.class());
                self.summary.discarded += 1;
            }
            Err(e) => warn!(request = %token, "Cannot animate: {}", e),
        }
    }
}

/// The result ticker shows the case's chances in order.
fn ticker_for(case: &PrizeCase) -> Result<ReelStrip, ReconcileError> {
    let symbols = case.chances.iter().map(|chance| chance.chance_id.clone()).collect();
    ReelStrip::new(symbols, TICKER_SYMBOL_HEIGHT)
}
