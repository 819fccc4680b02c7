//! Stateful tracking session: pipeline, state machine and feedback slot.
use super::options::TrackerConfig;
use super::pipeline::{CycleInput, CycleOutput, Pipeline};
use super::state::TrackingState;
use crate::error::Result;
use crate::types::Transform;
use log::{debug, info};

/// Owns one feedback transform. Cycles run strictly one after another
/// through `&mut self`; independent sessions share nothing.
pub struct TrackingSession {
    pipeline: Pipeline,
    state: TrackingState,
    feedback: Option<Transform>,
    consecutive_failures: usize,
}

impl TrackingSession {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        Ok(Self::with_pipeline(Pipeline::new(config)?))
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            state: TrackingState::Uninitialized,
            feedback: None,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Transform the next cycle stabilizes against.
    pub fn feedback(&self) -> Option<&Transform> {
        self.feedback.as_ref()
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Forget the target and start over from `Uninitialized`.
    pub fn reset(&mut self) {
        self.state = TrackingState::Uninitialized;
        self.feedback = None;
        self.consecutive_failures = 0;
    }

    pub fn process(&mut self, input: &CycleInput<'_>) -> CycleOutput {
        let mut out = self.pipeline.run_cycle(
            input.primary,
            input.secondary,
            self.feedback.as_ref(),
            input.time_msec,
        );

        let succeeded = out.transform.is_some();
        if succeeded {
            self.consecutive_failures = 0;
            self.feedback = out.transform;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        let lost_after = self.pipeline.config().session.lost_after_failures;
        let next = self
            .state
            .next(succeeded, self.consecutive_failures, lost_after);
        if next == TrackingState::Lost {
            self.feedback = None;
            info!(
                "target lost after {} failed cycles at t={}ms",
                self.consecutive_failures, input.time_msec
            );
        } else if next == TrackingState::Tracking && !self.state.has_lock() {
            info!("target acquired at t={}ms", input.time_msec);
        }
        if next != self.state {
            debug!("session state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        out.report.state = Some(next);
        out
    }
}
