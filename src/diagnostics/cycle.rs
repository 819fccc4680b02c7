//! Per-cycle report: what each stage saw and why a cycle produced nothing.
use super::timing::TimingBreakdown;
use crate::tracker::TrackingState;
use serde::Serialize;

/// Why a cycle emitted neither a transform nor a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    /// One of the input frames has no pixels or a truncated buffer.
    EmptyInput,
    /// One of the feature sets came back empty.
    NoFeatures,
    /// The matcher raised a fault (kind mismatch, unsupported input).
    MatchFailed,
    #[serde(rename_all = "camelCase")]
    TooFewCorrespondences { found: usize, required: usize },
    /// RANSAC found no usable homography.
    HomographyRejected,
    /// The outline projected to infinity.
    RegionRejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CycleOutcome {
    Tracked,
    Skipped { cause: SkipReason },
}

impl CycleOutcome {
    pub fn is_tracked(&self) -> bool {
        matches!(self, CycleOutcome::Tracked)
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            CycleOutcome::Tracked => None,
            CycleOutcome::Skipped { cause } => Some(*cause),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub primary_width: usize,
    pub primary_height: usize,
    pub secondary_width: usize,
    pub secondary_height: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStage {
    pub extractor: &'static str,
    pub primary_features: usize,
    pub secondary_features: usize,
    /// Extractions that panicked and were replaced by an empty set.
    pub contained_panics: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingStage {
    pub matcher: &'static str,
    pub knn_entries: usize,
    pub ratio_kept: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpipolarStage {
    pub input: usize,
    pub kept: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomographyStage {
    pub correspondences: usize,
    pub inliers: usize,
    pub iterations: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilizerStage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    pub damped: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub time_msec: i64,
    /// Session state after the cycle; absent for stateless runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TrackingState>,
    pub input: InputDescriptor,
    pub outcome: CycleOutcome,
    pub timings: TimingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epipolar: Option<EpipolarStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homography: Option<HomographyStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stabilizer: Option<StabilizerStage>,
}

impl CycleReport {
    pub fn new(time_msec: i64, input: InputDescriptor) -> Self {
        Self {
            time_msec,
            state: None,
            input,
            outcome: CycleOutcome::Tracked,
            timings: TimingBreakdown::default(),
            extraction: None,
            matching: None,
            epipolar: None,
            homography: None,
            stabilizer: None,
        }
    }

    pub fn skip(&mut self, cause: SkipReason) {
        self.outcome = CycleOutcome::Skipped { cause };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_outcome_serializes_reason() {
        let mut report = CycleReport::new(5, InputDescriptor::default());
        report.skip(SkipReason::TooFewCorrespondences {
            found: 3,
            required: 8,
        });
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["outcome"]["status"], "skipped");
        assert_eq!(json["outcome"]["cause"]["reason"], "tooFewCorrespondences");
        assert_eq!(json["outcome"]["cause"]["required"], 8);
        assert!(json.get("matching").is_none());
        assert_eq!(json["timeMsec"], 5);
    }
}
