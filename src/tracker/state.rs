use serde::Serialize;

/// Lifecycle of one tracking session.
///
/// `Uninitialized → Acquiring → Tracking → (Lost → Acquiring)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingState {
    /// No cycle has run yet.
    #[default]
    Uninitialized,
    /// No feedback transform; every cycle tries to lock on.
    Acquiring,
    /// A feedback transform exists and is refreshed by successful cycles.
    Tracking,
    /// Too many consecutive failures; the feedback transform was dropped.
    Lost,
}

impl TrackingState {
    /// State after a cycle. `failures` counts consecutive failed cycles,
    /// including this one when it failed.
    pub fn next(self, succeeded: bool, failures: usize, lost_after: usize) -> TrackingState {
        match (self, succeeded) {
            (_, true) => TrackingState::Tracking,
            (TrackingState::Tracking, false) if failures >= lost_after => TrackingState::Lost,
            (TrackingState::Tracking, false) => TrackingState::Tracking,
            (_, false) => TrackingState::Acquiring,
        }
    }

    pub fn has_lock(self) -> bool {
        self == TrackingState::Tracking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        use TrackingState::*;
        assert_eq!(Uninitialized.next(false, 1, 3), Acquiring);
        assert_eq!(Uninitialized.next(true, 0, 3), Tracking);
        assert_eq!(Acquiring.next(false, 10, 3), Acquiring);
        assert_eq!(Tracking.next(false, 2, 3), Tracking);
        assert_eq!(Tracking.next(false, 3, 3), Lost);
        assert_eq!(Lost.next(false, 4, 3), Acquiring);
        assert_eq!(Lost.next(true, 0, 3), Tracking);
    }
}
