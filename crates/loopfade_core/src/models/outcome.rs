//! Per-track conversion outcomes.

use crate::errors::ConversionError;

/// Final state of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    /// Failed with a human-readable reason.
    Failed(String),
}

/// Result of converting one track.
///
/// Every discovered track produces exactly one outcome, whether it
/// succeeded, failed or was interrupted.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    /// Display name of the track.
    pub track_id: String,
    /// How it ended.
    pub status: OutcomeStatus,
    /// Whether the failure came from the batch-wide interrupt.
    pub interrupted: bool,
}

impl ConversionOutcome {
    /// Create a successful outcome.
    pub fn succeeded(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            status: OutcomeStatus::Succeeded,
            interrupted: false,
        }
    }

    /// Create a failed outcome from an error.
    pub fn failed(track_id: impl Into<String>, error: &ConversionError) -> Self {
        Self {
            track_id: track_id.into(),
            status: OutcomeStatus::Failed(error.to_string()),
            interrupted: error.is_interrupted(),
        }
    }

    /// Collapse a pipeline result into an outcome.
    pub fn from_result(track_id: impl Into<String>, result: &Result<(), ConversionError>) -> Self {
        match result {
            Ok(()) => Self::succeeded(track_id),
            Err(e) => Self::failed(track_id, e),
        }
    }

    /// Whether the track converted successfully.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Failed(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Stage;

    #[test]
    fn outcome_from_result() {
        let ok = ConversionOutcome::from_result("a.org", &Ok(()));
        assert!(ok.is_success());
        assert_eq!(ok.reason(), None);

        let err = ConversionError::exit_failed(Stage::Encoder, Some(1));
        let failed = ConversionOutcome::from_result("b.org", &Err(err));
        assert!(!failed.is_success());
        assert!(failed.reason().unwrap().contains("encoder"));
        assert!(!failed.interrupted);

        let interrupted = ConversionOutcome::failed("c.org", &ConversionError::Interrupted);
        assert!(interrupted.interrupted);
    }
}
