use thiserror::Error;

/// Failures of a solve round trip. None of them are fatal: the surface stays
/// usable and another submit may follow immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// No drawable surface at submit time; nothing is sent.
    #[error("no canvas surface is available to capture")]
    CaptureUnavailable,
    #[error("a solve request is already in flight")]
    Busy,
    #[error("failed to encode canvas snapshot: {0}")]
    Encode(String),
    #[error("solve request failed: {0}")]
    SolveRequestFailed(String),
    #[error("solver returned an unreadable response: {0}")]
    MalformedResponse(String),
}

impl SolveError {
    /// Whether the user should see a failure notification for this error.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, SolveError::CaptureUnavailable | SolveError::Busy)
    }
}
