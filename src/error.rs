use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("input dispatch failed ({action}): {reason}")]
    InputDispatch { action: &'static str, reason: String },

    #[error("exit key query failed: {0}")]
    KeyPoll(String),

    #[error("giving up after {attempts} consecutive failures")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<CollectorError>,
    },

    #[error("collector worker stopped unexpectedly: {0}")]
    Worker(String),

    #[error("collector still busy {grace:?} after stop was requested")]
    WorkerStalled { grace: Duration },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
}

impl CollectorError {
    pub fn input(action: &'static str, reason: impl ToString) -> Self {
        CollectorError::InputDispatch {
            action,
            reason: reason.to_string(),
        }
    }

    /// Capture and input failures are transient enough to back off and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CollectorError::Capture(_) | CollectorError::InputDispatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
