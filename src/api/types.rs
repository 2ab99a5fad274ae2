//! Outcome types for a single submission attempt.
//!
//! A [`SubmissionOutcome`] is either a success or a [`Failure`] tagged with a
//! [`FailureReason`]. Server rejections and transport failures share one
//! type so the backoff controller can treat them uniformly, while logs and
//! reports still tell "server rejected" apart from "network unreachable".

use serde::Serialize;

/// Why a submission attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// HTTP 400.
    BadRequest,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 500.
    ServerError,
    /// HTTP 503.
    Unavailable,
    /// Any status other than the ones above and 201.
    Unknown,
    /// The request did not complete within the timeout.
    Timeout,
    /// The server could not be reached.
    ConnectionError,
    /// Any other transport-level failure (invalid URL, broken body, ...).
    OtherTransportError,
}

impl FailureReason {
    /// True when the failure came from a server response rather than the transport.
    pub fn is_server_rejection(&self) -> bool {
        !matches!(
            self,
            FailureReason::Timeout
                | FailureReason::ConnectionError
                | FailureReason::OtherTransportError
        )
    }

    /// Short operator-facing advice for this failure.
    pub fn hint(&self) -> &'static str {
        match self {
            FailureReason::BadRequest => "Check the data format.",
            FailureReason::Unauthorized => "Check your API token.",
            FailureReason::NotFound => "Check the URL.",
            FailureReason::ServerError => "Server issue. Try again later.",
            FailureReason::Unavailable => "Service temporarily unavailable. Try again later.",
            FailureReason::Unknown => "Unexpected response from the server.",
            FailureReason::Timeout => "The request timed out.",
            FailureReason::ConnectionError => "Could not connect to the server.",
            FailureReason::OtherTransportError => "The request could not be sent.",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureReason::BadRequest => "Bad Request",
            FailureReason::Unauthorized => "Unauthorized",
            FailureReason::NotFound => "Endpoint not found",
            FailureReason::ServerError => "Internal Server Error",
            FailureReason::Unavailable => "Service Unavailable",
            FailureReason::Unknown => "Unexpected status",
            FailureReason::Timeout => "Request timed out",
            FailureReason::ConnectionError => "Connection error",
            FailureReason::OtherTransportError => "Request error",
        };
        f.write_str(label)
    }
}

/// Diagnostics for one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub reason: FailureReason,
    /// Response status, absent for transport failures.
    pub status: Option<u16>,
    /// Response body, or the transport error text.
    pub detail: String,
    /// Email of the record being submitted.
    pub user: String,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} for user {}", self.reason, self.user)?;
        if let Some(status) = self.status {
            write!(f, " (status {status})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// The result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmissionOutcome {
    Success,
    Failure(Failure),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SubmissionOutcome::Success => None,
            SubmissionOutcome::Failure(f) => Some(f),
        }
    }
}
