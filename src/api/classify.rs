use crate::record::Record;

use super::types::{Failure, FailureReason, SubmissionOutcome};

/// Maps a response status and body to the outcome of a creation attempt.
///
/// Only 201 counts as success. Every failure keeps the raw status and body.
pub fn classify(status: u16, body: &str, record: &Record) -> SubmissionOutcome {
    let reason = match status {
        201 => return SubmissionOutcome::Success,
        400 => FailureReason::BadRequest,
        401 => FailureReason::Unauthorized,
        404 => FailureReason::NotFound,
        500 => FailureReason::ServerError,
        503 => FailureReason::Unavailable,
        _ => FailureReason::Unknown,
    };
    SubmissionOutcome::Failure(Failure {
        reason,
        status: Some(status),
        detail: body.to_string(),
        user: record.email().to_string(),
    })
}
