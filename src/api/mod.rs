pub mod classify;
pub mod client;
pub mod types;

pub use classify::classify;
pub use client::{Headers, Submitter};
pub use types::{Failure, FailureReason, SubmissionOutcome};
