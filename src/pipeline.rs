//! Drives records through validation and submission, one at a time.
//!
//! Each record ends in exactly one [`RecordOutcome`]. A failure on one record
//! never stops the run; the loop only ever produces outcomes.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::{Failure, Headers, Submitter};
use crate::backoff::{BackoffController, Delay};
use crate::error::EnrollError;
use crate::logging::EventSink;
use crate::record::{Record, validate};
use crate::source::{SourceError, read_records};

/// Terminal result for one input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RecordOutcome {
    /// The API accepted the record.
    Created { email: String, attempts: u32 },
    /// The record failed validation and was never submitted.
    Skipped { missing: Vec<String> },
    /// Every permitted attempt failed.
    Exhausted {
        email: String,
        attempts: u32,
        last_failure: Option<Failure>,
    },
}

/// Aggregated result of a run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<RecordOutcome>,
    /// Set when the record source could not be read.
    #[serde(skip)]
    pub source_error: Option<SourceError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            outcomes: Vec::new(),
            source_error: None,
            started_at: now,
            finished_at: now,
        }
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped { .. }))
    }

    pub fn exhausted(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Exhausted { .. }))
    }

    /// True when no record was read.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} skipped, {} failed",
            self.created(),
            self.skipped(),
            self.exhausted()
        )
    }
}

/// Observer notified as the run advances. Both hooks default to no-ops.
pub trait Progress {
    fn started(&mut self, _total: usize) {}
    fn record_finished(&mut self, _index: usize, _record: &Record, _outcome: &RecordOutcome) {}
}

impl Progress for () {}

/// Reads `path`, turning an unreadable source into empty input.
/// The error is reported to `sink` and handed back for the operator.
pub fn load_records(path: &Path, sink: &dyn EventSink) -> (Vec<Record>, Option<SourceError>) {
    match read_records(path) {
        Ok(records) => (records, None),
        Err(e) => {
            sink.error(format!("Failed to read records: {e}"));
            (Vec::new(), Some(e))
        }
    }
}

/// Validator, backoff controller and submitter wired together.
pub struct Pipeline<D> {
    submitter: Submitter,
    backoff: BackoffController<D>,
    sink: Arc<dyn EventSink>,
}

impl<D: Delay> Pipeline<D> {
    pub fn new(submitter: Submitter, backoff: BackoffController<D>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            submitter,
            backoff,
            sink,
        }
    }

    /// Processes `records` in order. Fails only if `api_token` cannot be
    /// turned into request headers, before any record is touched.
    pub async fn process(
        &self,
        records: &[Record],
        endpoint_url: &str,
        api_token: &str,
    ) -> Result<RunSummary, EnrollError> {
        self.process_with(records, endpoint_url, api_token, &mut ())
            .await
    }

    pub async fn process_with(
        &self,
        records: &[Record],
        endpoint_url: &str,
        api_token: &str,
        progress: &mut impl Progress,
    ) -> Result<RunSummary, EnrollError> {
        let headers = Headers::new(api_token)?;
        let span = tracing::info_span!("run", run_id = %Uuid::new_v4().simple());
        let summary = self
            .drive(RunSummary::started(), records, endpoint_url, &headers, progress)
            .instrument(span)
            .await;
        Ok(summary)
    }

    /// Reads `path` and processes its records. An unreadable source is
    /// reported and treated as empty input.
    pub async fn run_file(
        &self,
        path: &Path,
        endpoint_url: &str,
        api_token: &str,
        progress: &mut impl Progress,
    ) -> Result<RunSummary, EnrollError> {
        let headers = Headers::new(api_token)?;
        let mut summary = RunSummary::started();

        let (records, source_error) = load_records(path, self.sink.as_ref());
        summary.source_error = source_error;

        let span = tracing::info_span!(
            "run",
            run_id = %Uuid::new_v4().simple(),
            file = %path.display()
        );
        Ok(self
            .drive(summary, &records, endpoint_url, &headers, progress)
            .instrument(span)
            .await)
    }

    async fn drive(
        &self,
        mut summary: RunSummary,
        records: &[Record],
        endpoint_url: &str,
        headers: &Headers,
        progress: &mut impl Progress,
    ) -> RunSummary {
        if records.is_empty() {
            self.sink.warning("No records found in the provided file.");
            summary.finished_at = Utc::now();
            return summary;
        }

        progress.started(records.len());
        for (index, record) in records.iter().enumerate() {
            let outcome = self.process_record(record, endpoint_url, headers).await;
            progress.record_finished(index, record, &outcome);
            summary.outcomes.push(outcome);
        }

        summary.finished_at = Utc::now();
        self.sink.info(format!("Run complete: {summary}"));
        summary
    }

    async fn process_record(&self, record: &Record, endpoint_url: &str, headers: &Headers) -> RecordOutcome {
        let validation = validate(record);
        if !validation.is_valid() {
            self.sink.error(format!(
                "Validation failed. Missing fields: {:?}. Data: {record}",
                validation.missing
            ));
            return RecordOutcome::Skipped {
                missing: validation.missing,
            };
        }

        let submitter = &self.submitter;
        let report = self
            .backoff
            .retry_with_report(move || submitter.submit(record, endpoint_url, headers))
            .await;

        let email = record.email().to_string();
        if report.succeeded {
            self.sink.info(format!("Successfully created user: {email}"));
            RecordOutcome::Created {
                email,
                attempts: report.attempts,
            }
        } else {
            self.sink.error(format!(
                "Failed to create user after {} attempts: {email}. Data: {record}",
                report.attempts
            ));
            RecordOutcome::Exhausted {
                email,
                attempts: report.attempts,
                last_failure: report.last.and_then(|o| o.failure().cloned()),
            }
        }
    }
}
