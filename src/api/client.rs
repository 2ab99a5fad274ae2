use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use super::classify::classify;
use super::types::{Failure, FailureReason, SubmissionOutcome};
use crate::error::EnrollError;
use crate::logging::EventSink;
use crate::record::Record;

/// Upper bound on a single submission attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Request headers shared by every submission in a run.
#[derive(Debug, Clone)]
pub struct Headers(HeaderMap);

impl Headers {
    /// Builds `Content-Type: application/json` and `Authorization: Bearer <token>`.
    pub fn new(api_token: &str) -> Result<Self, EnrollError> {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_token}"))?;
        auth.set_sensitive(true);
        map.insert(AUTHORIZATION, auth);
        Ok(Self(map))
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.0
    }
}

/// Performs one creation attempt per call and reports its outcome.
pub struct Submitter {
    client: Client,
    sink: Arc<dyn EventSink>,
}

impl Submitter {
    pub fn new(sink: Arc<dyn EventSink>) -> Result<Self, EnrollError> {
        Self::with_timeout(REQUEST_TIMEOUT, sink)
    }

    /// Create a submitter with a custom per-request timeout (useful for testing).
    pub fn with_timeout(timeout: Duration, sink: Arc<dyn EventSink>) -> Result<Self, EnrollError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, sink })
    }

    /// POSTs `record` as JSON to `endpoint_url`. Never returns an error:
    /// transport failures become [`SubmissionOutcome::Failure`] values.
    pub async fn submit(
        &self,
        record: &Record,
        endpoint_url: &str,
        headers: &Headers,
    ) -> SubmissionOutcome {
        let result = self
            .client
            .post(endpoint_url)
            .headers(headers.as_map().clone())
            .json(record)
            .send()
            .await;

        let outcome = match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
                classify(status, &body, record)
            }
            Err(e) => SubmissionOutcome::Failure(Failure {
                reason: transport_reason(&e),
                status: None,
                detail: e.to_string(),
                user: record.email().to_string(),
            }),
        };

        match &outcome {
            SubmissionOutcome::Success => {
                self.sink
                    .info(format!("Created user {} at {endpoint_url}", record.email()));
            }
            SubmissionOutcome::Failure(failure) => {
                let origin = if failure.reason.is_server_rejection() {
                    "Server rejected request"
                } else {
                    "Transport failure"
                };
                self.sink.error(format!(
                    "{origin}: {failure}. {} Endpoint: {endpoint_url}. Data: {record}",
                    failure.reason.hint()
                ));
            }
        }
        outcome
    }
}

fn transport_reason(err: &reqwest::Error) -> FailureReason {
    if err.is_timeout() {
        FailureReason::Timeout
    } else if err.is_connect() {
        FailureReason::ConnectionError
    } else {
        FailureReason::OtherTransportError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Level, MemorySink};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ada() -> Record {
        [("name", "Ada"), ("email", "ada@example.com"), ("role", "admin")]
            .into_iter()
            .collect()
    }

    fn submitter(sink: &Arc<MemorySink>) -> Submitter {
        Submitter::new(sink.clone()).unwrap()
    }

    #[test]
    fn headers_carry_bearer_token() {
        let headers = Headers::new("secret").unwrap();
        let map = headers.as_map();
        assert_eq!(map[CONTENT_TYPE], "application/json");
        assert_eq!(map[AUTHORIZATION], "Bearer secret");
        assert!(map[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(matches!(
            Headers::new("bad\ntoken"),
            Err(EnrollError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn created_response_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(header("authorization", "Bearer secret"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "role": "admin"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let sink = Arc::new(MemorySink::new());
        let url = format!("{}/users", server.uri());
        let outcome = submitter(&sink)
            .submit(&ada(), &url, &Headers::new("secret").unwrap())
            .await;

        assert_eq!(outcome, SubmissionOutcome::Success);
        let infos = sink.messages(Level::Info);
        assert_eq!(infos.len(), 1);
        assert!(infos[0].contains("ada@example.com"));
        assert!(sink.messages(Level::Error).is_empty());
    }

    #[tokio::test]
    async fn rejection_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let sink = Arc::new(MemorySink::new());
        let outcome = submitter(&sink)
            .submit(&ada(), &server.uri(), &Headers::new("secret").unwrap())
            .await;

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.reason, FailureReason::Unavailable);
        assert_eq!(failure.status, Some(503));
        assert_eq!(failure.detail, "maintenance");

        let errors = sink.messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Server rejected request"));
        assert!(errors[0].contains("Service Unavailable"));
        assert!(errors[0].contains("maintenance"));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let sink = Arc::new(MemorySink::new());
        let submitter = Submitter::with_timeout(Duration::from_millis(100), sink.clone()).unwrap();
        let outcome = submitter
            .submit(&ada(), &server.uri(), &Headers::new("secret").unwrap())
            .await;

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.reason, FailureReason::Timeout);
        assert_eq!(failure.status, None);
    }

    #[tokio::test]
    async fn refused_connection_is_connection_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let sink = Arc::new(MemorySink::new());
        let outcome = submitter(&sink)
            .submit(&ada(), &format!("http://{addr}/users"), &Headers::new("secret").unwrap())
            .await;

        assert_eq!(outcome.failure().unwrap().reason, FailureReason::ConnectionError);
        let errors = sink.messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Transport failure"));
    }

    #[tokio::test]
    async fn invalid_url_is_other_transport_error() {
        let sink = Arc::new(MemorySink::new());
        let outcome = submitter(&sink)
            .submit(&ada(), "not a url", &Headers::new("secret").unwrap())
            .await;

        assert_eq!(
            outcome.failure().unwrap().reason,
            FailureReason::OtherTransportError
        );
    }
}
