use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{LeadContact, LeadSubmission, LeadValidationError, Profile, ResultsPayload};

/// Transport seam so the clients can be exercised with in-memory doubles.
#[async_trait]
pub trait JsonGateway: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<JsonReply, GatewayError>;
}

/// Status plus the decoded body, when the body was valid JSON.
#[derive(Debug, Clone)]
pub struct JsonReply {
    pub status: u16,
    pub body: Option<Value>,
}

impl JsonReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request never produced a response (connect failure, timeout, …).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Production gateway over reqwest with a shared request timeout.
#[derive(Clone)]
pub struct HttpJsonGateway {
    client: reqwest::Client,
}

impl HttpJsonGateway {
    /// Fails when the underlying client cannot be constructed (for example a
    /// broken TLS backend); callers surface that at startup.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JsonGateway for HttpJsonGateway {
    async fn post_json(&self, url: &str, body: &Value) -> Result<JsonReply, GatewayError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        // A non-JSON body is not fatal by itself; callers fall back to their
        // generic failure message when there is nothing to extract.
        let body = response.json::<Value>().await.ok();
        Ok(JsonReply { status, body })
    }
}

/// Client for `POST /api/calculate-scholarships`.
pub struct ScholarshipQueryClient<G> {
    gateway: Arc<G>,
    base_url: String,
}

/// A successful calculation either carries matches or explicitly has none.
///
/// The empty case is surfaced as its own outcome so the results stage is only
/// ever entered with at least one scholarship to show.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Matches(ResultsPayload),
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Non-success status; message extracted from the response `detail`.
    #[error("{0}")]
    Rejected(String),
    /// Transport failure or a success body without a usable `data` field.
    #[error("Failed to calculate scholarships.")]
    Unavailable,
}

impl<G: JsonGateway> ScholarshipQueryClient<G> {
    pub fn new(gateway: Arc<G>, base_url: impl Into<String>) -> Self {
        Self {
            gateway,
            base_url: base_url.into(),
        }
    }

    pub async fn query(&self, profile: &Profile) -> Result<QueryOutcome, QueryError> {
        let url = endpoint(&self.base_url, "/api/calculate-scholarships");
        let reply = self
            .gateway
            .post_json(&url, &profile.as_value())
            .await
            .map_err(|err| {
                warn!(%url, %err, "scholarship calculation request failed");
                QueryError::Unavailable
            })?;

        if !reply.is_success() {
            let message = detail_message(reply.body.as_ref());
            warn!(%url, status = reply.status, %message, "scholarship calculation rejected");
            return Err(QueryError::Rejected(message));
        }

        let payload = reply
            .body
            .as_ref()
            .and_then(|body| body.get("data"))
            .and_then(|data| serde_json::from_value::<ResultsPayload>(data.clone()).ok())
            .ok_or(QueryError::Unavailable)?;

        if payload.is_empty() {
            info!(%url, "calculation succeeded with no matches");
            return Ok(QueryOutcome::NoMatches);
        }

        info!(%url, matches = payload.scholarships.len(), "calculation succeeded");
        Ok(QueryOutcome::Matches(payload))
    }
}

/// Client for `POST /api/submit-lead`.
pub struct LeadSubmissionClient<G> {
    gateway: Arc<G>,
    base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadError {
    /// Blank contact field; short-circuits before any request is issued.
    #[error(transparent)]
    Validation(#[from] LeadValidationError),
    /// Non-success status; `detail` string when present, generic otherwise.
    #[error("{0}")]
    Rejected(String),
    #[error("Failed to submit form. Please try again.")]
    Unavailable,
}

impl<G: JsonGateway> LeadSubmissionClient<G> {
    pub fn new(gateway: Arc<G>, base_url: impl Into<String>) -> Self {
        Self {
            gateway,
            base_url: base_url.into(),
        }
    }

    pub async fn submit(
        &self,
        contact: &LeadContact,
        profile: &Profile,
        results: &ResultsPayload,
    ) -> Result<(), LeadError> {
        contact.validate()?;

        let url = endpoint(&self.base_url, "/api/submit-lead");
        let submission = LeadSubmission::new(contact, profile, results);
        let body = serde_json::to_value(&submission).map_err(|_| LeadError::Unavailable)?;

        let reply = self.gateway.post_json(&url, &body).await.map_err(|err| {
            warn!(%url, %err, "lead submission request failed");
            LeadError::Unavailable
        })?;

        if !reply.is_success() {
            let message = reply
                .body
                .as_ref()
                .and_then(|body| body.get("detail"))
                .and_then(Value::as_str)
                .unwrap_or("Failed to submit form")
                .to_string();
            warn!(%url, status = reply.status, %message, "lead submission rejected");
            return Err(LeadError::Rejected(message));
        }

        info!(%url, email = %submission.email, "lead submitted");
        Ok(())
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Extraction policy for calculation failures.
///
/// A string `detail` is used verbatim. A list-shaped `detail` of validation
/// errors is joined as `"<dot-joined loc>: <msg>"` with `"; "`. Anything else
/// falls back to a generic message.
fn detail_message(body: Option<&Value>) -> String {
    match body.and_then(|body| body.get("detail")) {
        Some(Value::String(detail)) => detail.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let loc = item
                    .get("loc")
                    .and_then(Value::as_array)
                    .map(|parts| {
                        parts
                            .iter()
                            .map(|part| match part {
                                Value::String(part) => part.clone(),
                                other => other.to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(".")
                    })
                    .unwrap_or_default();
                let msg = item.get("msg").and_then(Value::as_str).unwrap_or_default();
                format!("{loc}: {msg}")
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => "Validation failed".to_string(),
    }
}

