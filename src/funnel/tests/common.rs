use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::UpstreamConfig;
use crate::funnel::domain::{LeadContact, Profile, ResultsPayload, ScholarshipResult};
use crate::funnel::upstream::{GatewayError, JsonGateway, JsonReply};

/// Gateway double that replays queued replies and records every request.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    replies: Mutex<Vec<Result<JsonReply, GatewayError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedGateway {
    pub(super) fn with_reply(status: u16, body: Option<Value>) -> Self {
        let gateway = Self::default();
        gateway.push(Ok(JsonReply { status, body }));
        gateway
    }

    pub(super) fn push(&self, reply: Result<JsonReply, GatewayError>) {
        self.replies
            .lock()
            .expect("replies mutex poisoned")
            .push(reply);
    }

    pub(super) fn push_status(&self, status: u16, body: Option<Value>) {
        self.push(Ok(JsonReply { status, body }));
    }

    pub(super) fn push_transport_failure(&self) {
        self.push(Err(GatewayError::Transport(
            "connection refused".to_string(),
        )));
    }

    pub(super) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl JsonGateway for ScriptedGateway {
    async fn post_json(&self, url: &str, body: &Value) -> Result<JsonReply, GatewayError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((url.to_string(), body.clone()));
        let mut replies = self.replies.lock().expect("replies mutex poisoned");
        if replies.is_empty() {
            return Err(GatewayError::Transport("no scripted reply".to_string()));
        }
        replies.remove(0)
    }
}

pub(super) fn profile() -> Profile {
    Profile(
        json!({"goal": "engineering"})
            .as_object()
            .expect("object literal")
            .clone(),
    )
}

pub(super) fn scholarship(name: &str, score: u8) -> ScholarshipResult {
    ScholarshipResult {
        name: name.to_string(),
        amount: "$500".to_string(),
        deadline: "2025-01-01".to_string(),
        match_score: score,
        one_liner_reason: "strong fit".to_string(),
    }
}

pub(super) fn results_payload(count: usize) -> ResultsPayload {
    ResultsPayload {
        scholarships: (0..count)
            .map(|idx| scholarship(&format!("S{idx}"), 92 - idx as u8))
            .collect(),
        summary_probability: 80,
    }
}

/// Success body mirroring the calculation endpoint contract.
pub(super) fn matches_body(count: usize) -> Value {
    json!({ "success": true, "data": results_payload(count) })
}

pub(super) fn contact() -> LeadContact {
    LeadContact {
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: "+91 9876543210".to_string(),
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn upstream_config() -> UpstreamConfig {
    UpstreamConfig {
        scholarship_base_url: "http://upstream.test".to_string(),
        lead_base_url: "http://leads.test".to_string(),
        request_timeout: Duration::from_secs(5),
    }
}
