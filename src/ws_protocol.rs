use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_STATUS_CHANGED: &str = "status_changed";
pub const EVENT_ANSWER_FEEDBACK: &str = "answer_feedback";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEnvelope {
    pub event: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl WsEnvelope {
    pub fn new(event: &str, payload: Value, request_id: Option<String>) -> Self {
        Self {
            event: event.to_string(),
            payload,
            request_id,
            ts: Some(Utc::now().to_rfc3339()),
        }
    }
}
