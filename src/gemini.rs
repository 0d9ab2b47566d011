use crate::config::GeminiConfig;
use crate::provider::{ProviderError, QuestionGenerator};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// `generateContent` client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

pub fn batch_prompt(topic: &str, batch_size: usize) -> String {
    format!(
        "Generate {batch_size} unique, challenging English grammar multiple choice questions for the topic: \"{topic}\".\n\
         Each question must have exactly 4 options.\n\
         The questions should range from intermediate to advanced difficulty.\n\
         Provide a \"hint\" for each question that gives a small clue about the grammar rule involved without directly giving away the answer."
    )
}

/// Structured-output schema in the provider's own dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING", "description": "The grammar question text." },
                "options": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Exactly 4 multiple choice options."
                },
                "correctAnswerIndex": {
                    "type": "INTEGER",
                    "description": "The index of the correct answer (0-3)."
                },
                "explanation": {
                    "type": "STRING",
                    "description": "A clear explanation of why the correct answer is right and others are wrong."
                },
                "hint": {
                    "type": "STRING",
                    "description": "A helpful but subtle clue relating to the grammar rule."
                }
            },
            "required": ["question", "options", "correctAnswerIndex", "explanation", "hint"]
        }
    })
}

pub fn request_body(topic: &str, batch_size: usize, temperature: f32) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": batch_prompt(topic, batch_size) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
            "temperature": temperature
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Text of the first candidate; empty when the model produced none.
fn candidate_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Ok(text)
}

impl QuestionGenerator for GeminiClient {
    fn generate_batch(
        &self,
        topic: &str,
        batch_size: usize,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        let http = self.http.clone();
        let url = self.endpoint();
        let api_key = self.config.api_key.clone();
        let body = request_body(topic, batch_size, self.config.temperature);

        Box::pin(async move {
            let resp = http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await?;
            let status = resp.status();
            let text = resp.text().await?;
            if !status.is_success() {
                warn!(%status, body = %text.chars().take(512).collect::<String>(), "gemini request rejected");
                return Err(ProviderError::HttpStatus(status));
            }
            let content = candidate_text(&text)?;
            debug!(bytes = content.len(), "gemini batch received");
            Ok(content)
        })
    }
}
