//! Question provider adapter.
//!
//! Collects exactly `count` questions for a topic by issuing sequential
//! fixed-size batch requests against a [`QuestionGenerator`]. Items that do not
//! match the question contract are dropped; a provider-level failure aborts the
//! whole fetch.

use crate::models::{validate_question, Question, ValidationIssue};
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of questions requested from the generator per call.
pub const BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("question count must be positive")]
    InvalidCount,
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("provider payload is not valid json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("provider payload must be a json array of questions")]
    NotAnArray,
    #[error("insufficient questions: requested {requested}, received {received}")]
    Insufficient { requested: usize, received: usize },
    #[error("provider failed: {0}")]
    Upstream(String),
}

/// One batch request against the text-generation service.
///
/// Returns the raw JSON text the service produced; an empty string means the
/// service answered without content.
pub trait QuestionGenerator: Send + Sync {
    fn generate_batch(
        &self,
        topic: &str,
        batch_size: usize,
    ) -> BoxFuture<'static, Result<String, ProviderError>>;
}

/// Offline generator producing deterministic questions.
#[derive(Default)]
pub struct MockQuestionGenerator {
    issued: AtomicUsize,
}

impl QuestionGenerator for MockQuestionGenerator {
    fn generate_batch(
        &self,
        topic: &str,
        batch_size: usize,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        let first = self.issued.fetch_add(batch_size, Ordering::SeqCst);
        let topic = topic.to_string();
        Box::pin(async move {
            let questions: Vec<Value> = (first..first + batch_size)
                .map(|n| {
                    serde_json::json!({
                        "question": format!("{}: question {}", topic, n + 1),
                        "options": ["is", "are", "was", "were"],
                        "correctAnswerIndex": n % 4,
                        "explanation": format!("Practice item {} for {}.", n + 1, topic),
                        "hint": "Check the subject."
                    })
                })
                .collect();
            Ok(Value::Array(questions).to_string())
        })
    }
}

/// Compiles the per-item question contract shipped in `contracts/`.
pub fn compile_item_schema() -> anyhow::Result<jsonschema::Validator> {
    let raw = include_str!("../contracts/question.schema.json");
    let schema: Value = serde_json::from_str(raw)?;
    jsonschema::draft202012::new(&schema)
        .map_err(|e| anyhow::anyhow!("question schema build failed: {}", e))
}

#[derive(Clone)]
pub struct QuestionProvider {
    generator: Arc<dyn QuestionGenerator>,
    item_schema: Arc<jsonschema::Validator>,
}

impl QuestionProvider {
    pub fn new(generator: Arc<dyn QuestionGenerator>, item_schema: jsonschema::Validator) -> Self {
        Self {
            generator,
            item_schema: Arc::new(item_schema),
        }
    }

    /// Fetch exactly `count` questions for `topic`, preserving provider order.
    pub async fn fetch_questions(
        &self,
        topic: &str,
        count: usize,
    ) -> Result<Vec<Question>, ProviderError> {
        if count == 0 {
            return Err(ProviderError::InvalidCount);
        }
        let num_batches = count.div_ceil(BATCH_SIZE);
        info!(topic, count, num_batches, "fetching questions");

        let mut collected = Vec::with_capacity(num_batches * BATCH_SIZE);
        for batch in 0..num_batches {
            let raw = self.generator.generate_batch(topic, BATCH_SIZE).await?;
            let accepted = self.parse_batch(&raw)?;
            debug!(batch, accepted = accepted.len(), "batch received");
            collected.extend(accepted);
            if collected.len() >= count {
                break;
            }
        }

        if collected.len() < count {
            return Err(ProviderError::Insufficient {
                requested: count,
                received: collected.len(),
            });
        }
        collected.truncate(count);
        Ok(collected)
    }

    fn parse_batch(&self, raw: &str) -> Result<Vec<Question>, ProviderError> {
        let cleaned = strip_code_fence(raw);
        if cleaned.is_empty() {
            warn!("provider returned an empty batch");
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(cleaned)?;
        let Value::Array(items) = value else {
            return Err(ProviderError::NotAnArray);
        };

        let mut accepted = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match self.check_item(item) {
                Ok(q) => accepted.push(q),
                Err(issues) => warn!(index, ?issues, "dropping invalid question"),
            }
        }
        Ok(accepted)
    }

    fn check_item(&self, item: Value) -> Result<Question, Vec<ValidationIssue>> {
        if !self.item_schema.is_valid(&item) {
            return Err(self
                .item_schema
                .iter_errors(&item)
                .map(|e| ValidationIssue::new(e.instance_path.to_string(), e.to_string()))
                .collect());
        }
        let question: Question = serde_json::from_value(item)
            .map_err(|e| vec![ValidationIssue::new("", e.to_string())])?;
        validate_question(&question)?;
        Ok(question)
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}
