//! Application status and the transitions between its views.
//!
//! The status is a sum type: a session exists only in `Active`/`Finished` and
//! a topic is selected only in `Setup`/`Loading`. Every entry into `Loading`
//! mints a fresh [`AttemptId`]; fetch completions carrying any other id are
//! discarded.

use crate::models::{Question, Topic};
use crate::provider::ProviderError;
use crate::session::{AnswerFeedback, Progress, QuizSession, SessionError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// User-facing message shown on the setup screen after a failed fetch.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to generate questions. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Setup,
    Loading,
    Active,
    Finished,
}

impl StatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Idle => "idle",
            StatusKind::Setup => "setup",
            StatusKind::Loading => "loading",
            StatusKind::Active => "active",
            StatusKind::Finished => "finished",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppStatus {
    #[default]
    Idle,
    Setup { topic: Topic, error: Option<String> },
    Loading { topic: Topic, count: usize, attempt: AttemptId },
    Active(QuizSession),
    Finished(QuizSession),
}

impl AppStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            AppStatus::Idle => StatusKind::Idle,
            AppStatus::Setup { .. } => StatusKind::Setup,
            AppStatus::Loading { .. } => StatusKind::Loading,
            AppStatus::Active(_) => StatusKind::Active,
            AppStatus::Finished(_) => StatusKind::Finished,
        }
    }
}

/// Work order for the provider, issued on entry into `Loading`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub attempt: AttemptId,
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Activated,
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("cannot {action} while {status}")]
    NotAllowed {
        action: &'static str,
        status: StatusKind,
    },
    #[error("question count must be positive")]
    InvalidCount,
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Default)]
pub struct QuizMachine {
    status: AppStatus,
    last_attempt: u64,
}

impl QuizMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &AppStatus {
        &self.status
    }

    pub fn kind(&self) -> StatusKind {
        self.status.kind()
    }

    pub fn selected_topic(&self) -> Option<&Topic> {
        match &self.status {
            AppStatus::Setup { topic, .. } | AppStatus::Loading { topic, .. } => Some(topic),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.status {
            AppStatus::Active(session) | AppStatus::Finished(session) => Some(session),
            _ => None,
        }
    }

    pub fn pending_attempt(&self) -> Option<AttemptId> {
        match &self.status {
            AppStatus::Loading { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    fn not_allowed(&self, action: &'static str) -> TransitionError {
        TransitionError::NotAllowed {
            action,
            status: self.kind(),
        }
    }

    fn enter_loading(&mut self, topic: Topic, count: usize) -> FetchTicket {
        self.last_attempt += 1;
        let attempt = AttemptId(self.last_attempt);
        let ticket = FetchTicket {
            attempt,
            topic: topic.name.clone(),
            count,
        };
        self.status = AppStatus::Loading {
            topic,
            count,
            attempt,
        };
        ticket
    }

    pub fn select_topic(&mut self, topic: Topic) -> Result<(), TransitionError> {
        if !matches!(self.status, AppStatus::Idle) {
            return Err(self.not_allowed("select a topic"));
        }
        self.status = AppStatus::Setup { topic, error: None };
        Ok(())
    }

    pub fn start_session(&mut self, count: usize) -> Result<FetchTicket, TransitionError> {
        let AppStatus::Setup { topic, .. } = &self.status else {
            return Err(self.not_allowed("start a session"));
        };
        if count == 0 {
            return Err(TransitionError::InvalidCount);
        }
        let topic = topic.clone();
        Ok(self.enter_loading(topic, count))
    }

    /// Applies the result of the fetch issued for `attempt`.
    ///
    /// Results for anything but the pending attempt are dropped.
    pub fn complete_fetch(
        &mut self,
        attempt: AttemptId,
        result: Result<Vec<Question>, ProviderError>,
    ) -> FetchOutcome {
        let (topic, count) = match std::mem::take(&mut self.status) {
            AppStatus::Loading {
                topic,
                count,
                attempt: pending,
            } if pending == attempt => (topic, count),
            other => {
                debug!(%attempt, status = %other.kind(), "discarding stale fetch result");
                self.status = other;
                return FetchOutcome::Stale;
            }
        };

        let session = match result {
            Ok(questions) => {
                QuizSession::new(topic.clone(), count, questions).map_err(|e| e.to_string())
            }
            Err(err) => Err(err.to_string()),
        };
        match session {
            Ok(session) => {
                self.status = AppStatus::Active(session);
                FetchOutcome::Activated
            }
            Err(cause) => {
                warn!(%attempt, topic = %topic.name, %cause, "question fetch failed");
                self.status = AppStatus::Setup {
                    topic,
                    error: Some(FETCH_FAILED_MESSAGE.to_string()),
                };
                FetchOutcome::Failed
            }
        }
    }

    pub fn select_option(
        &mut self,
        option: usize,
    ) -> Result<Option<AnswerFeedback>, TransitionError> {
        match &mut self.status {
            AppStatus::Active(session) => Ok(session.select_option(option)?),
            _ => Err(self.not_allowed("answer")),
        }
    }

    pub fn toggle_hint(&mut self) -> Result<bool, TransitionError> {
        match &mut self.status {
            AppStatus::Active(session) => Ok(session.toggle_hint()?),
            _ => Err(self.not_allowed("show a hint")),
        }
    }

    pub fn advance(&mut self) -> Result<StatusKind, TransitionError> {
        let AppStatus::Active(session) = &mut self.status else {
            return Err(self.not_allowed("advance"));
        };
        match session.advance()? {
            Progress::Next => Ok(StatusKind::Active),
            Progress::Completed => {
                if let AppStatus::Active(session) = std::mem::take(&mut self.status) {
                    self.status = AppStatus::Finished(session);
                }
                Ok(StatusKind::Finished)
            }
        }
    }

    /// Re-fetches fresh questions for the finished session's topic and count.
    pub fn restart(&mut self) -> Result<FetchTicket, TransitionError> {
        let AppStatus::Finished(session) = &self.status else {
            return Err(self.not_allowed("restart"));
        };
        let topic = session.topic().clone();
        let count = session.count();
        Ok(self.enter_loading(topic, count))
    }

    /// Returns to the setup screen of the finished session's topic.
    pub fn reconfigure(&mut self) -> Result<(), TransitionError> {
        let AppStatus::Finished(session) = &self.status else {
            return Err(self.not_allowed("reconfigure"));
        };
        self.status = AppStatus::Setup {
            topic: session.topic().clone(),
            error: None,
        };
        Ok(())
    }

    /// Drops any session and selected topic; returns the superseded attempt, if any.
    pub fn back_to_home(&mut self) -> Option<AttemptId> {
        let superseded = self.pending_attempt();
        self.status = AppStatus::Idle;
        superseded
    }
}
