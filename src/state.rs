use crate::catalog::TopicCatalog;
use crate::machine::{AttemptId, FetchOutcome, FetchTicket, QuizMachine, TransitionError};
use crate::models::Topic;
use crate::preferences::{PreferenceStore, Preferences, PreferencesPatch};
use crate::provider::QuestionProvider;
use crate::session::AnswerFeedback;
use crate::view::QuizView;
use crate::ws_protocol::{WsEnvelope, EVENT_ANSWER_FEEDBACK, EVENT_STATUS_CHANGED};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard, RwLock};
use tokio::task::AbortHandle;
use tracing::{info, warn};

/// The state machine plus the fetch task issued for its pending attempt.
#[derive(Default)]
pub struct QuizCore {
    pub machine: QuizMachine,
    inflight: Option<(AttemptId, AbortHandle)>,
}

impl QuizCore {
    fn cancel_inflight(&mut self) {
        if let Some((attempt, handle)) = self.inflight.take() {
            info!(%attempt, "cancelling superseded question fetch");
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<Mutex<QuizCore>>,
    pub provider: QuestionProvider,
    pub catalog: Arc<TopicCatalog>,
    pub preferences: Arc<RwLock<Preferences>>,
    pub preference_store: Arc<dyn PreferenceStore>,
    pub events: broadcast::Sender<WsEnvelope>,
}

impl AppState {
    pub fn new(
        provider: QuestionProvider,
        catalog: TopicCatalog,
        preference_store: Arc<dyn PreferenceStore>,
        preferences: Preferences,
    ) -> Self {
        let (events, _) = broadcast::channel(200);
        Self {
            core: Arc::new(Mutex::new(QuizCore::default())),
            provider,
            catalog: Arc::new(catalog),
            preferences: Arc::new(RwLock::new(preferences)),
            preference_store,
            events,
        }
    }

    pub async fn view(&self) -> QuizView {
        QuizView::from_machine(&self.core.lock().await.machine)
    }

    fn publish_status(
        &self,
        core: &MutexGuard<'_, QuizCore>,
        request_id: Option<String>,
    ) -> QuizView {
        let view = QuizView::from_machine(&core.machine);
        let _ = self.events.send(WsEnvelope::new(
            EVENT_STATUS_CHANGED,
            json!(view),
            request_id,
        ));
        view
    }

    fn spawn_fetch(&self, core: &mut QuizCore, ticket: FetchTicket) {
        core.cancel_inflight();
        info!(attempt = %ticket.attempt, topic = %ticket.topic, count = ticket.count, "starting question fetch");
        let attempt = ticket.attempt;
        let state = self.clone();
        let handle = tokio::spawn(async move {
            state.run_fetch(ticket).await;
        });
        core.inflight = Some((attempt, handle.abort_handle()));
    }

    /// Runs the fetch for `ticket` and applies its result to the machine.
    pub async fn run_fetch(&self, ticket: FetchTicket) -> FetchOutcome {
        let result = self
            .provider
            .fetch_questions(&ticket.topic, ticket.count)
            .await;
        let mut core = self.core.lock().await;
        let outcome = core.machine.complete_fetch(ticket.attempt, result);
        if outcome != FetchOutcome::Stale {
            if matches!(core.inflight, Some((attempt, _)) if attempt == ticket.attempt) {
                core.inflight = None;
            }
            self.publish_status(&core, None);
        }
        info!(attempt = %ticket.attempt, ?outcome, "question fetch settled");
        outcome
    }

    pub async fn select_topic(
        &self,
        topic: Topic,
        request_id: Option<String>,
    ) -> Result<QuizView, TransitionError> {
        let mut core = self.core.lock().await;
        core.machine.select_topic(topic)?;
        Ok(self.publish_status(&core, request_id))
    }

    pub async fn start_session(
        &self,
        count: usize,
        request_id: Option<String>,
    ) -> Result<QuizView, TransitionError> {
        let mut core = self.core.lock().await;
        let ticket = core.machine.start_session(count)?;
        self.spawn_fetch(&mut core, ticket);
        Ok(self.publish_status(&core, request_id))
    }

    pub async fn select_option(
        &self,
        option: usize,
        request_id: Option<String>,
    ) -> Result<(Option<AnswerFeedback>, QuizView), TransitionError> {
        let mut core = self.core.lock().await;
        let feedback = core.machine.select_option(option)?;
        if let Some(fb) = &feedback {
            let muted = self.preferences.read().await.muted;
            let _ = self.events.send(WsEnvelope::new(
                EVENT_ANSWER_FEEDBACK,
                json!({ "feedback": fb, "muted": muted }),
                request_id.clone(),
            ));
        }
        let view = self.publish_status(&core, request_id);
        Ok((feedback, view))
    }

    pub async fn toggle_hint(&self, request_id: Option<String>) -> Result<QuizView, TransitionError> {
        let mut core = self.core.lock().await;
        core.machine.toggle_hint()?;
        Ok(self.publish_status(&core, request_id))
    }

    pub async fn advance(&self, request_id: Option<String>) -> Result<QuizView, TransitionError> {
        let mut core = self.core.lock().await;
        core.machine.advance()?;
        Ok(self.publish_status(&core, request_id))
    }

    pub async fn restart(&self, request_id: Option<String>) -> Result<QuizView, TransitionError> {
        let mut core = self.core.lock().await;
        let ticket = core.machine.restart()?;
        self.spawn_fetch(&mut core, ticket);
        Ok(self.publish_status(&core, request_id))
    }

    pub async fn reconfigure(&self, request_id: Option<String>) -> Result<QuizView, TransitionError> {
        let mut core = self.core.lock().await;
        core.machine.reconfigure()?;
        Ok(self.publish_status(&core, request_id))
    }

    pub async fn back_to_home(&self, request_id: Option<String>) -> QuizView {
        let mut core = self.core.lock().await;
        core.machine.back_to_home();
        core.cancel_inflight();
        self.publish_status(&core, request_id)
    }

    pub async fn current_preferences(&self) -> Preferences {
        *self.preferences.read().await
    }

    /// Applies `patch` in memory, then persists; a failed write is only logged.
    ///
    /// The write guard is held across the save so stored snapshots land in
    /// the same order as the in-memory updates.
    pub async fn update_preferences(&self, patch: &PreferencesPatch) -> Preferences {
        let mut prefs = self.preferences.write().await;
        prefs.apply(patch);
        let updated = *prefs;
        if let Err(err) = self.preference_store.save(updated).await {
            warn!("failed to persist preferences: {}", err);
        }
        updated
    }
}
