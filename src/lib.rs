pub mod catalog;
pub mod config;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod machine;
pub mod models;
pub mod preferences;
pub mod provider;
pub mod routes;
pub mod session;
pub mod state;
pub mod view;
pub mod ws_protocol;

use std::sync::Arc;
use tracing::{info, warn};

pub async fn build_state(config: &config::AppConfig) -> anyhow::Result<state::AppState> {
    let item_schema = provider::compile_item_schema()?;
    let generator: Arc<dyn provider::QuestionGenerator> = match &config.gemini {
        Some(gemini_config) => {
            info!(model = %gemini_config.model, "using Gemini question generator");
            Arc::new(gemini::GeminiClient::new(gemini_config.clone())?)
        }
        None => {
            warn!("no Gemini API key configured, serving mock questions");
            Arc::new(provider::MockQuestionGenerator::default())
        }
    };

    let store: Arc<dyn preferences::PreferenceStore> = match &config.preferences_path {
        Some(path) => Arc::new(preferences::JsonFilePreferenceStore::new(path.clone())),
        None => Arc::new(preferences::InMemoryPreferenceStore::default()),
    };
    let prefs = match store.load().await {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!("failed to load preferences, using defaults: {}", err);
            preferences::Preferences::default()
        }
    };

    Ok(state::AppState::new(
        provider::QuestionProvider::new(generator, item_schema),
        catalog::TopicCatalog::builtin(),
        store,
        prefs,
    ))
}
