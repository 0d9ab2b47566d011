use crate::catalog::{MAX_QUESTION_COUNT, QUESTION_COUNT_OPTIONS};
use crate::error::AppError;
use crate::models::Topic;
use crate::preferences::{Preferences, PreferencesPatch};
use crate::session::AnswerFeedback;
use crate::state::AppState;
use crate::view::QuizView;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use validator::Validate;

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectTopicPayload {
    #[validate(length(min = 1))]
    pub topic_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionPayload {
    #[validate(range(min = 1, max = MAX_QUESTION_COUNT))]
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnswerPayload {
    pub option: usize,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub feedback: Option<AnswerFeedback>,
    pub quiz: QuizView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicsResponse {
    pub topics: Vec<Topic>,
    pub count_options: [usize; 4],
}

pub async fn list_topics(State(state): State<AppState>) -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: state.catalog.topics().to_vec(),
        count_options: QUESTION_COUNT_OPTIONS,
    })
}

pub async fn get_quiz(State(state): State<AppState>) -> Json<QuizView> {
    Json(state.view().await)
}

pub async fn select_topic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SelectTopicPayload>,
) -> Result<Json<QuizView>, AppError> {
    let req_id = request_id_from_headers(&headers);
    if let Err(errors) = payload.validate() {
        return Err(AppError::validation(&errors, req_id));
    }
    let topic = state
        .catalog
        .find(payload.topic_id.trim())
        .cloned()
        .ok_or_else(|| AppError::not_found("topic not found", req_id.clone()))?;
    info!(topic = %topic.id, "topic selected");
    let view = state
        .select_topic(topic, Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok(Json(view))
}

pub async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StartSessionPayload>,
) -> Result<(StatusCode, Json<QuizView>), AppError> {
    let req_id = request_id_from_headers(&headers);
    if let Err(errors) = payload.validate() {
        return Err(AppError::validation(&errors, req_id));
    }
    let view = state
        .start_session(payload.count, Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub async fn answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<AnswerResponse>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let (feedback, quiz) = state
        .select_option(payload.option, Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok(Json(AnswerResponse { feedback, quiz }))
}

pub async fn reveal_hint(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QuizView>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let view = state
        .toggle_hint(Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok(Json(view))
}

pub async fn next_question(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QuizView>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let view = state
        .advance(Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok(Json(view))
}

pub async fn restart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<QuizView>), AppError> {
    let req_id = request_id_from_headers(&headers);
    let view = state
        .restart(Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub async fn reconfigure(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QuizView>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let view = state
        .reconfigure(Some(req_id.clone()))
        .await
        .map_err(|e| AppError::from_transition(e, req_id))?;
    Ok(Json(view))
}

pub async fn back_to_home(State(state): State<AppState>, headers: HeaderMap) -> Json<QuizView> {
    let req_id = request_id_from_headers(&headers);
    Json(state.back_to_home(Some(req_id)).await)
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.current_preferences().await)
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Json(patch): Json<PreferencesPatch>,
) -> Json<Preferences> {
    Json(state.update_preferences(&patch).await)
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| ws_session(socket, state))
}

async fn ws_session(stream: WebSocket, state: AppState) {
    let mut receiver = state.events.subscribe();
    let (mut sender_ws, mut receiver_ws) = stream.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(msg) => {
                    if let Ok(text) = serde_json::to_string(&msg) {
                        if sender_ws.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "ws subscriber lagged behind quiz events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Inbound frames carry no commands; the loop only watches for the close.
    loop {
        tokio::select! {
            _ = &mut send_task => break,
            message = receiver_ws.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    send_task.abort();
}
