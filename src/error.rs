use crate::machine::TransitionError;
use crate::session::SessionError;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    pub issue: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
    pub request_id: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Vec<ErrorDetail>,
    pub request_id: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: Vec::new(),
            request_id: request_id.into(),
        }
    }

    pub fn with_details(mut self, details: Vec<ErrorDetail>) -> Self {
        self.details = details;
        self
    }

    pub fn not_found(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message, request_id)
    }

    pub fn validation(errors: &ValidationErrors, request_id: impl Into<String>) -> Self {
        let mut details: Vec<ErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ErrorDetail {
                    field: field.to_string(),
                    issue: e.code.to_string(),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "invalid payload", request_id)
            .with_details(details)
    }

    /// Maps a rejected quiz action onto the HTTP error contract.
    pub fn from_transition(err: TransitionError, request_id: impl Into<String>) -> Self {
        let (status, code) = match &err {
            TransitionError::InvalidCount
            | TransitionError::Session(SessionError::OptionOutOfRange { .. }) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            TransitionError::Session(SessionError::Empty | SessionError::CountMismatch { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            _ => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        };
        Self::new(status, code, err.to_string(), request_id)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let payload = ErrorBody {
            error: ErrorPayload {
                code: self.code,
                message: self.message,
                details: self.details,
                request_id: self.request_id,
            },
        };
        (self.status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::StatusKind;

    #[test]
    fn transition_errors_map_to_status_codes() {
        let not_allowed = TransitionError::NotAllowed { action: "answer", status: StatusKind::Idle };
        let err = AppError::from_transition(not_allowed, "r1");
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "INVALID_TRANSITION");
        assert_eq!(err.message, "cannot answer while idle");

        let out_of_range = SessionError::OptionOutOfRange { option: 7, available: 4 };
        let err = AppError::from_transition(out_of_range.into(), "r2");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = AppError::from_transition(SessionError::NotAnswered.into(), "r3");
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.request_id, "r3");
    }
}
