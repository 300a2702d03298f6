use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::statistics::StatusSummary;
use crate::domain::error::TodoError;
use crate::domain::todo::Todo;
use crate::domain::validation::{FieldError, ValidationErrors};

#[derive(Debug, Serialize)]
pub struct TodoEnvelope { pub todo: Todo }

#[derive(Debug, Serialize)]
pub struct TodoMessage { pub message: &'static str, pub todo: Todo }

#[derive(Debug, Serialize)]
pub struct Message { pub message: &'static str }

#[derive(Debug, Serialize)]
pub struct SummaryEnvelope { pub summary: StatusSummary }

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    NotFound,
    Unauthorized,
    BadRequest(String),
    /// `message` names the failed action; `detail` is only set outside production.
    Internal { message: String, detail: Option<String> },
}

impl ApiError {
    /// Maps a service failure for an action such as "fetching todos".
    /// Store errors are logged here and reduced to a generic message.
    pub fn from_service(err: TodoError, action: &str, expose_detail: bool) -> Self {
        match err {
            TodoError::Validation(errors) => ApiError::Validation(errors),
            TodoError::NotFound => ApiError::NotFound,
            TodoError::Store(source) => {
                tracing::error!(error = %format!("{source:#}"), "server error while {action}");
                ApiError::Internal {
                    message: format!("Server error while {action}"),
                    detail: expose_detail.then(|| format!("{source:#}")),
                }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Validation(errors) => ErrorBody {
                message: "Validation failed",
                errors: Some(errors.errors()),
                error: None,
            },
            ApiError::NotFound => ErrorBody { message: "Todo not found", errors: None, error: None },
            ApiError::Unauthorized => ErrorBody { message: "Authentication required", errors: None, error: None },
            ApiError::BadRequest(message) => ErrorBody {
                message: message.as_str(),
                errors: Some(<&[FieldError]>::default()),
                error: None,
            },
            ApiError::Internal { message, detail } => ErrorBody {
                message: message.as_str(),
                errors: None,
                error: detail.as_deref(),
            },
        };
        (status, Json(body)).into_response()
    }
}
