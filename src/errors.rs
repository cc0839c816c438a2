use crate::client::ClientError;
use crate::reconcile::LogError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<&'static str>,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let status = match &err {
            ClientError::Unauthorized | ClientError::MissingToken => StatusCode::UNAUTHORIZED,
            ClientError::Transport(_) => StatusCode::BAD_GATEWAY,
            ClientError::Rejected { status, .. } if status.is_client_error() => *status,
            ClientError::Rejected { .. } => StatusCode::BAD_GATEWAY,
            ClientError::InvalidLogId(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<LogError> for AppError {
    fn from(err: LogError) -> Self {
        let status = match &err {
            LogError::NotOwner { .. } => StatusCode::FORBIDDEN,
            LogError::NotInSession(_) | LogError::UnknownExercise { .. } => StatusCode::NOT_FOUND,
            LogError::ConfirmationRequired(_) | LogError::NothingToDelete => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            login: self.is_unauthorized().then_some("/login"),
        };
        (self.status, Json(body)).into_response()
    }
}
