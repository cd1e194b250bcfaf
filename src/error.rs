use crate::gemini::GeminiError;
use crate::rate_limit::{LimitDecision, LimitType};
use crate::security::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Ways a planning request ends without an answer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.reason.as_deref().unwrap_or("Rate limit exceeded"))]
    RateLimited(LimitDecision),

    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("Gemini no está configurado. Por favor, crea un archivo .env con tu GEMINI_API_KEY.")]
    ModelNotConfigured,

    #[error("Error con Gemini: {0}")]
    Model(#[from] GeminiError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_type: Option<LimitType>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::ModelNotConfigured | Self::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (retry_after, limit_type) = match &self {
            Self::RateLimited(decision) => (decision.retry_after, decision.limit_type),
            _ => (None, None),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            retry_after,
            limit_type,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_and_status() {
        let err = AppError::RateLimited(LimitDecision::block(LimitType::Hour, 30, 120));
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "Has alcanzado el límite de 30 consultas por hora");
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let err = AppError::from(ValidationError::BadDateFormat);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Formato de fecha inválido");
    }
}
