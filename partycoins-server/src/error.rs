use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use partycoins_core::LedgerError;

/// Every failure the HTTP layer can answer with. Rendered as
/// `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
    NotFound(String),
    Unauthorized,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(LedgerError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::InsufficientFunds { .. }) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Ledger(LedgerError::TransactionConflict { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Ledger(LedgerError::InvalidInput(msg)) => msg.clone(),
            ApiError::Ledger(LedgerError::InsufficientFunds { .. }) => {
                "insufficient coins".to_string()
            }
            ApiError::Ledger(LedgerError::TransactionConflict { .. }) => {
                "ledger busy, try again".to_string()
            }
            // storage details stay in the logs
            ApiError::Ledger(_) => "internal error".to_string(),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Unauthorized => "unauthorized".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Ledger(err) if !err.is_client_error() => {
                tracing::error!("Request failed: {}", err)
            }
            _ => tracing::warn!("Request rejected ({}): {}", status, self.message()),
        }

        (status, Json(serde_json::json!({ "error": self.message() }))).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
