use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::db::DbError;
use crate::payment::{GatewayError, UpgradeError};

/// HTTP-facing error taxonomy. Every variant renders as a status code plus
/// a `{ "message": ... }` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("You are not authorized")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("Internal Server Error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ApiError::NotFound(msg),
            DbError::AlreadyExists(msg) => ApiError::BadRequest(msg),
            DbError::Sqlx(e) => {
                error!("Database failure: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        error!("Payment gateway failure: {}", e);
        ApiError::Internal
    }
}

impl From<UpgradeError> for ApiError {
    fn from(e: UpgradeError) -> Self {
        match e {
            UpgradeError::OrderNotFound | UpgradeError::UserNotFound => {
                ApiError::NotFound(e.to_string())
            }
            UpgradeError::AlreadyPremium | UpgradeError::AlreadyPaid | UpgradeError::Denied => {
                ApiError::BadRequest(e.to_string())
            }
            UpgradeError::Gateway(e) => e.into(),
            UpgradeError::Db(e) => e.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_errors_map_to_spec_statuses() {
        let cases = [
            (UpgradeError::OrderNotFound, StatusCode::NOT_FOUND),
            (UpgradeError::UserNotFound, StatusCode::NOT_FOUND),
            (UpgradeError::AlreadyPremium, StatusCode::BAD_REQUEST),
            (UpgradeError::AlreadyPaid, StatusCode::BAD_REQUEST),
            (UpgradeError::Denied, StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            let api: ApiError = err.into();
            let response = api.into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn messages_match_client_contract() {
        let api: ApiError = UpgradeError::Denied.into();
        assert_eq!(
            api.to_string(),
            "Upgrade failed, please call our customer support"
        );
        let api: ApiError = UpgradeError::AlreadyPremium.into();
        assert_eq!(api.to_string(), "You are already premium");
    }
}
