use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::client::{ErrorKind, GatewayError};

/// Envelope shared by every JSON reply; `err_code` is `0` on success.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub err_code: i32,
    pub err_msg: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            err_code: 0,
            err_msg: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("malformed request body: {0}")]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Gateway(err) => err.code(),
            Self::Body(_) => ErrorKind::InvalidInput.code(),
        }
    }

    fn status(&self) -> StatusCode {
        let kind = match self {
            Self::Gateway(err) => err.kind(),
            Self::Body(_) => ErrorKind::InvalidInput,
        };
        match kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::TransportFailure | ErrorKind::CarrierRejected => StatusCode::BAD_GATEWAY,
            ErrorKind::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        let body = Ack {
            err_code: self.code(),
            err_msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
