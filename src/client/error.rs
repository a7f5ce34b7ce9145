use crate::client::BoxError;
use crate::domain::{Carrier, CompanyId, ValidationError};
use crate::store::StoreError;
use crate::verification::VerificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Canonical error kinds exposed to callers.
pub enum ErrorKind {
    InvalidInput,
    ProviderUnavailable,
    TransportFailure,
    CarrierRejected,
    QuotaExhausted,
    PersistenceFailure,
}

impl ErrorKind {
    pub fn code(self) -> i32 {
        match self {
            Self::InvalidInput => 1001,
            Self::ProviderUnavailable => 1002,
            Self::TransportFailure => 1003,
            Self::CarrierRejected => 1004,
            Self::QuotaExhausted => 1005,
            Self::PersistenceFailure => 1006,
        }
    }
}

/// Code reported for bodies that could not be decoded.
pub const PARSE_FAILURE_CODE: i32 = 1007;

#[derive(Debug, thiserror::Error)]
/// Errors produced by the dispatch pipeline.
///
/// [`GatewayError::kind`] folds the variants into the canonical [`ErrorKind`] set;
/// [`GatewayError::code`] keeps the carrier's own code for rejections.
pub enum GatewayError {
    /// A domain constructor or precondition rejected the input.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// No enabled provider row exists for the carrier.
    #[error("no enabled provider for {carrier}")]
    ProviderUnavailable { carrier: Carrier },

    /// The carrier does not offer the requested operation.
    #[error("{carrier} does not support {operation}")]
    Unsupported {
        carrier: Carrier,
        operation: &'static str,
    },

    /// The provider has no approved template under this name.
    #[error("no approved template named {name}")]
    MissingTemplate { name: &'static str },

    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// Non-successful HTTP status code returned by the remote side.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// The account authority answered with an error.
    #[error("account authority {method} failed: {message}")]
    Authority {
        method: &'static str,
        message: String,
    },

    /// Response body could not be parsed as the expected format.
    #[error("parse error: {0}")]
    Parse(#[source] BoxError),

    /// The carrier answered with a non-zero status code.
    #[error("{carrier} rejected the request: code {code} ({})", .message.unwrap_or("unknown code"))]
    CarrierRejected {
        carrier: Carrier,
        code: i32,
        message: Option<&'static str>,
    },

    #[error("sending quota exhausted for company {}", .company.value())]
    QuotaExhausted { company: CompanyId },

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ProviderUnavailable { .. }
            | Self::Unsupported { .. }
            | Self::MissingTemplate { .. } => ErrorKind::ProviderUnavailable,
            Self::Transport(_)
            | Self::HttpStatus { .. }
            | Self::Authority { .. }
            | Self::Parse(_) => ErrorKind::TransportFailure,
            Self::CarrierRejected { .. } => ErrorKind::CarrierRejected,
            Self::QuotaExhausted { .. } => ErrorKind::QuotaExhausted,
            Self::Persistence(_) | Self::Verification(VerificationError::Poisoned) => {
                ErrorKind::PersistenceFailure
            }
            Self::Verification(_) => ErrorKind::InvalidInput,
        }
    }

    /// Numeric code reported to callers.
    pub fn code(&self) -> i32 {
        match self {
            Self::CarrierRejected { code, .. } => *code,
            Self::Parse(_) => PARSE_FAILURE_CODE,
            other => other.kind().code(),
        }
    }

    pub(crate) fn parse(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Parse(Box::new(err))
    }
}
