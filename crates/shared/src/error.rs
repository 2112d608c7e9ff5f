use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UserRejected,
    Reverted,
    NotFound,
    Validation,
    Unavailable,
    Internal,
}

/// Error envelope the module gateway returns in place of a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct GatewayException {
    pub code: ErrorCode,
    pub message: String,
}

impl From<GatewayError> for GatewayException {
    fn from(value: GatewayError) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid token amount '{0}'")]
    InvalidAmount(String),
    #[error("amount '{value}' has more than {decimals} decimal places")]
    TooManyDecimals { value: String, decimals: u32 },
    #[error("unknown proposal stage {0}")]
    UnknownProposalStage(u8),
    #[error("unknown vote type '{0}'")]
    UnknownVoteType(String),
}
