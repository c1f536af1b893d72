use crate::domain::AmountError;
use crate::ledger::LedgerError;
use crate::signer::SignerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Errors raised by client operations.
///
/// Chain-level execution failures are not errors: they come back as an
/// `OperationError` value inside `OperationOutcome`.
#[derive(Debug, Error)]
pub enum EarnError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid zero amount")]
    ZeroAmount,
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Address must be provided")]
    AddressRequired,
    #[error("Insufficient {currency} balance: requested {requested} > available {available}")]
    InsufficientBalance {
        currency: String,
        requested: u128,
        available: u128,
    },
    #[error("There is no deposit for the user")]
    NoDeposit,
    #[error("No signer available: configure a signing key or pass a custom signer")]
    SignerUnavailable,
    #[error("Query failed: {0}")]
    QueryFailed(#[from] LedgerError),
    #[error("Signing failed: {0}")]
    SigningFailed(#[from] SignerError),
    #[error("Broadcast failed: {0}")]
    BroadcastFailed(LedgerError),
}

impl EarnError {
    /// True for usage errors detected before anything was sent to the node.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EarnError::InvalidAmount(_)
                | EarnError::ZeroAmount
                | EarnError::UnsupportedCurrency(_)
                | EarnError::AddressRequired
                | EarnError::InsufficientBalance { .. }
                | EarnError::NoDeposit
                | EarnError::SignerUnavailable
        )
    }

    /// A node response that parsed but cannot be used, e.g. a zero rate.
    pub(crate) fn malformed_response(reason: impl fmt::Display) -> Self {
        EarnError::QueryFailed(LedgerError::ParseError(reason.to_string()))
    }
}

impl From<AmountError> for EarnError {
    fn from(err: AmountError) -> Self {
        EarnError::InvalidAmount(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<EarnError> for AppError {
    fn from(err: EarnError) -> Self {
        if err.is_validation() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
