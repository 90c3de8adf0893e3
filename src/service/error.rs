use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    // Business errors
    /// A token address could not be parsed.
    #[error("Invalid token address: {0}")]
    InvalidTokenAddress(String),

    /// An amount could not be converted or is out of range.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The approval transaction was mined but reverted.
    #[error("Approval of {token} reverted in transaction {tx_hash}")]
    ApprovalReverted { token: String, tx_hash: String },

    /// The swap transaction was mined but reverted.
    #[error("Swap reverted in transaction {tx_hash}")]
    SwapReverted { tx_hash: String },

    // External API errors
    /// The balance source or the swap aggregator failed.
    #[error("External API error: {0}")]
    ExternalApiError(String),

    // Infrastructure errors (abstracted from repository layer)
    /// An error occurred while communicating with the blockchain.
    #[error("Blockchain connection error: {0}")]
    BlockchainError(String),

    /// The swap history could not be written.
    #[error("History error: {0}")]
    HistoryError(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RpcError(msg)
            | RepositoryError::NetworkError(msg)
            | RepositoryError::ContractError(msg) => {
                ServiceError::BlockchainError(format!("Failed to interact with blockchain: {msg}"))
            }
            RepositoryError::ApiError { status, message } => {
                ServiceError::ExternalApiError(format!("status {status}: {message}"))
            }
            RepositoryError::ParseError(msg) => {
                ServiceError::ExternalApiError(format!("Malformed response: {msg}"))
            }
            RepositoryError::StorageError(msg) => ServiceError::HistoryError(msg),
            RepositoryError::Other(msg) => ServiceError::InternalError(msg),
        }
    }
}
