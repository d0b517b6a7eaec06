use thiserror::Error;

use super::ValidationError;
use crate::models::RequestStatus;
use crate::repository::FetchError;

/// Everything a store operation can fail with. All variants are recoverable.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Request not found: {0}")]
    NotFound(String),

    #[error("Request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Request {id} is {status} and can no longer be edited")]
    NotPending { id: String, status: RequestStatus },

    #[error("{actor} cannot review their own request {id}")]
    SelfApproval { id: String, actor: String },

    #[error("{actor} is not permitted to {action} request {id}")]
    NotPermitted {
        id: String,
        actor: String,
        action: &'static str,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to persist requests: {0:#}")]
    Storage(anyhow::Error),
}
