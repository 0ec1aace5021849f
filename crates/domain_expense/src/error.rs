//! Expense domain errors

use thiserror::Error;

use core_kernel::{ClaimId, MoneyError, PortError};
use crate::claim::ClaimStatus;

/// Errors that can occur in the expense approval domain
#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Claim {claim_id} is already {status}; no further transitions are permitted")]
    InvalidStateTransition { claim_id: ClaimId, status: ClaimStatus },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Policy misconfiguration: {0}")]
    PolicyMisconfiguration(String),

    #[error("Claim {claim_id} was modified concurrently; re-read and retry")]
    ConcurrentModification { claim_id: ClaimId },

    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Currency error: {0}")]
    Currency(#[from] MoneyError),

    #[error("Repository error: {0}")]
    Repository(PortError),
}

impl ExpenseError {
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        ExpenseError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ExpenseError::Validation(message.into())
    }

    pub fn misconfigured(message: impl Into<String>) -> Self {
        ExpenseError::PolicyMisconfiguration(message.into())
    }

    /// Returns true if the claim, policy, or directory entry was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExpenseError::NotFound { .. })
    }

    /// Returns true if the failed operation may be re-issued unchanged
    ///
    /// Only repository outages qualify. Callers must still only repeat reads
    /// blindly; a write should be retried by re-running the whole command.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExpenseError::RepositoryUnavailable(_))
    }
}

impl From<PortError> for ExpenseError {
    fn from(err: PortError) -> Self {
        if err.is_transient() {
            return ExpenseError::RepositoryUnavailable(err.to_string());
        }
        match err {
            PortError::NotFound { entity_type, id } => ExpenseError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Validation { message, .. } => ExpenseError::Validation(message),
            other => ExpenseError::Repository(other),
        }
    }
}
