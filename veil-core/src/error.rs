// veil-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeilError {
    // --- Policy / planner invariants ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- IO, YAML, SQL parsing ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for VeilError {
    fn from(err: std::io::Error) -> Self {
        VeilError::Infrastructure(InfrastructureError::Io(err))
    }
}
