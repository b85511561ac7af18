use thiserror::Error;

use stockwise_core::DomainError;

use crate::store::StoreError;

/// Error returned by every service operation.
///
/// Store constraint failures (uniqueness, references, the demo
/// compare-and-set) surface as domain conflicts; other store failures are
/// passed through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Constraint(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
