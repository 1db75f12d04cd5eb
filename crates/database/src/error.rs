//! Failures surfaced by the inventory core.

use models::PolicyError;
use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Typed failure of a core operation.
///
/// Every failed precondition maps to one of these; nothing is committed
/// when an operation returns `Err`.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input; the caller must fix it before retrying
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Transition is not legal from the current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A reservation or bucket move needs more units than the source holds
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    /// New total would not cover units that are on loan, damaged or under maintenance
    #[error("invalid quantity: total {requested} is below the {committed} units already committed")]
    InvalidQuantity { requested: i32, committed: i32 },

    /// No verified identity
    #[error("authentication required")]
    Unauthorized,

    /// Identity lacks the required role or ownership
    #[error("insufficient permissions")]
    Forbidden,

    /// Underlying persistence failed
    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
}

impl Error {
    /// Whether retrying the same call may succeed
    ///
    /// Only connection-level storage failures qualify. Core operations have
    /// no side effect before their commit, so a retry cannot double-apply.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
        )
    }
}

impl From<PolicyError> for Error {
    fn from(err: PolicyError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use models::{AmountRange, DamageSeverity, PolicyError};
    use sea_orm::DbErr;

    #[test]
    fn test_error_display_messages() {
        assert_eq!(Error::NotFound("booking").to_string(), "booking not found");
        assert_eq!(
            Error::InsufficientStock {
                requested: 5,
                available: 2
            }
            .to_string(),
            "insufficient stock: requested 5, available 2"
        );
        assert_eq!(Error::Forbidden.to_string(), "insufficient permissions");
    }

    #[test]
    fn test_policy_errors_become_invalid_requests() {
        let err: Error = PolicyError::AmountOutOfRange {
            severity: DamageSeverity::Minor,
            amount: 50,
            range: AmountRange::new(200, 500),
        }
        .into();
        assert!(matches!(err, Error::InvalidRequest(msg) if msg.contains("between 200 and 500")));
    }

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(!Error::InvalidState("booking is approved".to_owned()).is_retryable());
        assert!(!Error::Storage(DbErr::RecordNotFound("x".to_owned())).is_retryable());
    }
}
