// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid selection key '{key}': expected a date in dd-MM-yyyy format")]
    InvalidSelectionKey { key: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
