use super::types::EntityKind;
use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::storage::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Document '{id}' not found in '{kind}'")]
    NotFound { kind: EntityKind, id: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::WriteRejected(message.into())
    }

    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Field '{field}' is not part of the {kind} form")]
    UnknownField { kind: EntityKind, field: String },

    #[error("Unknown entity kind '{0}'")]
    UnknownKind(String),

    #[error("No instance with id '{0}' in the current listing")]
    NotInListing(String),

    #[error("No delete is awaiting confirmation")]
    NothingToConfirm,
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
