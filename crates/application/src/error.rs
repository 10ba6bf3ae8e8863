use std::fmt::{Display, Formatter};

use memeify_domain::DomainError;

use crate::ports::IndexError;

#[derive(Debug)]
pub enum ApplicationError {
    Domain(DomainError),
    InvalidInput(String),
    NotFound(String),
    Io(String),
    Persistence(String),
    Decode(String),
    Encode(String),
    /// Authorization denial with no interactive recovery path. Recoverable
    /// denials never surface as errors; they become recovery tokens.
    PermissionDenied(String),
}

impl Display for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(error) => write!(f, "{error}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Persistence(msg) => write!(f, "persistence error: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Encode(msg) => write!(f, "encode error: {msg}"),
            Self::PermissionDenied(msg) => write!(f, "permission denied: {msg}"),
        }
    }
}

impl std::error::Error for ApplicationError {}

impl From<DomainError> for ApplicationError {
    fn from(value: DomainError) -> Self {
        Self::Domain(value)
    }
}

impl From<IndexError> for ApplicationError {
    fn from(value: IndexError) -> Self {
        match value {
            IndexError::Denied { .. } => {
                Self::PermissionDenied("media index refused the modification".to_string())
            }
            IndexError::Storage(msg) => Self::Persistence(msg),
            IndexError::Io(msg) => Self::Io(msg),
        }
    }
}
