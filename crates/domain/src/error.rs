use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    InvalidImageId(i64),
    BitmapLengthMismatch { expected: usize, actual: usize },
    EmptyBitmap,
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImageId(value) => write!(f, "image id must be positive, got {value}"),
            Self::BitmapLengthMismatch { expected, actual } => write!(
                f,
                "bitmap pixel buffer must hold {expected} bytes, got {actual}"
            ),
            Self::EmptyBitmap => write!(f, "bitmap dimensions must be non-zero"),
        }
    }
}

impl std::error::Error for DomainError {}
