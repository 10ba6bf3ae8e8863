mod bitmap;
mod error;
mod format;
mod image;
mod mutation;

pub use bitmap::Bitmap;
pub use error::DomainError;
pub use format::CompressFormat;
pub use image::{ImageId, ImageRecord, MediaLocation};
pub use mutation::{
    ConsentHandle, ModificationIntent, MutationOutcome, MutationReport, RecoveryToken,
};
