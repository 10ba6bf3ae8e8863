mod error;
mod ports;
mod service;
mod use_cases;
mod worker;

pub use error::ApplicationError;
pub use ports::{
    Clock, ConsentBroker, ImageEncoder, IndexError, MediaIndex, MediaRow, NewMediaEntry,
    StoragePolicy,
};
pub use service::{run_with_recovery, GalleryService, SaveOutcome, QUALITY};
pub use use_cases::{
    DeleteImageCommand, ListImagesCommand, SaveImageCommand, UpdateImageCommand,
};
pub use worker::{GalleryEvent, GalleryJob, GalleryWorker};
