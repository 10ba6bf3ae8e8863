pub mod codec;
pub mod fs;
pub mod migrations;
pub mod presenters;
pub mod sqlite;

pub use codec::{load_bitmap, ImageCrateEncoder};
pub use fs::SystemClock;
pub use presenters::{present_details, present_image_row};
pub use sqlite::SqliteMediaIndex;
