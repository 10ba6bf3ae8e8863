use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use memeify_domain::{Bitmap, CompressFormat, ConsentHandle, ImageId, MediaLocation, RecoveryToken};

use crate::ApplicationError;

/// How the platform mediates shared-storage writes. `Legacy` is direct
/// path access; `Scoped` enforces per-item authorization, with interactive
/// recovery only on platforms that implement it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePolicy {
    Legacy,
    Scoped { recovery_supported: bool },
}

/// Raw projection row from the media index. `size` stays optional here;
/// the catalog gateway drops rows without one.
#[derive(Debug, Clone)]
pub struct MediaRow {
    pub id: i64,
    pub relative_path: String,
    pub display_name: String,
    pub size: Option<i64>,
    pub mime_type: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub date_modified: i64,
}

/// Metadata for a new entry, inserted with the pending flag set before any
/// pixel data is written.
#[derive(Debug, Clone)]
pub struct NewMediaEntry {
    pub display_name: String,
    pub relative_path: String,
    pub mime_type: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub date_added: i64,
    pub date_modified: i64,
}

#[derive(Debug)]
pub enum IndexError {
    /// Authorization denial. A handle is attached only when the platform
    /// can grant the missing consent interactively.
    Denied { handle: Option<ConsentHandle> },
    Storage(String),
    Io(String),
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denied { handle: Some(_) } => {
                write!(f, "modification denied, interactive consent available")
            }
            Self::Denied { handle: None } => write!(f, "modification denied"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
            Self::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for IndexError {}

/// The platform media index plus the files behind it. Implementations own
/// both the queryable row store and the byte streams.
pub trait MediaIndex: Send + Sync {
    fn initialize(&self) -> Result<(), IndexError>;

    fn policy(&self) -> StoragePolicy;

    /// One read-only snapshot, last-modified descending, pending entries
    /// hidden.
    fn query_images(&self) -> Result<Vec<MediaRow>, IndexError>;

    fn insert_pending(&self, entry: &NewMediaEntry) -> Result<MediaLocation, IndexError>;

    fn write_entry(&self, location: &MediaLocation, bytes: &[u8]) -> Result<(), IndexError>;

    /// Clears the pending flag and records the final byte size. Until this
    /// succeeds the entry must stay invisible to `query_images`.
    fn finalize_entry(&self, location: &MediaLocation, size: u64) -> Result<(), IndexError>;

    /// Single-row delete filtered by id, removing the backing file too.
    fn delete_entry(&self, id: ImageId) -> Result<(), IndexError>;

    /// Legacy path: write the file directly and re-index it from disk, the
    /// way a media-scanner broadcast would.
    fn write_direct(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IndexError>;
}

pub trait ImageEncoder: Send + Sync {
    fn encode(
        &self,
        bitmap: &Bitmap,
        format: CompressFormat,
        quality: u8,
    ) -> Result<Vec<u8>, ApplicationError>;
}

/// Interactive grant/deny step the platform runs against a recovery token.
/// Granting is expected to make the denied item writable before this
/// returns true.
pub trait ConsentBroker {
    fn request_consent(&self, token: &RecoveryToken) -> bool;
}

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}
