use std::path::Path;

use serde::Serialize;

/// Container format used when compressing a bitmap back to shared storage.
///
/// Mapping from extensions and MIME suffixes is total: anything that is not
/// recognizably PNG resolves to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompressFormat {
    Png,
    Jpeg,
}

impl CompressFormat {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            _ => Self::Jpeg,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Jpeg)
    }

    /// Resolves a MIME type by its suffix, e.g. `image/png` → PNG.
    pub fn from_mime(mime: &str) -> Self {
        let suffix = mime.rsplit('/').next().unwrap_or(mime);
        Self::from_extension(suffix)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}
