use serde::Serialize;

use crate::DomainError;

/// Bytes-to-kilobytes divisor used for user-facing sizes.
const BYTES_PER_KILOBYTE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImageId(i64);

impl ImageId {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidImageId(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Addressable location of one shared-storage entry. Stands in for the
/// content locator handed out by the platform index: the id addresses the
/// index row, the path pair addresses the backing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaLocation {
    pub id: ImageId,
    pub relative_path: String,
    pub display_name: String,
}

/// One gallery entry as read from the media index. Immutable; a fresh
/// catalog read supersedes old records rather than mutating them.
///
/// `size_bytes` is never missing here: index rows without a size are
/// discarded at catalog-read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub relative_path: String,
    pub display_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub date_modified: i64,
}

impl ImageRecord {
    pub fn location(&self) -> MediaLocation {
        MediaLocation {
            id: self.id,
            relative_path: self.relative_path.clone(),
            display_name: self.display_name.clone(),
        }
    }

    /// Size rounded to whole kilobytes.
    pub fn size_kilobytes(&self) -> u64 {
        (self.size_bytes as f64 / BYTES_PER_KILOBYTE).round() as u64
    }

    /// Pixel dimensions, only when the index recorded both.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size_bytes: u64) -> ImageRecord {
        ImageRecord {
            id: ImageId::new(1).expect("id"),
            relative_path: "Pictures/Memeify".to_string(),
            display_name: "1.jpg".to_string(),
            size_bytes,
            mime_type: "image/jpeg".to_string(),
            width: None,
            height: None,
            date_modified: 0,
        }
    }

    #[test]
    fn image_id_must_be_positive() {
        assert!(ImageId::new(1).is_ok());
        assert!(matches!(
            ImageId::new(0),
            Err(DomainError::InvalidImageId(0))
        ));
        assert!(matches!(
            ImageId::new(-3),
            Err(DomainError::InvalidImageId(-3))
        ));
    }

    #[test]
    fn size_rounds_to_whole_kilobytes() {
        assert_eq!(record(1024).size_kilobytes(), 1);
        assert_eq!(record(1500).size_kilobytes(), 2);
        assert_eq!(record(499).size_kilobytes(), 0);
    }

    #[test]
    fn dimensions_require_both_axes() {
        let mut image = record(1024);
        assert_eq!(image.dimensions(), None);

        image.width = Some(640);
        assert_eq!(image.dimensions(), None);

        image.height = Some(480);
        assert_eq!(image.dimensions(), Some((640, 480)));
    }

    #[test]
    fn location_carries_id_and_path() {
        let image = record(1024);
        let location = image.location();
        assert_eq!(location.id, image.id);
        assert_eq!(location.display_name, "1.jpg");
    }
}
