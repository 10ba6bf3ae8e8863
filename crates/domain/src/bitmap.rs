use crate::DomainError;

const BYTES_PER_PIXEL: usize = 4;

/// Decoded image pixels, RGBA8 row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::EmptyBitmap);
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(DomainError::BitmapLengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Uncompressed size, used as the provisional byte size when a new
    /// entry is inserted ahead of the actual write.
    pub fn byte_count(&self) -> u64 {
        self.pixels.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(matches!(
            Bitmap::new(2, 2, vec![0; 15]),
            Err(DomainError::BitmapLengthMismatch {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            Bitmap::new(0, 4, Vec::new()),
            Err(DomainError::EmptyBitmap)
        ));
    }

    #[test]
    fn reports_byte_count() {
        let bitmap = Bitmap::new(2, 3, vec![0; 24]).expect("bitmap");
        assert_eq!(bitmap.byte_count(), 24);
        assert_eq!(bitmap.width(), 2);
        assert_eq!(bitmap.height(), 3);
    }
}
