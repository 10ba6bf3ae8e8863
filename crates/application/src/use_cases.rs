use memeify_domain::{Bitmap, CompressFormat, ImageRecord, MediaLocation};

#[derive(Debug, Clone, Default)]
pub struct ListImagesCommand;

#[derive(Debug, Clone)]
pub struct SaveImageCommand {
    pub bitmap: Bitmap,
    pub format: CompressFormat,
}

#[derive(Debug, Clone)]
pub struct UpdateImageCommand {
    pub location: MediaLocation,
    pub bitmap: Bitmap,
    pub format: CompressFormat,
}

#[derive(Debug, Clone)]
pub struct DeleteImageCommand {
    pub record: ImageRecord,
}
