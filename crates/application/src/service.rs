use memeify_domain::{
    ImageId, ImageRecord, ModificationIntent, MutationOutcome, MutationReport, RecoveryToken,
};

use crate::{
    ApplicationError, Clock, ConsentBroker, DeleteImageCommand, ImageEncoder, IndexError,
    ListImagesCommand, MediaIndex, NewMediaEntry, SaveImageCommand, StoragePolicy,
    UpdateImageCommand,
};

/// Compression quality for every write. PNG ignores it.
pub const QUALITY: u8 = 100;

/// Where a save landed. The legacy path degrades write failures to a
/// logged `Failed` instead of propagating them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Indexed(memeify_domain::MediaLocation),
    Direct(std::path::PathBuf),
    Failed,
}

/// Gateway over the media index: catalog reads plus save, update and
/// delete with the permission-recovery contract.
pub struct GalleryService {
    index: Box<dyn MediaIndex>,
    encoder: Box<dyn ImageEncoder>,
    clock: Box<dyn Clock>,
    pictures_dir: String,
}

impl GalleryService {
    pub fn new(
        index: Box<dyn MediaIndex>,
        encoder: Box<dyn ImageEncoder>,
        clock: Box<dyn Clock>,
        pictures_dir: String,
    ) -> Self {
        Self {
            index,
            encoder,
            clock,
            pictures_dir,
        }
    }

    /// One full catalog read, newest first. Rows without a size are
    /// placeholders or corrupt entries and are skipped, not errors.
    pub fn list_images(
        &self,
        _command: ListImagesCommand,
    ) -> Result<Vec<ImageRecord>, ApplicationError> {
        let rows = self.index.query_images().map_err(ApplicationError::from)?;

        let mut images = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(size) = row.size else {
                continue;
            };
            let Ok(size_bytes) = u64::try_from(size) else {
                continue;
            };

            images.push(ImageRecord {
                id: ImageId::new(row.id)?,
                relative_path: row.relative_path,
                display_name: row.display_name,
                size_bytes,
                mime_type: row.mime_type,
                width: row.width.and_then(|value| u32::try_from(value).ok()),
                height: row.height.and_then(|value| u32::try_from(value).ok()),
                date_modified: row.date_modified,
            });
        }

        Ok(images)
    }

    /// Save a freshly rendered image as a new entry named
    /// `<epoch-millis>.<ext>` under the app's pictures directory.
    pub fn save_image(&self, command: SaveImageCommand) -> Result<SaveOutcome, ApplicationError> {
        match self.index.policy() {
            StoragePolicy::Scoped { .. } => self.save_indexed(&command),
            StoragePolicy::Legacy => Ok(self.save_direct(&command)),
        }
    }

    /// Two-phase write: insert metadata with the pending flag set, stream
    /// the compressed bytes, then clear the flag with the final size. Other
    /// index readers never observe a half-written entry as complete.
    fn save_indexed(&self, command: &SaveImageCommand) -> Result<SaveOutcome, ApplicationError> {
        let now = self.clock.now_millis();
        let entry = NewMediaEntry {
            display_name: format!("{now}.{}", command.format.extension()),
            relative_path: self.pictures_dir.clone(),
            mime_type: command.format.mime_type().to_string(),
            size: command.bitmap.byte_count(),
            width: command.bitmap.width(),
            height: command.bitmap.height(),
            date_added: now,
            date_modified: now,
        };

        let location = self.index.insert_pending(&entry)?;
        let bytes = self.encoder.encode(&command.bitmap, command.format, QUALITY)?;
        self.index.write_entry(&location, &bytes)?;
        self.index.finalize_entry(&location, bytes.len() as u64)?;

        Ok(SaveOutcome::Indexed(location))
    }

    fn save_direct(&self, command: &SaveImageCommand) -> SaveOutcome {
        let now = self.clock.now_millis();
        let file_name = format!("{now}.{}", command.format.extension());

        let written = self
            .encoder
            .encode(&command.bitmap, command.format, QUALITY)
            .and_then(|bytes| {
                self.index
                    .write_direct(&file_name, &bytes)
                    .map_err(ApplicationError::from)
            });

        match written {
            Ok(path) => SaveOutcome::Direct(path),
            Err(error) => {
                log::error!("unable to save image: {error}");
                SaveOutcome::Failed
            }
        }
    }

    /// Overwrite an existing entry in place. A recoverable denial becomes a
    /// token (intent Update) with nothing written; an unrecoverable denial
    /// or any other failure propagates.
    pub fn update_image(
        &self,
        command: UpdateImageCommand,
    ) -> Result<MutationOutcome, ApplicationError> {
        let bytes = self.encoder.encode(&command.bitmap, command.format, QUALITY)?;
        match self.index.write_entry(&command.location, &bytes) {
            Ok(()) => Ok(MutationOutcome::Completed),
            Err(error) => recovery_or_error(error, ModificationIntent::Update),
        }
    }

    /// Single-row delete by id, same recovery semantics as update.
    pub fn delete_image(
        &self,
        command: DeleteImageCommand,
    ) -> Result<MutationOutcome, ApplicationError> {
        match self.index.delete_entry(command.record.id) {
            Ok(()) => Ok(MutationOutcome::Completed),
            Err(error) => recovery_or_error(error, ModificationIntent::Delete),
        }
    }
}

fn recovery_or_error(
    error: IndexError,
    intent: ModificationIntent,
) -> Result<MutationOutcome, ApplicationError> {
    match error {
        IndexError::Denied {
            handle: Some(handle),
        } => Ok(MutationOutcome::RecoveryRequired(RecoveryToken::new(
            handle, intent,
        ))),
        other => Err(other.into()),
    }
}

/// The consent state machine shared by update and delete: attempt, redeem
/// a recovery token through the broker, retry at most once. A second
/// denial or a refused consent is terminal.
pub fn run_with_recovery<F>(
    broker: &dyn ConsentBroker,
    mut attempt: F,
) -> Result<MutationReport, ApplicationError>
where
    F: FnMut() -> Result<MutationOutcome, ApplicationError>,
{
    match attempt()? {
        MutationOutcome::Completed => Ok(MutationReport::Completed),
        MutationOutcome::RecoveryRequired(token) => {
            if !broker.request_consent(&token) {
                return Ok(MutationReport::Denied(token.intent()));
            }
            match attempt()? {
                MutationOutcome::Completed => Ok(MutationReport::Completed),
                MutationOutcome::RecoveryRequired(again) => {
                    Ok(MutationReport::Denied(again.intent()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use memeify_domain::{Bitmap, CompressFormat, ConsentHandle, MediaLocation};

    use super::*;
    use crate::MediaRow;

    struct FakeEntry {
        row: MediaRow,
        pending: bool,
        data: Vec<u8>,
    }

    struct FakeIndex {
        policy: StoragePolicy,
        entries: Mutex<Vec<FakeEntry>>,
        next_id: Mutex<i64>,
        calls: Arc<Mutex<Vec<&'static str>>>,
        deny_mutations: bool,
        granted: Arc<AtomicBool>,
        fail_direct: bool,
    }

    impl FakeIndex {
        fn new(policy: StoragePolicy) -> Self {
            Self {
                policy,
                entries: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
                calls: Arc::new(Mutex::new(Vec::new())),
                deny_mutations: false,
                granted: Arc::new(AtomicBool::new(false)),
                fail_direct: false,
            }
        }

        fn with_row(self, row: MediaRow) -> Self {
            self.entries.lock().expect("entries").push(FakeEntry {
                row,
                pending: false,
                data: vec![0xAA],
            });
            self
        }

        fn denying(mut self) -> Self {
            self.deny_mutations = true;
            self
        }

        fn denial(&self) -> IndexError {
            let handle = match self.policy {
                StoragePolicy::Scoped {
                    recovery_supported: true,
                } => Some(ConsentHandle::new(7)),
                _ => None,
            };
            IndexError::Denied { handle }
        }
    }

    impl MediaIndex for FakeIndex {
        fn initialize(&self) -> Result<(), IndexError> {
            Ok(())
        }

        fn policy(&self) -> StoragePolicy {
            self.policy
        }

        fn query_images(&self) -> Result<Vec<MediaRow>, IndexError> {
            Ok(self
                .entries
                .lock()
                .expect("entries")
                .iter()
                .filter(|entry| !entry.pending)
                .map(|entry| entry.row.clone())
                .collect())
        }

        fn insert_pending(&self, entry: &NewMediaEntry) -> Result<MediaLocation, IndexError> {
            self.calls.lock().expect("calls").push("insert_pending");
            let mut next_id = self.next_id.lock().expect("next_id");
            let id = *next_id;
            *next_id += 1;

            self.entries.lock().expect("entries").push(FakeEntry {
                row: MediaRow {
                    id,
                    relative_path: entry.relative_path.clone(),
                    display_name: entry.display_name.clone(),
                    size: Some(entry.size as i64),
                    mime_type: entry.mime_type.clone(),
                    width: Some(i64::from(entry.width)),
                    height: Some(i64::from(entry.height)),
                    date_modified: entry.date_modified,
                },
                pending: true,
                data: Vec::new(),
            });

            Ok(MediaLocation {
                id: ImageId::new(id).expect("positive id"),
                relative_path: entry.relative_path.clone(),
                display_name: entry.display_name.clone(),
            })
        }

        fn write_entry(&self, location: &MediaLocation, bytes: &[u8]) -> Result<(), IndexError> {
            self.calls.lock().expect("calls").push("write_entry");
            if self.deny_mutations && !self.granted.load(Ordering::SeqCst) {
                return Err(self.denial());
            }
            let mut entries = self.entries.lock().expect("entries");
            let entry = entries
                .iter_mut()
                .find(|entry| entry.row.id == location.id.get())
                .ok_or_else(|| IndexError::Storage("no such entry".to_string()))?;
            entry.data = bytes.to_vec();
            Ok(())
        }

        fn finalize_entry(&self, location: &MediaLocation, size: u64) -> Result<(), IndexError> {
            self.calls.lock().expect("calls").push("finalize_entry");
            let mut entries = self.entries.lock().expect("entries");
            let entry = entries
                .iter_mut()
                .find(|entry| entry.row.id == location.id.get())
                .ok_or_else(|| IndexError::Storage("no such entry".to_string()))?;
            entry.pending = false;
            entry.row.size = Some(size as i64);
            Ok(())
        }

        fn delete_entry(&self, id: ImageId) -> Result<(), IndexError> {
            self.calls.lock().expect("calls").push("delete_entry");
            if self.deny_mutations && !self.granted.load(Ordering::SeqCst) {
                return Err(self.denial());
            }
            self.entries
                .lock()
                .expect("entries")
                .retain(|entry| entry.row.id != id.get());
            Ok(())
        }

        fn write_direct(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IndexError> {
            self.calls.lock().expect("calls").push("write_direct");
            if self.fail_direct {
                return Err(IndexError::Io("disk full".to_string()));
            }
            let mut next_id = self.next_id.lock().expect("next_id");
            let id = *next_id;
            *next_id += 1;
            self.entries.lock().expect("entries").push(FakeEntry {
                row: MediaRow {
                    id,
                    relative_path: "Pictures/Memeify".to_string(),
                    display_name: file_name.to_string(),
                    size: Some(bytes.len() as i64),
                    mime_type: "image/jpeg".to_string(),
                    width: None,
                    height: None,
                    date_modified: 0,
                },
                pending: false,
                data: bytes.to_vec(),
            });
            Ok(PathBuf::from(format!("Pictures/Memeify/{file_name}")))
        }
    }

    struct FakeEncoder;

    impl ImageEncoder for FakeEncoder {
        fn encode(
            &self,
            bitmap: &Bitmap,
            format: CompressFormat,
            quality: u8,
        ) -> Result<Vec<u8>, ApplicationError> {
            assert_eq!(quality, QUALITY);
            let marker = match format {
                CompressFormat::Png => 0x50,
                CompressFormat::Jpeg => 0x4A,
            };
            Ok(vec![marker, bitmap.width() as u8, bitmap.height() as u8])
        }
    }

    struct FakeClock;

    impl Clock for FakeClock {
        fn now_millis(&self) -> i64 {
            1_700_000_000_000
        }
    }

    fn service_with(index: FakeIndex) -> GalleryService {
        GalleryService::new(
            Box::new(index),
            Box::new(FakeEncoder),
            Box::new(FakeClock),
            "Pictures/Memeify".to_string(),
        )
    }

    fn row(id: i64, size: Option<i64>) -> MediaRow {
        MediaRow {
            id,
            relative_path: "Pictures/Camera".to_string(),
            display_name: format!("{id}.jpg"),
            size,
            mime_type: "image/jpeg".to_string(),
            width: None,
            height: None,
            date_modified: id,
        }
    }

    fn bitmap() -> Bitmap {
        Bitmap::new(2, 2, vec![0; 16]).expect("bitmap")
    }

    #[test]
    fn list_images_skips_rows_without_size() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        })
        .with_row(row(1, Some(1024)))
        .with_row(row(2, None))
        .with_row(row(3, Some(2048)));

        let images = service_with(index)
            .list_images(ListImagesCommand)
            .expect("list");

        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|image| image.size_bytes > 0));
        assert!(images.iter().all(|image| image.id.get() != 2));
    }

    #[test]
    fn save_names_entry_by_timestamp_and_extension() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        });
        let service = service_with(index);

        let outcome = service
            .save_image(SaveImageCommand {
                bitmap: bitmap(),
                format: CompressFormat::Png,
            })
            .expect("save");

        match outcome {
            SaveOutcome::Indexed(location) => {
                assert_eq!(location.display_name, "1700000000000.png");
                assert_eq!(location.relative_path, "Pictures/Memeify");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn save_runs_pending_protocol_in_order() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        });
        let calls = Arc::clone(&index.calls);
        let service = service_with(index);

        let saved = service
            .save_image(SaveImageCommand {
                bitmap: bitmap(),
                format: CompressFormat::Jpeg,
            })
            .expect("save");

        assert!(matches!(saved, SaveOutcome::Indexed(_)));
        assert_eq!(
            calls.lock().expect("calls").as_slice(),
            ["insert_pending", "write_entry", "finalize_entry"]
        );
        assert_eq!(service.list_images(ListImagesCommand).expect("list").len(), 1);
    }

    #[test]
    fn legacy_save_failure_degrades_to_failed() {
        let mut index = FakeIndex::new(StoragePolicy::Legacy);
        index.fail_direct = true;

        let outcome = service_with(index)
            .save_image(SaveImageCommand {
                bitmap: bitmap(),
                format: CompressFormat::Jpeg,
            })
            .expect("legacy save never errors");

        assert_eq!(outcome, SaveOutcome::Failed);
    }

    #[test]
    fn legacy_save_writes_directly() {
        let index = FakeIndex::new(StoragePolicy::Legacy);

        let outcome = service_with(index)
            .save_image(SaveImageCommand {
                bitmap: bitmap(),
                format: CompressFormat::Jpeg,
            })
            .expect("save");

        match outcome {
            SaveOutcome::Direct(path) => {
                assert!(path.to_string_lossy().ends_with("1700000000000.jpg"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn recoverable_update_denial_returns_token_without_partial_write() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        })
        .with_row(row(1, Some(1024)))
        .denying();

        let location = MediaLocation {
            id: ImageId::new(1).expect("id"),
            relative_path: "Pictures/Camera".to_string(),
            display_name: "1.jpg".to_string(),
        };

        let outcome = service_with(index)
            .update_image(UpdateImageCommand {
                location,
                bitmap: bitmap(),
                format: CompressFormat::Jpeg,
            })
            .expect("recoverable denial is not an error");

        match outcome {
            MutationOutcome::RecoveryRequired(token) => {
                assert_eq!(token.intent(), ModificationIntent::Update);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unrecoverable_denial_propagates() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: false,
        })
        .with_row(row(1, Some(1024)))
        .denying();

        let location = MediaLocation {
            id: ImageId::new(1).expect("id"),
            relative_path: "Pictures/Camera".to_string(),
            display_name: "1.jpg".to_string(),
        };

        let result = service_with(index).update_image(UpdateImageCommand {
            location,
            bitmap: bitmap(),
            format: CompressFormat::Jpeg,
        });

        assert!(matches!(
            result,
            Err(ApplicationError::PermissionDenied(_))
        ));
    }

    #[test]
    fn delete_denial_token_is_tagged_delete() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        })
        .with_row(row(1, Some(1024)))
        .denying();
        let service = service_with(index);

        let record = service
            .list_images(ListImagesCommand)
            .expect("list")
            .remove(0);

        let outcome = service
            .delete_image(DeleteImageCommand { record })
            .expect("recoverable denial is not an error");

        match outcome {
            MutationOutcome::RecoveryRequired(token) => {
                assert_eq!(token.intent(), ModificationIntent::Delete);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn delete_removes_single_row() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        })
        .with_row(row(1, Some(1024)))
        .with_row(row(2, Some(2048)));
        let service = service_with(index);

        let record = service
            .list_images(ListImagesCommand)
            .expect("list")
            .into_iter()
            .find(|image| image.id.get() == 1)
            .expect("record");

        let outcome = service
            .delete_image(DeleteImageCommand { record })
            .expect("delete");
        assert_eq!(outcome, MutationOutcome::Completed);

        let remaining = service.list_images(ListImagesCommand).expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.get(), 2);
    }

    struct ScriptedBroker {
        grant: bool,
        granted: Arc<AtomicBool>,
        asked: AtomicUsize,
    }

    impl ConsentBroker for ScriptedBroker {
        fn request_consent(&self, _token: &RecoveryToken) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            if self.grant {
                self.granted.store(true, Ordering::SeqCst);
            }
            self.grant
        }
    }

    #[test]
    fn recovery_flow_retries_once_after_consent() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        })
        .with_row(row(1, Some(1024)))
        .denying();
        let granted = Arc::clone(&index.granted);
        let service = service_with(index);

        let broker = ScriptedBroker {
            grant: true,
            granted,
            asked: AtomicUsize::new(0),
        };

        let location = MediaLocation {
            id: ImageId::new(1).expect("id"),
            relative_path: "Pictures/Camera".to_string(),
            display_name: "1.jpg".to_string(),
        };

        let attempts = AtomicUsize::new(0);
        let report = run_with_recovery(&broker, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            service.update_image(UpdateImageCommand {
                location: location.clone(),
                bitmap: bitmap(),
                format: CompressFormat::Jpeg,
            })
        })
        .expect("recovery flow");

        assert_eq!(report, MutationReport::Completed);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(broker.asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn refused_consent_is_terminal() {
        let index = FakeIndex::new(StoragePolicy::Scoped {
            recovery_supported: true,
        })
        .with_row(row(1, Some(1024)))
        .denying();
        let granted = Arc::clone(&index.granted);
        let service = service_with(index);

        let broker = ScriptedBroker {
            grant: false,
            granted,
            asked: AtomicUsize::new(0),
        };

        let record = service
            .list_images(ListImagesCommand)
            .expect("list")
            .remove(0);

        let report = run_with_recovery(&broker, || {
            service.delete_image(DeleteImageCommand {
                record: record.clone(),
            })
        })
        .expect("recovery flow");

        assert_eq!(report, MutationReport::Denied(ModificationIntent::Delete));
    }
}
