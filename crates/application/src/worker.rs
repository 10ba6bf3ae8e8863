use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use memeify_domain::{ImageRecord, MutationOutcome};

use crate::{
    ApplicationError, DeleteImageCommand, GalleryService, ListImagesCommand, SaveImageCommand,
    SaveOutcome, UpdateImageCommand,
};

#[derive(Debug, Clone)]
pub enum GalleryJob {
    ListImages(ListImagesCommand),
    Save(SaveImageCommand),
    Update(UpdateImageCommand),
    Delete(DeleteImageCommand),
}

#[derive(Debug)]
pub enum GalleryEvent {
    Images(Vec<ImageRecord>),
    Saved(SaveOutcome),
    Updated(MutationOutcome),
    Deleted(MutationOutcome),
    Failed(ApplicationError),
}

/// Runs the gallery service on a worker thread so no catalog read, write
/// or delete ever blocks the submitting thread. Jobs go in over a channel,
/// typed events come back. No timeouts: a hung platform call parks the
/// worker until the process exits.
pub struct GalleryWorker {
    jobs: Option<Sender<GalleryJob>>,
    events: Receiver<GalleryEvent>,
    handle: Option<JoinHandle<()>>,
}

impl GalleryWorker {
    pub fn spawn(service: GalleryService) -> Self {
        let (job_tx, job_rx) = channel::<GalleryJob>();
        let (event_tx, event_rx) = channel::<GalleryEvent>();

        let handle = thread::spawn(move || {
            while let Ok(job) = job_rx.recv() {
                // Owning scope torn down mid-operation: abandon the result.
                if event_tx.send(run_job(&service, job)).is_err() {
                    break;
                }
            }
        });

        Self {
            jobs: Some(job_tx),
            events: event_rx,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, job: GalleryJob) -> Result<(), ApplicationError> {
        match &self.jobs {
            Some(jobs) => jobs
                .send(job)
                .map_err(|_| ApplicationError::Persistence("gallery worker has shut down".to_string())),
            None => Err(ApplicationError::Persistence(
                "gallery worker has shut down".to_string(),
            )),
        }
    }

    /// Blocks until the next completed operation reports back.
    pub fn wait_event(&self) -> Result<GalleryEvent, ApplicationError> {
        self.events
            .recv()
            .map_err(|_| ApplicationError::Persistence("gallery worker has shut down".to_string()))
    }

    pub fn try_event(&self) -> Option<GalleryEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for GalleryWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_job(service: &GalleryService, job: GalleryJob) -> GalleryEvent {
    match job {
        GalleryJob::ListImages(command) => match service.list_images(command) {
            Ok(images) => GalleryEvent::Images(images),
            Err(error) => GalleryEvent::Failed(error),
        },
        GalleryJob::Save(command) => match service.save_image(command) {
            Ok(outcome) => GalleryEvent::Saved(outcome),
            Err(error) => GalleryEvent::Failed(error),
        },
        GalleryJob::Update(command) => match service.update_image(command) {
            Ok(outcome) => GalleryEvent::Updated(outcome),
            Err(error) => GalleryEvent::Failed(error),
        },
        GalleryJob::Delete(command) => match service.delete_image(command) {
            Ok(outcome) => GalleryEvent::Deleted(outcome),
            Err(error) => GalleryEvent::Failed(error),
        },
    }
}
