mod config;
mod consent;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::AppConfig;
use consent::PromptConsentBroker;
use memeify_adapters::{
    load_bitmap, present_details, present_image_row, ImageCrateEncoder, SqliteMediaIndex,
    SystemClock,
};
use memeify_application::{
    run_with_recovery, ApplicationError, DeleteImageCommand, GalleryEvent, GalleryJob,
    GalleryService, GalleryWorker, ListImagesCommand, MediaIndex, SaveImageCommand, SaveOutcome,
    UpdateImageCommand,
};
use memeify_domain::{
    CompressFormat, ImageId, ImageRecord, ModificationIntent, MutationOutcome, MutationReport,
};

const CONFIG_FILE: &str = "memeify.json";

fn main() -> ExitCode {
    logging::init_logging();
    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::load(Path::new(CONFIG_FILE));

    let index = SqliteMediaIndex::new(
        PathBuf::from(&config.storage_root),
        config.app_name.clone(),
        config.policy(),
    );
    if let Err(error) = index.initialize() {
        eprintln!("failed to open media index: {error}");
        return ExitCode::from(1);
    }

    let service = GalleryService::new(
        Box::new(index.clone()),
        Box::new(ImageCrateEncoder),
        Box::new(SystemClock),
        index.pictures_dir(),
    );
    let worker = GalleryWorker::spawn(service);

    let command = parse_command(&args);
    match run_command(command, &worker, &index) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            print_usage();
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

#[derive(Debug, Clone)]
enum Command {
    List { json: bool },
    Show { image_id: i64 },
    Save { file: String, format: Option<CompressFormat> },
    Update { image_id: i64, file: String },
    Delete { image_id: i64 },
}

#[derive(Debug, Clone)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

fn parse_command(args: &[String]) -> Result<Command, CommandError> {
    if args.len() <= 1 {
        return Ok(Command::List { json: false });
    }

    match args[1].as_str() {
        "list" => {
            let json = match args.get(2).map(String::as_str) {
                None => false,
                Some("--json") => true,
                Some(other) => {
                    return Err(CommandError::Usage(format!("unknown flag: {other}")))
                }
            };
            Ok(Command::List { json })
        }
        "show" => Ok(Command::Show {
            image_id: parse_image_id(args.get(2))?,
        }),
        "save" => {
            let file = args
                .get(2)
                .ok_or_else(|| CommandError::Usage("missing image file".to_string()))?
                .clone();
            let format = args.get(3).map(|name| parse_format(name)).transpose()?;
            Ok(Command::Save { file, format })
        }
        "update" => Ok(Command::Update {
            image_id: parse_image_id(args.get(2))?,
            file: args
                .get(3)
                .ok_or_else(|| CommandError::Usage("missing image file".to_string()))?
                .clone(),
        }),
        "delete" => Ok(Command::Delete {
            image_id: parse_image_id(args.get(2))?,
        }),
        other => Err(CommandError::Usage(format!("unknown command: {other}"))),
    }
}

fn parse_image_id(arg: Option<&String>) -> Result<i64, CommandError> {
    let arg = arg.ok_or_else(|| CommandError::Usage("missing image id".to_string()))?;
    arg.parse::<i64>()
        .map_err(|_| CommandError::Usage(format!("invalid image id: {arg}")))
}

fn parse_format(name: &str) -> Result<CompressFormat, CommandError> {
    match name.to_ascii_lowercase().as_str() {
        "png" => Ok(CompressFormat::Png),
        "jpg" | "jpeg" => Ok(CompressFormat::Jpeg),
        other => Err(CommandError::Usage(format!("unknown format: {other}"))),
    }
}

fn run_command(
    command: Result<Command, CommandError>,
    worker: &GalleryWorker,
    index: &SqliteMediaIndex,
) -> Result<(), CommandError> {
    match command? {
        Command::List { json } => {
            let images = list_images(worker)?;
            if json {
                let rendered = serde_json::to_string_pretty(&images)
                    .map_err(|error| CommandError::Runtime(error.to_string()))?;
                println!("{rendered}");
                return Ok(());
            }
            if images.is_empty() {
                println!("no images in shared storage");
                return Ok(());
            }
            for image in images {
                println!("{}", present_image_row(&image));
            }
            Ok(())
        }
        Command::Show { image_id } => {
            let record = find_image(worker, image_id)?;
            println!("{}", present_details(&record));
            Ok(())
        }
        Command::Save { file, format } => {
            let path = Path::new(&file);
            let bitmap = load_bitmap(path)
                .map_err(|error| CommandError::Runtime(format!("cannot read {file}: {error}")))?;
            let format = format.unwrap_or_else(|| CompressFormat::from_path(path));

            worker
                .submit(GalleryJob::Save(SaveImageCommand { bitmap, format }))
                .map_err(|error| CommandError::Runtime(error.to_string()))?;
            match worker
                .wait_event()
                .map_err(|error| CommandError::Runtime(error.to_string()))?
            {
                GalleryEvent::Saved(SaveOutcome::Indexed(location)) => {
                    println!(
                        "saved {}/{} (entry {})",
                        location.relative_path,
                        location.display_name,
                        location.id.get()
                    );
                    Ok(())
                }
                GalleryEvent::Saved(SaveOutcome::Direct(path)) => {
                    println!("saved {}", path.display());
                    Ok(())
                }
                GalleryEvent::Saved(SaveOutcome::Failed) => {
                    Err(CommandError::Runtime("save failed".to_string()))
                }
                GalleryEvent::Failed(error) => {
                    Err(CommandError::Runtime(format!("save failed: {error}")))
                }
                other => Err(CommandError::Runtime(format!("unexpected event: {other:?}"))),
            }
        }
        Command::Update { image_id, file } => {
            let record = find_image(worker, image_id)?;
            let bitmap = load_bitmap(Path::new(&file))
                .map_err(|error| CommandError::Runtime(format!("cannot read {file}: {error}")))?;
            let command = UpdateImageCommand {
                location: record.location(),
                bitmap,
                format: CompressFormat::from_mime(&record.mime_type),
            };

            let broker = PromptConsentBroker::new(index.clone());
            let report = run_with_recovery(&broker, || {
                mutation_attempt(worker, GalleryJob::Update(command.clone()))
            })
            .map_err(|error| CommandError::Runtime(format!("update failed: {error}")))?;
            report_mutation(report, image_id)
        }
        Command::Delete { image_id } => {
            let record = find_image(worker, image_id)?;
            let command = DeleteImageCommand { record };

            let broker = PromptConsentBroker::new(index.clone());
            let report = run_with_recovery(&broker, || {
                mutation_attempt(worker, GalleryJob::Delete(command.clone()))
            })
            .map_err(|error| CommandError::Runtime(format!("delete failed: {error}")))?;
            report_mutation(report, image_id)
        }
    }
}

fn list_images(worker: &GalleryWorker) -> Result<Vec<ImageRecord>, CommandError> {
    worker
        .submit(GalleryJob::ListImages(ListImagesCommand))
        .map_err(|error| CommandError::Runtime(error.to_string()))?;
    match worker
        .wait_event()
        .map_err(|error| CommandError::Runtime(error.to_string()))?
    {
        GalleryEvent::Images(images) => Ok(images),
        GalleryEvent::Failed(error) => {
            Err(CommandError::Runtime(format!("list failed: {error}")))
        }
        other => Err(CommandError::Runtime(format!("unexpected event: {other:?}"))),
    }
}

fn find_image(worker: &GalleryWorker, image_id: i64) -> Result<ImageRecord, CommandError> {
    let image_id = ImageId::new(image_id)
        .map_err(|error| CommandError::Usage(format!("invalid image id: {error}")))?;
    list_images(worker)?
        .into_iter()
        .find(|image| image.id == image_id)
        .ok_or_else(|| {
            CommandError::Runtime(format!("no image with id {}", image_id.get()))
        })
}

/// One update or delete attempt through the worker, unwrapped back to the
/// outcome the recovery flow consumes.
fn mutation_attempt(
    worker: &GalleryWorker,
    job: GalleryJob,
) -> Result<MutationOutcome, ApplicationError> {
    worker.submit(job)?;
    match worker.wait_event()? {
        GalleryEvent::Updated(outcome) | GalleryEvent::Deleted(outcome) => Ok(outcome),
        GalleryEvent::Failed(error) => Err(error),
        other => Err(ApplicationError::Persistence(format!(
            "unexpected event: {other:?}"
        ))),
    }
}

fn report_mutation(report: MutationReport, image_id: i64) -> Result<(), CommandError> {
    match report {
        MutationReport::Completed => {
            println!("done: image {image_id}");
            Ok(())
        }
        MutationReport::Denied(ModificationIntent::Update) => Err(CommandError::Runtime(
            format!("not allowed to modify image {image_id}"),
        )),
        MutationReport::Denied(ModificationIntent::Delete) => Err(CommandError::Runtime(
            format!("not allowed to delete image {image_id}"),
        )),
    }
}

fn print_usage() {
    println!("usage:");
    println!("  memeify list [--json]");
    println!("  memeify show <image_id>");
    println!("  memeify save <file> [png|jpeg]");
    println!("  memeify update <image_id> <file>");
    println!("  memeify delete <image_id>");
}
