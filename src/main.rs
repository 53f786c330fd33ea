//! Pixelscribe - image folder browser backend
//!
//! Command-line front end over the library's backend.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pixelscribe::app::{init_metrics, init_tracing, metrics, Backend, FolderPicker};
use pixelscribe::ocr::{default_engine, OcrProgress, OcrStatus};
use pixelscribe::watcher::ImageFile;
use pixelscribe::{Config, Error, Result};

/// Pixelscribe - image folder browser backend
#[derive(Parser, Debug)]
#[command(name = "pixelscribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the persisted settings
    #[arg(short, long, env = "PIXELSCRIBE_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PIXELSCRIBE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "PIXELSCRIBE_LOG_JSON")]
    log_json: bool,

    /// Quiet period before file changes are reported, in milliseconds
    #[arg(long, env = "PIXELSCRIBE_DEBOUNCE_MS", default_value = "100")]
    debounce_ms: u64,

    /// Tesseract language code(s)
    #[arg(long = "lang", env = "PIXELSCRIBE_OCR_LANG", default_value = "eng")]
    ocr_language: String,

    /// Directory containing tesseract language data
    #[arg(long = "tessdata", env = "TESSDATA_PREFIX")]
    tessdata_dir: Option<PathBuf>,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the project folder, or set it
    Folder {
        /// New project folder
        path: Option<PathBuf>,
    },

    /// List images in the project folder, newest first
    Scan {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-scan the project folder whenever its images change
    Watch,

    /// Recognize text in images
    Ocr {
        /// Images to process, in order
        #[arg(required_unless_present = "all")]
        paths: Vec<PathBuf>,

        /// Process every image in the project folder
        #[arg(long, conflicts_with = "paths")]
        all: bool,
    },
}

/// Folder "picked" on the command line.
struct ArgumentPicker(PathBuf);

impl FolderPicker for ArgumentPicker {
    fn pick_folder(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::debug!(
        "Pixelscribe v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config {
        data_dir: cli.data_dir,
        log_level: cli.log_level,
        debounce_ms: cli.debounce_ms,
        ocr_language: cli.ocr_language,
        tessdata_dir: cli.tessdata_dir,
    };

    tracing::debug!(?config, "Configuration loaded");

    init_metrics();

    let backend = Backend::open(&config, default_engine(&config))?;

    let outcome = match cli.command {
        Command::Folder { path } => folder(&backend, path),
        Command::Scan { json } => scan(&backend, json).await,
        Command::Watch => watch(&backend).await,
        Command::Ocr { paths, all } => ocr(&backend, paths, all).await,
    };

    backend.shutdown();

    if cli.metrics {
        print!("{}", metrics::render()?);
    }

    outcome
}

fn folder(backend: &Backend, path: Option<PathBuf>) -> Result<()> {
    let folder = match path {
        Some(path) => {
            let path = if path.is_absolute() {
                path
            } else {
                std::env::current_dir()?.join(path)
            };
            backend.select_project_folder(&ArgumentPicker(path))
        }
        None => backend.project_folder(),
    };

    match folder {
        Some(folder) => println!("{}", folder.display()),
        None => println!("(no project folder)"),
    }
    Ok(())
}

async fn scan(backend: &Backend, json: bool) -> Result<()> {
    let images = backend.scan_images_async().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&images)?);
    } else {
        for image in &images {
            println!("{}", describe(image));
        }
        tracing::info!(count = images.len(), "Scan finished");
    }
    Ok(())
}

async fn watch(backend: &Backend) -> Result<()> {
    let Some(folder) = backend.project_folder() else {
        return Err(Error::config(
            "no project folder set; run `pixelscribe folder <PATH>` first",
        ));
    };
    if !backend.is_watching() {
        return Err(Error::config(format!(
            "project folder '{}' cannot be watched",
            folder.display()
        )));
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _changes = backend.on_files_changed(move || {
        let _ = tx.send(());
    });

    println!(
        "{} images in {} (Ctrl-C to stop)",
        backend.scan_images_async().await?.len(),
        folder.display()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(()) = rx.recv() => {
                let images = backend.scan_images_async().await?;
                println!("changed: {} images", images.len());
            }
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

async fn ocr(backend: &Backend, paths: Vec<PathBuf>, all: bool) -> Result<()> {
    let paths = if all {
        backend
            .scan_images_async()
            .await?
            .into_iter()
            .map(|image| image.path)
            .collect()
    } else {
        paths
    };

    let _progress = backend.on_ocr_progress(log_progress);

    let canceller = backend.ocr_canceller();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current image");
            canceller.cancel();
        }
    });

    let response = backend.run_ocr(paths).await;
    interrupt.abort();

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn log_progress(progress: &OcrProgress) {
    match progress.status {
        OcrStatus::Processing if progress.image_progress == 0 => {
            if let Some(image) = &progress.current_image {
                tracing::info!(
                    "[{}/{}] {}",
                    progress.current_index + 1,
                    progress.total_images,
                    image.display()
                );
            }
        }
        status if status.is_terminal() => {
            tracing::info!(%status, overall = progress.overall_progress, "OCR finished");
        }
        _ => {}
    }
}

fn describe(image: &ImageFile) -> String {
    let modified = chrono::DateTime::from_timestamp_millis(image.modified_at)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    match &image.folder {
        Some(folder) => format!("{modified:16}  {folder}/{}", image.name),
        None => format!("{modified:16}  {}", image.name),
    }
}
