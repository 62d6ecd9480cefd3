use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use picscan::overlay::{ImageCanvas, OverlayStyle};
use picscan::recognition::{OcrsRecognizer, RtenDetectorFactory};
use picscan::{ObjectDetection, PreviewStore, SelectedImage, Settings, TextExtraction};

#[derive(Parser)]
#[command(name = "picscan")]
#[command(about = "Extract text from images and detect objects in them")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML settings file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Read the text in an image
    ExtractText {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,
    },
    /// Detect objects in an image
    Detect {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Write the preview with boxes and labels drawn on it
        #[arg(long, value_name = "FILE")]
        overlay_out: Option<PathBuf>,
    },
    /// Open the desktop app
    #[cfg(feature = "gui")]
    Gui,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let settings = Settings::load(args.config.as_deref())?;
    picscan::logging::init(if args.verbose { "debug" } else { settings.log.level.as_str() });
    debug!("Settings: {:?}", settings);

    // The GUI brings its own runtime.
    let runtime = || {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")
    };

    match args.command {
        Command::ExtractText { image_path } => {
            runtime()?.block_on(extract_text(&settings, image_path))
        }
        Command::Detect {
            image_path,
            overlay_out,
        } => runtime()?.block_on(detect(&settings, image_path, overlay_out)),
        #[cfg(feature = "gui")]
        Command::Gui => picscan::gui::run(settings),
    }
}

async fn extract_text(settings: &Settings, image_path: PathBuf) -> anyhow::Result<()> {
    let image = SelectedImage::from_path(&image_path)?;
    let engine = OcrsRecognizer::new(&settings.ocr);

    let mut screen = TextExtraction::with_language(PreviewStore::new(), settings.ocr.language.clone());
    screen.select(image);

    let mut progress = screen.progress_reader();
    let reporter = tokio::spawn(async move {
        while let Some(value) = progress.changed().await {
            if value > 0.0 {
                eprint!("\rExtracting... {}%", picscan::models::rounded_percent(value));
            }
        }
    });

    screen.extract(&engine).await;
    reporter.abort();
    eprintln!();

    if let Some(error) = screen.error() {
        anyhow::bail!("Text extraction failed: {}", error);
    }

    println!("=== Extracted Text ===");
    if screen.text().is_empty() {
        println!("No text found.");
    } else {
        println!("{}", screen.text());
    }
    Ok(())
}

async fn detect(
    settings: &Settings,
    image_path: PathBuf,
    overlay_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let image = SelectedImage::from_path(&image_path)?;
    let factory = RtenDetectorFactory::new(&settings.detector);

    let mut screen =
        ObjectDetection::new(settings.display.width).with_style(OverlayStyle::from(&settings.overlay));
    if !screen.detect(&factory, image).await {
        anyhow::bail!("Object detection failed for {}", image_path.display());
    }

    println!("=== Object Detection Results ===");
    println!("Total detections: {}", screen.objects().len());
    for item in screen.items() {
        println!("  {}", item);
    }

    if let Some(out) = overlay_out {
        let mut canvas = ImageCanvas::from_settings(&settings.overlay)?;
        screen.render(&mut canvas);
        let selected = screen
            .selected()
            .context("No image selected after detection")?;
        canvas
            .composite(&selected.image())
            .save(&out)
            .with_context(|| format!("Failed to save overlay to {}", out.display()))?;
        println!("Overlay written to {}", out.display());
    }

    Ok(())
}
