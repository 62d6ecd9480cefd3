use async_trait::async_trait;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ProgressEvent, ProgressObserver, RecognitionStatus, TextRecognizer};
use crate::config::OcrSettings;
use crate::error::RecognitionError;
use crate::models::RecognizedText;

/// Languages the bundled recognition model can read.
pub const SUPPORTED_LANGUAGES: &[&str] = &["eng"];

/// OCR backed by `ocrs`, with models loaded from disk on first use.
pub struct OcrsRecognizer {
    detection_model: PathBuf,
    recognition_model: PathBuf,
    lines_per_batch: usize,
    // Lazy-initialized, shared with the blocking worker via Arc
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsRecognizer {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            detection_model: settings.detection_model.clone(),
            recognition_model: settings.recognition_model.clone(),
            lines_per_batch: settings.lines_per_batch.max(1),
            engine: Mutex::new(None),
        }
    }

    async fn engine(&self, observer: &dyn ProgressObserver) -> Result<Arc<OcrEngine>, RecognitionError> {
        let mut guard = self.engine.lock().await;
        if let Some(engine) = guard.as_ref() {
            return Ok(engine.clone());
        }

        observer.on_progress(ProgressEvent::new(RecognitionStatus::LoadingModel, 0.0));
        let detection = self.detection_model.clone();
        let recognition = self.recognition_model.clone();
        let engine = tokio::task::spawn_blocking(move || init_ocr_engine(&detection, &recognition))
            .await
            .map_err(|e| RecognitionError::Worker(e.to_string()))??;
        observer.on_progress(ProgressEvent::new(RecognitionStatus::LoadingModel, 1.0));
        info!("OCR engine initialized");

        let engine = Arc::new(engine);
        *guard = Some(engine.clone());
        Ok(engine)
    }
}

/// Initialize the OCR engine from a pair of `.rten` model files
pub fn init_ocr_engine(
    detection_model_path: &Path,
    recognition_model_path: &Path,
) -> Result<OcrEngine, RecognitionError> {
    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(RecognitionError::ModelsMissing {
            detection: detection_model_path.display().to_string(),
            recognition: recognition_model_path.display().to_string(),
        });
    }

    debug!("Loading OCR models from {}", detection_model_path.display());
    let detection_model = Model::load_file(detection_model_path).map_err(engine_err)?;
    let recognition_model = Model::load_file(recognition_model_path).map_err(engine_err)?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(engine_err)
}

fn engine_err(e: impl std::fmt::Display) -> RecognitionError {
    RecognitionError::Engine(e.to_string())
}

/// Detect and read all text lines in `image`, reporting per-batch progress.
fn recognize_lines(
    engine: &OcrEngine,
    image: &DynamicImage,
    lines_per_batch: usize,
    observer: &dyn ProgressObserver,
) -> Result<String, RecognitionError> {
    observer.on_progress(ProgressEvent::new(RecognitionStatus::Initializing, 0.0));
    let img = image.to_rgb8();
    let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions()).map_err(engine_err)?;
    let ocr_input = engine.prepare_input(img_source).map_err(engine_err)?;
    observer.on_progress(ProgressEvent::new(RecognitionStatus::Initializing, 1.0));

    observer.on_progress(ProgressEvent::new(RecognitionStatus::DetectingText, 0.0));
    let word_rects = engine.detect_words(&ocr_input).map_err(engine_err)?;
    let line_rects = engine.find_text_lines(&ocr_input, &word_rects);
    observer.on_progress(ProgressEvent::new(RecognitionStatus::DetectingText, 1.0));
    debug!("Found {} words in {} lines", word_rects.len(), line_rects.len());

    observer.on_progress(ProgressEvent::new(RecognitionStatus::RecognizingText, 0.0));
    let total = line_rects.len();
    let mut lines = Vec::with_capacity(total);
    let mut done = 0;
    for batch in line_rects.chunks(lines_per_batch) {
        let recognized = engine
            .recognize_text(&ocr_input, batch)
            .map_err(engine_err)?;
        lines.extend(recognized.into_iter().flatten().map(|line| line.to_string()));
        done += batch.len();
        observer.on_progress(ProgressEvent::new(
            RecognitionStatus::RecognizingText,
            done as f32 / total as f32,
        ));
    }
    observer.on_progress(ProgressEvent::new(RecognitionStatus::RecognizingText, 1.0));

    Ok(lines.join("\n"))
}

#[async_trait]
impl TextRecognizer for OcrsRecognizer {
    async fn recognize(
        &self,
        image: Arc<DynamicImage>,
        language: &str,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<RecognizedText, RecognitionError> {
        if !SUPPORTED_LANGUAGES.contains(&language) {
            return Err(RecognitionError::UnsupportedLanguage(language.to_string()));
        }

        let engine = self.engine(observer.as_ref()).await?;
        let lines_per_batch = self.lines_per_batch;
        let text = tokio::task::spawn_blocking(move || {
            recognize_lines(&engine, &image, lines_per_batch, observer.as_ref())
        })
        .await
        .map_err(|e| RecognitionError::Worker(e.to_string()))??;

        Ok(RecognizedText::new(text))
    }
}
