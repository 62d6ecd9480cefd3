use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::RecognitionError;
use crate::intake::{ImageSlot, Preview, PreviewStore, SelectedImage};
use crate::models::{RecognizedText, rounded_percent};
use crate::recognition::{ProgressObserver, ProgressReader, ProgressTracker, TextRecognizer};

pub const DEFAULT_LANGUAGE: &str = "eng";

/// State of the "image to text" screen.
///
/// A run goes through [`begin`](Self::begin), the engine call, and
/// [`finish`](Self::finish); [`extract`](Self::extract) does all three.
pub struct TextExtraction {
    slot: ImageSlot,
    previews: PreviewStore,
    language: String,
    text: String,
    loading: bool,
    progress: ProgressTracker,
    error: Option<String>,
}

/// Everything an engine needs for one run, detached from the screen so it
/// can be awaited elsewhere.
pub struct RecognitionJob {
    pub image: Arc<DynamicImage>,
    pub language: String,
    pub observer: Arc<dyn ProgressObserver>,
}

impl RecognitionJob {
    pub async fn run(self, engine: &dyn TextRecognizer) -> Result<RecognizedText, RecognitionError> {
        engine.recognize(self.image, &self.language, self.observer).await
    }
}

impl TextExtraction {
    pub fn new(previews: PreviewStore) -> Self {
        Self::with_language(previews, DEFAULT_LANGUAGE)
    }

    pub fn with_language(previews: PreviewStore, language: impl Into<String>) -> Self {
        Self {
            slot: ImageSlot::default(),
            previews,
            language: language.into(),
            text: String::new(),
            loading: false,
            progress: ProgressTracker::new(),
            error: None,
        }
    }

    /// Replace the selected image; the previous preview is revoked.
    ///
    /// The selection is locked while a run is in flight, so a result always
    /// belongs to the image shown. Returns `false` when refused.
    pub fn select(&mut self, image: SelectedImage) -> bool {
        if self.loading {
            debug!("Keeping {} selected until OCR finishes", self.slot_name());
            return false;
        }
        let url = self.previews.create_object_url(&image);
        self.slot.replace(image, Preview::ObjectUrl(url));
        true
    }

    /// Drop the selected image. Refused while a run is in flight.
    pub fn clear_selection(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.slot.clear();
        true
    }

    /// Whether the selection can be changed right now.
    pub fn can_change_selection(&self) -> bool {
        !self.loading
    }

    fn slot_name(&self) -> &str {
        self.slot.image().map(SelectedImage::name).unwrap_or("<none>")
    }

    pub fn can_extract(&self) -> bool {
        !self.slot.is_empty() && !self.loading
    }

    /// Start a run. Returns `None` when no image is selected or a run is
    /// already in flight.
    pub fn begin(&mut self) -> Option<RecognitionJob> {
        if !self.can_extract() {
            return None;
        }
        let image = self.slot.image()?;
        debug!("Extracting text from {} ({})", image.name(), self.language);

        self.loading = true;
        self.text.clear();
        self.error = None;
        self.progress.reset();

        Some(RecognitionJob {
            image: image.image(),
            language: self.language.clone(),
            observer: Arc::new(self.progress.clone()),
        })
    }

    /// Complete the current run. Progress returns to 0 whatever the outcome.
    pub fn finish(&mut self, outcome: Result<RecognizedText, RecognitionError>) {
        if !self.loading {
            debug!("Ignoring OCR result with no run in flight");
            return;
        }
        match outcome {
            Ok(recognized) => {
                info!("Extracted {} characters", recognized.text.chars().count());
                self.text = recognized.text;
            }
            Err(e) => {
                warn!("Text extraction failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
        self.loading = false;
        self.progress.reset();
    }

    /// Run a full extraction against `engine`. Returns `false` if the run
    /// could not start.
    pub async fn extract(&mut self, engine: &dyn TextRecognizer) -> bool {
        let Some(job) = self.begin() else {
            return false;
        };
        let outcome = job.run(engine).await;
        self.finish(outcome);
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn progress(&self) -> f32 {
        self.progress.get()
    }

    pub fn progress_reader(&self) -> ProgressReader {
        self.progress.reader()
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.slot.image()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.slot.preview()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn button_label(&self) -> String {
        if self.loading {
            format!("Extracting... {}%", rounded_percent(self.progress()))
        } else {
            "Extract Text".to_string()
        }
    }
}
