use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, Rgb};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use picscan::error::{DetectionError, RecognitionError};
use picscan::models::{BoundingBox, RecognizedText};
use picscan::recognition::{
    Detection, DetectorFactory, ObjectDetector, ProgressEvent, ProgressObserver, TextRecognizer,
};
use picscan::SelectedImage;

/// Encodes a solid red image of the given size as PNG bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| {
        Rgb([255u8, 0u8, 0u8])
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}

/// Creates a 100x100 red test image and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image() -> NamedTempFile {
    let img = ImageBuffer::from_fn(100, 100, |_, _| Rgb([255u8, 0u8, 0u8]));
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// An in-memory selected image of the given size.
pub fn make_selected_image(name: &str, width: u32, height: u32) -> SelectedImage {
    SelectedImage::from_bytes(name, png_bytes(width, height)).expect("Failed to select test image")
}

/// OCR engine returning a fixed text after replaying a list of progress events.
pub struct FakeRecognizer {
    pub text: String,
    pub error: Option<RecognitionError>,
    pub events: Vec<ProgressEvent>,
    pub calls: AtomicUsize,
    pub languages: Mutex<Vec<String>>,
}

impl FakeRecognizer {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            error: None,
            events: Vec::new(),
            calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RecognitionError) -> Self {
        Self {
            error: Some(error),
            ..Self::returning("")
        }
    }

    pub fn with_events(mut self, events: Vec<ProgressEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for FakeRecognizer {
    async fn recognize(
        &self,
        _image: Arc<DynamicImage>,
        language: &str,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<RecognizedText, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(language.to_string());
        for event in &self.events {
            observer.on_progress(event.clone());
        }
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(RecognizedText::new(self.text.clone())),
        }
    }
}

/// Detector factory handing out detectors with a fixed outcome.
pub struct FakeDetectorFactory {
    pub outcome: Result<Vec<Detection>, DetectionError>,
    pub loads: AtomicUsize,
}

impl FakeDetectorFactory {
    pub fn returning(detections: Vec<Detection>) -> Self {
        Self {
            outcome: Ok(detections),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: DetectionError) -> Self {
        Self {
            outcome: Err(error),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

struct FakeDetector {
    outcome: Result<Vec<Detection>, DetectionError>,
}

#[async_trait]
impl ObjectDetector for FakeDetector {
    async fn detect(&self, _image: Arc<DynamicImage>) -> Result<Vec<Detection>, DetectionError> {
        self.outcome.clone()
    }
}

#[async_trait]
impl DetectorFactory for FakeDetectorFactory {
    async fn load(&self) -> Result<Box<dyn ObjectDetector>, DetectionError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDetector {
            outcome: self.outcome.clone(),
        }))
    }
}

pub fn detection(label: &str, confidence: f32, x: f32, y: f32, width: f32, height: f32) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bbox: BoundingBox::new(x, y, width, height),
    }
}
