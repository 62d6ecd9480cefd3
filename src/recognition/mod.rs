//! Interfaces to the external recognition engines.
//!
//! The OCR engine and the object detector are consumed through these traits;
//! [`ocr`] and [`detector`] hold the adapters for the engines this crate
//! ships with.

pub mod coco;
pub mod detector;
pub mod ocr;

use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{DetectionError, RecognitionError};
use crate::models::{BoundingBox, RecognizedText};

pub use detector::{RtenDetector, RtenDetectorFactory};
pub use ocr::OcrsRecognizer;

/// Phase an OCR engine reports while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionStatus {
    LoadingModel,
    Initializing,
    DetectingText,
    RecognizingText,
    Other(String),
}

impl fmt::Display for RecognitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionStatus::LoadingModel => write!(f, "loading model"),
            RecognitionStatus::Initializing => write!(f, "initializing"),
            RecognitionStatus::DetectingText => write!(f, "detecting text"),
            RecognitionStatus::RecognizingText => write!(f, "recognizing text"),
            RecognitionStatus::Other(status) => write!(f, "{status}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: RecognitionStatus,
    /// Fraction of the current phase completed
    pub progress: f32,
}

impl ProgressEvent {
    pub fn new(status: RecognitionStatus, progress: f32) -> Self {
        Self { status, progress }
    }
}

/// Receives progress events from an engine, possibly from a worker thread.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

/// Tracks the fraction of the "recognizing text" phase completed.
///
/// Only [`RecognitionStatus::RecognizingText`] events move the value; it is
/// always clamped to [0, 1]. Readers hold a [`ProgressReader`].
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    sender: Arc<watch::Sender<f32>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0.0);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn reader(&self) -> ProgressReader {
        ProgressReader {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn reset(&self) {
        self.sender.send_replace(0.0);
    }

    pub fn get(&self) -> f32 {
        *self.sender.borrow()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressTracker {
    fn on_progress(&self, event: ProgressEvent) {
        if event.status != RecognitionStatus::RecognizingText {
            return;
        }
        let progress = if event.progress.is_finite() {
            event.progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.sender.send_replace(progress);
    }
}

#[derive(Debug, Clone)]
pub struct ProgressReader {
    receiver: watch::Receiver<f32>,
}

impl ProgressReader {
    pub fn get(&self) -> f32 {
        *self.receiver.borrow()
    }

    /// Wait for the next progress change. Returns `None` once the tracker is gone.
    pub async fn changed(&mut self) -> Option<f32> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }
}

/// An optical-character-recognition engine.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(
        &self,
        image: Arc<DynamicImage>,
        language: &str,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<RecognizedText, RecognitionError>;
}

/// A detection as reported by a model, in source-image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// A loaded object-detection model.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: Arc<DynamicImage>) -> Result<Vec<Detection>, DetectionError>;
}

/// Produces detector handles; called once per selected image.
#[async_trait]
pub trait DetectorFactory: Send + Sync {
    async fn load(&self) -> Result<Box<dyn ObjectDetector>, DetectionError>;
}
