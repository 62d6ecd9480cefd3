pub mod config;
pub mod error;
pub mod intake;
pub mod logging;
pub mod models;
pub mod overlay;
pub mod recognition;
pub mod screens;

pub use config::Settings;
pub use error::{DetectionError, IntakeError, RecognitionError};
pub use intake::{Preview, PreviewStore, SelectedImage};
pub use models::{BoundingBox, DetectedObject, DisplaySize, RecognizedText};
pub use screens::{ObjectDetection, TextExtraction};

#[cfg(feature = "gui")]
pub mod gui;
