mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from picscan for tests
pub use picscan::error::{DetectionError, IntakeError, RecognitionError};
pub use picscan::models::{BoundingBox, DetectedObject, DisplaySize, RecognizedText};
pub use picscan::overlay::{DrawOp, RecordingCanvas};
pub use picscan::recognition::{Detection, ProgressEvent, RecognitionStatus};
pub use picscan::{ObjectDetection, PreviewStore, SelectedImage, TextExtraction};
