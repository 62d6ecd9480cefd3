//! Screen state for the two flows, independent of any UI toolkit.

pub mod object_detection;
pub mod text_extraction;

pub use object_detection::{DetectionRequest, ObjectDetection};
pub use text_extraction::{RecognitionJob, TextExtraction};
