use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} is not an image (detected type: {mime})")]
    NotAnImage { name: String, mime: String },
    #[error("failed to decode image {name}: {message}")]
    Decode { name: String, message: String },
}

#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    #[error("unsupported language: {0} (only \"eng\" is available)")]
    UnsupportedLanguage(String),
    #[error("OCR models not found. Expected:\n  - {detection}\n  - {recognition}")]
    ModelsMissing { detection: String, recognition: String },
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR worker stopped unexpectedly: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("detection model not found at {0}")]
    ModelMissing(String),
    #[error("failed to load detection model: {0}")]
    Load(String),
    #[error("detection model has no output named {0}")]
    MissingOutput(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("detection worker stopped unexpectedly: {0}")]
    Worker(String),
}
