use std::sync::Arc;

use crate::Settings;
use crate::intake::PreviewStore;
use crate::recognition::{DetectorFactory, OcrsRecognizer, RtenDetectorFactory, TextRecognizer};

/// Shared by every screen: settings, preview registry and engine handles.
pub struct AppState {
    pub settings: Settings,
    pub previews: PreviewStore,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub detectors: Arc<dyn DetectorFactory>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let recognizer = Arc::new(OcrsRecognizer::new(&settings.ocr));
        let detectors = Arc::new(RtenDetectorFactory::new(&settings.detector));
        Self {
            settings,
            previews: PreviewStore::new(),
            recognizer,
            detectors,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("live_previews", &self.previews.live_count())
            .finish()
    }
}
