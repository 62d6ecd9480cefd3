use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::DetectionError;
use crate::intake::{ImageSlot, Preview, SelectedImage, data_uri};
use crate::models::{DetectedObject, DisplaySize};
use crate::overlay::{Canvas, OverlayStyle, draw_detections};
use crate::recognition::{Detection, DetectorFactory};

pub const DEFAULT_DISPLAY_WIDTH: u32 = 500;

/// State of the object detection screen.
///
/// Every selection starts a new generation. Results are tagged with the
/// generation they were requested for and anything older than the current
/// one is dropped, so a slow detection for a replaced image can never
/// overwrite the newer result.
pub struct ObjectDetection {
    slot: ImageSlot,
    objects: Vec<DetectedObject>,
    display_width: u32,
    display: DisplaySize,
    source_size: (u32, u32),
    generation: u64,
    pending: Option<u64>,
    style: OverlayStyle,
}

/// A detection to run for one selected image.
pub struct DetectionRequest {
    pub generation: u64,
    pub image: Arc<DynamicImage>,
}

pub type DetectionOutcome = Result<Vec<Detection>, DetectionError>;

impl DetectionRequest {
    /// Load a fresh detector and run it on the image.
    pub async fn run(self, factory: &dyn DetectorFactory) -> (u64, DetectionOutcome) {
        let outcome = match factory.load().await {
            Ok(detector) => detector.detect(self.image).await,
            Err(e) => Err(e),
        };
        (self.generation, outcome)
    }
}

impl ObjectDetection {
    pub fn new(display_width: u32) -> Self {
        Self {
            slot: ImageSlot::default(),
            objects: Vec::new(),
            display_width,
            display: DisplaySize::default(),
            source_size: (0, 0),
            generation: 0,
            pending: None,
            style: OverlayStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Show `image` and return the detection to run for it. The previous
    /// preview is released; previous results stay until new ones arrive.
    pub fn select(&mut self, image: SelectedImage) -> DetectionRequest {
        let (width, height) = image.dimensions();
        self.source_size = (width, height);
        self.display = DisplaySize::fit_width(width, height, self.display_width);

        let request_image = image.image();
        let preview = Preview::DataUri(data_uri(&image));
        self.slot.replace(image, preview);

        self.generation += 1;
        self.pending = Some(self.generation);
        debug!("Detection generation {} requested", self.generation);

        DetectionRequest {
            generation: self.generation,
            image: request_image,
        }
    }

    /// Accept the outcome of a detection. Returns `true` when it changed the
    /// displayed results.
    pub fn apply(&mut self, generation: u64, outcome: DetectionOutcome) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding stale detection (generation {}, current {})",
                generation, self.generation
            );
            return false;
        }
        self.pending = None;

        match outcome {
            Ok(detections) => {
                let (sx, sy) = self
                    .display
                    .scale_from(self.source_size.0, self.source_size.1);
                self.objects = detections
                    .into_iter()
                    .map(|d| DetectedObject::new(d.label, d.confidence, d.bbox.scaled(sx, sy)))
                    .collect();
                info!("Showing {} detected objects", self.objects.len());
                true
            }
            Err(e) => {
                error!("Object detection failed: {}", e);
                false
            }
        }
    }

    /// Select `image` and run detection on it to completion.
    pub async fn detect(&mut self, factory: &dyn DetectorFactory, image: SelectedImage) -> bool {
        let request = self.select(image);
        let (generation, outcome) = request.run(factory).await;
        self.apply(generation, outcome)
    }

    /// Redraw the overlay: one rectangle and one label per object.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        draw_detections(canvas, self.display, &self.objects, &self.style);
    }

    /// One line per object for the detection list.
    pub fn items(&self) -> Vec<String> {
        self.objects.iter().map(DetectedObject::list_entry).collect()
    }

    pub fn objects(&self) -> &[DetectedObject] {
        &self.objects
    }

    pub fn is_detecting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.slot.image()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.slot.preview()
    }

    pub fn display_size(&self) -> DisplaySize {
        self.display
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for ObjectDetection {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_WIDTH)
    }
}
