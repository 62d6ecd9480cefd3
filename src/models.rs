use serde::{Deserialize, Serialize};

/// Axis-aligned box, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from corner coordinates, normalising the order of the corners.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (min_x, max_x) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (min_y, max_y) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// A single detection reported by an object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    /// Model confidence in [0, 1]
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bbox,
        }
    }

    pub fn confidence_percent(&self) -> u32 {
        rounded_percent(self.confidence)
    }

    /// Text drawn next to the box on the overlay, e.g. `person (87%)`
    pub fn overlay_label(&self) -> String {
        format!("{} ({}%)", self.label, self.confidence_percent())
    }

    /// Entry in the detection list, e.g. `person - Confidence: 87%`
    pub fn list_entry(&self) -> String {
        format!("{} - Confidence: {}%", self.label, self.confidence_percent())
    }
}

/// Round a fraction in [0, 1] to a whole percentage.
pub fn rounded_percent(fraction: f32) -> u32 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Text returned by an OCR run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedText {
    pub text: String,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Size of the on-screen image element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl DisplaySize {
    /// Fit a source image to a fixed display width, keeping its aspect ratio.
    pub fn fit_width(source_width: u32, source_height: u32, display_width: u32) -> Self {
        if source_width == 0 || source_height == 0 {
            return Self::default();
        }
        let scale = display_width as f64 / source_width as f64;
        Self {
            width: display_width,
            height: (source_height as f64 * scale).round() as u32,
        }
    }

    /// Scale factors mapping source pixels onto this display size.
    pub fn scale_from(&self, source_width: u32, source_height: u32) -> (f32, f32) {
        if source_width == 0 || source_height == 0 {
            return (1.0, 1.0);
        }
        (
            self.width as f32 / source_width as f32,
            self.height as f32 / source_height as f32,
        )
    }
}
