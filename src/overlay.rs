//! Drawing detections over the displayed image.
//!
//! Drawing goes through the [`Canvas`] trait so the same routine can record
//! operations (for the GUI canvas and for tests) or rasterise them onto an
//! image.

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgba, RgbaImage, imageops::FilterType};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::debug;

use crate::config::OverlaySettings;
use crate::models::{BoundingBox, DetectedObject, DisplaySize};

/// Horizontal offset of a label from the left edge of its box
pub const LABEL_INSET_X: f32 = 5.0;
/// Gap between a label's baseline and the top of its box
pub const LABEL_GAP_Y: f32 = 5.0;
/// Boxes whose top is at or above this line get a label pinned to it
pub const LABEL_MIN_Y: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub color: [u8; 3],
    pub line_width: u32,
    pub font_size: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            line_width: 2,
            font_size: 14.0,
        }
    }
}

impl From<&OverlaySettings> for OverlayStyle {
    fn from(settings: &OverlaySettings) -> Self {
        Self {
            color: settings.color,
            line_width: settings.line_width.max(1),
            font_size: settings.font_size,
        }
    }
}

pub trait Canvas {
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn stroke_rect(&mut self, rect: &BoundingBox, style: &OverlayStyle);
    /// Draw `text` with its left edge at `x` and its baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &OverlayStyle);
}

/// Where the label for `bbox` is drawn: just above the box, or pinned near
/// the top of the canvas when the box starts too close to it.
pub fn label_position(bbox: &BoundingBox) -> (f32, f32) {
    let y = if bbox.y > LABEL_MIN_Y {
        bbox.y - LABEL_GAP_Y
    } else {
        LABEL_MIN_Y
    };
    (bbox.x + LABEL_INSET_X, y)
}

/// Redraw the whole overlay for `objects`.
pub fn draw_detections<C: Canvas + ?Sized>(
    canvas: &mut C,
    size: DisplaySize,
    objects: &[DetectedObject],
    style: &OverlayStyle,
) {
    canvas.resize(size.width, size.height);
    canvas.clear();

    for object in objects {
        canvas.stroke_rect(&object.bbox, style);
        let (x, y) = label_position(&object.bbox);
        canvas.fill_text(&object.overlay_label(), x, y, style);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize { width: u32, height: u32 },
    Clear,
    StrokeRect { rect: BoundingBox, style: OverlayStyle },
    FillText { text: String, x: f32, y: f32, style: OverlayStyle },
}

/// Canvas that only records what was drawn.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    size: DisplaySize,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn size(&self) -> DisplaySize {
        self.size
    }

    pub fn rects(&self) -> Vec<BoundingBox> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokeRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<(String, f32, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = DisplaySize { width, height };
        self.ops.push(DrawOp::Resize { width, height });
    }

    fn clear(&mut self) {
        // Everything before a clear is no longer visible.
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, style: &OverlayStyle) {
        self.ops.push(DrawOp::StrokeRect {
            rect: *rect,
            style: *style,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &OverlayStyle) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            style: *style,
        });
    }
}

/// Canvas backed by a transparent RGBA image.
///
/// Labels are only rasterised when a font has been supplied.
pub struct ImageCanvas {
    image: RgbaImage,
    font: Option<FontArc>,
}

impl ImageCanvas {
    pub fn new(font: Option<FontArc>) -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            font,
        }
    }

    /// Build a canvas from overlay settings, loading the configured font.
    pub fn from_settings(settings: &OverlaySettings) -> anyhow::Result<Self> {
        let font = match &settings.font {
            Some(path) => Some(load_font(path)?),
            None => None,
        };
        Ok(Self::new(font))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Scale `base` to the canvas size and draw the overlay on top of it.
    pub fn composite(&self, base: &DynamicImage) -> RgbaImage {
        let (width, height) = self.image.dimensions();
        let mut out = base.resize_exact(width, height, FilterType::Triangle).to_rgba8();
        image::imageops::overlay(&mut out, &self.image, 0, 0);
        out
    }
}

pub fn load_font(path: &Path) -> anyhow::Result<FontArc> {
    let data = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read font {}: {}", path.display(), e))?;
    FontArc::try_from_vec(data)
        .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))
}

fn rgba(style: &OverlayStyle) -> Rgba<u8> {
    let [r, g, b] = style.color;
    Rgba([r, g, b, 255])
}

impl Canvas for ImageCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, style: &OverlayStyle) {
        let color = rgba(style);
        let x = rect.x.round() as i32;
        let y = rect.y.round() as i32;
        let width = rect.width.round().max(0.0) as i32;
        let height = rect.height.round().max(0.0) as i32;

        // The stroke is centred on the rectangle's edge, like a 2D canvas.
        let half = (style.line_width / 2) as i32;
        for i in 0..style.line_width as i32 {
            let offset = i - half;
            let w = width - 2 * offset;
            let h = height - 2 * offset;
            if w <= 0 || h <= 0 {
                break;
            }
            let r = Rect::at(x + offset, y + offset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut self.image, r, color);
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &OverlayStyle) {
        let Some(font) = &self.font else {
            debug!("No overlay font configured, skipping label '{}'", text);
            return;
        };
        // imageproc positions text by its top edge; `y` is the baseline.
        let top = (y - style.font_size).round() as i32;
        draw_text_mut(
            &mut self.image,
            rgba(style),
            x.round() as i32,
            top,
            PxScale::from(style.font_size),
            font,
            text,
        );
    }
}
