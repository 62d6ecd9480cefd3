//! Integration tests for overlay drawing
//!
//! Tests cover:
//! - Label placement near the top edge
//! - Confidence rounding
//! - Rasterising boxes onto an image canvas

mod common;
use common::*;

use image::Rgba;
use picscan::models::rounded_percent;
use picscan::overlay::{Canvas, ImageCanvas, OverlayStyle, draw_detections, label_position};

#[test]
fn test_label_position() {
    // Boxes near the top get their label pinned at y = 10
    assert_eq!(label_position(&BoundingBox::new(20.0, 5.0, 10.0, 10.0)), (25.0, 10.0));
    assert_eq!(label_position(&BoundingBox::new(0.0, 10.0, 10.0, 10.0)), (5.0, 10.0));

    // Otherwise the label sits just above the box
    assert_eq!(label_position(&BoundingBox::new(20.0, 50.0, 10.0, 10.0)), (25.0, 45.0));
    assert_eq!(label_position(&BoundingBox::new(0.0, 10.5, 10.0, 10.0)), (5.0, 5.5));
}

#[test]
fn test_confidence_rounding() {
    assert_eq!(rounded_percent(0.0), 0);
    assert_eq!(rounded_percent(0.999), 100);
    assert_eq!(rounded_percent(1.0), 100);
    assert_eq!(rounded_percent(0.5), 50);
    assert_eq!(rounded_percent(f32::NAN), 0);

    let object = DetectedObject::new("cup", 0.999, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(object.overlay_label(), "cup (100%)");
    assert_eq!(object.list_entry(), "cup - Confidence: 100%");
}

#[test]
fn test_draw_detections_replaces_previous_drawing() {
    let style = OverlayStyle::default();
    let mut canvas = RecordingCanvas::new();
    let objects = vec![
        DetectedObject::new("person", 0.87, BoundingBox::new(10.0, 50.0, 100.0, 200.0)),
        DetectedObject::new("kite", 0.42, BoundingBox::new(300.0, 2.0, 40.0, 30.0)),
    ];

    draw_detections(&mut canvas, DisplaySize { width: 500, height: 400 }, &objects, &style);
    draw_detections(&mut canvas, DisplaySize { width: 500, height: 400 }, &objects[..1], &style);

    assert_eq!(canvas.rects().len(), 1, "Second draw should replace the first");
    assert_eq!(
        canvas.labels(),
        vec![("person (87%)".to_string(), 15.0, 45.0)]
    );
    assert_eq!(canvas.ops()[0], DrawOp::Clear);
}

#[test]
fn test_image_canvas_strokes_boxes() {
    let style = OverlayStyle::default();
    let mut canvas = ImageCanvas::new(None);
    let objects = vec![DetectedObject::new(
        "person",
        0.9,
        BoundingBox::new(10.0, 10.0, 30.0, 20.0),
    )];

    draw_detections(&mut canvas, DisplaySize { width: 64, height: 48 }, &objects, &style);

    let image = canvas.image();
    assert_eq!(image.dimensions(), (64, 48));
    assert_eq!(*image.get_pixel(10, 20), Rgba([255, 0, 0, 255]), "Left edge should be red");
    assert_eq!(*image.get_pixel(25, 10), Rgba([255, 0, 0, 255]), "Top edge should be red");
    assert_eq!(image.get_pixel(25, 20)[3], 0, "Inside of the box should stay transparent");

    // Clearing wipes the drawing
    canvas.clear();
    assert_eq!(canvas.image().get_pixel(10, 20)[3], 0);
}

#[test]
fn test_composite_scales_base_image() {
    let base = image::load_from_memory(&png_bytes(128, 96)).expect("Failed to decode test image");
    let mut canvas = ImageCanvas::new(None);
    canvas.resize(64, 48);

    let out = canvas.composite(&base);

    assert_eq!(out.dimensions(), (64, 48));
    assert_eq!(*out.get_pixel(32, 24), Rgba([255, 0, 0, 255]));
}
