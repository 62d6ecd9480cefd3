//! Integration tests for the object detection screen
//!
//! Tests cover:
//! - One rectangle and one label per detection
//! - Scaling boxes from source pixels to the display size
//! - Discarding results for a replaced image
//! - Keeping prior results when detection fails
//! - Decoding raw model outputs

mod common;
use common::*;

use picscan::recognition::coco::label_for_class;
use picscan::recognition::detector::decode_detections;

fn street_scene() -> Vec<Detection> {
    vec![
        detection("person", 0.87, 10.0, 50.0, 100.0, 200.0),
        detection("car", 0.6123, 200.0, 5.0, 150.0, 80.0),
    ]
}

#[tokio::test]
async fn test_detect_draws_each_object() -> anyhow::Result<()> {
    let factory = FakeDetectorFactory::returning(street_scene());
    let mut screen = ObjectDetection::new(500);

    // 1. Detect on an image already 500 pixels wide
    let changed = screen.detect(&factory, make_selected_image("street.png", 500, 400)).await;
    assert!(changed, "Successful detection should update the results");
    assert!(!screen.is_detecting());
    assert_eq!(screen.display_size(), DisplaySize { width: 500, height: 400 });

    // 2. Render and check the canvas
    let mut canvas = RecordingCanvas::new();
    screen.render(&mut canvas);

    assert_eq!(canvas.size(), DisplaySize { width: 500, height: 400 });
    let rects = canvas.rects();
    assert_eq!(rects.len(), 2, "Expected one rectangle per detection");
    assert_eq!(rects[0], BoundingBox::new(10.0, 50.0, 100.0, 200.0));
    assert_eq!(rects[1], BoundingBox::new(200.0, 5.0, 150.0, 80.0));

    let labels = canvas.labels();
    assert_eq!(labels.len(), 2, "Expected one label per detection");
    assert_eq!(labels[0], ("person (87%)".to_string(), 15.0, 45.0));
    assert_eq!(labels[1], ("car (61%)".to_string(), 205.0, 10.0));

    // 3. List entries
    assert_eq!(
        screen.items(),
        vec!["person - Confidence: 87%", "car - Confidence: 61%"]
    );

    Ok(())
}

#[tokio::test]
async fn test_boxes_scaled_to_display_width() -> anyhow::Result<()> {
    let factory = FakeDetectorFactory::returning(vec![detection(
        "dog", 0.9, 100.0, 200.0, 400.0, 300.0,
    )]);
    let mut screen = ObjectDetection::new(500);

    screen.detect(&factory, make_selected_image("dog.png", 1000, 800)).await;

    assert_eq!(screen.display_size(), DisplaySize { width: 500, height: 400 });
    assert_eq!(screen.objects().len(), 1);
    assert_eq!(
        screen.objects()[0].bbox,
        BoundingBox::new(50.0, 100.0, 200.0, 150.0)
    );

    Ok(())
}

#[tokio::test]
async fn test_preview_is_data_uri() -> anyhow::Result<()> {
    let mut screen = ObjectDetection::default();
    let _request = screen.select(make_selected_image("cat.png", 20, 20));

    let uri = screen.preview().expect("Preview should be set").uri();
    assert!(uri.starts_with("data:image/png;base64,"), "Unexpected preview: {}", &uri[..30]);
    assert!(screen.is_detecting(), "Detection should be pending after a selection");

    Ok(())
}

#[tokio::test]
async fn test_stale_results_are_discarded() -> anyhow::Result<()> {
    let mut screen = ObjectDetection::new(500);

    // 1. Select A, then B before A's detection finishes
    let request_a = screen.select(make_selected_image("a.png", 500, 500));
    let request_b = screen.select(make_selected_image("b.png", 500, 500));
    assert_ne!(request_a.generation, request_b.generation);
    assert_eq!(screen.generation(), request_b.generation);

    // 2. B finishes first
    let applied = screen.apply(
        request_b.generation,
        Ok(vec![detection("bicycle", 0.7, 1.0, 2.0, 3.0, 4.0)]),
    );
    assert!(applied);

    // 3. A's late result must not overwrite B's
    let applied = screen.apply(
        request_a.generation,
        Ok(vec![
            detection("person", 0.9, 0.0, 0.0, 10.0, 10.0),
            detection("person", 0.8, 5.0, 5.0, 10.0, 10.0),
        ]),
    );
    assert!(!applied, "Stale result should be discarded");
    assert_eq!(screen.items(), vec!["bicycle - Confidence: 70%"]);
    assert_eq!(screen.selected().map(|s| s.name()), Some("b.png"));

    Ok(())
}

#[tokio::test]
async fn test_failure_keeps_previous_results() -> anyhow::Result<()> {
    let mut screen = ObjectDetection::new(500);

    let ok = FakeDetectorFactory::returning(street_scene());
    assert!(screen.detect(&ok, make_selected_image("first.png", 500, 400)).await);
    assert_eq!(screen.objects().len(), 2);

    let failing = FakeDetectorFactory::failing(DetectionError::Inference("bad tensor".to_string()));
    let changed = screen.detect(&failing, make_selected_image("second.png", 500, 400)).await;

    assert!(!changed, "Failed detection should not change results");
    assert_eq!(screen.objects().len(), 2, "Previous results should remain");
    assert!(!screen.is_detecting());

    Ok(())
}

#[tokio::test]
async fn test_empty_result_clears_overlay() -> anyhow::Result<()> {
    let mut screen = ObjectDetection::new(500);
    let mut canvas = RecordingCanvas::new();

    let ok = FakeDetectorFactory::returning(street_scene());
    screen.detect(&ok, make_selected_image("busy.png", 500, 400)).await;
    screen.render(&mut canvas);
    assert_eq!(canvas.rects().len(), 2);

    let empty = FakeDetectorFactory::returning(Vec::new());
    assert!(screen.detect(&empty, make_selected_image("empty.png", 500, 250)).await);
    screen.render(&mut canvas);

    assert!(canvas.ops().contains(&DrawOp::Clear), "Canvas should be cleared");
    assert!(canvas.rects().is_empty());
    assert!(canvas.labels().is_empty());
    assert_eq!(canvas.size(), DisplaySize { width: 500, height: 250 });
    assert!(screen.items().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_detector_loaded_per_image() -> anyhow::Result<()> {
    let factory = FakeDetectorFactory::returning(street_scene());
    let mut screen = ObjectDetection::new(500);

    screen.detect(&factory, make_selected_image("one.png", 50, 50)).await;
    screen.detect(&factory, make_selected_image("two.png", 50, 50)).await;

    assert_eq!(factory.loads(), 2, "A fresh detector should be loaded for each image");

    Ok(())
}

#[tokio::test]
async fn test_decode_detections() -> anyhow::Result<()> {
    // [ymin, xmin, ymax, xmax] normalised boxes
    let boxes = [
        0.125, 0.25, 0.5, 0.75, // person, kept
        0.0, 0.0, 1.0, 1.0, // below threshold
        0.25, 0.25, 0.5, 0.5, // class 12 has no label
        -0.25, 0.5, 0.5, 1.25, // clamped to the image
    ];
    let classes = [1.0, 3.0, 12.0, 18.0];
    let scores = [0.9, 0.3, 0.95, 0.55];

    let detections = decode_detections(&boxes, &classes, &scores, 4, (200, 100), 0.5, 20);

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].label, "person");
    assert_eq!(detections[0].confidence, 0.9);
    assert_eq!(detections[0].bbox, BoundingBox::new(50.0, 12.5, 100.0, 37.5));
    assert_eq!(detections[1].label, "dog");
    assert_eq!(detections[1].bbox, BoundingBox::new(100.0, 0.0, 100.0, 50.0));

    // max_detections caps the list
    let capped = decode_detections(&boxes, &classes, &scores, 4, (200, 100), 0.5, 1);
    assert_eq!(capped.len(), 1);

    // count beyond the buffers is ignored
    let short = decode_detections(&boxes[..4], &classes[..1], &scores[..1], 100, (200, 100), 0.5, 20);
    assert_eq!(short.len(), 1);

    Ok(())
}

#[test]
fn test_coco_labels() {
    assert_eq!(label_for_class(1), Some("person"));
    assert_eq!(label_for_class(3), Some("car"));
    assert_eq!(label_for_class(0), None);
    assert_eq!(label_for_class(12), None);
    assert_eq!(label_for_class(1000), None);
}
