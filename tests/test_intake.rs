//! Integration tests for image intake
//!
//! Tests cover:
//! - Reading and decoding image files
//! - Rejecting files that are not images
//! - Object URL and data URI previews

mod common;
use common::*;

use picscan::intake::{data_uri, is_image, mime_for_extension};

#[tokio::test]
async fn test_select_image_from_path() -> anyhow::Result<()> {
    let file = create_test_image();

    let selected = SelectedImage::from_path(file.path())?;

    assert_eq!(selected.mime(), "image/png");
    assert_eq!(selected.dimensions(), (100, 100));
    assert!(!selected.bytes().is_empty());
    assert!(selected.name().ends_with(".png"), "Unexpected name: {}", selected.name());

    Ok(())
}

#[tokio::test]
async fn test_reject_non_image() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello world")?;

    let result = SelectedImage::from_path(&path);

    match result {
        Err(IntakeError::NotAnImage { name, mime }) => {
            assert_eq!(name, "notes.txt");
            assert_eq!(mime, "text/plain");
        }
        other => panic!("Expected NotAnImage, got {:?}", other.map(|s| s.name().to_string())),
    }

    Ok(())
}

#[tokio::test]
async fn test_reject_corrupt_image() -> anyhow::Result<()> {
    let result = SelectedImage::from_bytes("broken.png", b"definitely not a png".to_vec());

    assert!(
        matches!(result, Err(IntakeError::Decode { .. })),
        "Corrupt image data should fail to decode"
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let result = SelectedImage::from_path(dir.path().join("missing.png"));

    assert!(matches!(result, Err(IntakeError::Read { .. })));

    Ok(())
}

#[test]
fn test_mime_detection() {
    assert_eq!(mime_for_extension("photo.JPG"), "image/jpeg");
    assert_eq!(mime_for_extension("scan.webp"), "image/webp");
    assert!(is_image(mime_for_extension("diagram.png")));
    assert!(!is_image(mime_for_extension("report.pdf")));
    assert!(!is_image(mime_for_extension("no_extension")));
}

#[tokio::test]
async fn test_data_uri() -> anyhow::Result<()> {
    let selected = make_selected_image("tiny.png", 4, 4);

    let uri = data_uri(&selected);

    assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"), "Unexpected URI prefix");

    Ok(())
}

#[tokio::test]
async fn test_object_url_lifetime() -> anyhow::Result<()> {
    let store = PreviewStore::new();
    let selected = make_selected_image("photo.png", 8, 8);

    // 1. Creating a URL registers the file bytes
    let url = store.create_object_url(&selected);
    let (mime, bytes) = store.resolve(&url.url()).expect("URL should resolve");
    assert_eq!(mime, "image/png");
    assert_eq!(&bytes[..], selected.bytes());

    // 2. Unknown URLs never resolve
    assert!(store.resolve("blob:picscan/not-a-uuid").is_none());
    assert!(store.resolve("https://example.com/photo.png").is_none());

    // 3. Dropping the URL revokes it
    let raw = url.url();
    drop(url);
    assert!(store.resolve(&raw).is_none());
    assert_eq!(store.live_count(), 0);

    Ok(())
}
