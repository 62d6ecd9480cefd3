//! Image intake: validating a user-selected file and producing a preview
//! reference for it.
//!
//! Two preview forms exist. Object URLs (`blob:picscan/<uuid>`) are handles
//! registered in a [`PreviewStore`]; the returned [`ObjectUrl`] guard revokes
//! the registration when dropped. Data URIs embed the bytes directly.

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::error::IntakeError;

/// A file the user picked, decoded once on selection.
#[derive(Debug, Clone)]
pub struct SelectedImage {
    name: String,
    mime: &'static str,
    bytes: Arc<[u8]>,
    image: Arc<DynamicImage>,
}

impl SelectedImage {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| IntakeError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, bytes)
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, IntakeError> {
        let name = name.into();

        let format = match image::guess_format(&bytes) {
            Ok(format) => format,
            Err(_) => {
                let mime = mime_for_extension(&name);
                match ImageFormat::from_mime_type(mime) {
                    Some(format) if is_image(mime) => format,
                    _ => {
                        return Err(IntakeError::NotAnImage {
                            name,
                            mime: mime.to_string(),
                        });
                    }
                }
            }
        };
        let mime = format.to_mime_type();

        let image = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
            IntakeError::Decode {
                name: name.clone(),
                message: e.to_string(),
            }
        })?;

        debug!(
            "Selected {} ({}, {}x{})",
            name,
            mime,
            image.width(),
            image.height()
        );

        Ok(Self {
            name,
            mime,
            bytes: bytes.into(),
            image: Arc::new(image),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        self.bytes.clone()
    }

    pub fn image(&self) -> Arc<DynamicImage> {
        self.image.clone()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Detect MIME type by file extension.
pub fn mime_for_extension(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tiff" | "tif" => "image/tiff",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// File extensions offered by the file picker.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "tiff", "tif",
];

/// Encode the selected file as a `data:` URI.
pub fn data_uri(image: &SelectedImage) -> String {
    format!("data:{};base64,{}", image.mime(), STANDARD.encode(image.bytes()))
}

#[derive(Debug, Clone)]
struct StoredPreview {
    mime: &'static str,
    bytes: Arc<[u8]>,
}

/// Registry backing object URLs.
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    entries: Arc<Mutex<HashMap<Uuid, StoredPreview>>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object_url(&self, image: &SelectedImage) -> ObjectUrl {
        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            StoredPreview {
                mime: image.mime(),
                bytes: image.shared_bytes(),
            },
        );
        debug!("Created object URL for {}", image.name());
        ObjectUrl {
            id,
            store: self.clone(),
        }
    }

    /// Look up the bytes and MIME type behind a live object URL.
    pub fn resolve(&self, url: &str) -> Option<(&'static str, Arc<[u8]>)> {
        let id = url.strip_prefix(OBJECT_URL_PREFIX)?;
        let id = Uuid::parse_str(id).ok()?;
        self.lock()
            .get(&id)
            .map(|entry| (entry.mime, entry.bytes.clone()))
    }

    /// Number of object URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn revoke(&self, id: &Uuid) {
        if self.lock().remove(id).is_some() {
            debug!("Revoked object URL {}", id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, StoredPreview>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

const OBJECT_URL_PREFIX: &str = "blob:picscan/";

/// Live object URL; revoked on drop.
#[derive(Debug)]
pub struct ObjectUrl {
    id: Uuid,
    store: PreviewStore,
}

impl ObjectUrl {
    pub fn url(&self) -> String {
        format!("{}{}", OBJECT_URL_PREFIX, self.id)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.store.revoke(&self.id);
    }
}

/// Displayable reference to the selected image.
#[derive(Debug)]
pub enum Preview {
    ObjectUrl(ObjectUrl),
    DataUri(String),
}

impl Preview {
    pub fn uri(&self) -> String {
        match self {
            Preview::ObjectUrl(url) => url.url(),
            Preview::DataUri(uri) => uri.clone(),
        }
    }
}

/// Holds at most one selected image and its preview. Replacing or clearing
/// the slot releases the previous preview.
#[derive(Debug, Default)]
pub struct ImageSlot {
    current: Option<(SelectedImage, Preview)>,
}

impl ImageSlot {
    pub fn replace(&mut self, image: SelectedImage, preview: Preview) {
        // Release the old preview before holding the new one.
        self.current.take();
        self.current = Some((image, preview));
    }

    pub fn clear(&mut self) {
        self.current.take();
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.current.as_ref().map(|(image, _)| image)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.current.as_ref().map(|(_, preview)| preview)
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
