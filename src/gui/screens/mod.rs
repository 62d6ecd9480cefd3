pub mod object_detection;
pub mod text_extraction;

use std::path::PathBuf;

use iced::{Element, Task};
use rfd::AsyncFileDialog;

use crate::gui::AppState;
use crate::intake::IMAGE_EXTENSIONS;

pub enum ScreenMessage<S: Screen> {
    ScreenMessage(S::Message),
    ParentMessage(S::ParentMessage),
}

// Manual impls: screens own preview guards and are not `Clone`.
impl<S: Screen> Clone for ScreenMessage<S> {
    fn clone(&self) -> Self {
        match self {
            ScreenMessage::ScreenMessage(msg) => ScreenMessage::ScreenMessage(msg.clone()),
            ScreenMessage::ParentMessage(msg) => ScreenMessage::ParentMessage(msg.clone()),
        }
    }
}

impl<S: Screen> std::fmt::Debug for ScreenMessage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenMessage::ScreenMessage(msg) => f.debug_tuple("ScreenMessage").field(msg).finish(),
            ScreenMessage::ParentMessage(msg) => f.debug_tuple("ParentMessage").field(msg).finish(),
        }
    }
}

pub trait Screen: Sized {
    type Message: std::fmt::Debug + Clone;
    type ParentMessage: std::fmt::Debug + Clone;
    fn view(&self) -> Element<'_, ScreenMessage<Self>>;
    fn update(&mut self, message: Self::Message, state: &mut AppState)
    -> Task<ScreenMessage<Self>>;
}

/// Ask the user for an image file.
pub async fn pick_image() -> Option<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Choose an image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}
