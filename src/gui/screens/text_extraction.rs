use std::convert::Infallible;
use std::path::PathBuf;

use iced::{
    Alignment::Center,
    Element, Task,
    widget::{button, column, image, row, text},
};
use tracing::warn;

use crate::error::RecognitionError;
use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage, pick_image},
};
use crate::intake::SelectedImage;
use crate::models::RecognizedText;
use crate::screens::TextExtraction;

pub struct TextExtractionScreen {
    screen: TextExtraction,
    preview: Option<image::Handle>,
    intake_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TextExtractionMessage {
    PickImage,
    ImagePicked(Option<PathBuf>),
    ClearImage,
    Extract,
    Extracted(Result<RecognizedText, RecognitionError>),
}

impl TextExtractionScreen {
    pub fn new(state: &AppState) -> Self {
        Self {
            screen: TextExtraction::with_language(
                state.previews.clone(),
                state.settings.ocr.language.clone(),
            ),
            preview: None,
            intake_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.screen.is_loading()
    }
}

fn message(msg: TextExtractionMessage) -> ScreenMessage<TextExtractionScreen> {
    ScreenMessage::ScreenMessage(msg)
}

impl Screen for TextExtractionScreen {
    type Message = TextExtractionMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let mut content = column![
            text("Image to Text").size(32),
            row![
                button("Choose Image").on_press_maybe(
                    self.screen
                        .can_change_selection()
                        .then(|| message(TextExtractionMessage::PickImage))
                ),
                button("Clear").on_press_maybe(
                    self.preview
                        .as_ref()
                        .filter(|_| self.screen.can_change_selection())
                        .map(|_| message(TextExtractionMessage::ClearImage))
                ),
            ]
            .spacing(10),
        ]
        .spacing(20)
        .padding(20);

        if let Some(error) = &self.intake_error {
            content = content.push(text(error).style(text::danger));
        }

        if let Some(handle) = &self.preview {
            content = content.push(column![
                text("Image Preview:").size(20),
                image(handle.clone()).height(400),
            ]);
        }

        if !self.screen.text().is_empty() {
            content = content.push(column![
                text("Extracted Text:").size(20),
                text(self.screen.text()),
            ]);
        }

        if let Some(error) = self.screen.error() {
            content = content.push(text(format!("Extraction failed: {error}")).style(text::danger));
        }

        content
            .push(
                button(text(self.screen.button_label())).on_press_maybe(
                    self.screen
                        .can_extract()
                        .then(|| message(TextExtractionMessage::Extract)),
                ),
            )
            .align_x(Center)
            .into()
    }

    fn update(
        &mut self,
        msg: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match msg {
            TextExtractionMessage::PickImage => Task::perform(pick_image(), |path| {
                message(TextExtractionMessage::ImagePicked(path))
            }),
            TextExtractionMessage::ImagePicked(None) => Task::none(),
            TextExtractionMessage::ImagePicked(Some(path)) => {
                match SelectedImage::from_path(&path) {
                    Ok(selected) => {
                        if !self.screen.select(selected) {
                            warn!("Ignoring {} while text extraction is running", path.display());
                            return Task::none();
                        }
                        self.preview = self
                            .screen
                            .preview()
                            .and_then(|preview| state.previews.resolve(&preview.uri()))
                            .map(|(_, bytes)| image::Handle::from_bytes(bytes.to_vec()));
                        self.intake_error = None;
                    }
                    Err(e) => {
                        warn!("Rejected {}: {}", path.display(), e);
                        self.intake_error = Some(e.to_string());
                    }
                }
                Task::none()
            }
            TextExtractionMessage::ClearImage => {
                if self.screen.clear_selection() {
                    self.preview = None;
                }
                Task::none()
            }
            TextExtractionMessage::Extract => match self.screen.begin() {
                Some(job) => {
                    let engine = state.recognizer.clone();
                    Task::perform(async move { job.run(engine.as_ref()).await }, |outcome| {
                        message(TextExtractionMessage::Extracted(outcome))
                    })
                }
                None => Task::none(),
            },
            TextExtractionMessage::Extracted(outcome) => {
                self.screen.finish(outcome);
                Task::none()
            }
        }
    }
}
