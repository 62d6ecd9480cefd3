use std::convert::Infallible;
use std::path::PathBuf;

use iced::{
    Element, Task,
    widget::{button, column, image, stack, text},
};
use tracing::warn;

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage, pick_image},
    widgets::detection_overlay,
};
use crate::intake::SelectedImage;
use crate::overlay::OverlayStyle;
use crate::screens::ObjectDetection;
use crate::screens::object_detection::DetectionOutcome;

pub struct ObjectDetectionScreen {
    screen: ObjectDetection,
    preview: Option<image::Handle>,
    intake_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ObjectDetectionMessage {
    PickImage,
    ImagePicked(Option<PathBuf>),
    Detected(u64, DetectionOutcome),
}

impl ObjectDetectionScreen {
    pub fn new(state: &AppState) -> Self {
        Self {
            screen: ObjectDetection::new(state.settings.display.width)
                .with_style(OverlayStyle::from(&state.settings.overlay)),
            preview: None,
            intake_error: None,
        }
    }
}

fn message(msg: ObjectDetectionMessage) -> ScreenMessage<ObjectDetectionScreen> {
    ScreenMessage::ScreenMessage(msg)
}

impl Screen for ObjectDetectionScreen {
    type Message = ObjectDetectionMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let mut content = column![
            text("Object Detection").size(32),
            button("Choose Image").on_press(message(ObjectDetectionMessage::PickImage)),
        ]
        .spacing(20)
        .padding(20);

        if let Some(error) = &self.intake_error {
            content = content.push(text(error).style(text::danger));
        }

        if let Some(handle) = &self.preview {
            let size = self.screen.display_size();
            content = content.push(stack![
                image(handle.clone())
                    .width(size.width as f32)
                    .height(size.height as f32),
                detection_overlay(&self.screen),
            ]);
        }

        if self.screen.is_detecting() {
            content = content.push(text("Detecting objects..."));
        }

        let items = self.screen.items();
        if !items.is_empty() {
            content = content.push(
                column(items.into_iter().map(|item| text(item).into())).spacing(4),
            );
        }

        content.into()
    }

    fn update(
        &mut self,
        msg: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match msg {
            ObjectDetectionMessage::PickImage => Task::perform(pick_image(), |path| {
                message(ObjectDetectionMessage::ImagePicked(path))
            }),
            ObjectDetectionMessage::ImagePicked(None) => Task::none(),
            ObjectDetectionMessage::ImagePicked(Some(path)) => {
                let selected = match SelectedImage::from_path(&path) {
                    Ok(selected) => selected,
                    Err(e) => {
                        warn!("Rejected {}: {}", path.display(), e);
                        self.intake_error = Some(e.to_string());
                        return Task::none();
                    }
                };
                self.intake_error = None;
                self.preview = Some(image::Handle::from_bytes(selected.bytes().to_vec()));

                let request = self.screen.select(selected);
                let factory = state.detectors.clone();
                Task::perform(
                    async move { request.run(factory.as_ref()).await },
                    |(generation, outcome)| {
                        message(ObjectDetectionMessage::Detected(generation, outcome))
                    },
                )
            }
            ObjectDetectionMessage::Detected(generation, outcome) => {
                self.screen.apply(generation, outcome);
                Task::none()
            }
        }
    }
}
