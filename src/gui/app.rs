use std::time::Duration;

use iced::{Element, Subscription, Task, Theme};

use super::{AppState, Message};
use crate::Settings;
use crate::gui::{
    screens::{
        Screen, ScreenMessage, object_detection::ObjectDetectionScreen,
        text_extraction::TextExtractionScreen,
    },
    widgets::{Tab, layout},
};

pub struct PicscanApp {
    state: AppState,
    active: Tab,
    text_extraction: TextExtractionScreen,
    object_detection: ObjectDetectionScreen,
}

impl PicscanApp {
    pub fn new(settings: Settings) -> Self {
        let state = AppState::new(settings);
        Self {
            text_extraction: TextExtractionScreen::new(&state),
            object_detection: ObjectDetectionScreen::new(&state),
            active: Tab::TextExtraction,
            state,
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ChangeTab(tab) => {
                self.active = tab;
                Task::none()
            }
            Message::Tick => Task::none(),
            Message::TextExtraction(ScreenMessage::ScreenMessage(msg)) => self
                .text_extraction
                .update(msg, &mut self.state)
                .map(Message::TextExtraction),
            Message::ObjectDetection(ScreenMessage::ScreenMessage(msg)) => self
                .object_detection
                .update(msg, &mut self.state)
                .map(Message::ObjectDetection),
            Message::TextExtraction(ScreenMessage::ParentMessage(never))
            | Message::ObjectDetection(ScreenMessage::ParentMessage(never)) => match never {},
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let content = match self.active {
            Tab::TextExtraction => self.text_extraction.view().map(Message::TextExtraction),
            Tab::ObjectDetection => self.object_detection.view().map(Message::ObjectDetection),
        };
        layout(self.active, Message::ChangeTab, content)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        // Progress is written from the OCR worker; redraw to pick it up.
        if self.text_extraction.is_loading() {
            iced::time::every(Duration::from_millis(100)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}

pub fn run(settings: Settings) -> anyhow::Result<()> {
    iced::application(
        move || PicscanApp::new(settings.clone()),
        PicscanApp::update,
        PicscanApp::view,
    )
    .title("picscan")
    .subscription(PicscanApp::subscription)
    .theme(PicscanApp::theme)
    .run()
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}
