use crate::gui::{
    screens::{
        ScreenMessage, object_detection::ObjectDetectionScreen,
        text_extraction::TextExtractionScreen,
    },
    widgets::Tab,
};

#[derive(Debug, Clone)]
pub enum Message {
    TextExtraction(ScreenMessage<TextExtractionScreen>),
    ObjectDetection(ScreenMessage<ObjectDetectionScreen>),
    ChangeTab(Tab),
    /// Redraw while a run reports progress
    Tick,
}
