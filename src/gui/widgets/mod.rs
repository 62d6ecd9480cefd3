use iced::{
    Color, Element, Point, Rectangle, Renderer, Size, Theme, border, mouse,
    widget::{
        button, canvas, column, container,
        container::{Style, bordered_box},
        row, text,
    },
};

use crate::overlay::{DrawOp, RecordingCanvas};
use crate::screens::ObjectDetection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    TextExtraction,
    ObjectDetection,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::TextExtraction => "Image to Text",
            Tab::ObjectDetection => "Object Detection",
        }
    }

    fn style(self, active: Self) -> impl Fn(&Theme) -> Style {
        move |theme: &Theme| {
            let style = bordered_box(theme).border(border::width(2));
            // darken the tabs that are not shown
            if self != active {
                let mut color_rgba = theme.palette().background.into_rgba8();
                color_rgba[0] /= 2;
                color_rgba[1] /= 2;
                color_rgba[2] /= 2;
                style.background(Color::from_rgb8(color_rgba[0], color_rgba[1], color_rgba[2]))
            } else {
                style.background(theme.palette().background)
            }
        }
    }
}

pub fn layout<'a, Message>(
    active: Tab,
    on_select: impl Fn(Tab) -> Message,
    main_content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let tab = |tab: Tab| {
        container(button(text(tab.title())).on_press(on_select(tab)))
            .style(tab.style(active))
            .padding(10)
    };

    column![
        row![tab(Tab::TextExtraction), tab(Tab::ObjectDetection)].spacing(10),
        container(main_content.into()).height(iced::Length::Fill),
    ]
    .padding(10)
    .into()
}

/// Canvas program replaying recorded overlay operations.
struct DetectionOverlay {
    recording: RecordingCanvas,
}

impl<Message> canvas::Program<Message> for DetectionOverlay {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        for op in self.recording.ops() {
            match op {
                DrawOp::Resize { .. } | DrawOp::Clear => {}
                DrawOp::StrokeRect { rect, style } => {
                    let [r, g, b] = style.color;
                    let path = canvas::Path::rectangle(
                        Point::new(rect.x, rect.y),
                        Size::new(rect.width, rect.height),
                    );
                    frame.stroke(
                        &path,
                        canvas::Stroke::default()
                            .with_width(style.line_width as f32)
                            .with_color(Color::from_rgb8(r, g, b)),
                    );
                }
                DrawOp::FillText { text, x, y, style } => {
                    let [r, g, b] = style.color;
                    // Text is positioned by its top edge; `y` is the baseline.
                    frame.fill_text(canvas::Text {
                        content: text.clone(),
                        position: Point::new(*x, *y - style.font_size),
                        color: Color::from_rgb8(r, g, b),
                        size: iced::Pixels(style.font_size),
                        ..canvas::Text::default()
                    });
                }
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Canvas sized to the displayed image with the current detections drawn on it.
pub fn detection_overlay<'a, Message: 'a>(screen: &ObjectDetection) -> Element<'a, Message> {
    let mut recording = RecordingCanvas::new();
    screen.render(&mut recording);
    let size = recording.size();

    canvas(DetectionOverlay { recording })
        .width(size.width as f32)
        .height(size.height as f32)
        .into()
}
