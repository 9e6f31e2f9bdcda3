use std::{fs::File, io::BufWriter, sync::Arc};

use gpui::{
    AnyElement, App, AppContext, Bounds, Context, FocusHandle, InteractiveElement, IntoElement,
    KeyDownEvent, Keystroke, ObjectFit, ParentElement, Render, RenderImage, Styled, StyledImage,
    TitlebarOptions, Window, WindowBounds, WindowOptions, div, img, px, size,
};
use gpui_component::{ActiveTheme, Root, h_flex, v_flex};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    capture::Session,
    config::WindowConfig,
    pipeline::{
        frame_store::FrameStore,
        sensor::{CoordinateMapper, SensorStream},
    },
    visualizer::FrameStats,
};

mod main_view;
mod render_util;

use render_util::RgbaCanvas;

/// Everything the window owns once it is open.
pub struct AppParts {
    pub store: FrameStore,
    pub mapper: Arc<dyn CoordinateMapper>,
    pub session: Session<BufWriter<File>>,
    pub sensor: SensorStream,
    pub sensor_label: String,
}

pub fn launch_ui(app: &mut App, window_config: &WindowConfig, parts: AppParts) -> gpui::Result<()> {
    let bounds = Bounds::centered(
        None,
        size(px(window_config.width), px(window_config.height)),
        app,
    );
    let window_options = WindowOptions {
        window_bounds: Some(WindowBounds::Windowed(bounds)),
        titlebar: Some(TitlebarOptions {
            title: Some(window_config.title.clone().into()),
            appears_transparent: false,
            traffic_light_position: None,
        }),
        ..Default::default()
    };

    app.on_window_closed(|cx| {
        if should_quit(cx.windows().len()) {
            log::info!("last window closed, quitting");
            cx.quit();
        }
    })
    .detach();

    app.open_window(window_options, move |window, app| {
        let view = app.new(|cx| AppView::new(parts, cx));
        let focus_handle = view.read(app).focus_handle.clone();
        window.focus(&focus_handle);
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    store: FrameStore,
    mapper: Arc<dyn CoordinateMapper>,
    session: Session<BufWriter<File>>,
    sensor: Option<SensorStream>,
    sensor_label: String,
    canvas: RgbaCanvas,
    latest_image: Option<Arc<RenderImage>>,
    last_stats: FrameStats,
    focus_handle: FocusHandle,
}

impl AppView {
    fn new(parts: AppParts, cx: &mut Context<'_, Self>) -> Self {
        let AppParts {
            store,
            mapper,
            session,
            sensor,
            sensor_label,
        } = parts;

        Self {
            store,
            mapper,
            session,
            sensor: Some(sensor),
            sensor_label,
            canvas: RgbaCanvas::new(),
            latest_image: None,
            last_stats: FrameStats::default(),
            focus_handle: cx.focus_handle(),
        }
    }

    /// Stops the sensor thread and flushes the log. Safe to call twice.
    fn shutdown(&mut self) {
        if let Some(sensor) = self.sensor.take() {
            sensor.stop();
        }
        self.session.flush();
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        self.render_main(window, cx)
    }
}

/// Closing the last window ends the session the same way Escape does.
fn should_quit(open_windows: usize) -> bool {
    open_windows == 0
}

/// The character a key-down stands for, if it is a single printable one.
fn typed_char(keystroke: &Keystroke) -> Option<char> {
    if keystroke.modifiers.control || keystroke.modifiers.platform {
        return None;
    }
    let text = keystroke.key_char.as_deref().unwrap_or(&keystroke.key);
    single_char(text)
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}
