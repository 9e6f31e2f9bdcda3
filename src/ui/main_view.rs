use super::render_util::canvas_to_image;
use super::{
    ActiveTheme, AnyElement, AppView, Context, InteractiveElement, IntoElement, KeyDownEvent,
    ObjectFit, ParentElement, Styled, StyledImage, Window, div, h_flex, img, px, typed_char,
    v_flex,
};
use crate::visualizer;
use std::sync::Arc;

impl AppView {
    pub(super) fn render_main(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        self.store.refresh();

        let viewport = window.viewport_size();
        let width = f32::from(viewport.width).round().max(1.0) as u32;
        let height = f32::from(viewport.height).round().max(1.0) as u32;
        self.canvas.reset(width, height);
        self.last_stats = visualizer::draw_frame(
            &self.store,
            self.mapper.as_ref(),
            &mut self.canvas,
            &mut self.session,
        );
        self.session.flush();
        if let Some(image) = canvas_to_image(&self.canvas) {
            self.replace_latest_image(image, window, cx);
        }

        let frame_view: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Fill)
                .into_any_element()
        } else {
            div().size_full().bg(gpui::rgb(0x000000)).into_any_element()
        };

        div()
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(Self::handle_key_down))
            .relative()
            .size_full()
            .bg(gpui::rgb(0x000000))
            .child(frame_view)
            .child(
                div()
                    .absolute()
                    .top(px(12.0))
                    .left(px(12.0))
                    .child(self.render_status(cx)),
            )
            .into_any_element()
    }

    fn render_status(&self, cx: &mut Context<'_, Self>) -> AnyElement {
        let theme = cx.theme();
        let capture = self.session.capture();
        let capture_color = if capture.is_on() {
            gpui::rgb(0xef4444).into()
        } else {
            theme.muted_foreground
        };

        let label = self.session.last_label().unwrap_or("--");
        let hands = self
            .store
            .body_frame()
            .and_then(|frame| frame.tracked_bodies().next())
            .map(|body| {
                format!(
                    "hands L:{} R:{}",
                    body.hand_left.label(),
                    body.hand_right.label()
                )
            })
            .unwrap_or_else(|| "no body".to_string());

        let skew = self
            .store
            .channel_skew()
            .map(|skew| format!("skew {} ms", skew.as_millis()))
            .unwrap_or_else(|| "waiting for sensor".to_string());

        let chip = |text: String| {
            div()
                .px_2()
                .py_0p5()
                .rounded_md()
                .bg(gpui::rgba(0x00000099))
                .text_xs()
                .text_color(gpui::rgb(0xd0d7e1))
                .child(text)
        };

        v_flex()
            .gap_1()
            .child(
                h_flex()
                    .gap_2()
                    .child(
                        div()
                            .px_2()
                            .py_0p5()
                            .rounded_md()
                            .bg(gpui::rgba(0x00000099))
                            .text_xs()
                            .text_color(capture_color)
                            .child(format!("● {}", capture.label())),
                    )
                    .child(chip(format!("label: {label}")))
                    .child(chip(format!("rows: {}", self.session.rows_written()))),
            )
            .child(
                h_flex()
                    .gap_2()
                    .child(chip(format!(
                        "{}: {} bodies, {} joints",
                        self.sensor_label,
                        self.last_stats.tracked_bodies,
                        self.last_stats.tracked_joints
                    )))
                    .child(chip(hands))
                    .child(chip(skew)),
            )
            .child(
                div()
                    .text_xs()
                    .text_color(gpui::rgb(0x8b95a5))
                    .child(format!(
                        "'{}' toggles capture, Esc quits",
                        self.session.keys().toggle_key()
                    )),
            )
            .into_any_element()
    }

    fn handle_key_down(
        &mut self,
        event: &KeyDownEvent,
        _: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if event.keystroke.key == "escape" {
            self.shutdown();
            cx.quit();
            return;
        }

        let Some(key) = typed_char(&event.keystroke) else {
            return;
        };
        if self.session.handle_key(key) {
            cx.notify();
        } else {
            log::debug!("unbound key {key:?}");
        }
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<super::RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // The sprite atlas keeps every texture until it is dropped explicitly.
            cx.drop_image(old_image, Some(window));
        }
    }
}
