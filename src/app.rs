use std::sync::Arc;

use eframe::egui::{self, Context as EguiContext, Key, RichText, TopBottomPanel};
use eframe::{App, Frame};

use crate::canvas;
use crate::capture::{ClipboardCapture, ViewCapture};
use crate::compositor;
use crate::config::{Settings, WidgetConfig};
use crate::controller::EscapeOutcome;
use crate::mapper::CoordinateMapper;
use crate::recorder::ActivityRecorder;
use crate::report::{self, SystemInfo};
use crate::session::{MessageKind, ReportSession};
use crate::theme::{self, AppTheme};
use crate::toolbar;
use crate::ui_controls;

pub struct BugmarkApp {
    config: WidgetConfig,
    settings: Settings,
    theme: AppTheme,
    recorder: Arc<ActivityRecorder>,
    capture: Box<dyn ViewCapture>,
    session: Option<ReportSession>,
}

impl BugmarkApp {
    pub fn new(cc: &eframe::CreationContext<'_>, recorder: Arc<ActivityRecorder>) -> Self {
        let theme = theme::reporter_theme();
        theme::apply_theme(&cc.egui_ctx, &theme);

        let settings = Settings::load().unwrap_or_else(|err| {
            log::warn!("cannot load settings: {err:#}");
            Settings::default()
        });

        Self {
            config: WidgetConfig::load(),
            settings,
            theme,
            recorder,
            capture: Box::new(ClipboardCapture),
            session: None,
        }
    }

    /// Opens the reporting modal. A failed capture is non-fatal, the session
    /// opens without a screenshot and says so inline.
    fn open_session(&mut self) {
        let session = match self.capture.capture_view() {
            Ok(image) => {
                log::info!(
                    "captured view {}x{} for a new report",
                    image.width(),
                    image.height()
                );
                ReportSession::new(Some(image), self.settings.last_color)
            }
            Err(err) => {
                log::warn!("view capture failed: {err:#}");
                let mut session = ReportSession::new(None, self.settings.last_color);
                session.show_message(
                    MessageKind::Error,
                    "Failed to capture screenshot, but you can still report the bug.",
                );
                session
            }
        };
        self.session = Some(session);
    }

    fn close_session(&mut self) {
        self.session = None;
    }

    fn handle_shortcuts(&mut self, ctx: &EguiContext) {
        let escape = ctx.input(|input| input.key_pressed(Key::Escape));
        let undo_redo = ctx.input(|input| {
            (input.modifiers.command || input.modifiers.ctrl) && input.key_pressed(Key::Z)
        });
        let shift = ctx.input(|input| input.modifiers.shift);

        let mut close = false;
        if let Some(session) = self.session.as_mut() {
            if escape {
                if session.confirm_clear {
                    session.confirm_clear = false;
                } else if session.controller.escape() == EscapeOutcome::CloseSession {
                    close = true;
                }
            }

            if !close && undo_redo {
                if shift {
                    session.controller.redo();
                } else {
                    session.controller.undo();
                }
            }
        }

        if close {
            self.close_session();
        }
    }

    fn persist_color(&mut self, color: crate::annotation::Color) {
        self.settings.last_color = color;
        if let Err(err) = self.settings.save() {
            log::warn!("cannot save settings: {err:#}");
        }
    }

    /// Flattens the annotations into the captured raster and posts the
    /// report. On failure the session stays open for a retry.
    fn submit_report(&mut self, ctx: &EguiContext) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.description.trim().is_empty() {
            session.show_message(MessageKind::Error, "Please describe the issue");
            return;
        }

        session.show_message(MessageKind::Info, "Submitting report...");

        // A failed export is terminal for the submit. The modal stays open
        // with the annotations intact so the user can retry.
        let screenshot_png = match flatten_screenshot(session) {
            Ok(png) => png,
            Err(err) => {
                log::warn!("cannot flatten the screenshot: {err:#}");
                session.show_message(
                    MessageKind::Error,
                    format!("Could not export the screenshot: {err:#}"),
                );
                return;
            }
        };

        let viewport = ctx.screen_rect();
        let screen = ctx.input(|input| input.viewport().monitor_size);
        let system_info = SystemInfo::collect(
            screen.map(|size| (size.x as u32, size.y as u32)),
            Some((viewport.width() as u32, viewport.height() as u32)),
        );

        let payload = report::build_payload(
            session.description.clone(),
            screenshot_png,
            &self.recorder,
            system_info,
        );

        match report::submit(&self.config, payload, &self.recorder) {
            Ok(()) => {
                log::info!("report submitted");
                self.close_session();
            }
            Err(err) => {
                log::warn!("report submit failed: {err:#}");
                session.show_message(MessageKind::Error, format!("Submit failed: {err:#}"));
            }
        }
    }

    fn show_idle_screen(&mut self, ctx: &EguiContext) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.surfaces.app_bg))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.4);
                        ui.label(
                            RichText::new(&self.config.modal_title)
                                .size(22.0)
                                .color(self.theme.text.primary),
                        );
                        ui.add_space(12.0);
                        if ui_controls::primary_button(ui, &self.theme, "🐛 Report a Bug")
                            .clicked()
                        {
                            self.open_session();
                        }
                    });
                });
            });
    }

    fn show_confirm_clear(&mut self, ctx: &EguiContext) {
        let theme = self.theme.clone();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.confirm_clear {
            return;
        }

        egui::Window::new("Clear all annotations?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .frame(ui_controls::card_frame(&theme))
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("All arrows, text and drawings will be removed.")
                        .color(theme.text.secondary)
                        .size(15.0),
                );
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui_controls::primary_button(ui, &theme, "Clear").clicked() {
                        session.controller.clear_all();
                        session.confirm_clear = false;
                    }
                    if ui_controls::ghost_button(ui, &theme, "Keep").clicked() {
                        session.confirm_clear = false;
                    }
                });
            });
    }

    fn show_footer(&mut self, ctx: &EguiContext) -> FooterOutput {
        let theme = self.theme.clone();
        let config = self.config.clone();
        let mut output = FooterOutput::default();
        let Some(session) = self.session.as_mut() else {
            return output;
        };

        TopBottomPanel::bottom("report_footer")
            .exact_height(theme.layout.footer_height)
            .frame(ui_controls::footer_frame(&theme))
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(&config.description_label)
                        .color(theme.text.secondary)
                        .size(13.0),
                );
                ui.add_space(4.0);
                ui.add_sized(
                    egui::vec2(ui.available_width(), 44.0),
                    egui::TextEdit::multiline(&mut session.description)
                        .hint_text(&config.description_placeholder)
                        .desired_rows(2),
                );
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    if let Some((kind, text)) = &session.message {
                        let color = match kind {
                            MessageKind::Error => theme.surfaces.danger,
                            MessageKind::Info => theme.text.muted,
                        };
                        ui.label(RichText::new(text).color(color).size(13.0));
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui_controls::primary_button(ui, &theme, &config.submit_text).clicked() {
                            output.submit = true;
                        }
                        if ui_controls::ghost_button(ui, &theme, &config.cancel_text).clicked() {
                            output.cancel = true;
                        }
                    });
                });
            });

        output
    }
}

#[derive(Default)]
struct FooterOutput {
    submit: bool,
    cancel: bool,
}

impl App for BugmarkApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        if self.session.is_none() {
            self.show_idle_screen(ctx);
            return;
        }

        self.handle_shortcuts(ctx);
        if self.session.is_none() {
            // Escape closed the session this frame.
            self.show_idle_screen(ctx);
            return;
        }

        let theme = self.theme.clone();
        let toolbar_output = TopBottomPanel::top("toolbar")
            .exact_height(theme.layout.toolbar_height)
            .frame(ui_controls::toolbar_frame(&theme))
            .show(ctx, |ui| {
                let session = self.session.as_mut().expect("session was checked above");
                toolbar::show_toolbar(ui, &theme, &mut session.controller)
            })
            .inner;

        if let Some(color) = toolbar_output.color_changed {
            self.persist_color(color);
        }
        if toolbar_output.clear_requested {
            let session = self.session.as_mut().expect("session is open");
            if !session.controller.store().is_empty() {
                session.confirm_clear = true;
            }
        }

        let footer_output = self.show_footer(ctx);

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme.surfaces.app_bg)
                    .inner_margin(egui::Margin::symmetric(
                        theme.layout.panel_padding_x,
                        theme.layout.panel_padding_y,
                    )),
            )
            .show(ctx, |ui| {
                let session = self.session.as_mut().expect("session is open");
                canvas::show_canvas(ui, ctx, &theme, session);
            });

        self.show_confirm_clear(ctx);

        if footer_output.cancel {
            self.close_session();
        } else if footer_output.submit {
            self.submit_report(ctx);
        }
    }
}

/// Composite the session's annotations into the base raster at full capture
/// resolution. `None` when the session never had a screenshot.
fn flatten_screenshot(session: &ReportSession) -> anyhow::Result<Option<Vec<u8>>> {
    let Some(image) = session.image.as_ref() else {
        return Ok(None);
    };
    let Some(display) = session.display_size else {
        return Ok(None);
    };

    let mapper = CoordinateMapper::new(display, (image.dynamic.width(), image.dynamic.height()));
    let flattened = compositor::composite(&image.dynamic, &session.controller.snapshot(), &mapper)?;
    let png = compositor::encode_png(&flattened)?;
    Ok(Some(png))
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::flatten_screenshot;
    use crate::annotation::Color;
    use crate::session::ReportSession;

    #[test]
    fn flatten_surfaces_errors_for_a_degenerate_raster() {
        // A raster the compositor cannot work with must come back as an
        // error, never as a silent screenshot-less export.
        let mut session = ReportSession::new(Some(DynamicImage::new_rgba8(0, 16)), Color::Red);
        session.display_size = Some((320.0, 240.0));
        assert!(flatten_screenshot(&session).is_err());
    }

    #[test]
    fn flatten_without_a_capture_is_not_an_error() {
        let session = ReportSession::new(None, Color::Red);
        assert!(matches!(flatten_screenshot(&session), Ok(None)));
    }
}
