use egui::{
    vec2, Align2, Color32, Context, FontId, Id, Pos2, Rect, Response, Sense, Shape, Stroke, Ui,
};

use crate::annotation::{Point, TextLabel};
use crate::controller::GesturePreview;
use crate::overlay::{self, DrawCmd};
use crate::session::ReportSession;
use crate::theme::AppTheme;

/// Preview pane: the captured screenshot fitted to the available area with
/// the live annotation overlay on top. Display space is local to the fitted
/// image rect, so overlay geometry converts to screen by translation only.
pub fn show_canvas(ui: &mut Ui, ctx: &Context, theme: &AppTheme, session: &mut ReportSession) {
    if session.image.is_none() {
        empty_canvas(ui, theme);
        return;
    }

    let (texture_id, image_size) = {
        let image = session.image.as_mut().expect("image was checked above");
        let texture = image.ensure_texture(ctx);
        (texture.id(), image.size_vec2())
    };

    let available = ui.available_size();
    if available.x <= 1.0 || available.y <= 1.0 {
        // Layout has not settled yet; retry next frame instead of fitting
        // the image into a zero-sized box.
        ctx.request_repaint();
        return;
    }

    let (canvas_rect, response) = ui.allocate_exact_size(available, Sense::click_and_drag());
    let painter = ui.painter_at(canvas_rect);
    painter.rect_filled(canvas_rect, 12.0, theme.surfaces.canvas_bg);

    let inner = canvas_rect.shrink(16.0);
    let scale = (inner.width() / image_size.x).min(inner.height() / image_size.y);
    let display = image_size * scale;
    let origin = Pos2::new(
        canvas_rect.center().x - display.x * 0.5,
        canvas_rect.center().y - display.y * 0.5,
    );
    let image_rect = Rect::from_min_size(origin, display);

    session.display_size = Some((display.x, display.y));
    session.controller.set_bounds(display.x, display.y);

    painter.rect_stroke(
        image_rect.expand(1.0),
        2.0,
        Stroke::new(1.0, theme.surfaces.stroke_soft),
    );
    painter.image(
        texture_id,
        image_rect,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    handle_pointer(ctx, session, &response, image_rect);

    draw_overlay(&painter, theme, session, image_rect);
    draw_gesture_preview(&painter, session, image_rect);
    draw_text_editor(ui, theme, session, image_rect);
}

fn empty_canvas(ui: &mut Ui, theme: &AppTheme) {
    let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 12.0, theme.surfaces.canvas_bg);
    painter.rect_stroke(rect, 12.0, Stroke::new(1.0, theme.surfaces.stroke_soft));
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        "No screenshot",
        FontId::proportional(18.0),
        theme.text.secondary,
    );
}

fn handle_pointer(ctx: &Context, session: &mut ReportSession, response: &Response, image_rect: Rect) {
    if !response.hovered() && !response.dragged() && !response.clicked() {
        return;
    }

    let Some(pointer_pos) = ctx.input(|input| input.pointer.interact_pos()) else {
        return;
    };

    if !image_rect.contains(pointer_pos) && !session.controller.has_active_gesture() {
        return;
    }

    let display_pos = screen_to_display(pointer_pos, image_rect);
    let controller = &mut session.controller;

    if response.drag_started() {
        controller.pointer_pressed(display_pos);
    }
    if response.dragged() {
        controller.pointer_moved(display_pos);
    }
    if response.drag_stopped() {
        controller.pointer_released();
    }
    if response.clicked() && !response.dragged() {
        // A click never crosses the drag threshold, so synthesize the full
        // press and release pair.
        controller.pointer_pressed(display_pos);
        controller.pointer_released();
    }
}

fn draw_overlay(painter: &egui::Painter, theme: &AppTheme, session: &ReportSession, image_rect: Rect) {
    let snapshot = session.controller.snapshot();
    let display = (image_rect.width(), image_rect.height());
    let Some(scene) = overlay::build(&snapshot, display) else {
        return;
    };

    let editing_id = session.controller.text_edit().map(|edit| edit.id);

    for cmd in scene {
        match cmd {
            DrawCmd::Polyline {
                points,
                width,
                color,
            } => {
                let screen: Vec<Pos2> = points
                    .iter()
                    .map(|p| display_to_screen(*p, image_rect))
                    .collect();
                painter.add(Shape::line(screen, Stroke::new(width, color.color32())));
            }
            DrawCmd::Line {
                from,
                to,
                width,
                color,
            } => {
                painter.line_segment(
                    [
                        display_to_screen(from, image_rect),
                        display_to_screen(to, image_rect),
                    ],
                    Stroke::new(width, color.color32()),
                );
            }
            DrawCmd::Polygon { points, color } => {
                let screen = points
                    .iter()
                    .map(|p| display_to_screen(*p, image_rect))
                    .collect();
                painter.add(Shape::convex_polygon(screen, color.color32(), Stroke::NONE));
            }
            DrawCmd::Handle { center } => {
                let pos = display_to_screen(center, image_rect);
                painter.circle_filled(pos, overlay::HANDLE_RADIUS, theme.surfaces.accent);
                painter.circle_stroke(
                    pos,
                    overlay::HANDLE_RADIUS,
                    Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 200)),
                );
            }
            DrawCmd::Label {
                id,
                pos,
                text,
                color,
            } => {
                // The label under edit is rendered by the inline editor.
                if editing_id == Some(id) {
                    continue;
                }
                draw_label(painter, display_to_screen(pos, image_rect), &text, color);
            }
        }
    }
}

fn draw_label(painter: &egui::Painter, pos: Pos2, text: &str, color: crate::annotation::Color) {
    let galley = painter.layout_no_wrap(
        text.to_string(),
        FontId::proportional(TextLabel::FONT_SIZE),
        color.color32(),
    );
    let bg = Rect::from_min_size(pos, galley.size()).expand(3.0);
    painter.rect_filled(bg, 4.0, Color32::from_rgba_unmultiplied(0, 0, 0, 160));
    painter.galley(pos, galley, color.color32());
}

fn draw_gesture_preview(painter: &egui::Painter, session: &ReportSession, image_rect: Rect) {
    let Some(preview) = session.controller.gesture_preview() else {
        return;
    };

    match preview {
        GesturePreview::Arrow { tail, head } => {
            let color = session.controller.color().color32().linear_multiply(0.8);
            let from = display_to_screen(tail, image_rect);
            let to = display_to_screen(head, image_rect);
            painter.line_segment([from, to], Stroke::new(overlay::STROKE_WIDTH, color));

            let tip = overlay::arrow_head_points(
                tail,
                head,
                overlay::HEAD_LEN,
                overlay::HEAD_HALF_WIDTH,
            );
            let screen = tip
                .iter()
                .map(|p| display_to_screen(*p, image_rect))
                .collect();
            painter.add(Shape::convex_polygon(screen, color, Stroke::NONE));
        }
        GesturePreview::Stroke { points } => {
            let color = session.controller.color().color32().linear_multiply(0.8);
            let screen: Vec<Pos2> = points
                .iter()
                .map(|p| display_to_screen(*p, image_rect))
                .collect();
            painter.add(Shape::line(screen, Stroke::new(overlay::STROKE_WIDTH, color)));
        }
    }
}

fn draw_text_editor(ui: &mut Ui, theme: &AppTheme, session: &mut ReportSession, image_rect: Rect) {
    let Some(edit) = session.controller.text_edit() else {
        return;
    };
    let id = edit.id;
    let mut buffer = edit.buffer.clone();

    let Some(label) = session.controller.store().text(id) else {
        return;
    };
    let screen_pos = display_to_screen(label.pos, image_rect) - vec2(4.0, 4.0);
    let color = label.color.color32();

    let popup_id = Id::new("bugmark_text_edit");
    let focus_key = popup_id.with("focused");
    let mut commit = false;

    egui::Area::new(popup_id)
        .order(egui::Order::Foreground)
        .fixed_pos(screen_pos)
        .show(ui.ctx(), |ui| {
            egui::Frame::none()
                .fill(Color32::from_rgba_unmultiplied(0, 0, 0, 160))
                .rounding(egui::Rounding::same(4.0))
                .stroke(Stroke::new(1.0, theme.surfaces.accent))
                .inner_margin(egui::Margin::symmetric(4.0, 4.0))
                .show(ui, |ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut buffer)
                            .font(FontId::proportional(TextLabel::FONT_SIZE))
                            .text_color(color)
                            .desired_width(180.0)
                            .frame(false),
                    );

                    // Grab focus once per edit, so Tab can still move
                    // focus out to the description field afterwards.
                    let focused_for = ui.ctx().data(|data| data.get_temp::<u64>(focus_key));
                    if focused_for != Some(id) {
                        response.request_focus();
                        ui.ctx().data_mut(|data| data.insert_temp(focus_key, id));
                    }

                    // Enter, Tab and clicks elsewhere all surface as a
                    // lost focus; any of them settles the edit.
                    if response.lost_focus() {
                        commit = true;
                    }
                });
        });

    session.controller.update_text_buffer(buffer);
    if commit {
        session.controller.apply_text_edit();
        ui.ctx().data_mut(|data| data.remove::<u64>(focus_key));
    }
}

fn display_to_screen(pos: Point, image_rect: Rect) -> Pos2 {
    Pos2::new(image_rect.min.x + pos.x, image_rect.min.y + pos.y)
}

fn screen_to_display(pos: Pos2, image_rect: Rect) -> Point {
    Point::new(pos.x - image_rect.min.x, pos.y - image_rect.min.y)
}
