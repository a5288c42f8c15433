use egui::{vec2, Align, Align2, FontId, Layout, Pos2, RichText, Shape, Stroke, Ui};

use crate::annotation::Color;
use crate::controller::{InteractionController, Tool};
use crate::theme::AppTheme;
use crate::ui_controls;

/// What the toolbar asked the app to do this frame. The clear action needs
/// a confirmation dialog, so it bubbles up instead of mutating directly.
#[derive(Default)]
pub struct ToolbarOutput {
    pub clear_requested: bool,
    pub color_changed: Option<Color>,
}

pub fn show_toolbar(
    ui: &mut Ui,
    theme: &AppTheme,
    controller: &mut InteractionController,
) -> ToolbarOutput {
    let mut output = ToolbarOutput::default();

    ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
        ui.spacing_mut().interact_size.y = theme.layout.chip_h;
        ui.spacing_mut().item_spacing = vec2(6.0, 0.0);

        tool_button(ui, theme, controller, Tool::Select, "Select (Esc)");
        tool_button(ui, theme, controller, Tool::Arrow, "Arrow");
        tool_button(ui, theme, controller, Tool::Text, "Text");
        tool_button(ui, theme, controller, Tool::Freehand, "Draw");

        ui.separator();

        for color in Color::ALL {
            let selected = controller.color() == color;
            if ui_controls::color_chip(ui, theme, color.color32(), selected)
                .on_hover_text(color.label())
                .clicked()
            {
                controller.set_color(color);
                output.color_changed = Some(color);
            }
        }

        ui.separator();

        if ui
            .add_enabled(
                controller.can_undo(),
                egui::Button::new(RichText::new("Undo").size(13.0)),
            )
            .on_hover_text("Undo (Ctrl+Z)")
            .clicked()
        {
            controller.undo();
        }
        if ui
            .add_enabled(
                controller.can_redo(),
                egui::Button::new(RichText::new("Redo").size(13.0)),
            )
            .on_hover_text("Redo (Ctrl+Shift+Z)")
            .clicked()
        {
            controller.redo();
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui
                .add(
                    egui::Button::new(
                        RichText::new("Clear all")
                            .size(13.0)
                            .color(theme.surfaces.danger),
                    )
                    .fill(theme.surfaces.card_bg),
                )
                .clicked()
            {
                output.clear_requested = true;
            }
        });
    });

    output
}

fn tool_button(
    ui: &mut Ui,
    theme: &AppTheme,
    controller: &mut InteractionController,
    tool: Tool,
    hint: &str,
) {
    let selected = controller.tool() == tool;
    let response = ui_controls::tool_chip(ui, theme, "", selected).on_hover_text(hint);
    draw_tool_icon(ui, theme, response.rect, tool, selected);
    if response.clicked() {
        controller.toggle_tool(tool);
    }
}

fn draw_tool_icon(ui: &Ui, theme: &AppTheme, rect: egui::Rect, tool: Tool, selected: bool) {
    let color = if selected {
        theme.text.primary
    } else {
        theme.text.secondary
    };
    let stroke = Stroke::new(1.65, color);
    let painter = ui.painter();
    let icon_rect = rect.shrink2(vec2(8.0, 5.0));

    match tool {
        Tool::Select => {
            // Cursor triangle with a short tail.
            let tip = Pos2::new(icon_rect.left() + 3.0, icon_rect.top() + 1.0);
            let left = Pos2::new(icon_rect.left() + 3.0, icon_rect.bottom() - 3.0);
            let right = Pos2::new(icon_rect.left() + 11.0, icon_rect.center().y + 2.0);
            painter.line_segment([tip, left], stroke);
            painter.line_segment([left, right], stroke);
            painter.line_segment([right, tip], stroke);
            painter.line_segment(
                [right, Pos2::new(right.x + 4.0, right.y + 4.0)],
                stroke,
            );
        }
        Tool::Arrow => {
            // Diagonal shaft pointing to the upper right.
            let start = Pos2::new(icon_rect.left() + 2.0, icon_rect.bottom() - 2.0);
            let tip = Pos2::new(icon_rect.right() - 2.0, icon_rect.top() + 2.0);
            painter.line_segment([start, tip], stroke);
            painter.add(Shape::convex_polygon(
                vec![
                    tip,
                    Pos2::new(tip.x - 7.0, tip.y + 1.5),
                    Pos2::new(tip.x - 1.5, tip.y + 7.0),
                ],
                color,
                Stroke::NONE,
            ));
        }
        Tool::Text => {
            painter.text(
                icon_rect.center(),
                Align2::CENTER_CENTER,
                "T",
                FontId::proportional(15.0),
                color,
            );
        }
        Tool::Freehand => {
            // Squiggle across the chip.
            let y = icon_rect.center().y;
            let w = icon_rect.width();
            let points: Vec<Pos2> = (0..=8)
                .map(|i| {
                    let t = i as f32 / 8.0;
                    Pos2::new(
                        icon_rect.left() + t * w,
                        y + (t * std::f32::consts::TAU).sin() * 3.5,
                    )
                })
                .collect();
            painter.add(Shape::line(points, stroke));
        }
    }
}
