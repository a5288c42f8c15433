use egui::{vec2, Frame, Margin, RichText, Rounding, Stroke, Ui};

use crate::theme::AppTheme;

pub fn card_frame(theme: &AppTheme) -> Frame {
    Frame::none()
        .fill(theme.surfaces.card_bg)
        .rounding(Rounding::same(theme.layout.card_rounding))
        .stroke(Stroke::new(1.0, theme.surfaces.stroke_soft))
        .inner_margin(Margin::symmetric(16.0, 12.0))
}

pub fn toolbar_frame(theme: &AppTheme) -> Frame {
    Frame::none()
        .fill(theme.surfaces.panel_bg)
        .rounding(Rounding::ZERO)
        .inner_margin(Margin::symmetric(
            theme.layout.panel_padding_x,
            theme.layout.panel_padding_y,
        ))
}

pub fn footer_frame(theme: &AppTheme) -> Frame {
    Frame::none()
        .fill(theme.surfaces.panel_bg)
        .rounding(Rounding::ZERO)
        .inner_margin(Margin::symmetric(
            theme.layout.panel_padding_x,
            theme.layout.panel_padding_y,
        ))
}

pub fn tool_chip(ui: &mut Ui, theme: &AppTheme, label: &str, selected: bool) -> egui::Response {
    let mut button = egui::Button::new(RichText::new(label).size(14.0))
        .min_size(vec2(64.0, theme.layout.chip_h))
        .rounding(Rounding::same(theme.layout.rounding));

    if selected {
        button = button
            .fill(theme.surfaces.accent_soft)
            .stroke(Stroke::new(1.0, theme.surfaces.accent));
    } else {
        button = button.fill(theme.surfaces.card_bg);
    }

    ui.add(button)
}

pub fn color_chip(
    ui: &mut Ui,
    theme: &AppTheme,
    color: egui::Color32,
    selected: bool,
) -> egui::Response {
    let size = vec2(theme.layout.chip_h * 0.75, theme.layout.chip_h * 0.75);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());

    let painter = ui.painter();
    painter.rect_filled(rect, Rounding::same(rect.width() * 0.5), color);
    if selected {
        painter.rect_stroke(
            rect.expand(2.0),
            Rounding::same(rect.width() * 0.5 + 2.0),
            Stroke::new(2.0, theme.surfaces.accent),
        );
    } else {
        painter.rect_stroke(
            rect,
            Rounding::same(rect.width() * 0.5),
            Stroke::new(1.0, theme.surfaces.stroke_strong),
        );
    }

    response
}

pub fn primary_button(ui: &mut Ui, theme: &AppTheme, label: &str) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).color(theme.text.primary))
            .min_size(vec2(116.0, 32.0))
            .fill(theme.surfaces.accent)
            .rounding(Rounding::same(theme.layout.rounding)),
    )
}

pub fn ghost_button(ui: &mut Ui, theme: &AppTheme, label: &str) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(label).color(theme.text.secondary))
            .min_size(vec2(96.0, 32.0))
            .fill(theme.surfaces.card_bg)
            .stroke(Stroke::new(1.0, theme.surfaces.stroke_soft))
            .rounding(Rounding::same(theme.layout.rounding)),
    )
}
