//! Bottom status bar.

use egui::{
    Align, Color32, Context as EguiContext, CornerRadius, Layout, Margin, RichText, Spinner,
    Stroke, TopBottomPanel, Ui,
};

use crate::{RealtimeStatus, YoloApp, theme};

impl YoloApp {
    /// Renders the bottom status bar with the state badge and status line.
    pub fn show_status_bar(&mut self, ctx: &EguiContext) {
        let palette = theme::palette();
        TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::new()
                    .fill(palette.panel_dark)
                    .stroke(Stroke::new(1.0, palette.outline))
                    .inner_margin(Margin::symmetric(16, 8)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    self.draw_status_badge(ui, palette);

                    if let Some(report) = &self.last_error {
                        ui.colored_label(palette.danger, &report.detail);
                    } else {
                        ui.label(RichText::new(&self.status_line).color(palette.subtle_text));
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.unsaved_changes {
                            self.status_chip(ui, palette, "Unsaved results", palette.warning);
                        }
                    });
                });
            });
    }

    fn draw_status_badge(&self, ui: &mut Ui, palette: theme::Palette) {
        let (label, color) = if self.is_busy {
            ("Detecting...", palette.accent)
        } else if self.realtime.is_running() {
            ("Live", palette.success)
        } else if self.detector.is_none() {
            ("Loading Model", palette.warning)
        } else {
            ("Ready", palette.success)
        };

        egui::Frame::new()
            .fill(palette.panel_light)
            .stroke(Stroke::new(1.0, color))
            .corner_radius(CornerRadius::same(64))
            .inner_margin(Margin::symmetric(12, 4))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    if self.is_busy || matches!(self.realtime.status, RealtimeStatus::Starting) {
                        ui.add(Spinner::new().size(14.0));
                    }
                    ui.label(RichText::new(label).size(14.0).strong());
                });
            });
    }

    pub(crate) fn status_chip(
        &self,
        ui: &mut Ui,
        palette: theme::Palette,
        text: impl Into<String>,
        accent: Color32,
    ) {
        egui::Frame::new()
            .fill(palette.panel_dark)
            .stroke(Stroke::new(1.0, accent))
            .corner_radius(CornerRadius::same(24))
            .inner_margin(Margin::symmetric(12, 4))
            .show(ui, |ui| {
                ui.label(
                    RichText::new(text.into())
                        .size(14.0)
                        .color(palette.subtle_text),
                );
            });
    }
}
