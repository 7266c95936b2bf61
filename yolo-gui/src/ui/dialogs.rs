//! Modal dialogs: errors, close confirmation, about.

use egui::{Align2, Context as EguiContext, RichText, ViewportCommand};

use crate::{YoloApp, theme};

impl YoloApp {
    /// Renders whichever modal dialogs are pending.
    pub fn show_dialogs(&mut self, ctx: &EguiContext) {
        self.show_error_dialog(ctx);
        self.show_close_confirm_dialog(ctx);
        self.show_about_window(ctx);
    }

    /// Error dialog for the queued [`crate::ErrorReport`].
    ///
    /// Acknowledging a fatal report closes the application.
    fn show_error_dialog(&mut self, ctx: &EguiContext) {
        let Some(report) = self.last_error.clone() else {
            return;
        };
        let palette = theme::palette();

        egui::Window::new(report.kind.dialog_title())
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(RichText::new(report.kind.dialog_lead()).strong());
                ui.label(RichText::new(&report.detail).color(palette.subtle_text));
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() && self.acknowledge_error() {
                        ctx.send_viewport_cmd(ViewportCommand::Close);
                    }
                });
            });
    }

    fn show_close_confirm_dialog(&mut self, ctx: &EguiContext) {
        if !self.show_close_confirm {
            return;
        }

        egui::Window::new("Unsaved Changes")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Do you want to exit without saving?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        self.confirm_exit();
                        ctx.send_viewport_cmd(ViewportCommand::Close);
                    }
                    if ui.button("No").clicked() {
                        self.cancel_exit();
                    }
                });
            });
    }

    fn show_about_window(&mut self, ctx: &EguiContext) {
        let palette = theme::palette();
        let mut open = self.show_about;

        egui::Window::new("About Us")
            .open(&mut open)
            .auto_sized()
            .show(ctx, |ui| {
                ui.heading(RichText::new("Object Detection App").color(palette.accent));
                ui.label(format!("Version {}", yolo_core::version()));
                ui.add_space(8.0);
                ui.label("Detects objects in still images with a pretrained YOLOv3 network.");
                ui.label("Real-time webcam detection draws boxes straight onto the live feed.");
            });

        self.show_about = open;
    }
}
