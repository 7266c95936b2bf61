//! Splash screen shown while the model loads.

use egui::{CentralPanel, Context as EguiContext, RichText, Spinner};

use crate::{YoloApp, theme};

impl YoloApp {
    /// Full-window splash with the application title.
    pub fn show_splash(&mut self, ctx: &EguiContext) {
        let palette = theme::palette();
        CentralPanel::default()
            .frame(egui::Frame::new().fill(palette.canvas))
            .show(ctx, |ui| {
                let height = ui.available_height();
                ui.vertical_centered(|ui| {
                    ui.add_space((height * 0.35).max(48.0));
                    ui.label(
                        RichText::new("Object Detection")
                            .size(36.0)
                            .strong()
                            .color(palette.accent),
                    );
                    ui.add_space(12.0);
                    if self.detector.is_none() && !self.detector_failed {
                        ui.add(Spinner::new().size(22.0));
                        ui.label(RichText::new("Loading model...").color(palette.subtle_text));
                    }
                });
            });
    }
}
