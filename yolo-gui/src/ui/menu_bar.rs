//! Menu bar and toolbar.

use egui::{
    Button, Context as EguiContext, CornerRadius, Margin, Response, RichText, Stroke,
    TopBottomPanel, Ui, ViewportCommand, vec2,
};

use crate::{YoloApp, theme};

impl YoloApp {
    /// Renders the File and About menus.
    pub fn show_menu_bar(&mut self, ctx: &EguiContext) {
        TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image").clicked() {
                        ui.close();
                        self.open_image_dialog();
                    }
                    if ui.button("Exit").clicked() {
                        ui.close();
                        // Goes through the same close path as the window
                        // button, including the unsaved-changes check.
                        ctx.send_viewport_cmd(ViewportCommand::Close);
                    }
                });
                ui.menu_button("About", |ui| {
                    if ui.button("About Us").clicked() {
                        ui.close();
                        self.show_about = true;
                    }
                });
            });
        });
    }

    /// Renders the toolbar with the two main actions.
    pub fn show_toolbar(&mut self, ctx: &EguiContext) {
        let palette = theme::palette();
        TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::new()
                    .fill(palette.panel)
                    .inner_margin(Margin::symmetric(16, 10)),
            )
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    let model_ready = self.detector.is_some();

                    if self
                        .toolbar_button(
                            ui,
                            palette,
                            "Open Image",
                            "Detect objects in a file",
                            model_ready && !self.is_busy,
                        )
                        .clicked()
                    {
                        self.open_image_dialog();
                    }

                    if self.realtime.is_running() {
                        if self
                            .toolbar_button(
                                ui,
                                palette,
                                "Stop Real-Time Detection",
                                "Release the camera",
                                true,
                            )
                            .clicked()
                        {
                            self.stop_realtime();
                        }
                    } else if self
                        .toolbar_button(
                            ui,
                            palette,
                            "Start Real-Time Detection",
                            "Annotate the webcam feed",
                            model_ready,
                        )
                        .clicked()
                    {
                        self.start_realtime();
                    }
                });
            });
    }

    fn toolbar_button(
        &self,
        ui: &mut Ui,
        palette: theme::Palette,
        title: &str,
        subtitle: &str,
        enabled: bool,
    ) -> Response {
        let text = format!("{title}\n{subtitle}");
        ui.add_enabled(
            enabled,
            Button::new(RichText::new(text).size(15.0))
                .wrap()
                .min_size(vec2(200.0, 56.0))
                .fill(if enabled {
                    palette.panel_light
                } else {
                    palette.panel_dark
                })
                .stroke(Stroke::new(1.0, palette.outline))
                .corner_radius(CornerRadius::same(14)),
        )
    }
}
