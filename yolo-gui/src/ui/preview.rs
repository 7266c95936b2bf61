//! Central panel: workspace tabs, image preview, realtime view.

use egui::{
    CentralPanel, Context as EguiContext, CornerRadius, Margin, RichText, ScrollArea, Spinner,
    Stroke, TextureHandle, TextureOptions, Ui,
};
use egui_extras::{Size, StripBuilder};
use image::RgbImage;

use crate::{ActiveTab, RealtimeStatus, YoloApp, theme};

/// Width of the results side panel in both tabs.
const SUMMARY_PANEL_WIDTH: f32 = 260.0;

/// Upload an RGB frame as a uniquely named texture.
///
/// Texture names never repeat, so a new upload cannot collide with a frame
/// still referenced by the previous paint pass.
pub(crate) fn load_texture_from_rgb(
    ctx: &EguiContext,
    label: &str,
    frame: &RgbImage,
    texture_seq: &mut u64,
) -> TextureHandle {
    let size = [frame.width() as usize, frame.height() as usize];
    let color_image = egui::ColorImage::from_rgb(size, frame.as_raw());
    let name = format!("{label}-{texture_seq}");
    *texture_seq = texture_seq.wrapping_add(1);
    ctx.load_texture(name, color_image, TextureOptions::LINEAR)
}

/// Scale a texture to fit the available area and center it.
fn show_scaled_texture(ui: &mut Ui, texture: &TextureHandle) {
    let available = ui.available_size();
    if available.x <= 0.0 || available.y <= 0.0 {
        return;
    }
    let tex_size = texture.size_vec2();
    if tex_size.x <= 0.0 || tex_size.y <= 0.0 {
        return;
    }

    let scale = (available.x / tex_size.x)
        .min(available.y / tex_size.y)
        .max(0.0);
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let scaled = tex_size * scale;

    ui.centered_and_justified(|ui| {
        ui.add(egui::Image::new(texture).fit_to_exact_size(scaled));
    });
}

impl YoloApp {
    /// Renders the central panel with the workspace tabs.
    pub fn show_central_panel(&mut self, ctx: &EguiContext) {
        CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(
                    &mut self.active_tab,
                    ActiveTab::ImageDetection,
                    "Image Detection",
                );
                ui.selectable_value(
                    &mut self.active_tab,
                    ActiveTab::RealtimeDetection,
                    "Real-Time Detection",
                );
            });
            ui.separator();

            match self.active_tab {
                ActiveTab::ImageDetection => self.show_image_tab(ui),
                ActiveTab::RealtimeDetection => self.show_realtime_tab(ui),
            }
        });
    }

    fn show_image_tab(&mut self, ui: &mut Ui) {
        let palette = theme::palette();
        StripBuilder::new(ui)
            .size(Size::remainder())
            .size(Size::exact(SUMMARY_PANEL_WIDTH))
            .horizontal(|mut strip| {
                strip.cell(|ui| {
                    framed_viewport(ui, palette, |ui| {
                        self.render_image_area(ui, palette);
                    });
                });
                strip.cell(|ui| {
                    self.render_image_summary(ui, palette);
                });
            });
    }

    fn render_image_area(&mut self, ui: &mut Ui, palette: theme::Palette) {
        if let Some(texture) = self.preview.texture.clone() {
            show_scaled_texture(ui, &texture);
        } else if self.preview.is_loading {
            ui.vertical_centered(|ui| {
                ui.add_space(64.0);
                ui.add(Spinner::new().size(28.0));
                ui.label(RichText::new("Loading image and running detection...").size(16.0));
            });
        } else {
            ui.vertical_centered(|ui| {
                ui.add_space(64.0);
                ui.heading("Open an image to detect objects.");
                ui.label(
                    RichText::new("Boxes and labels are drawn straight onto the preview.")
                        .color(palette.subtle_text),
                );
            });
        }
    }

    fn render_image_summary(&mut self, ui: &mut Ui, palette: theme::Palette) {
        ui.vertical(|ui| {
            ui.heading(RichText::new("Results").size(18.0));
            ui.horizontal_wrapped(|ui| {
                self.status_chip(
                    ui,
                    palette,
                    format!("Objects {}", self.preview.detections.len()),
                    palette.accent,
                );
                if let Some((width, height)) = self.preview.image_size {
                    self.status_chip(ui, palette, format!("{width}x{height}"), palette.subtle_text);
                }
            });
            ui.separator();

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if self.preview.summary.is_empty() {
                        ui.label(RichText::new("No detections yet.").color(palette.subtle_text));
                    } else {
                        ui.label(&self.preview.summary);
                    }
                });
        });
    }

    fn show_realtime_tab(&mut self, ui: &mut Ui) {
        let palette = theme::palette();
        StripBuilder::new(ui)
            .size(Size::remainder())
            .size(Size::exact(SUMMARY_PANEL_WIDTH))
            .horizontal(|mut strip| {
                strip.cell(|ui| {
                    framed_viewport(ui, palette, |ui| {
                        self.render_realtime_area(ui, palette);
                    });
                });
                strip.cell(|ui| {
                    self.render_realtime_panel(ui, palette);
                });
            });
    }

    fn render_realtime_area(&mut self, ui: &mut Ui, palette: theme::Palette) {
        if let Some(texture) = self.realtime.texture.clone() {
            show_scaled_texture(ui, &texture);
            return;
        }

        ui.vertical_centered(|ui| {
            ui.add_space(64.0);
            if matches!(self.realtime.status, RealtimeStatus::Starting) {
                ui.add(Spinner::new().size(28.0));
                ui.label(RichText::new("Opening camera...").size(16.0));
            } else {
                ui.heading("Start real-time detection to see the camera feed.");
                ui.label(
                    RichText::new("Press Esc or the toolbar button to stop.")
                        .color(palette.subtle_text),
                );
            }
        });
    }

    fn render_realtime_panel(&mut self, ui: &mut Ui, palette: theme::Palette) {
        ui.vertical(|ui| {
            ui.heading(RichText::new("Live Feed").size(18.0));
            ui.horizontal_wrapped(|ui| {
                let (label, color) = match self.realtime.status {
                    RealtimeStatus::Inactive => ("Stopped", palette.subtle_text),
                    RealtimeStatus::Starting => ("Starting", palette.warning),
                    RealtimeStatus::Active => ("Live", palette.success),
                    RealtimeStatus::Stopping => ("Stopping", palette.warning),
                };
                self.status_chip(ui, palette, label, color);
                self.status_chip(
                    ui,
                    palette,
                    format!("Frames {}", self.realtime.frames_captured),
                    palette.accent,
                );
                self.status_chip(
                    ui,
                    palette,
                    format!("Objects {}", self.realtime.last_detection_count),
                    palette.accent,
                );
            });

            if self.realtime.is_running() && ui.button("Stop").clicked() {
                self.stop_realtime();
            }
            ui.separator();

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if self.realtime.summary.is_empty() {
                        ui.label(
                            RichText::new("Frame summaries appear here.")
                                .color(palette.subtle_text),
                        );
                    } else {
                        ui.label(&self.realtime.summary);
                    }
                });
        });
    }
}

fn framed_viewport(ui: &mut Ui, palette: theme::Palette, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::new()
        .fill(palette.canvas)
        .stroke(Stroke::new(1.0, palette.outline))
        .corner_radius(CornerRadius::same(18))
        .inner_margin(Margin::symmetric(14, 14))
        .show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            add_contents(ui);
        });
}
