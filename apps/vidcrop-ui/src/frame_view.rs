//! Frame display widget: the decoded frame at native resolution with the
//! pointer guides and selection fill painted on top.

use eframe::egui::{self, Color32};
use vidcrop_model::display::{Overlay, Rgba, GUIDE_COLOR, SELECTION_COLOR};
use vidcrop_model::geometry::PixelPoint;
use vidcrop_render_engine::{Frame, Session};

#[derive(Default)]
pub struct FrameView {
    texture: Option<egui::TextureHandle>,
}

impl FrameView {
    /// Upload `frame` as the image to display.
    pub fn set_frame(&mut self, ctx: &egui::Context, frame: &Frame) {
        let image = egui::ColorImage::from_rgb(
            [frame.width() as usize, frame.height() as usize],
            frame.data(),
        );
        self.texture = Some(ctx.load_texture("video-frame", image, egui::TextureOptions::NEAREST));
    }

    /// Draw the frame and forward pointer input to `session`.
    pub fn show(&self, ui: &mut egui::Ui, session: &mut Session) {
        let Some(texture) = self.texture.as_ref() else {
            ui.label("Open a video to select a region.");
            return;
        };

        // One frame pixel per physical pixel.
        let ppp = ui.ctx().pixels_per_point();
        let [width, height] = texture.size();
        let size = egui::vec2(width as f32 / ppp, height as f32 / ppp);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());

        if let Some(pos) = response.hover_pos() {
            let local = (pos - rect.min) * ppp;
            session.on_pointer_move(local.x, local.y);
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = (pos - rect.min) * ppp;
                session.on_pointer_down(local.x, local.y);
            }
        }

        let painter = ui.painter_at(rect);
        painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
        if let Some(overlay) = session.overlay() {
            paint_overlay(&painter, rect.min, ppp, &overlay);
        }
    }
}

fn paint_overlay(painter: &egui::Painter, origin: egui::Pos2, ppp: f32, overlay: &Overlay) {
    let stroke = egui::Stroke::new(1.0, to_color32(GUIDE_COLOR));
    for guide in [overlay.horizontal, overlay.vertical] {
        painter.line_segment(
            [
                to_screen(origin, ppp, guide.from),
                to_screen(origin, ppp, guide.to),
            ],
            stroke,
        );
    }

    if let Some(selection) = overlay.selection {
        let rect = egui::Rect::from_min_max(
            to_screen(origin, ppp, PixelPoint::new(selection.x, selection.y)),
            to_screen(
                origin,
                ppp,
                PixelPoint::new(selection.right(), selection.bottom()),
            ),
        );
        painter.rect_filled(rect, 0.0, to_color32(SELECTION_COLOR));
    }
}

fn to_screen(origin: egui::Pos2, ppp: f32, point: PixelPoint) -> egui::Pos2 {
    origin + egui::vec2(point.x as f32 / ppp, point.y as f32 / ppp)
}

fn to_color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}
