//! Thin eframe front-end around [`Session`].

use crate::canvas::model::{Color, Tool, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};
use crate::messages::{Notification, NotificationKind};
use crate::overlay::OverlayPosition;
use crate::session::Session;
use crate::settings::AppSettings;
use crate::solve::client::SolverClient;
use crate::typeset::DelimiterTypesetter;
use eframe::egui::{
    self, Color32, PointerButton, Pos2, Rect, RichText, Sense, Stroke, TextureHandle,
    TextureOptions, Vec2,
};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SWATCH_SIZE: f32 = 22.0;
const BUSY_REPAINT_INTERVAL: Duration = Duration::from_millis(100);
const OVERLAY_FILL: Color32 = Color32::from_rgba_premultiplied(23, 30, 41, 191);

pub struct InkCalcApp {
    session: Session,
    palette: Vec<Color>,
    toast_duration: f32,
    toasts: Toasts,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    resets: u64,
}

impl InkCalcApp {
    pub fn new(settings: AppSettings, client: Arc<dyn SolverClient>) -> Self {
        let session = Session::new(
            &settings,
            client,
            Box::new(DelimiterTypesetter::default()),
            (0, 0),
        );
        Self {
            session,
            palette: settings.palette.clone(),
            toast_duration: settings.toast_duration,
            toasts: Toasts::new()
                .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                .direction(egui::Direction::TopDown),
            texture: None,
            texture_dirty: true,
            resets: 0,
        }
    }

    fn notify(&mut self, note: Notification) {
        let kind = match note.kind {
            NotificationKind::Success => ToastKind::Success,
            NotificationKind::Error => ToastKind::Error,
        };
        self.toasts.add(Toast {
            text: note.message.into(),
            kind,
            options: ToastOptions::default().duration_in_seconds(self.toast_duration as f64),
        });
    }

    fn reset(&mut self) {
        self.session.reset();
        self.resets += 1;
        self.texture_dirty = true;
    }

    fn run(&mut self) {
        match self.session.submit(Instant::now()) {
            Ok(()) => {}
            Err(err) if err.is_user_visible() => {
                tracing::error!(error = %err, "submit failed");
                self.notify(Notification::error(crate::messages::SOLVE_FAILED));
            }
            Err(err) => tracing::debug!(error = %err, "submit skipped"),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        let busy = self.session.is_busy();
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Reset")).clicked() {
                self.reset();
            }
            ui.separator();

            let current = *self.session.tools();
            for color in self.palette.clone() {
                let (rect, response) =
                    ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::click());
                let selected = current.tool() == Tool::Pencil && current.color() == color;
                let painter = ui.painter();
                painter.circle_filled(rect.center(), SWATCH_SIZE / 2.0 - 2.0, to_color32(color));
                if selected {
                    painter.circle_stroke(
                        rect.center(),
                        SWATCH_SIZE / 2.0,
                        Stroke::new(2.0, Color32::LIGHT_BLUE),
                    );
                }
                if response.on_hover_text(color.to_hex()).clicked() {
                    self.session.select_color(color);
                }
            }
            ui.separator();

            if ui
                .selectable_label(current.tool() == Tool::Pencil, "Pencil")
                .clicked()
            {
                self.session.select_tool(Tool::Pencil);
            }
            if ui
                .selectable_label(current.tool() == Tool::Eraser, "Eraser")
                .clicked()
            {
                self.session.select_tool(Tool::Eraser);
            }
            let mut width = current.brush_width();
            if ui
                .add(egui::Slider::new(&mut width, MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH).text("Width"))
                .changed()
            {
                self.session.set_brush_width(width);
            }
            ui.separator();

            let label = if busy { "Running" } else { "Run" };
            if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                self.run();
            }
            if busy {
                ui.spinner();
            }
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) -> Pos2 {
        let size = ui.available_size();
        let (width, height) = (size.x.max(1.0) as u32, size.y.max(1.0) as u32);
        if self.session.surface().size() != (width, height) {
            self.session.resize(width, height);
            self.texture_dirty = true;
        }

        let (response, painter) = ui.allocate_painter(size, Sense::drag());
        let origin = response.rect.min;
        let to_surface =
            |pos: Pos2| ((pos.x - origin.x).round() as i32, (pos.y - origin.y).round() as i32);

        if response.drag_started_by(PointerButton::Primary) {
            let press = ui.input(|i| i.pointer.press_origin());
            if let Some(start) = press.or_else(|| response.interact_pointer_pos()) {
                self.session.pointer_down(to_surface(start));
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if self.session.pointer_move(to_surface(pos)).is_some() {
                    self.texture_dirty = true;
                }
            }
        }
        if response.drag_stopped_by(PointerButton::Primary) {
            self.session.pointer_up();
        }
        if self.session.is_drawing() {
            let outside = ui
                .ctx()
                .pointer_hover_pos()
                .map_or(true, |pos| !response.rect.contains(pos));
            if outside {
                self.session.pointer_leave();
            }
        }

        self.upload_canvas(ui.ctx());
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                response.rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        origin
    }

    fn upload_canvas(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty {
            return;
        }
        let surface = self.session.surface();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [surface.width() as usize, surface.height() as usize],
            surface.rgba(),
        );
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("ink-canvas", image, TextureOptions::NEAREST))
            }
        }
        self.texture_dirty = false;
    }

    fn overlays(&mut self, ctx: &egui::Context, origin: Pos2) {
        let mut moved = Vec::new();
        let overlays = self.session.overlays();
        for (index, entry) in overlays.entries().iter().enumerate() {
            let text = overlays.display_text(index).unwrap_or(entry.text.as_str());
            let shown = egui::Area::new(egui::Id::new(("overlay", self.resets, index)))
                .order(egui::Order::Foreground)
                .movable(true)
                .default_pos(origin + Vec2::new(entry.position.x, entry.position.y))
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style())
                        .fill(OVERLAY_FILL)
                        .show(ui, |ui| {
                            ui.label(RichText::new(text).size(22.0).color(Color32::WHITE));
                        });
                });
            if shown.response.drag_stopped() {
                let pos = shown.response.rect.min - origin;
                moved.push((index, OverlayPosition::new(pos.x, pos.y)));
            }
        }
        for (index, position) in moved {
            self.session.reposition_overlay(index, position);
        }
    }
}

impl eframe::App for InkCalcApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        for note in self.session.tick(now) {
            self.notify(note);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        let origin = egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| self.canvas(ui))
            .inner;
        self.overlays(ctx, origin);
        self.toasts.show(ctx);

        if self.session.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT_INTERVAL);
        }
        if let Some(deadline) = self.session.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

fn to_color32(color: Color) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}
