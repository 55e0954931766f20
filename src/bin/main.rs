use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;
use particle_field::{DrawCommand, DrawList, FieldConfig, FrameClock, ParticleFieldHandle, Rgb};

const GLOW_LAYERS: usize = 4;

fn color(rgb: Rgb, alpha: f32) -> egui::Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

fn paint_command(painter: &egui::Painter, origin: egui::Pos2, command: &DrawCommand) {
    match *command {
        DrawCommand::FillCircle { x, y, radius, color: rgb, alpha, glow } => {
            let center = origin + egui::vec2(x, y);
            // Approximate the blur with fading discs out to the blur radius.
            if let Some(blur) = glow {
                for layer in (1..=GLOW_LAYERS).rev() {
                    let t = layer as f32 / GLOW_LAYERS as f32;
                    let fade = (1.0 - t) * 0.5 + 0.05;
                    let halo = color(rgb, alpha * fade * 0.3);
                    painter.circle_filled(center, radius + blur * t, halo);
                }
            }
            painter.circle_filled(center, radius, color(rgb, alpha));
        }
        DrawCommand::StrokeLine { x1, y1, x2, y2, color: rgb, alpha } => {
            painter.line_segment(
                [origin + egui::vec2(x1, y1), origin + egui::vec2(x2, y2)],
                egui::Stroke::new(1.0, color(rgb, alpha)),
            );
        }
    }
}

struct ParticleFieldApp {
    field: ParticleFieldHandle<DrawList>,
    clock: FrameClock,
    paused: bool,
    surface_size: egui::Vec2,
    last_frame_time: Instant,
    update_time: Duration,
}

impl ParticleFieldApp {
    fn new(_cc: &eframe::CreationContext, config: FieldConfig) -> Self {
        let clock = FrameClock::new();
        let surface = Some(DrawList::new(0.0, 0.0));
        let field = ParticleFieldHandle::create(config, surface, Arc::new(clock.clone()));
        field.start();

        Self {
            field,
            clock,
            paused: false,
            surface_size: egui::Vec2::ZERO,
            last_frame_time: Instant::now(),
            update_time: Duration::ZERO,
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.field.is_hidden() {
            return;
        }
        self.paused = paused;
        if paused {
            self.field.stop();
        } else {
            self.field.start();
        }
    }

    fn render_ui_panel(&mut self, ui: &mut egui::Ui, frame_time: f32) {
        let (particle_count, frame_count) = {
            let field = self.field.lock();
            (field.particles().len(), field.frame_count())
        };

        ui.label(format!("FPS: {:.3}", 1.0 / frame_time.max(f32::EPSILON)));
        ui.label(format!("Frame Time: {:.3}ms", frame_time * 1000.0));
        ui.label(format!("Update Time: {:.3}ms", self.update_time.as_secs_f64() * 1000.0));
        ui.label(format!("Particles: {}", particle_count));
        ui.label(format!("Frames: {}", frame_count));

        let mut paused = self.paused;
        if ui.checkbox(&mut paused, "Paused (Space)").changed() {
            self.set_paused(paused);
        }
    }
}

impl eframe::App for ParticleFieldApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let current_time = Instant::now();
        let frame_time = current_time.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = current_time;

        self.field.set_visible(!frame.info().window_info.minimized);

        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.set_paused(!self.paused);
        }

        egui::SidePanel::left("Control Panel").show(ctx, |ui| {
            self.render_ui_panel(ui, frame_time);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(10, 10, 20)))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::hover());
                let rect = response.rect;

                if rect.size() != self.surface_size {
                    self.surface_size = rect.size();
                    self.field.resize(rect.width(), rect.height());
                }
                if let Some(pointer) = response.hover_pos() {
                    let local = pointer - rect.min;
                    self.field.set_pointer(local.x, local.y);
                }

                let start_update = Instant::now();
                self.clock.refresh();
                self.update_time = start_update.elapsed();

                let field = self.field.lock();
                if let Some(surface) = field.surface() {
                    for command in surface.commands() {
                        paint_command(&painter, rect.min, command);
                    }
                }
            });

        ctx.request_repaint();
    }
}

fn load_config() -> FieldConfig {
    let Some(path) = std::env::args().nth(1) else {
        return FieldConfig::default();
    };
    match FieldConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{}; using default config", err);
            FieldConfig::default()
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = load_config();

    eframe::run_native(
        "Particle Field",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            initial_window_size: Some(egui::vec2(1280.0, 720.0)),
            ..Default::default()
        },
        Box::new(|cc| Box::new(ParticleFieldApp::new(cc, config))),
    )
}
