//! The particle field simulator.
//!
//! A field owns a fixed set of particles, the last known pointer position and
//! the surface dimensions. Each [`ParticleField::tick`] pushes particles away
//! from the pointer, lets them drift and wander, wraps them at the edges,
//! draws them with a glow and finally links every pair closer than the link
//! threshold.
//!
//! The time step is one call: on a slow display everything moves slower.

use cgmath::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::config::FieldConfig;
use crate::particle::{Dimensions, Particle, apply_boundary_conditions};
use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Created, frames can be stepped by hand.
    Idle,
    Running,
    /// Stopped by the host; ticks are ignored until restarted.
    Stopped,
}

/// A link between the particles at indices `a` and `b`, `a < b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
}

/// Positional push a pointer at `pointer` applies to a particle at `position`.
///
/// Zero at or beyond `radius`, growing linearly to `strength` as the distance
/// shrinks to zero.
pub fn repulsion(
    position: cgmath::Vector2<f32>,
    pointer: cgmath::Vector2<f32>,
    radius: f32,
    strength: f32,
) -> cgmath::Vector2<f32> {
    let delta = pointer - position;
    let distance = delta.magnitude();

    if distance < radius {
        let angle = delta.y.atan2(delta.x);
        let force = (radius - distance) / radius;
        -cgmath::vec2(angle.cos(), angle.sin()) * force * strength
    } else {
        cgmath::Vector2::zero()
    }
}

/// Opacity of a link between particles `distance` apart. Fades linearly from
/// `max_opacity` at zero distance to nothing at `threshold`.
pub fn link_opacity(distance: f32, threshold: f32, max_opacity: f32) -> f32 {
    if distance < threshold {
        (1.0 - distance / threshold) * max_opacity
    } else {
        0.0
    }
}

pub struct ParticleField<S> {
    config: FieldConfig,
    particles: Vec<Particle>,
    spawned: bool,
    pointer: Option<cgmath::Vector2<f32>>,
    dimensions: Dimensions,
    surface: Option<S>,
    rng: StdRng,
    state: RunState,
    frame_count: u64,
}

impl<S: Surface> ParticleField<S> {
    /// Creates a field of `config.particle_count` random particles. Without a
    /// drawable surface the particles are spawned by the first tick that has one.
    ///
    /// A config that fails [`FieldConfig::validate`] is replaced by the
    /// defaults, keeping only its particle count and seed.
    pub fn new(config: FieldConfig, surface: Option<S>) -> Self {
        let mut field = Self::empty(config, surface);
        field.spawn_particles();
        field
    }

    /// Creates a field over an explicit particle set, ignoring `particle_count`.
    pub fn with_particles(
        config: FieldConfig,
        surface: Option<S>,
        particles: Vec<Particle>,
    ) -> Self {
        let mut field = Self::empty(config, surface);
        field.particles = particles;
        field.spawned = true;
        field
    }

    fn empty(config: FieldConfig, surface: Option<S>) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("{}; falling back to default field constants", err);
                FieldConfig {
                    particle_count: config.particle_count,
                    seed: config.seed,
                    ..FieldConfig::default()
                }
            }
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dimensions = surface
            .as_ref()
            .map(|surface| Dimensions::new(surface.width(), surface.height()))
            .unwrap_or(Dimensions::new(0.0, 0.0));

        log::debug!(
            "particle field created: {} particles requested, surface {}x{}",
            config.particle_count(),
            dimensions.width,
            dimensions.height
        );

        Self {
            config,
            particles: Vec::new(),
            spawned: false,
            pointer: None,
            dimensions,
            surface,
            rng,
            state: RunState::Idle,
            frame_count: 0,
        }
    }

    fn spawn_particles(&mut self) {
        if self.spawned || !self.dimensions.is_drawable() {
            return;
        }

        let count = self.config.particle_count();
        self.particles = (0..count)
            .map(|_| Particle::random(&mut self.rng, &self.config, self.dimensions))
            .collect();
        self.spawned = true;

        log::debug!(
            "spawned {} particles on {}x{} surface",
            count,
            self.dimensions.width,
            self.dimensions.height
        );
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn pointer(&self) -> Option<cgmath::Vector2<f32>> {
        self.pointer
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Frames actually simulated and drawn.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Binds a surface, adopting its current size.
    pub fn attach_surface(&mut self, surface: S) {
        self.dimensions = Dimensions::new(surface.width(), surface.height());
        self.surface = Some(surface);
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn start(&mut self) {
        self.state = RunState::Running;
    }

    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
    }

    /// Updates the dimensions used for wrapping and resizes the surface.
    /// Particles stay where they are until the next tick wraps them.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.dimensions = Dimensions::new(width, height);
        if let Some(surface) = self.surface.as_mut() {
            surface.set_size(width, height);
        }
        log::debug!("particle field resized to {}x{}", width, height);
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Some(cgmath::vec2(x, y));
    }

    /// Advances and renders one frame.
    ///
    /// Returns `false` without touching anything when the field is stopped or
    /// has no drawable surface.
    pub fn tick(&mut self) -> bool {
        let ready = self.surface.is_some() && self.dimensions.is_drawable();
        if self.state == RunState::Stopped || !ready {
            return false;
        }
        self.spawn_particles();

        let config = &self.config;
        let dimensions = self.dimensions;
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        surface.clear();

        for particle in self.particles.iter_mut() {
            if let Some(pointer) = self.pointer {
                particle.position += repulsion(
                    particle.position,
                    pointer,
                    config.repulsion_radius,
                    config.repulsion_strength,
                );
            }

            particle.advance(config.wander_step, config.wander_amplitude);
            apply_boundary_conditions(&mut self.rng, dimensions, particle);

            let (x, y) = (particle.position.x, particle.position.y);
            surface.fill_circle(x, y, particle.radius, particle.color, particle.alpha, None);
            let glow = Some(config.glow_blur);
            surface.fill_circle(x, y, particle.radius, particle.color, particle.alpha, glow);
        }

        for link in find_links(&self.particles, config.link_threshold) {
            let (a, b) = (&self.particles[link.a], &self.particles[link.b]);
            surface.stroke_line(
                a.position.x,
                a.position.y,
                b.position.x,
                b.position.y,
                config.link_color,
                link_opacity(link.distance, config.link_threshold, config.link_opacity),
            );
        }

        self.frame_count += 1;
        true
    }
}

/// All pairs closer than `threshold`, ordered by `a` then `b`.
pub fn find_links(particles: &[Particle], threshold: f32) -> Vec<Link> {
    (0..particles.len())
        .into_par_iter()
        .flat_map_iter(|a| {
            (a + 1..particles.len()).filter_map(move |b| {
                let distance = particles[a].distance_to(&particles[b]);
                (distance < threshold).then_some(Link { a, b, distance })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::surface::{DrawCommand, DrawList};

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle::new(cgmath::vec2(x, y), cgmath::vec2(0.0, 0.0), 2.0, Rgb::default(), 0.5)
    }

    fn still_config() -> FieldConfig {
        FieldConfig {
            wander_amplitude: 0.0,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_repulsion_falloff() {
        let origin = cgmath::vec2(0.0, 0.0);

        let at_edge = repulsion(origin, cgmath::vec2(100.0, 0.0), 100.0, 2.0);
        assert_eq!(at_edge.magnitude(), 0.0);

        let beyond = repulsion(origin, cgmath::vec2(0.0, 250.0), 100.0, 2.0);
        assert_eq!(beyond, cgmath::Vector2::zero());

        let halfway = repulsion(origin, cgmath::vec2(50.0, 0.0), 100.0, 2.0);
        assert!((halfway.x + 1.0).abs() < 1e-6);
        assert!(halfway.y.abs() < 1e-6);

        let on_top = repulsion(origin, origin, 100.0, 2.0);
        assert!((on_top.magnitude() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_repulsion_never_exceeds_strength() {
        let origin = cgmath::vec2(0.0, 0.0);
        let mut previous = f32::INFINITY;
        for step in 0..=100 {
            let distance = step as f32;
            let push = repulsion(origin, cgmath::vec2(distance * 0.6, distance * 0.8), 100.0, 2.0);
            let magnitude = push.magnitude();
            assert!(magnitude <= 2.0 + 1e-6);
            assert!(magnitude <= previous + 1e-6);
            previous = magnitude;
        }
    }

    #[test]
    fn test_link_opacity_continuity() {
        assert_eq!(link_opacity(100.0, 100.0, 0.1), 0.0);
        assert_eq!(link_opacity(150.0, 100.0, 0.1), 0.0);
        assert!((link_opacity(0.0, 100.0, 0.1) - 0.1).abs() < 1e-7);
        assert!((link_opacity(50.0, 100.0, 0.1) - 0.05).abs() < 1e-7);

        let mut previous = link_opacity(0.0, 100.0, 0.1);
        for step in 1..=1000 {
            let opacity = link_opacity(step as f32 * 0.1, 100.0, 0.1);
            assert!(opacity >= 0.0);
            assert!(opacity <= previous);
            previous = opacity;
        }
    }

    #[test]
    fn test_find_links_pairs_once() {
        let particles = vec![
            particle_at(0.0, 0.0),
            particle_at(30.0, 40.0),
            particle_at(500.0, 500.0),
        ];
        let links = find_links(&particles, 100.0);
        assert_eq!(links, vec![Link { a: 0, b: 1, distance: 50.0 }]);
    }

    #[test]
    fn test_find_links_ordered() {
        let particles: Vec<_> = (0..20).map(|i| particle_at(i as f32 * 10.0, 0.0)).collect();
        let links = find_links(&particles, 25.0);
        let pairs: Vec<_> = links.iter().map(|link| (link.a, link.b)).collect();
        let mut sorted = pairs.clone();
        sorted.sort();
        assert_eq!(pairs, sorted);
        assert!(links.iter().all(|link| link.a < link.b));
    }

    #[test]
    fn test_tick_draws_each_particle_twice() {
        let particles = vec![particle_at(10.0, 10.0), particle_at(20.0, 10.0)];
        let surface = Some(DrawList::new(100.0, 100.0));
        let mut field = ParticleField::with_particles(still_config(), surface, particles);
        assert!(field.tick());

        let surface = field.surface().unwrap();
        let circles: Vec<_> = surface.circles().collect();
        assert_eq!(circles.len(), 4);
        assert!(matches!(circles[0], DrawCommand::FillCircle { glow: None, .. }));
        assert!(matches!(
            circles[1],
            DrawCommand::FillCircle { glow: Some(blur), .. } if *blur == 15.0
        ));

        let lines: Vec<_> = surface.lines().collect();
        assert_eq!(lines.len(), 1);
        match lines[0] {
            DrawCommand::StrokeLine { alpha, color, .. } => {
                assert!((alpha - 0.09).abs() < 1e-6);
                assert_eq!(*color, FieldConfig::default().link_color);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_each_tick_starts_from_a_clear_surface() {
        let mut field = ParticleField::with_particles(
            still_config(),
            Some(DrawList::new(100.0, 100.0)),
            vec![particle_at(50.0, 50.0)],
        );
        field.tick();
        field.tick();
        let surface = field.surface().unwrap();
        assert_eq!(surface.clear_count(), 2);
        assert_eq!(surface.commands().len(), 2);
    }

    #[test]
    fn test_pointer_far_away_leaves_particle_still() {
        let mut field = ParticleField::with_particles(
            still_config(),
            Some(DrawList::new(100.0, 100.0)),
            vec![particle_at(50.0, 50.0)],
        );
        field.set_pointer(1000.0, 1000.0);
        field.tick();
        assert_eq!(field.particles()[0].position, cgmath::vec2(50.0, 50.0));
    }

    #[test]
    fn test_pointer_close_pushes_particle_away() {
        let mut field = ParticleField::with_particles(
            still_config(),
            Some(DrawList::new(100.0, 100.0)),
            vec![particle_at(50.0, 50.0)],
        );
        field.set_pointer(51.0, 50.0);
        field.tick();
        let position = field.particles()[0].position;
        assert!(position.x < 50.0);
        assert!((position.x - 48.02).abs() < 1e-4);
        assert!((position.y - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_pointer_means_no_repulsion() {
        let mut field = ParticleField::with_particles(
            still_config(),
            Some(DrawList::new(100.0, 100.0)),
            vec![particle_at(0.5, 0.5)],
        );
        field.tick();
        assert_eq!(field.particles()[0].position, cgmath::vec2(0.5, 0.5));
    }

    #[test]
    fn test_wraps_past_right_edge() {
        let mut particle = particle_at(99.5, 50.0);
        particle.velocity = cgmath::vec2(1.0, 0.0);
        let surface = Some(DrawList::new(100.0, 100.0));
        let mut field = ParticleField::with_particles(still_config(), surface, vec![particle]);
        field.tick();
        let position = field.particles()[0].position;
        assert!((0.0..100.0).contains(&position.x));
        assert!((0.0..100.0).contains(&position.y));
    }

    #[test]
    fn test_stopped_field_ignores_ticks() {
        let mut field = ParticleField::with_particles(
            still_config(),
            Some(DrawList::new(100.0, 100.0)),
            vec![particle_at(50.0, 50.0)],
        );
        field.start();
        assert!(field.tick());
        field.stop();
        assert!(!field.tick());
        assert_eq!(field.frame_count(), 1);
        assert_eq!(field.surface().unwrap().clear_count(), 1);

        field.start();
        assert!(field.tick());
        assert_eq!(field.frame_count(), 2);
    }

    #[test]
    fn test_missing_surface_is_a_no_op() {
        let mut field: ParticleField<DrawList> = ParticleField::new(still_config(), None);
        assert!(field.particles().is_empty());
        field.set_pointer(3.0, 4.0);
        field.resize(200.0, 200.0);
        assert!(!field.tick());
        assert_eq!(field.frame_count(), 0);
    }

    #[test]
    fn test_spawn_waits_for_drawable_surface() {
        let mut field = ParticleField::new(still_config(), Some(DrawList::new(0.0, 0.0)));
        assert!(field.particles().is_empty());
        assert!(!field.tick());

        field.resize(320.0, 240.0);
        assert_eq!(field.surface().unwrap().width(), 320.0);
        assert!(field.tick());
        assert_eq!(field.particles().len(), 100);
    }

    #[test]
    fn test_attach_surface_later() {
        let mut field = ParticleField::new(still_config(), None);
        field.attach_surface(DrawList::new(64.0, 64.0));
        assert!(field.tick());
        assert_eq!(field.particles().len(), 100);
        assert!(field.detach_surface().is_some());
        assert!(!field.tick());
    }

    #[test]
    fn test_resize_keeps_positions_until_next_tick() {
        let mut field = ParticleField::new(still_config(), Some(DrawList::new(500.0, 500.0)));
        assert!(field.tick());
        let before = field.particles().to_vec();

        field.resize(10.0, 10.0);
        assert_eq!(field.particles(), before.as_slice());
        assert_eq!(field.dimensions(), Dimensions::new(10.0, 10.0));

        assert!(field.tick());
        assert_ne!(field.particles(), before.as_slice());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let config = FieldConfig {
            particle_count: 40,
            wander_step: f32::NAN,
            max_drift: f32::NAN,
            seed: Some(17),
            ..Default::default()
        };
        let mut field = ParticleField::new(config, Some(DrawList::new(120.0, 80.0)));
        assert_eq!(field.config().wander_step, 0.01);
        assert_eq!(field.config().max_drift, 0.25);
        assert_eq!(field.config().particle_count, 40);
        assert_eq!(field.config().seed, Some(17));

        for _ in 0..50 {
            field.tick();
            for particle in field.particles() {
                assert!((0.0..120.0).contains(&particle.position.x));
                assert!((0.0..80.0).contains(&particle.position.y));
            }
        }
    }
}
