use cgmath::prelude::*;
use rand::Rng;

use crate::color::Rgb;
use crate::config::FieldConfig;

/// Size of the surface a field wraps its particles within.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether particles can be placed at all: both sides finite and positive.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: cgmath::Vector2<f32>,
    /// Baseline drift per frame; never changed after creation.
    pub velocity: cgmath::Vector2<f32>,
    pub radius: f32,
    pub color: Rgb,
    pub alpha: f32,
    /// Wander oscillator angle. Grows without bound, only its sine and cosine are used.
    pub phase: f32,
}

impl Particle {
    pub fn new(
        position: cgmath::Vector2<f32>,
        velocity: cgmath::Vector2<f32>,
        radius: f32,
        color: Rgb,
        alpha: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            radius,
            color,
            alpha,
            phase: 0.0,
        }
    }

    /// Spawns a particle at a uniformly random position inside `dimensions`,
    /// which must be drawable.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        config: &FieldConfig,
        dimensions: Dimensions,
    ) -> Self {
        let mut unit = || rng.gen_range(0.0f32..1.0);
        let radius = config.min_radius + unit() * (config.max_radius - config.min_radius);
        let velocity = cgmath::vec2(
            (unit() * 2.0 - 1.0) * config.max_drift,
            (unit() * 2.0 - 1.0) * config.max_drift,
        );
        let color = Rgb::from_hsl(unit() * 360.0, config.saturation, config.lightness);
        let alpha = config.min_alpha + unit() * (config.max_alpha - config.min_alpha);

        let position = cgmath::vec2(
            rng.gen_range(0.0..dimensions.width),
            rng.gen_range(0.0..dimensions.height),
        );

        Self::new(position, velocity, radius, color, alpha)
    }

    /// Advances the wander phase and integrates one frame of drift.
    pub fn advance(&mut self, wander_step: f32, wander_amplitude: f32) {
        self.phase += wander_step;
        let wander = cgmath::vec2(self.phase.sin(), self.phase.cos()) * wander_amplitude;
        self.position += self.velocity + wander;
    }

    pub fn distance_to(&self, other: &Particle) -> f32 {
        (self.position - other.position).magnitude()
    }
}

/// Largest value strictly below a positive `extent`.
fn just_below(extent: f32) -> f32 {
    if extent > 0.0 {
        f32::from_bits(extent.to_bits() - 1)
    } else {
        0.0
    }
}

/// Wraps `particle` back into `[0, width) x [0, height)`. Crossing an edge
/// moves it to the opposite edge and re-draws the other coordinate at random.
pub(crate) fn apply_boundary_conditions<R: Rng + ?Sized>(
    rng: &mut R,
    dimensions: Dimensions,
    particle: &mut Particle,
) {
    macro_rules! handle_boundary {
        ($coord:expr, $extent:expr, $other:expr, $other_extent:expr) => {
            if $coord >= $extent {
                $coord = 0.0;
                $other = rng.gen_range(0.0..$other_extent);
            } else if $coord < 0.0 {
                $coord = just_below($extent);
                $other = rng.gen_range(0.0..$other_extent);
            }
        };
    }

    handle_boundary!(particle.position.x, dimensions.width, particle.position.y, dimensions.height);
    handle_boundary!(particle.position.y, dimensions.height, particle.position.x, dimensions.width);
}
