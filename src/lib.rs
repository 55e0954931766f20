//! Decorative 2D particle field: glowing particles that drift, wander, flee
//! the pointer, wrap at the surface edges and link to their neighbours.
//!
//! ```ignore
//! use std::sync::Arc;
//! use particle_field::{DrawList, FieldConfig, FrameClock, ParticleFieldHandle};
//!
//! let clock = FrameClock::new();
//! let field = ParticleFieldHandle::create(
//!     FieldConfig::default(),
//!     Some(DrawList::new(1280.0, 720.0)),
//!     Arc::new(clock.clone()),
//! );
//! field.start();
//!
//! // Once per repaint:
//! field.set_pointer(640.0, 360.0);
//! clock.refresh();
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod handle;
pub mod particle;
pub mod schedule;
pub mod surface;

pub use color::Rgb;
pub use config::FieldConfig;
pub use error::ConfigError;
pub use field::{Link, ParticleField, RunState, find_links, link_opacity, repulsion};
pub use handle::ParticleFieldHandle;
pub use particle::{Dimensions, Particle};
pub use schedule::{FrameCallback, FrameClock, FrameHandle, FrameScheduler};
pub use surface::{DrawCommand, DrawList, Surface};
