//! The drawable 2D surface a particle field renders onto.

use crate::color::Rgb;

/// A 2D surface provided by the host.
///
/// Coordinates are surface units with the origin in the top-left corner.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn set_size(&mut self, width: f32, height: f32);

    /// Erases everything drawn so far.
    fn clear(&mut self);

    /// Fills a circle. `glow` is an optional blur radius for a soft halo in
    /// the same color.
    fn fill_circle(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        color: Rgb,
        alpha: f32,
        glow: Option<f32>,
    );

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, alpha: f32);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    FillCircle {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgb,
        alpha: f32,
        glow: Option<f32>,
    },
    StrokeLine {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        alpha: f32,
    },
}

/// A surface that records draw calls instead of rasterising them.
///
/// Hosts replay [`DrawList::commands`] onto their real canvas after each
/// frame.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    width: f32,
    height: f32,
    commands: Vec<DrawCommand>,
    clear_count: u64,
}

impl DrawList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// How many times the surface has been cleared, i.e. frames started.
    pub fn clear_count(&self) -> u64 {
        self.clear_count
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::FillCircle { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::StrokeLine { .. }))
    }
}

impl Surface for DrawList {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.clear_count += 1;
    }

    fn fill_circle(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        color: Rgb,
        alpha: f32,
        glow: Option<f32>,
    ) {
        self.commands.push(DrawCommand::FillCircle { x, y, radius, color, alpha, glow });
    }

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, alpha: f32) {
        self.commands.push(DrawCommand::StrokeLine { x1, y1, x2, y2, color, alpha });
    }
}
