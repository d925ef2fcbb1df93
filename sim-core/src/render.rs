//! Draw-instruction output of the simulation.
//!
//! The core never talks to a canvas directly. It emits instructions into a
//! [`DrawSink`], which a host (window, test, exporter) implements.

use glam::Vec2;

/// Receiver of per-frame draw instructions.
pub trait DrawSink {
    /// Called once per frame, before any line of that frame.
    fn clear_background(&mut self, gray: u8);

    fn draw_line(&mut self, from: Vec2, to: Vec2, stroke_weight: f32);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    Clear {
        gray: u8,
    },
    Line {
        from: Vec2,
        to: Vec2,
        stroke_weight: f32,
    },
}

/// A [`DrawSink`] that records one frame of instructions.
///
/// Clearing the background drops everything recorded so far.
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Recorded lines as `(from, to, stroke_weight)`.
    pub fn lines(&self) -> impl Iterator<Item = (Vec2, Vec2, f32)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            DrawCommand::Line {
                from,
                to,
                stroke_weight,
            } => Some((from, to, stroke_weight)),
            DrawCommand::Clear { .. } => None,
        })
    }

    /// Background gray of the recorded frame, if it was cleared.
    pub fn background(&self) -> Option<u8> {
        match self.commands.first() {
            Some(DrawCommand::Clear { gray }) => Some(*gray),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawSink for CommandBuffer {
    fn clear_background(&mut self, gray: u8) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { gray });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, stroke_weight: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            stroke_weight,
        });
    }
}
