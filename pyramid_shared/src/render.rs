//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! Define traits that a renderer implementation would satisfy.

use serde::{Deserialize, Serialize};

use crate::{
    math::Vec3,
    pyramid::PyramidSpec,
    wireframe::{compute_wireframe, EdgeRole},
};

/// RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::rgb(1.0, 0.92, 0.016);
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// The raw edge vectors, drawn as rays from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugRay {
    V1,
    V2,
    V3,
}

/// Role to color mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub bottom_face: Color,
    pub top_face: Color,
    pub side_edge: Color,
    pub v1: Color,
    pub v2: Color,
    pub v3: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bottom_face: Color::YELLOW,
            top_face: Color::CYAN,
            side_edge: Color::WHITE,
            v1: Color::RED,
            v2: Color::BLUE,
            v3: Color::GREEN,
        }
    }
}

impl Palette {
    pub fn edge(&self, role: EdgeRole) -> Color {
        match role {
            EdgeRole::BottomFace => self.bottom_face,
            EdgeRole::TopFace => self.top_face,
            EdgeRole::SideEdge => self.side_edge,
        }
    }

    pub fn ray(&self, ray: DebugRay) -> Color {
        match ray {
            DebugRay::V1 => self.v1,
            DebugRay::V2 => self.v2,
            DebugRay::V3 => self.v3,
        }
    }
}

/// A minimal rendering API.
pub trait RenderBackend: Send + Sync {
    fn begin_frame(&mut self);
    fn draw_line(&mut self, start: Vec3, end: Vec3, color: Color);
    fn draw_ray(&mut self, origin: Vec3, direction: Vec3, color: Color);
    fn end_frame(&mut self);
}

/// Issues the draw calls for one pyramid. Returns the number of lines drawn.
///
/// Frame boundaries are left to the caller.
pub fn draw_pyramid(
    backend: &mut dyn RenderBackend,
    spec: &PyramidSpec,
    origin: Vec3,
    palette: &Palette,
    show_rays: bool,
) -> usize {
    let mut drawn = 0;
    for seg in &compute_wireframe(spec, origin) {
        backend.draw_line(seg.start, seg.end, palette.edge(seg.role));
        drawn += 1;
    }

    if show_rays && !spec.is_degenerate() {
        for (ray, dir) in [(DebugRay::V1, spec.v1), (DebugRay::V2, spec.v2), (DebugRay::V3, spec.v3)] {
            backend.draw_ray(origin, dir, palette.ray(ray));
        }
    }
    drawn
}

/// A no-op renderer useful for headless tests.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) {}
    fn draw_line(&mut self, _start: Vec3, _end: Vec3, _color: Color) {}
    fn draw_ray(&mut self, _origin: Vec3, _direction: Vec3, _color: Color) {}
    fn end_frame(&mut self) {}
}

/// Recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    Line { start: Vec3, end: Vec3, color: Color },
    Ray { origin: Vec3, direction: Vec3, color: Color },
}

/// Keeps the draw calls of the most recent frame.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub calls: Vec<DrawCall>,
    pub frames: u64,
    in_frame: bool,
}

impl FrameRecorder {
    pub fn lines(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Line { .. }))
    }

    pub fn rays(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Ray { .. }))
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }
}

impl RenderBackend for FrameRecorder {
    fn begin_frame(&mut self) {
        self.calls.clear();
        self.in_frame = true;
    }

    fn draw_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        self.calls.push(DrawCall::Line { start, end, color });
    }

    fn draw_ray(&mut self, origin: Vec3, direction: Vec3, color: Color) {
        self.calls.push(DrawCall::Ray {
            origin,
            direction,
            color,
        });
    }

    fn end_frame(&mut self) {
        self.in_frame = false;
        self.frames += 1;
    }
}
