//! Wireframe edges of the stepped solid.
//!
//! Every step contributes twelve segments: the bottom loop, the top loop,
//! and the four vertical edges joining them. Nothing is cached; a
//! [`Wireframe`] re-derives its segments from the spec each time it is
//! iterated.

use serde::{Deserialize, Serialize};

use crate::{
    math::Vec3,
    pyramid::{PyramidSpec, StepDescriptor, Steps},
};

/// Segments emitted per step.
pub const SEGMENTS_PER_STEP: usize = 12;

/// Which part of a step box an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeRole {
    BottomFace,
    TopFace,
    SideEdge,
}

/// A single line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
    pub role: EdgeRole,
    pub step: u32,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Lazily evaluated wireframe of one spec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wireframe {
    spec: PyramidSpec,
    origin: Vec3,
}

/// Wireframe of `spec` with its base corner at `origin`.
pub fn compute_wireframe(spec: &PyramidSpec, origin: Vec3) -> Wireframe {
    Wireframe { spec: *spec, origin }
}

impl Wireframe {
    /// Fresh iterator over all segments, bottom step first.
    pub fn segments(&self) -> Segments {
        Segments {
            steps: self.spec.steps(self.origin),
            current: None,
            edge: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.segments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for &Wireframe {
    type Item = Segment;
    type IntoIter = Segments;

    fn into_iter(self) -> Segments {
        self.segments()
    }
}

/// Twelve edges of one step, in emission order.
fn step_edges(step: &StepDescriptor) -> [Segment; SEGMENTS_PER_STEP] {
    let b = step.bottom_corners();
    let t = step.top_corners();
    let seg = |start, end, role| Segment {
        start,
        end,
        role,
        step: step.index,
    };
    [
        seg(b[0], b[1], EdgeRole::BottomFace),
        seg(b[1], b[2], EdgeRole::BottomFace),
        seg(b[2], b[3], EdgeRole::BottomFace),
        seg(b[3], b[0], EdgeRole::BottomFace),
        seg(t[0], t[1], EdgeRole::TopFace),
        seg(t[1], t[2], EdgeRole::TopFace),
        seg(t[2], t[3], EdgeRole::TopFace),
        seg(t[3], t[0], EdgeRole::TopFace),
        seg(b[0], t[0], EdgeRole::SideEdge),
        seg(b[1], t[1], EdgeRole::SideEdge),
        seg(b[2], t[2], EdgeRole::SideEdge),
        seg(b[3], t[3], EdgeRole::SideEdge),
    ]
}

/// Iterator over wireframe segments.
#[derive(Debug, Clone)]
pub struct Segments {
    steps: Steps,
    current: Option<[Segment; SEGMENTS_PER_STEP]>,
    edge: usize,
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        loop {
            if let Some(edges) = &self.current {
                if self.edge < SEGMENTS_PER_STEP {
                    let seg = edges[self.edge];
                    self.edge += 1;
                    return Some(seg);
                }
            }
            let step = self.steps.next()?;
            self.current = Some(step_edges(&step));
            self.edge = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let in_step = match self.current {
            Some(_) => SEGMENTS_PER_STEP - self.edge,
            None => 0,
        };
        let left = in_step + self.steps.len() * SEGMENTS_PER_STEP;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Segments {}
