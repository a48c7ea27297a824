//! Axis-aligned rectangle geometry and collision tests
//!
//! Entities are positioned in floor-relative space: `x` grows to the right from
//! the left screen edge and `y` is the offset *above* the floor line. The
//! renderer converts to screen space (origin top-left, y grows downward) with
//! [`floor_to_screen`]. Overlap tests are invariant under that flip, so
//! collisions are resolved directly in floor-relative space.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in integer pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner (left, bottom in floor space / top in screen space)
    pub pos: IVec2,
    /// Width and height, both > 0
    pub size: IVec2,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            pos: IVec2::new(x, y),
            size: IVec2::new(width, height),
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.pos.y
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.size.y
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> i32 {
        self.pos.x + self.size.x
    }

    /// Exclusive far edge on the y axis
    #[inline]
    pub fn far_y(&self) -> i32 {
        self.pos.y + self.size.y
    }

    /// Overlap with another rectangle (see [`rectangles_intersect`])
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        rectangles_intersect(self, other)
    }
}

/// True iff the rectangles share a region of non-zero area.
///
/// Edges that merely touch do not count as a collision.
pub fn rectangles_intersect(a: &Rect, b: &Rect) -> bool {
    a.x() < b.right() && b.x() < a.right() && a.y() < b.far_y() && b.y() < a.far_y()
}

/// True iff the agent's right edge has reached the right screen boundary
pub fn has_reached_goal(agent: &Rect, screen_width: i32) -> bool {
    agent.right() >= screen_width
}

/// Screen row of the floor line (first row of the floor band)
#[inline]
pub fn floor_line(screen_height: i32, floor_height: i32) -> i32 {
    screen_height - floor_height
}

/// Convert a floor-relative rectangle into screen space (origin top-left).
///
/// `screen_y = screen_height - floor_height - offset - height`
pub fn floor_to_screen(rect: &Rect, screen_height: i32, floor_height: i32) -> Rect {
    Rect {
        pos: IVec2::new(
            rect.x(),
            floor_line(screen_height, floor_height) - rect.y() - rect.height(),
        ),
        size: rect.size,
    }
}

/// Clip a screen-space rectangle to `[0, width) x [0, height)`.
///
/// Returns `None` when nothing remains visible.
pub fn clip_to_screen(rect: &Rect, width: i32, height: i32) -> Option<Rect> {
    let min = rect.pos.max(IVec2::ZERO);
    let max = (rect.pos + rect.size).min(IVec2::new(width, height));
    let size = max - min;
    if size.x <= 0 || size.y <= 0 {
        return None;
    }
    Some(Rect { pos: min, size })
}
