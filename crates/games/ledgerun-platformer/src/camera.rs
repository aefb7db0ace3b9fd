use ledgerun_core::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Screen offset into the world. The view is centered on its target every
/// tick; there is no smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn follow(&mut self, target: &Rect) {
        self.x = target.center_x() - self.width / 2.0;
        self.y = target.center_y() - self.height / 2.0;
    }

    pub fn visible(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Convert a world rectangle to screen coordinates.
    pub fn to_screen(&self, rect: &Rect) -> Rect {
        rect.translated(-self.x, -self.y)
    }

    pub fn is_visible(&self, rect: &Rect) -> bool {
        self.visible().intersects(rect)
    }
}
