use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Stable handle to a live block in a [`crate::registry::BlockRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// Integer top-left corner of a block, in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i64,
    pub y: i64,
}

impl TilePos {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Where a block came from. Drives culling and stomp breakage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Infinite ground band maintained around the camera.
    Ground,
    /// Platform tile emitted by the world generator.
    Platform,
    /// Rung of a synthesized helper column.
    Helper,
    /// Boundary wall (level edge or boss arena).
    Wall,
    /// Hand-placed level setup tile.
    Setup,
}

/// An axis-aligned solid object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub kind: BlockKind,
    /// Collides but is skipped by rendering.
    pub invisible: bool,
    /// Generation section that produced the block, if any.
    pub section: Option<i64>,
}

impl Block {
    /// Square tile with side `size`.
    pub fn tile(x: i64, y: i64, size: i64, kind: BlockKind) -> Self {
        Self {
            x,
            y,
            width: size,
            height: size,
            kind,
            invisible: false,
            section: None,
        }
    }

    pub fn wall(x: i64, y: i64, width: i64, height: i64, invisible: bool) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind: BlockKind::Wall,
            invisible,
            section: None,
        }
    }

    pub fn in_section(mut self, section: i64) -> Self {
        self.section = Some(section);
        self
    }

    pub fn pos(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }

    /// Stomping through this block destroys it.
    pub fn is_breakable(&self) -> bool {
        matches!(self.kind, BlockKind::Platform | BlockKind::Helper)
    }

    /// Ledges can be grabbed on tiles but not on boundary walls.
    pub fn is_grabbable(&self) -> bool {
        !matches!(self.kind, BlockKind::Wall)
    }

    /// Produced by generation (sections or scatter) rather than level setup.
    pub fn is_generated(&self) -> bool {
        matches!(self.kind, BlockKind::Platform | BlockKind::Helper)
    }
}
