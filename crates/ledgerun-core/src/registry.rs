use std::collections::{BTreeMap, HashMap, HashSet};

use crate::block::{Block, BlockId, TilePos};
use crate::geometry::Rect;
use crate::spatial::SpatialGrid;

/// Read-only view of which tile positions are taken.
///
/// Implemented by the live [`BlockRegistry`] and by plain position sets, so
/// placement code can run against either.
pub trait Occupancy {
    fn is_occupied(&self, pos: TilePos) -> bool;

    /// Occupied positions whose top-left corner lies inside `area`
    /// (half-open on the right and bottom).
    fn occupied_in(&self, area: &Rect) -> Vec<TilePos>;
}

impl Occupancy for HashSet<TilePos> {
    fn is_occupied(&self, pos: TilePos) -> bool {
        self.contains(&pos)
    }

    fn occupied_in(&self, area: &Rect) -> Vec<TilePos> {
        let mut out: Vec<TilePos> = self
            .iter()
            .filter(|p| area.contains_point(p.x as f32, p.y as f32))
            .copied()
            .collect();
        out.sort_unstable();
        out
    }
}

/// The world's live block collection.
///
/// Keeps three views in lockstep: blocks by id, the occupied-set keyed by
/// each block's top-left tile position, and a spatial grid for area queries.
/// All mutation goes through `insert`/`remove`/`retain` so the occupied-set
/// is always the exact projection of the live blocks.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: BTreeMap<BlockId, Block>,
    occupied: HashMap<TilePos, BlockId>,
    grid: SpatialGrid,
    next_id: u64,
}

impl BlockRegistry {
    pub fn new(cell_size: f32) -> Self {
        Self {
            blocks: BTreeMap::new(),
            occupied: HashMap::new(),
            grid: SpatialGrid::new(cell_size),
            next_id: 1,
        }
    }

    /// Add a block. Returns `None` (and drops the block) if its tile position
    /// is already occupied.
    pub fn insert(&mut self, block: Block) -> Option<BlockId> {
        let pos = block.pos();
        if self.occupied.contains_key(&pos) {
            tracing::trace!(x = pos.x, y = pos.y, "tile already occupied, block dropped");
            return None;
        }
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.grid.insert(id, &block.rect());
        self.occupied.insert(pos, id);
        self.blocks.insert(id, block);
        Some(id)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.remove(&id)?;
        self.grid.remove(id, &block.rect());
        self.occupied.remove(&block.pos());
        Some(block)
    }

    /// Remove every block for which `keep` returns false. Returns the
    /// removed blocks in id order.
    pub fn retain(&mut self, mut keep: impl FnMut(BlockId, &Block) -> bool) -> Vec<(BlockId, Block)> {
        let doomed: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|(id, block)| !keep(**id, block))
            .map(|(id, _)| *id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.remove(id).map(|b| (id, b)))
            .collect()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn id_at(&self, pos: TilePos) -> Option<BlockId> {
        self.occupied.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Live blocks in id (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().map(|(id, b)| (*id, b))
    }

    /// Ids of blocks whose rectangles intersect `area`, in id order.
    pub fn query_rect(&self, area: &Rect) -> Vec<BlockId> {
        self.grid
            .query(area)
            .into_iter()
            .filter(|id| {
                self.blocks
                    .get(id)
                    .is_some_and(|b| b.rect().intersects(area))
            })
            .collect()
    }

    /// Whether any live block other than `except` intersects `area`.
    pub fn any_overlap(&self, area: &Rect, except: Option<BlockId>) -> bool {
        self.query_rect(area).into_iter().any(|id| Some(id) != except)
    }

    /// Verify the occupied-set mirrors the live blocks exactly.
    pub fn is_consistent(&self) -> bool {
        self.occupied.len() == self.blocks.len()
            && self
                .blocks
                .iter()
                .all(|(id, b)| self.occupied.get(&b.pos()) == Some(id))
    }
}

impl Occupancy for BlockRegistry {
    fn is_occupied(&self, pos: TilePos) -> bool {
        self.occupied.contains_key(&pos)
    }

    fn occupied_in(&self, area: &Rect) -> Vec<TilePos> {
        // Block rects extend right/down from their corner; widen the grid
        // query so corners inside `area` are never missed.
        let probe = Rect::new(area.x, area.y, area.w + 1.0, area.h + 1.0);
        let mut out: Vec<TilePos> = self
            .grid
            .query(&probe)
            .into_iter()
            .filter_map(|id| self.blocks.get(&id))
            .map(Block::pos)
            .filter(|p| area.contains_point(p.x as f32, p.y as f32))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
