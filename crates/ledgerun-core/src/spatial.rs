use std::collections::HashMap;

use crate::block::BlockId;
use crate::geometry::Rect;

/// Uniform hash grid bucketing block ids by the cells their rectangles cover.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i64, i64), Vec<BlockId>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn cell_range(&self, rect: &Rect) -> Option<(i64, i64, i64, i64)> {
        if rect.is_degenerate() {
            return None;
        }
        let x0 = (rect.left() / self.cell_size).floor() as i64;
        let y0 = (rect.top() / self.cell_size).floor() as i64;
        // Right/bottom edges are exclusive.
        let x1 = ((rect.right() / self.cell_size).ceil() as i64 - 1).max(x0);
        let y1 = ((rect.bottom() / self.cell_size).ceil() as i64 - 1).max(y0);
        Some((x0, y0, x1, y1))
    }

    pub fn insert(&mut self, id: BlockId, rect: &Rect) {
        let Some((x0, y0, x1, y1)) = self.cell_range(rect) else {
            return;
        };
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
    }

    pub fn remove(&mut self, id: BlockId, rect: &Rect) {
        let Some((x0, y0, x1, y1)) = self.cell_range(rect) else {
            return;
        };
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.cells.get_mut(&(cx, cy)) {
                    bucket.retain(|b| *b != id);
                    if bucket.is_empty() {
                        self.cells.remove(&(cx, cy));
                    }
                }
            }
        }
    }

    /// Ids whose cells touch `area`, sorted and deduplicated. Callers still
    /// need an exact overlap test.
    pub fn query(&self, area: &Rect) -> Vec<BlockId> {
        let Some((x0, y0, x1, y1)) = self.cell_range(area) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    #[cfg(test)]
    fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}
