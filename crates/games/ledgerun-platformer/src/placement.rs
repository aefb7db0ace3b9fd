use std::collections::HashSet;

use ledgerun_core::block::{Block, BlockKind, TilePos};
use ledgerun_core::geometry::Rect;
use ledgerun_core::registry::Occupancy;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::config::GeneratorConfig;

/// Platform lengths for scattered clusters; short runs are twice as likely.
const SCATTER_LENGTHS: [i64; 6] = [1, 1, 2, 2, 3, 4];

/// Distances that decide whether a tile can be reached from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRules {
    pub block_size: i64,
    /// Highest climb (px) from a support to the tile above it.
    pub max_vertical_gap: i64,
    /// Widest horizontal offset (px) between a support and the tile above it.
    pub horizontal_reach: i64,
    /// Extra spacing (px) between scattered platforms on the same row.
    pub min_gap: i64,
    /// Most rungs one helper column may contain.
    pub max_helpers: i64,
}

impl PlacementRules {
    pub fn from_config(cfg: &GeneratorConfig) -> Self {
        Self {
            block_size: cfg.block_size,
            max_vertical_gap: cfg.max_vertical_gap,
            horizontal_reach: cfg.horizontal_reach(),
            min_gap: cfg.min_gap,
            max_helpers: cfg.max_helpers(),
        }
    }

    /// Vertical distance between helper rungs: the largest multiple of the
    /// block size that is still climbable.
    pub fn rung_step(&self) -> i64 {
        if self.block_size <= 0 {
            return 0;
        }
        (self.max_vertical_gap / self.block_size) * self.block_size
    }
}

/// A horizontal run of `len` tiles starting at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    pub x: i64,
    pub y: i64,
    pub len: i64,
}

impl Cluster {
    pub fn new(x: i64, y: i64, len: i64) -> Self {
        Self { x, y, len }
    }
}

/// How strictly a cluster is checked before placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    /// Pattern layouts: tiles outside the bounds or already taken are
    /// dropped and the rest of the run is kept.
    Pattern,
    /// Random scatter: the whole run is rejected on any overlap, bounds
    /// violation, or crowding of same-row neighbors.
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    OutOfBounds,
    Overlap,
    Spacing,
    /// No support in reach and no helper column could be built.
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed { tiles: usize, helpers: usize },
    Rejected(RejectReason),
}

impl PlaceOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlaceOutcome::Placed { .. })
    }
}

/// Places clusters so every one of them can be reached from terrain the
/// player can already stand on.
///
/// Supports are tiles in `existing`, tiles placed by this placer, an
/// optional ground line that supports any column, and an optional anchor
/// point (the player's feet).
pub struct Placer<'a> {
    rules: PlacementRules,
    min_x: i64,
    max_x: i64,
    floor_y: Option<i64>,
    anchor: Option<(i64, i64)>,
    existing: &'a dyn Occupancy,
    section: Option<i64>,
    placed: HashSet<TilePos>,
    blocks: Vec<Block>,
}

impl<'a> Placer<'a> {
    /// Tiles must lie entirely within `[min_x, max_x)`.
    pub fn new(rules: PlacementRules, min_x: i64, max_x: i64, existing: &'a dyn Occupancy) -> Self {
        Self {
            rules,
            min_x,
            max_x,
            floor_y: None,
            anchor: None,
            existing,
            section: None,
            placed: HashSet::new(),
            blocks: Vec::new(),
        }
    }

    /// Treat `y` as a continuous ground line under every column.
    pub fn with_floor(mut self, y: i64) -> Self {
        self.floor_y = Some(y);
        self
    }

    /// Treat the point `(center_x, bottom)` as a temporary support.
    pub fn with_anchor(mut self, center_x: i64, bottom: i64) -> Self {
        self.anchor = Some((center_x, bottom));
        self
    }

    /// Tag every emitted block with `section`.
    pub fn in_section(mut self, section: i64) -> Self {
        self.section = Some(section);
        self
    }

    pub fn placed_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    fn is_taken(&self, pos: TilePos) -> bool {
        self.placed.contains(&pos) || self.existing.is_occupied(pos)
    }

    fn in_bounds(&self, x: i64) -> bool {
        x >= self.min_x && x + self.rules.block_size <= self.max_x
    }

    /// Tiles (placed or existing) whose top-left lies in the inclusive box.
    fn tiles_in(&self, x0: i64, x1: i64, y0: i64, y1: i64) -> Vec<TilePos> {
        if x1 < x0 || y1 < y0 {
            return Vec::new();
        }
        let area = Rect::new(
            x0 as f32,
            y0 as f32,
            (x1 - x0 + 1) as f32,
            (y1 - y0 + 1) as f32,
        );
        let mut found = self.existing.occupied_in(&area);
        found.extend(
            self.placed
                .iter()
                .filter(|p| p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1)
                .copied(),
        );
        found
    }

    /// Whether a tile at `(x, y)` has something to jump from.
    pub fn has_support(&self, x: i64, y: i64) -> bool {
        let gap = self.rules.max_vertical_gap;
        let reach = self.rules.horizontal_reach;
        if self.floor_y.is_some_and(|f| f > y && f - y <= gap) {
            return true;
        }
        if let Some((ax, ab)) = self.anchor {
            let center = x + self.rules.block_size / 2;
            if ab > y && ab - y <= gap && (ax - center).abs() <= reach {
                return true;
            }
        }
        !self.tiles_in(x - reach, x + reach, y + 1, y + gap).is_empty()
    }

    /// Try to place `cluster`, adding a helper column when nothing supports it.
    pub fn place(&mut self, cluster: Cluster, mode: ClusterMode) -> PlaceOutcome {
        let outcome = self.try_place(cluster, mode);
        if let PlaceOutcome::Rejected(reason) = outcome {
            tracing::trace!(
                x = cluster.x,
                y = cluster.y,
                len = cluster.len,
                ?reason,
                "cluster rejected"
            );
        }
        outcome
    }

    fn try_place(&mut self, cluster: Cluster, mode: ClusterMode) -> PlaceOutcome {
        let bs = self.rules.block_size;
        if cluster.len <= 0 || bs <= 0 {
            return PlaceOutcome::Rejected(RejectReason::Empty);
        }
        let mut tiles: Vec<TilePos> = (0..cluster.len)
            .map(|i| TilePos::new(cluster.x + i * bs, cluster.y))
            .collect();

        match mode {
            ClusterMode::Scatter => {
                if tiles.iter().any(|t| !self.in_bounds(t.x)) {
                    return PlaceOutcome::Rejected(RejectReason::OutOfBounds);
                }
                if tiles.iter().any(|t| self.is_taken(*t)) {
                    return PlaceOutcome::Rejected(RejectReason::Overlap);
                }
                let spacing = bs + self.rules.min_gap;
                let crowded = tiles.iter().any(|t| {
                    !self
                        .tiles_in(t.x - spacing + 1, t.x + spacing - 1, t.y, t.y)
                        .is_empty()
                });
                if crowded {
                    return PlaceOutcome::Rejected(RejectReason::Spacing);
                }
            },
            ClusterMode::Pattern => {
                tiles.retain(|t| self.in_bounds(t.x));
                if tiles.is_empty() {
                    return PlaceOutcome::Rejected(RejectReason::OutOfBounds);
                }
                tiles.retain(|t| !self.is_taken(*t));
                if tiles.is_empty() {
                    return PlaceOutcome::Rejected(RejectReason::Overlap);
                }
            },
        }

        let helpers = if tiles.iter().any(|t| self.has_support(t.x, t.y)) {
            Vec::new()
        } else {
            match self.helper_column(&tiles) {
                Some(rungs) => rungs,
                None => return PlaceOutcome::Rejected(RejectReason::Unreachable),
            }
        };

        let placed = PlaceOutcome::Placed {
            tiles: tiles.len(),
            helpers: helpers.len(),
        };
        for rung in helpers {
            self.commit(rung, BlockKind::Helper);
        }
        for tile in tiles {
            self.commit(tile, BlockKind::Platform);
        }
        placed
    }

    fn commit(&mut self, pos: TilePos, kind: BlockKind) {
        self.placed.insert(pos);
        let mut block = Block::tile(pos.x, pos.y, self.rules.block_size, kind);
        if let Some(section) = self.section {
            block = block.in_section(section);
        }
        self.blocks.push(block);
    }

    /// Plan a staircase of rungs beside the cluster down to the nearest
    /// support, or to the ground line if no support is close enough.
    fn helper_column(&self, tiles: &[TilePos]) -> Option<Vec<TilePos>> {
        let bs = self.rules.block_size;
        let step = self.rules.rung_step();
        let gap = self.rules.max_vertical_gap;
        let max_rungs = self.rules.max_helpers;
        let first = tiles.first()?;
        if step <= 0 || max_rungs <= 0 {
            return None;
        }
        let y = first.y;
        let left = tiles.iter().map(|t| t.x).min()?;
        let right = tiles.iter().map(|t| t.x).max()? + bs;

        // Columns are tried to the right of the cluster first, then mirrored.
        let sides = [(right, right + bs), (left - bs, left - 2 * bs)];
        let depth = gap + max_rungs * step;

        for (near, far) in sides {
            let span_min = near.min(far) - self.rules.horizontal_reach;
            let span_max = near.max(far) + self.rules.horizontal_reach;
            let mut bases: Vec<i64> = self
                .tiles_in(span_min, span_max, y + gap + 1, y + depth)
                .into_iter()
                .map(|p| p.y)
                .collect();
            bases.sort_unstable();
            bases.dedup();
            if let Some(floor) = self.floor_y.filter(|f| *f - y > gap) {
                bases.push(floor);
            }

            for base_y in bases {
                let rise = base_y - y - gap;
                let rungs = (rise + step - 1) / step;
                if rungs < 1 || rungs > max_rungs {
                    continue;
                }
                let column: Vec<TilePos> = (1..=rungs)
                    .map(|j| TilePos::new(if j % 2 == 1 { near } else { far }, y + j * step))
                    .collect();
                let last = column.last()?;
                let base_in_reach = Some(base_y) == self.floor_y
                    || !self
                        .tiles_in(
                            last.x - self.rules.horizontal_reach,
                            last.x + self.rules.horizontal_reach,
                            base_y,
                            base_y,
                        )
                        .is_empty();
                let free = column
                    .iter()
                    .all(|r| self.in_bounds(r.x) && !self.is_taken(*r) && r.y + bs <= base_y);
                if base_in_reach && free {
                    return Some(column);
                }
            }
        }
        None
    }
}

/// A batch of randomly scattered platforms.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRequest {
    pub count: usize,
    pub min_x: i64,
    pub max_x: i64,
    /// Bottom of the height band; platforms sit between one block and
    /// `max_vertical_gap` above it.
    pub band_bottom: i64,
    /// Ground line that supports every column, if the band touches it.
    pub floor_y: Option<i64>,
    /// Player feet `(center_x, bottom)` used as a temporary support.
    pub anchor: Option<(i64, i64)>,
}

/// Scatter up to `req.count` platform clusters over shuffled grid columns
/// and band heights, keeping each reachable.
///
/// Gives up after `count * attempts_per_cube` draws or when the columns run
/// out, so fewer platforms than requested is a normal result.
pub fn scatter_platforms(
    rules: PlacementRules,
    req: &ScatterRequest,
    existing: &dyn Occupancy,
    attempts_per_cube: usize,
    rng: &mut impl Rng,
) -> Vec<Block> {
    let bs = rules.block_size;
    if bs <= 0 || req.count == 0 || req.max_x <= req.min_x {
        return Vec::new();
    }

    let lowest = req.band_bottom - bs;
    let highest = req.band_bottom - rules.max_vertical_gap;
    let mut heights: Vec<i64> = Vec::new();
    let mut h = lowest;
    while h >= highest {
        heights.push(h);
        h -= bs;
    }
    if heights.is_empty() {
        return Vec::new();
    }
    heights.shuffle(rng);

    let first_col = req.min_x.div_euclid(bs) + i64::from(req.min_x.rem_euclid(bs) != 0);
    let mut columns: Vec<i64> = (first_col..)
        .map(|c| c * bs)
        .take_while(|x| x + bs <= req.max_x)
        .collect();
    columns.shuffle(rng);

    let mut placer = Placer::new(rules, req.min_x, req.max_x, existing);
    if let Some(floor) = req.floor_y {
        placer = placer.with_floor(floor);
    }
    if let Some((ax, ab)) = req.anchor {
        placer = placer.with_anchor(ax, ab);
    }

    let mut clusters = 0;
    let mut attempts = 0;
    let max_attempts = req.count.saturating_mul(attempts_per_cube);
    while clusters < req.count && attempts < max_attempts {
        let Some(x) = columns.pop() else {
            break;
        };
        attempts += 1;
        let (Some(&y), Some(&len)) = (heights.choose(rng), SCATTER_LENGTHS.choose(rng)) else {
            break;
        };
        if placer.place(Cluster::new(x, y, len), ClusterMode::Scatter).is_placed() {
            clusters += 1;
        }
    }

    tracing::trace!(clusters, attempts, blocks = placer.placed_count(), "scatter finished");
    placer.into_blocks()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const BS: i64 = 96;
    const GROUND: i64 = 704;

    fn rules() -> PlacementRules {
        PlacementRules::from_config(&GeneratorConfig::default())
    }

    fn empty() -> HashSet<TilePos> {
        HashSet::new()
    }

    /// Support predicate from the reachability guarantee, checked against
    /// the finished layout.
    fn supported(
        blocks: &[Block],
        extra: &HashSet<TilePos>,
        b: &Block,
        r: &PlacementRules,
        floor: Option<i64>,
    ) -> bool {
        if floor.is_some_and(|f| f > b.y && f - b.y <= r.max_vertical_gap) {
            return true;
        }
        blocks
            .iter()
            .map(|o| o.pos())
            .chain(extra.iter().copied())
            .any(|p| {
                p.y > b.y
                    && p.y - b.y <= r.max_vertical_gap
                    && (p.x - b.x).abs() <= r.horizontal_reach
            })
    }

    // ================================================================
    // Support checks
    // ================================================================

    #[test]
    fn floor_supports_low_rows_only() {
        let occ = empty();
        let placer = Placer::new(rules(), 0, 2000, &occ).with_floor(GROUND);
        assert!(placer.has_support(500, GROUND - BS));
        assert!(placer.has_support(500, GROUND - 2 * BS));
        assert!(!placer.has_support(500, GROUND - 3 * BS), "288 px is above the double jump");
    }

    #[test]
    fn existing_tiles_support_within_reach() {
        let occ: HashSet<TilePos> = [TilePos::new(400, 400)].into_iter().collect();
        let placer = Placer::new(rules(), 0, 2000, &occ);
        assert!(placer.has_support(400 + 4 * BS, 400 - 2 * BS));
        assert!(!placer.has_support(400 + 5 * BS, 400 - 2 * BS), "Too far sideways");
        assert!(!placer.has_support(400, 400 - 3 * BS), "Too high");
        assert!(!placer.has_support(400, 400), "Same row is not below");
    }

    #[test]
    fn anchor_counts_as_support() {
        let occ = empty();
        let placer = Placer::new(rules(), 0, 2000, &occ).with_anchor(300, 500);
        assert!(placer.has_support(300, 500 - 2 * BS));
        assert!(!placer.has_support(1000, 500 - 2 * BS));
    }

    // ================================================================
    // Cluster placement
    // ================================================================

    #[test]
    fn supported_cluster_places_without_helpers() {
        let occ = empty();
        let mut placer = Placer::new(rules(), 0, 2000, &occ).with_floor(GROUND);
        let outcome = placer.place(Cluster::new(192, GROUND - 2 * BS, 3), ClusterMode::Scatter);
        assert_eq!(outcome, PlaceOutcome::Placed { tiles: 3, helpers: 0 });
        assert!(placer.blocks().iter().all(|b| b.kind == BlockKind::Platform));
    }

    #[test]
    fn unsupported_cluster_gets_helper_staircase() {
        let occ = empty();
        let mut placer = Placer::new(rules(), 0, 2000, &occ).with_floor(GROUND);
        // Row 4 is 384 px up: one rung at row 2 bridges it.
        let outcome = placer.place(Cluster::new(192, GROUND - 4 * BS, 2), ClusterMode::Pattern);
        assert_eq!(outcome, PlaceOutcome::Placed { tiles: 2, helpers: 1 });
        let rung = placer
            .blocks()
            .iter()
            .find(|b| b.kind == BlockKind::Helper)
            .expect("helper rung");
        assert_eq!((rung.x, rung.y), (384, GROUND - 2 * BS));
    }

    #[test]
    fn staircase_alternates_columns() {
        let occ = empty();
        let mut r = rules();
        r.max_helpers = 3;
        let mut placer = Placer::new(r, 0, 2000, &occ).with_floor(GROUND);
        // Row 6 needs two rungs (rows 4 and 2).
        let outcome = placer.place(Cluster::new(192, GROUND - 6 * BS, 1), ClusterMode::Pattern);
        assert_eq!(outcome, PlaceOutcome::Placed { tiles: 1, helpers: 2 });
        let rungs: Vec<(i64, i64)> = placer
            .blocks()
            .iter()
            .filter(|b| b.kind == BlockKind::Helper)
            .map(|b| (b.x, b.y))
            .collect();
        assert_eq!(rungs, vec![(288, GROUND - 4 * BS), (384, GROUND - 2 * BS)]);
    }

    #[test]
    fn helper_column_prefers_nearest_support() {
        let occ: HashSet<TilePos> = [TilePos::new(288, 300)].into_iter().collect();
        let mut placer = Placer::new(rules(), 0, 2000, &occ).with_floor(GROUND);
        // 300 - 12 = 288 px above the tile at y=300: one rung at y=204.
        let outcome = placer.place(Cluster::new(96, 12, 1), ClusterMode::Pattern);
        assert_eq!(outcome, PlaceOutcome::Placed { tiles: 1, helpers: 1 });
        let rung = &placer.blocks()[0];
        assert_eq!((rung.x, rung.y), (192, 12 + 192));
    }

    #[test]
    fn too_many_rungs_is_unreachable() {
        let occ = empty();
        let mut placer = Placer::new(rules(), 0, 2000, &occ).with_floor(GROUND);
        let outcome = placer.place(Cluster::new(192, GROUND - 8 * BS, 2), ClusterMode::Pattern);
        assert_eq!(outcome, PlaceOutcome::Rejected(RejectReason::Unreachable));
        assert_eq!(placer.placed_count(), 0);
    }

    #[test]
    fn helper_column_mirrors_when_right_side_is_out_of_bounds() {
        let occ = empty();
        let mut placer = Placer::new(rules(), 0, 384, &occ).with_floor(GROUND);
        let outcome = placer.place(Cluster::new(192, GROUND - 4 * BS, 2), ClusterMode::Pattern);
        assert_eq!(outcome, PlaceOutcome::Placed { tiles: 2, helpers: 1 });
        let rung = &placer.blocks()[0];
        assert_eq!(rung.kind, BlockKind::Helper);
        assert_eq!((rung.x, rung.y), (96, GROUND - 2 * BS));
    }

    #[test]
    fn scatter_mode_rejects_overlap_bounds_and_crowding() {
        let occ: HashSet<TilePos> = [TilePos::new(480, GROUND - BS)].into_iter().collect();
        let mut placer = Placer::new(rules(), 0, 960, &occ).with_floor(GROUND);
        assert_eq!(
            placer.place(Cluster::new(384, GROUND - BS, 2), ClusterMode::Scatter),
            PlaceOutcome::Rejected(RejectReason::Overlap)
        );
        assert_eq!(
            placer.place(Cluster::new(864, GROUND - BS, 2), ClusterMode::Scatter),
            PlaceOutcome::Rejected(RejectReason::OutOfBounds)
        );
        assert_eq!(
            placer.place(Cluster::new(576, GROUND - BS, 1), ClusterMode::Scatter),
            PlaceOutcome::Rejected(RejectReason::Spacing),
            "Adjacent on the same row is too close"
        );
        assert!(
            placer
                .place(Cluster::new(576, GROUND - 2 * BS, 1), ClusterMode::Scatter)
                .is_placed(),
            "A different row is fine"
        );
    }

    #[test]
    fn pattern_mode_clips_instead_of_rejecting() {
        let occ: HashSet<TilePos> = [TilePos::new(288, GROUND - BS)].into_iter().collect();
        let mut placer = Placer::new(rules(), 0, 480, &occ).with_floor(GROUND);
        let outcome = placer.place(Cluster::new(192, GROUND - BS, 4), ClusterMode::Pattern);
        // 288 is taken, 480 is out of bounds.
        assert_eq!(outcome, PlaceOutcome::Placed { tiles: 2, helpers: 0 });
        let xs: Vec<i64> = placer.blocks().iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![192, 384]);
    }

    #[test]
    fn section_tag_is_applied() {
        let occ = empty();
        let mut placer = Placer::new(rules(), 0, 2000, &occ).with_floor(GROUND).in_section(7);
        placer.place(Cluster::new(0, GROUND - BS, 1), ClusterMode::Pattern);
        assert_eq!(placer.blocks()[0].section, Some(7));
    }

    // ================================================================
    // Scatter loop
    // ================================================================

    fn request(count: usize) -> ScatterRequest {
        ScatterRequest {
            count,
            min_x: 0,
            max_x: 3000,
            band_bottom: GROUND,
            floor_y: Some(GROUND),
            anchor: Some((125, GROUND)),
        }
    }

    #[test]
    fn scatter_is_reproducible_for_a_seed() {
        let occ = empty();
        let a = scatter_platforms(rules(), &request(8), &occ, 80, &mut StdRng::seed_from_u64(3));
        let b = scatter_platforms(rules(), &request(8), &occ, 80, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn scatter_output_is_reachable_and_disjoint() {
        let r = rules();
        let occ = empty();
        for seed in 0..20 {
            let blocks = scatter_platforms(r, &request(8), &occ, 80, &mut StdRng::seed_from_u64(seed));
            let mut seen = HashSet::new();
            for b in &blocks {
                assert!(seen.insert(b.pos()), "seed {seed}: duplicate tile {:?}", b.pos());
                assert!(b.x >= 0 && b.x + BS <= 3000);
                assert!(
                    supported(&blocks, &occ, b, &r, Some(GROUND)),
                    "seed {seed}: unsupported block {b:?}"
                );
            }
        }
    }

    #[test]
    fn gap_below_one_block_places_nothing() {
        let mut r = rules();
        r.max_vertical_gap = 80;
        r.max_helpers = 80 / BS;
        let occ = empty();
        let blocks = scatter_platforms(r, &request(8), &occ, 80, &mut StdRng::seed_from_u64(1));
        assert!(blocks.is_empty());

        // A hand-picked unreachable cluster is skipped and the placer stays usable.
        let mut placer = Placer::new(r, 0, 3000, &occ).with_floor(GROUND);
        assert_eq!(
            placer.place(Cluster::new(960, GROUND - 3 * BS, 2), ClusterMode::Scatter),
            PlaceOutcome::Rejected(RejectReason::Unreachable)
        );
        assert_eq!(placer.placed_count(), 0);
    }

    #[test]
    fn scatter_with_no_columns_is_empty() {
        let occ = empty();
        let mut req = request(8);
        req.max_x = 50;
        assert!(scatter_platforms(rules(), &req, &occ, 80, &mut StdRng::seed_from_u64(0)).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scattered_tiles_never_overlap_existing(
                seed in any::<u64>(),
                existing in proptest::collection::hash_set((0i64..30, 1i64..3), 0..20),
            ) {
                let occ: HashSet<TilePos> = existing
                    .iter()
                    .map(|(c, r)| TilePos::new(c * BS, GROUND - r * BS))
                    .collect();
                let blocks = scatter_platforms(
                    rules(),
                    &request(10),
                    &occ,
                    80,
                    &mut StdRng::seed_from_u64(seed),
                );
                let mut seen = HashSet::new();
                for b in &blocks {
                    prop_assert!(!occ.contains(&b.pos()));
                    prop_assert!(seen.insert(b.pos()));
                }
            }
        }
    }
}
