use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

use ledgerun_core::block::{Block, TilePos};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::config::GeneratorConfig;
use crate::placement::{Cluster, ClusterMode, PlacementRules, Placer};

const SECTION_SALT: u64 = 0x5ec7_1011_a11d_2b3f;

/// Section layout families. Each one emits platform runs in tile units
/// relative to the section's left edge and the ground line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Three parallel routes at increasing heights.
    MultiRoute,
    /// Alternating high and low platforms.
    HighLow,
    /// Runs climbing upward in a zig-zag.
    Spiral,
    /// A low path and a high path over the same span.
    ChoicePath,
    /// Scattered heights that need precise jumps.
    VerticalMaze,
    /// Heights that swing up and down every few platforms.
    Wave,
    /// One path splitting into two branches and merging again.
    SplitMerge,
    /// Stacked horizontal layers.
    Layered,
}

impl Pattern {
    pub const ALL: [Pattern; 8] = [
        Pattern::MultiRoute,
        Pattern::HighLow,
        Pattern::Spiral,
        Pattern::ChoicePath,
        Pattern::VerticalMaze,
        Pattern::Wave,
        Pattern::SplitMerge,
        Pattern::Layered,
    ];

    /// Platform runs as `(column, row, length)`. Row 1 sits directly on
    /// the ground line.
    fn runs(self, rng: &mut StdRng) -> Vec<(i64, i64, i64)> {
        let mut runs = Vec::new();
        match self {
            Pattern::MultiRoute => {
                for row in [4, 6, 8] {
                    let n = rng.random_range(3..=5);
                    for i in 0..n {
                        runs.push((i * 4, row, rng.random_range(4..=8)));
                    }
                }
            },
            Pattern::HighLow => {
                for i in 0..8 {
                    let row = if i % 2 == 0 { 2 } else { 6 };
                    runs.push((i * 5 / 2, row, rng.random_range(4..=6)));
                }
            },
            Pattern::Spiral => {
                for i in 0..10 {
                    runs.push(((i % 5) * 3, 2 + (i / 2) * 2, 4));
                }
            },
            Pattern::ChoicePath => {
                for i in 0..5 {
                    runs.push(((i + 2) * 2, 2, 4));
                    runs.push(((i + 2) * 2, 7, 4));
                }
            },
            Pattern::VerticalMaze => {
                for i in 0..6 {
                    let row = rng.random_range(2..=8);
                    runs.push((i * 3, row, 3));
                    if rng.random_bool(0.5) {
                        runs.push((i * 3, row + 2, 3));
                    }
                }
            },
            Pattern::Wave => {
                for i in 0..12 {
                    let swing: i64 = rng.random_range(3..=4);
                    let row = if (i / 3) % 2 == 0 { 4 + swing } else { 4 - swing };
                    runs.push((i * 3 / 2, row.max(1), 3));
                }
            },
            Pattern::SplitMerge => {
                for i in 0..12 {
                    if (4..8).contains(&i) {
                        runs.push((i * 2, 6, 3));
                        runs.push((i * 2, 1, 3));
                    } else {
                        runs.push((i * 2, 3, 3));
                    }
                }
            },
            Pattern::Layered => {
                for row in [2, 5, 8] {
                    let n = rng.random_range(3..=5);
                    for i in 0..n {
                        runs.push((i * 3, row, rng.random_range(4..=6)));
                    }
                }
            },
        }
        runs
    }
}

/// splitmix64 finalizer.
fn mix_u64(mut value: u64) -> u64 {
    value ^= value >> 30;
    value = value.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    value ^= value >> 27;
    value = value.wrapping_mul(0x94d0_49bb_1331_11eb);
    value ^ (value >> 31)
}

/// Seed for one section's random stream; depends on nothing but the world
/// seed and the section index.
pub fn section_seed(world_seed: u64, index: i64) -> u64 {
    mix_u64(world_seed ^ SECTION_SALT ^ (index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// Streams the world in fixed-width sections, each generated at most once.
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    cfg: GeneratorConfig,
    rules: PlacementRules,
    generated: BTreeSet<i64>,
}

impl WorldGenerator {
    pub fn new(cfg: &GeneratorConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            rules: PlacementRules::from_config(cfg),
            generated: BTreeSet::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.cfg.seed
    }

    pub fn rules(&self) -> PlacementRules {
        self.rules
    }

    pub fn section_px(&self) -> i64 {
        self.cfg.section_px().max(1)
    }

    pub fn section_index(&self, x: i64) -> i64 {
        x.div_euclid(self.section_px())
    }

    /// Sections intersecting `[min_x, max_x)`.
    pub fn section_range(&self, min_x: i64, max_x: i64) -> Range<i64> {
        if min_x >= max_x {
            return 0..0;
        }
        let w = self.section_px();
        let end = max_x.div_euclid(w) + i64::from(max_x.rem_euclid(w) != 0);
        min_x.div_euclid(w)..end
    }

    pub fn is_generated(&self, index: i64) -> bool {
        self.generated.contains(&index)
    }

    pub fn generated_sections(&self) -> impl Iterator<Item = i64> + '_ {
        self.generated.iter().copied()
    }

    /// Generate every not-yet-generated section intersecting
    /// `[min_x, max_x)` and return the new blocks.
    pub fn generate_region(&mut self, min_x: i64, max_x: i64, ground_y: i64) -> Vec<Block> {
        let mut blocks = Vec::new();
        for index in self.section_range(min_x, max_x) {
            blocks.extend(self.generate_section(index, ground_y));
        }
        blocks
    }

    /// Generate one section, or nothing if it was generated before.
    pub fn generate_section(&mut self, index: i64, ground_y: i64) -> Vec<Block> {
        if !self.generated.insert(index) {
            return Vec::new();
        }
        let blocks = self.layout_section(index, ground_y);
        tracing::debug!(section = index, blocks = blocks.len(), "section generated");
        blocks
    }

    /// The section's layout, without recording it as generated.
    ///
    /// Clusters are placed lowest first so lower routes can support the
    /// ones above them. Connector and advanced-route clusters go through
    /// the same reachability check as the pattern itself.
    pub fn layout_section(&self, index: i64, ground_y: i64) -> Vec<Block> {
        let mut rng = StdRng::seed_from_u64(section_seed(self.cfg.seed, index));
        let bs = self.cfg.block_size;
        let start_x = index * self.section_px();
        let section_cols = self.cfg.section_width;

        let pattern = Pattern::ALL
            .choose(&mut rng)
            .copied()
            .unwrap_or(Pattern::Layered);
        let mut runs = pattern.runs(&mut rng);
        runs.sort_by_key(|&(_, row, _)| row);

        let mut extras = Vec::new();
        let connectors = rng.random_range(
            self.cfg.connectors_min..=self.cfg.connectors_max.max(self.cfg.connectors_min),
        );
        for _ in 0..connectors {
            let col = rng.random_range(1..=(section_cols - 2).max(1));
            let row = rng.random_range(3..=10);
            extras.push((col, row, 3));
        }
        let advanced = rng.random_range(
            self.cfg.advanced_min..=self.cfg.advanced_max.max(self.cfg.advanced_min),
        );
        for _ in 0..advanced {
            let col = rng.random_range(2..=(section_cols - 4).max(2));
            let row = rng.random_range(9..=14);
            extras.push((col, row, rng.random_range(2..=4)));
        }

        let local = HashSet::<TilePos>::new();
        let mut placer = Placer::new(self.rules, start_x, start_x + self.section_px(), &local)
            .with_floor(ground_y)
            .in_section(index);
        let mut placed = 0;
        for (col, row, len) in runs.into_iter().chain(extras) {
            let cluster = Cluster::new(start_x + col * bs, ground_y - row * bs, len);
            if placer.place(cluster, ClusterMode::Pattern).is_placed() {
                placed += 1;
            }
        }
        tracing::trace!(section = index, ?pattern, clusters = placed, "section laid out");
        placer.into_blocks()
    }

    /// Forget sections lying entirely behind `reference_x - distance` so
    /// they can be generated again later. Returns the forgotten indices.
    pub fn cleanup_far_sections(&mut self, reference_x: i64, distance: i64) -> Vec<i64> {
        let limit = self.section_index(reference_x.saturating_sub(distance.max(0)));
        let forgotten: Vec<i64> = self.generated.range(..limit).copied().collect();
        for index in &forgotten {
            self.generated.remove(index);
        }
        if !forgotten.is_empty() {
            tracing::debug!(?forgotten, "sections forgotten");
        }
        forgotten
    }

    /// Mirror of [`cleanup_far_sections`](Self::cleanup_far_sections):
    /// forget sections lying entirely beyond `reference_x + distance`.
    pub fn cleanup_sections_ahead(&mut self, reference_x: i64, distance: i64) -> Vec<i64> {
        let limit = self.section_index(reference_x.saturating_add(distance.max(0))) + 1;
        let forgotten: Vec<i64> = self.generated.range(limit..).copied().collect();
        for index in &forgotten {
            self.generated.remove(index);
        }
        if !forgotten.is_empty() {
            tracing::debug!(?forgotten, "sections ahead forgotten");
        }
        forgotten
    }
}
