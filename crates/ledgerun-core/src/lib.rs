pub mod block;
pub mod collision;
pub mod geometry;
pub mod mask;
pub mod registry;
pub mod spatial;
pub mod timer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::block::{Block, BlockId, BlockKind};
    use crate::collision::Body;
    use crate::geometry::Rect;
    use crate::registry::BlockRegistry;

    /// Minimal solid body for driving the resolver directly.
    #[derive(Debug, Clone)]
    pub struct TestBody {
        pub rect: Rect,
    }

    impl TestBody {
        pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
            Self {
                rect: Rect::new(x, y, w, h),
            }
        }
    }

    impl Body for TestBody {
        fn rect(&self) -> Rect {
            self.rect
        }

        fn rect_mut(&mut self) -> &mut Rect {
            &mut self.rect
        }
    }

    /// Registry with a ground row of `cols` tiles starting at column
    /// `first_col`, tops at `ground_y`.
    pub fn floor_world(block_size: i64, first_col: i64, cols: i64, ground_y: i64) -> BlockRegistry {
        let mut world = BlockRegistry::new(block_size as f32 * 2.0);
        for col in first_col..first_col + cols {
            world.insert(Block::tile(
                col * block_size,
                ground_y,
                block_size,
                BlockKind::Ground,
            ));
        }
        world
    }

    /// Add a single platform tile, panicking if the tile is taken.
    pub fn add_tile(world: &mut BlockRegistry, x: i64, y: i64, block_size: i64) -> BlockId {
        world
            .insert(Block::tile(x, y, block_size, BlockKind::Platform))
            .unwrap_or_else(|| panic!("tile ({x}, {y}) already occupied"))
    }

    /// Assert that no two live blocks share a tile and the occupied-set is exact.
    pub fn assert_world_consistent(world: &BlockRegistry) {
        assert!(
            world.is_consistent(),
            "occupied-set must mirror live blocks exactly"
        );
        let mut seen = std::collections::HashSet::new();
        for (_, block) in world.iter() {
            assert!(
                seen.insert(block.pos()),
                "two live blocks share tile {:?}",
                block.pos()
            );
        }
    }
}
