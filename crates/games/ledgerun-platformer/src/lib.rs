pub mod actors;
pub mod camera;
pub mod config;
pub mod encounter;
pub mod events;
pub mod physics;
pub mod placement;
pub mod world_gen;

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use ledgerun_core::block::{Block, BlockId, BlockKind, TilePos};
use ledgerun_core::geometry::Rect;
use ledgerun_core::registry::BlockRegistry;

use actors::{Actor, ActorEnv, ActorKind, MonsterSpawner};
use camera::Camera;
use config::PlatformerConfig;
use encounter::BossEncounter;
use events::SimEvent;
use physics::{Animation, MotionInput, PlayerState, step_player};
use placement::{PlacementRules, ScatterRequest, scatter_platforms};
use world_gen::WorldGenerator;

/// Keeps the runtime stream (scatter, spawns) apart from section seeds.
const RUNTIME_SALT: u64 = 0x5bd1_e995_c2b2_ae35;
/// Scattered platforms start this far right of the spawn point.
const SPAWN_CLEARANCE: i64 = 200;

/// Counters for a run, reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub ticks: u64,
    pub elapsed: f32,
    pub jumps: u32,
    pub dashes: u32,
    pub stomps: u32,
    pub ledge_grabs: u32,
    pub blocks_broken: u32,
    pub damage_taken: f32,
    pub deaths: u32,
    pub monsters_spawned: u32,
    pub monsters_defeated: u32,
    pub sections_generated: u32,
    pub platforms_scattered: u32,
    pub furthest_x: f32,
    /// Smallest y reached (y grows downward).
    pub highest_y: f32,
    pub arena_sealed: bool,
    pub boss_defeated: bool,
}

impl RunStats {
    fn record(&mut self, events: &[SimEvent]) {
        for event in events {
            match event {
                SimEvent::Jumped { .. } => self.jumps += 1,
                SimEvent::DashStarted { .. } => self.dashes += 1,
                SimEvent::StompStarted => self.stomps += 1,
                SimEvent::LedgeGrabbed { .. } => self.ledge_grabs += 1,
                SimEvent::BlockBroken { .. } => self.blocks_broken += 1,
                SimEvent::Damaged { amount, .. } => self.damage_taken += amount,
                SimEvent::PlayerDied => self.deaths += 1,
                SimEvent::MonsterSpawned { .. } => self.monsters_spawned += 1,
                SimEvent::MonsterDefeated { .. } => self.monsters_defeated += 1,
                SimEvent::SectionsGenerated { sections, .. } => {
                    self.sections_generated += sections.len() as u32;
                },
                SimEvent::PlatformsScattered { blocks } => {
                    self.platforms_scattered += *blocks as u32;
                },
                SimEvent::ArenaSealed { .. } => self.arena_sealed = true,
                _ => {},
            }
        }
    }
}

/// The whole simulation: world, player, monsters, and the boss encounter.
///
/// Driven by a fixed-timestep host. Each `update` samples the pending input,
/// advances the player, applies stomp and fall outcomes, maintains the world
/// around the view, runs monsters and the encounter, then moves the camera.
pub struct Platformer {
    cfg: PlatformerConfig,
    world: BlockRegistry,
    generator: WorldGenerator,
    rules: PlacementRules,
    player: PlayerState,
    actors: Vec<Actor>,
    spawner: MonsterSpawner,
    encounter: BossEncounter,
    camera: Camera,
    rng: StdRng,
    pending_input: MotionInput,
    /// Ground columns currently kept, as `(first_x, last_x)`.
    ground_span: Option<(i64, i64)>,
    /// Band bottom of the most recent vertical expansion.
    last_gen_height: i64,
    paused: bool,
    stats: RunStats,
}

impl Platformer {
    pub fn new(cfg: PlatformerConfig) -> Self {
        let bs = cfg.generator.block_size.max(1);
        let world = BlockRegistry::new(bs as f32 * 2.0);
        let player = PlayerState::new(&cfg.physics, cfg.world.spawn_x, cfg.world.spawn_y);
        let mut camera = Camera::new(cfg.world.view_width, cfg.world.view_height);
        camera.follow(&player.rect);
        let stats = RunStats {
            furthest_x: player.rect.x,
            highest_y: player.rect.y,
            ..RunStats::default()
        };

        let mut game = Self {
            generator: WorldGenerator::new(&cfg.generator),
            rules: PlacementRules::from_config(&cfg.generator),
            rng: StdRng::seed_from_u64(cfg.generator.seed ^ RUNTIME_SALT),
            spawner: MonsterSpawner::new(),
            encounter: BossEncounter::new(&cfg.encounter),
            last_gen_height: cfg.world.ground_y,
            world,
            player,
            camera,
            actors: Vec::new(),
            pending_input: MotionInput::default(),
            ground_span: None,
            paused: false,
            stats,
            cfg,
        };
        game.setup_level();
        game
    }

    pub fn config(&self) -> &PlatformerConfig {
        &self.cfg
    }

    pub fn world(&self) -> &BlockRegistry {
        &self.world
    }

    pub fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn encounter(&self) -> &BossEncounter {
        &self.encounter
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn animation(&self) -> Animation {
        self.player.animation(&self.cfg.physics)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Queue input for the next update. Edge-triggered actions accumulate
    /// until consumed so a press is never lost between ticks; held state
    /// always takes the latest value.
    pub fn apply_input(&mut self, input: &MotionInput) {
        let pending = &mut self.pending_input;
        pending.left = input.left;
        pending.right = input.right;
        pending.hold = input.hold;
        pending.jump |= input.jump;
        pending.dash |= input.dash;
        pending.stomp |= input.stomp;
        pending.hold_jump |= input.hold_jump;
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Vec<SimEvent> {
        if self.paused {
            return Vec::new();
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let input = std::mem::take(&mut self.pending_input);

        let mut events = step_player(&mut self.player, &input, &self.world, &self.cfg.physics, dt);
        let stomped_blocks: Vec<BlockId> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::StompImpact { blocks } => Some(blocks.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        if !stomped_blocks.is_empty() {
            self.break_blocks(&stomped_blocks, &mut events);
            self.player.stomp_bounce(&self.cfg.physics);
        }
        let stomped_actors = self.stomp_actors();

        let kill_line = self.cfg.world.ground_y as f32 + self.cfg.world.kill_depth;
        if self.player.rect.top() > kill_line {
            tracing::info!(y = self.player.rect.y, "player fell out of the world");
            self.kill_player(&mut events);
        }

        self.maintain_world(&mut events);
        self.update_actors(dt, &stomped_actors, &mut events);
        self.update_encounter(dt, &mut events);
        self.camera.follow(&self.player.rect);

        self.stats.ticks += 1;
        self.stats.elapsed += dt;
        self.stats.furthest_x = self.stats.furthest_x.max(self.player.rect.x);
        self.stats.highest_y = self.stats.highest_y.min(self.player.rect.y);
        self.stats.record(&events);
        events
    }

    /// Left edge of the view centered on the player.
    fn view_left(&self) -> f32 {
        self.player.rect.center_x() - self.cfg.world.view_width / 2.0
    }

    fn block_size(&self) -> i64 {
        self.cfg.generator.block_size.max(1)
    }

    fn setup_level(&mut self) {
        let bs = self.block_size();
        let view_h = self.cfg.world.view_height as i64;
        self.update_ground();
        for (x, y) in [(0, view_h - 2 * bs), (3 * bs, view_h - 4 * bs)] {
            self.world.insert(Block::tile(x, y, bs, BlockKind::Setup));
        }
        if self.cfg.world.left_wall {
            self.world.insert(Block::wall(
                0,
                -2 * view_h,
                self.cfg.encounter.wall_width,
                6 * view_h,
                true,
            ));
        }

        let view_right = self.view_left() + self.cfg.world.view_width + self.cfg.world.cull_margin;
        let req = ScatterRequest {
            count: self.cfg.world.cube_batch * 3,
            min_x: self.cfg.world.spawn_x as i64 + SPAWN_CLEARANCE,
            max_x: view_right as i64,
            band_bottom: self.cfg.world.ground_y,
            floor_y: Some(self.cfg.world.ground_y),
            anchor: Some(self.player_feet()),
        };
        let blocks = scatter_platforms(
            self.rules,
            &req,
            &self.world,
            self.cfg.generator.attempts_per_cube,
            &mut self.rng,
        );
        let placed = self.insert_blocks(blocks);
        tracing::info!(
            seed = self.generator.seed(),
            blocks = self.world.len(),
            scattered = placed,
            "world created"
        );
    }

    fn player_feet(&self) -> (i64, i64) {
        (
            self.player.rect.center_x() as i64,
            self.player.rect.bottom() as i64,
        )
    }

    fn insert_blocks(&mut self, blocks: Vec<Block>) -> usize {
        blocks
            .into_iter()
            .filter_map(|b| self.world.insert(b))
            .count()
    }

    /// Keep ground tiles under `[view_left - view_width, view_left + 2 * view_width]`.
    fn update_ground(&mut self) {
        let bs = self.block_size();
        let ground_y = self.cfg.world.ground_y;
        let view_left = self.view_left();
        let view_w = self.cfg.world.view_width;
        let first = ((view_left - view_w) / bs as f32).floor() as i64 * bs;
        let last = ((view_left + 2.0 * view_w) / bs as f32).floor() as i64 * bs;
        if self.ground_span == Some((first, last)) {
            return;
        }

        if let Some((old_first, old_last)) = self.ground_span {
            let mut x = old_first;
            while x <= old_last {
                if (x < first || x > last)
                    && let Some(id) = self.world.id_at(TilePos::new(x, ground_y))
                    && self.world.get(id).is_some_and(|b| b.kind == BlockKind::Ground)
                {
                    self.world.remove(id);
                }
                x += bs;
            }
        }
        let mut x = first;
        while x <= last {
            if self.world.id_at(TilePos::new(x, ground_y)).is_none() {
                self.world.insert(Block::tile(x, ground_y, bs, BlockKind::Ground));
            }
            x += bs;
        }
        self.ground_span = Some((first, last));
    }

    fn break_blocks(&mut self, blocks: &[BlockId], events: &mut Vec<SimEvent>) {
        let mut seen = HashSet::new();
        for &id in blocks {
            if !seen.insert(id) {
                continue;
            }
            if self.world.get(id).is_some_and(Block::is_breakable) {
                self.world.remove(id);
                tracing::debug!(block = id.0, "block broken by stomp");
                events.push(SimEvent::BlockBroken { block: id });
            }
        }
    }

    /// Damage monsters a stomping player comes down on. Returns their ids.
    fn stomp_actors(&mut self) -> Vec<u64> {
        if !self.player.is_stomping() || self.player.vy <= 0.0 {
            return Vec::new();
        }
        let player = self.player.rect;
        let damage = self.cfg.physics.stomp_damage;
        let hit: Vec<u64> = self
            .actors
            .iter_mut()
            .filter(|a| a.rect.intersects(&player) && player.center_y() < a.rect.center_y())
            .map(|a| {
                a.take_damage(damage);
                a.id
            })
            .collect();
        if !hit.is_empty() {
            self.player.stomp_bounce(&self.cfg.physics);
        }
        hit
    }

    fn kill_player(&mut self, events: &mut Vec<SimEvent>) {
        tracing::info!(x = self.player.rect.x, "player died");
        events.push(SimEvent::PlayerDied);
        self.player.respawn(&self.cfg.physics);
        events.push(SimEvent::Respawned);
    }

    fn maintain_world(&mut self, events: &mut Vec<SimEvent>) {
        self.update_ground();

        let view_left = self.view_left();
        let world_cfg = &self.cfg.world;
        let view_right = view_left + world_cfg.view_width;

        if !self.encounter.is_sealed() {
            let min_x = (view_left - world_cfg.generate_margin) as i64;
            let max_x = (view_right + world_cfg.generate_margin) as i64;
            let fresh: Vec<i64> = self
                .generator
                .section_range(min_x, max_x)
                .filter(|i| !self.generator.is_generated(*i))
                .collect();
            if !fresh.is_empty() {
                let blocks = self.generator.generate_region(min_x, max_x, world_cfg.ground_y);
                let placed = self.insert_blocks(blocks);
                events.push(SimEvent::SectionsGenerated {
                    sections: fresh,
                    blocks: placed,
                });
            }
        }

        let cleanup = self.cfg.world.cleanup_distance as i64;
        let mut forgotten = self
            .generator
            .cleanup_far_sections(view_left as i64, cleanup);
        forgotten.extend(
            self.generator
                .cleanup_sections_ahead(view_right as i64, cleanup),
        );
        if !forgotten.is_empty() {
            let removed = self
                .world
                .retain(|_, b| !b.section.is_some_and(|s| forgotten.contains(&s)));
            tracing::debug!(sections = ?forgotten, blocks = removed.len(), "sections forgotten");
            events.push(SimEvent::SectionsForgotten {
                sections: forgotten,
                blocks: removed.len(),
            });
        }

        let culled = match self.encounter.arena() {
            Some(arena) => self.world.retain(|_, b| !b.is_generated() || arena.keeps(b.x)),
            None => {
                let margin = self.cfg.world.cull_margin;
                let lo = view_left - margin;
                let hi = view_right + margin;
                self.world.retain(|_, b| {
                    !(b.is_generated() && b.section.is_none())
                        || (b.x as f32 >= lo && b.x as f32 <= hi)
                })
            },
        };
        if !culled.is_empty() {
            tracing::trace!(blocks = culled.len(), "blocks culled");
        }

        self.expand_upward(events);
    }

    /// Scatter a new band of platforms once the player climbs above the
    /// last one.
    fn expand_upward(&mut self, events: &mut Vec<SimEvent>) {
        if self.player.rect.y >= self.last_gen_height as f32 {
            return;
        }
        let step = self.cfg.world.vertical_step_blocks * self.block_size();
        let new_height = self.last_gen_height - step;
        let px = self.player.rect.center_x();
        let view_w = self.cfg.world.view_width;
        let wall_right = if self.cfg.world.left_wall {
            self.cfg.encounter.wall_width
        } else {
            i64::MIN
        };
        let mut min_x = ((px - view_w) as i64).max(wall_right);
        let mut max_x = (px + view_w) as i64;
        if let Some(arena) = self.encounter.arena() {
            min_x = min_x.max(arena.left + self.cfg.encounter.wall_width);
            max_x = max_x.min(arena.right);
        }
        let req = ScatterRequest {
            count: self.cfg.world.cube_batch,
            min_x,
            max_x,
            band_bottom: new_height,
            floor_y: None,
            anchor: Some(self.player_feet()),
        };
        let blocks = scatter_platforms(
            self.rules,
            &req,
            &self.world,
            self.cfg.generator.attempts_per_cube,
            &mut self.rng,
        );
        if blocks.is_empty() {
            return;
        }
        let placed = self.insert_blocks(blocks);
        self.last_gen_height = new_height;
        tracing::debug!(band = new_height, blocks = placed, "platforms scattered above");
        events.push(SimEvent::PlatformsScattered { blocks: placed });
    }

    fn update_actors(&mut self, dt: f32, stomped: &[u64], events: &mut Vec<SimEvent>) {
        let world = &self.world;
        self.actors
            .retain(|a| a.anchor.is_none_or(|id| world.contains(id)));

        let view = self.camera.visible();
        let view_w = self.cfg.world.view_width;
        let area = Rect::new(
            self.view_left() - view_w,
            view.y - view.h,
            3.0 * view_w,
            3.0 * view.h,
        );
        let spawned = self.spawner.tick(
            dt,
            &self.world,
            &self.actors,
            &area,
            &self.cfg.monsters,
            &mut self.rng,
        );
        for actor in &spawned {
            events.push(SimEvent::MonsterSpawned {
                actor: actor.id,
                kind: actor.kind,
            });
        }
        self.actors.extend(spawned);

        let env = ActorEnv {
            world: &self.world,
            target: self.player.rect,
            cfg: &self.cfg.monsters,
            player_vel: self.cfg.physics.player_vel,
            max_fall_speed: self.cfg.physics.max_fall_speed,
            block_size: self.cfg.generator.block_size as f32,
        };
        for actor in &mut self.actors {
            actor.update(&env);
        }

        let invincibility = self.cfg.physics.invincibility;
        for actor in &self.actors {
            if stomped.contains(&actor.id) || !actor.touches(&self.player.rect) {
                continue;
            }
            let amount = actor.contact_dps(&self.cfg.monsters) * invincibility;
            if let Some(amount) = self.player.take_damage(amount, &self.cfg.physics) {
                events.push(SimEvent::Damaged {
                    amount,
                    health: self.player.health,
                });
            }
        }
        if self.player.is_dead() {
            self.kill_player(events);
        }

        let mut defeated = Vec::new();
        self.actors.retain(|a| {
            if a.is_dead() {
                defeated.push((a.id, a.kind));
                false
            } else {
                true
            }
        });
        for (id, kind) in defeated {
            tracing::debug!(actor = id, ?kind, "monster defeated");
            events.push(SimEvent::MonsterDefeated { actor: id, kind });
            if self.encounter.actor_defeated(id) {
                self.stats.boss_defeated = true;
            }
        }
    }

    fn update_encounter(&mut self, dt: f32, events: &mut Vec<SimEvent>) {
        if !self.encounter.tick(dt) {
            return;
        }
        let boss_id = self.spawner.next_id();
        let arena = self.encounter.seal(
            self.player.rect.center_x(),
            self.cfg.world.view_width,
            &self.cfg.encounter,
            boss_id,
        );
        for wall in arena.walls(self.cfg.encounter.wall_width, self.cfg.world.view_height) {
            self.world.insert(wall);
        }
        let boss = Actor::boss(
            boss_id,
            arena.center_x(),
            self.cfg.world.ground_y as f32,
            &self.cfg.monsters,
        );
        self.actors.push(boss);
        events.push(SimEvent::ArenaSealed {
            left: arena.left,
            right: arena.right,
        });
        events.push(SimEvent::BossSpawned { actor: boss_id });
        events.push(SimEvent::MonsterSpawned {
            actor: boss_id,
            kind: ActorKind::GroundBoss,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerun_core::test_helpers::assert_world_consistent;

    const DT: f32 = 1.0 / 60.0;

    fn game() -> Platformer {
        Platformer::new(PlatformerConfig::default())
    }

    fn run(game: &mut Platformer, input: &MotionInput, ticks: usize) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            game.apply_input(input);
            events.extend(game.update(DT));
        }
        events
    }

    fn block_positions(game: &Platformer) -> Vec<TilePos> {
        game.world().iter().map(|(_, b)| b.pos()).collect()
    }

    // ================================================================
    // Level setup
    // ================================================================

    #[test]
    fn new_world_has_ground_setup_blocks_and_wall() {
        let game = game();
        let world = game.world();
        assert_world_consistent(world);
        assert!(world.id_at(TilePos::new(0, 608)).is_some(), "setup block near spawn");
        assert!(world.id_at(TilePos::new(288, 416)).is_some(), "second setup block");

        let walls: Vec<&Block> = world
            .iter()
            .map(|(_, b)| b)
            .filter(|b| b.kind == BlockKind::Wall)
            .collect();
        assert_eq!(walls.len(), 1);
        assert!(walls[0].invisible, "left boundary collides but is not drawn");
        assert_eq!((walls[0].x, walls[0].y, walls[0].height), (0, -1600, 4800));

        let ground: Vec<i64> = world
            .iter()
            .map(|(_, b)| b)
            .filter(|b| b.kind == BlockKind::Ground)
            .map(|b| b.x)
            .collect();
        // Camera left edge at spawn is 125 - 500 = -375.
        assert!(ground.contains(&-1440) && ground.contains(&1536));
        assert!(!ground.contains(&-1536) && !ground.contains(&1632));
    }

    #[test]
    fn player_falls_and_lands() {
        let mut game = game();
        let events = run(&mut game, &MotionInput::default(), 120);
        assert!(events.contains(&SimEvent::Landed));
        assert!(game.player().grounded);
        assert_eq!(game.player().vy, 0.0);
        assert!(
            !game.world().any_overlap(&game.player().rect, None),
            "player must rest on, not inside, a block"
        );
    }

    // ================================================================
    // World maintenance
    // ================================================================

    #[test]
    fn sections_stream_in_ahead_of_the_player() {
        let mut game = game();
        let events = run(&mut game, &MotionInput::default(), 1);
        let generated: Vec<i64> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::SectionsGenerated { sections, .. } => Some(sections.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert!(generated.contains(&0) && generated.contains(&1));
        assert!(game.generator().is_generated(-1));

        // A second tick at the same spot generates nothing new.
        let events = run(&mut game, &MotionInput::default(), 1);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, SimEvent::SectionsGenerated { .. }))
        );
    }

    #[test]
    fn ground_follows_the_camera() {
        let mut game = game();
        game.player.rect.x = 20_000.0;
        game.player.rect.y = 600.0;
        run(&mut game, &MotionInput::default(), 1);
        let ground: Vec<i64> = game
            .world()
            .iter()
            .map(|(_, b)| b)
            .filter(|b| b.kind == BlockKind::Ground)
            .map(|b| b.x)
            .collect();
        assert!(ground.iter().all(|&x| x > 15_000), "old ground is dropped");
        assert!(ground.contains(&20_064));
        assert_world_consistent(game.world());
    }

    #[test]
    fn far_sections_are_forgotten_and_their_blocks_removed() {
        let mut game = game();
        run(&mut game, &MotionInput::default(), 1);
        game.player.rect.x = 30_000.0;
        game.player.rect.y = 600.0;
        let events = run(&mut game, &MotionInput::default(), 1);
        let forgotten: Vec<i64> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::SectionsForgotten { sections, .. } => Some(sections.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert!(forgotten.contains(&0));
        assert!(!game.generator().is_generated(0));
        assert!(
            game.world()
                .iter()
                .all(|(_, b)| b.section.is_none_or(|s| s > 5)),
            "blocks of forgotten sections are gone"
        );
        assert_world_consistent(game.world());
    }

    #[test]
    fn walking_left_keeps_the_world_bounded() {
        let mut cfg = PlatformerConfig::default();
        cfg.world.left_wall = false;
        let mut game = Platformer::new(cfg);
        run(&mut game, &MotionInput::default(), 1);
        let mut peak = 0;
        for step in 1..=60 {
            game.player.rect.x = -2000.0 * step as f32;
            game.player.rect.y = 600.0;
            game.player.vy = 0.0;
            run(&mut game, &MotionInput::default(), 1);
            peak = peak.max(game.world().len());
        }
        let px = game.player().rect.x;
        assert!(peak < 1200, "live blocks peaked at {peak}");
        assert!(
            game.generator().generated_sections().count() <= 10,
            "generated sections must stay within the streaming window"
        );
        assert!(
            game.world()
                .iter()
                .all(|(_, b)| b.section.is_none() || (b.x as f32) < px + 10_000.0),
            "sections far to the right are forgotten"
        );
        assert_world_consistent(game.world());
    }

    #[test]
    fn runs_are_deterministic() {
        let input = MotionInput {
            right: true,
            ..MotionInput::default()
        };
        let mut a = game();
        let mut b = game();
        for tick in 0..400 {
            let mut step = input.clone();
            step.jump = tick % 45 == 0;
            step.dash = tick % 120 == 60;
            a.apply_input(&step);
            b.apply_input(&step);
            assert_eq!(a.update(DT), b.update(DT));
        }
        assert_eq!(a.player().rect, b.player().rect);
        assert_eq!(block_positions(&a), block_positions(&b));
        assert_eq!(a.stats(), b.stats());
        assert_world_consistent(a.world());
    }

    #[test]
    fn climbing_scatters_platforms_above() {
        let mut game = game();
        let events = run(&mut game, &MotionInput::default(), 30);
        if events
            .iter()
            .any(|e| matches!(e, SimEvent::PlatformsScattered { .. }))
        {
            assert!(game.last_gen_height < game.config().world.ground_y);
        } else {
            assert_eq!(game.last_gen_height, game.config().world.ground_y);
        }
        assert_world_consistent(game.world());
    }

    // ================================================================
    // Stomp and death
    // ================================================================

    #[test]
    fn stomp_breaks_platform_and_bounces() {
        let mut game = game();
        let tile = game
            .world
            .insert(Block::tile(96, -3000, 96, BlockKind::Platform))
            .expect("sky tile is free");
        game.player.rect.x = 110.0;
        game.player.rect.set_bottom(-3001.0);
        game.player.vy = 5.0;
        game.player.fall_count = 30;

        game.apply_input(&MotionInput {
            stomp: true,
            ..MotionInput::default()
        });
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::StompStarted));
        assert!(events.contains(&SimEvent::BlockBroken { block: tile }));
        assert!(!game.world().contains(tile));
        assert!(game.player().is_normal(), "the impact ends the stomp");
        assert_eq!(game.player().vy, -game.config().physics.stomp_bounce);
        assert_eq!(game.player().jump_count, 1);
    }

    #[test]
    fn stomp_does_not_break_setup_blocks() {
        let mut game = game();
        let tile = game.world().id_at(TilePos::new(288, 416)).expect("setup block");
        game.player.rect.x = 300.0;
        game.player.rect.set_bottom(415.0);
        game.player.vy = 5.0;
        game.player.fall_count = 30;
        game.apply_input(&MotionInput {
            stomp: true,
            ..MotionInput::default()
        });
        let events = game.update(DT);
        assert!(!events.iter().any(|e| matches!(e, SimEvent::BlockBroken { .. })));
        assert!(game.world().contains(tile));
        assert_eq!(game.player().rect.bottom(), 416.0);
    }

    #[test]
    fn stomp_damages_monster_below() {
        let mut game = game();
        let cfg = game.config().monsters.clone();
        let mut boss = Actor::boss(77, 0.0, 0.0, &cfg);
        boss.rect = Rect::new(100.0, -3000.0, 100.0, 100.0);
        game.actors.push(boss);
        game.player.rect.x = 120.0;
        game.player.rect.set_bottom(-2990.0);
        game.player.vy = 5.0;
        game.apply_input(&MotionInput {
            stomp: true,
            ..MotionInput::default()
        });
        let events = game.update(DT);
        assert!(
            !events.iter().any(|e| matches!(e, SimEvent::Damaged { .. })),
            "stomping a monster does not hurt the player"
        );
        let boss = game.actors().iter().find(|a| a.id == 77).expect("boss survives one stomp");
        assert_eq!(boss.hp, 50.0);
        assert!(game.player().vy < 0.0, "player bounces off");
    }

    #[test]
    fn falling_out_of_the_world_respawns() {
        let mut game = game();
        game.player.rect.y = 704.0 + 2000.0 + 10.0;
        game.player.health = 40.0;
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::PlayerDied));
        assert!(events.contains(&SimEvent::Respawned));
        assert_eq!(game.player().health, game.player().max_health);
        assert_eq!(game.stats().deaths, 1);
        assert!(game.player().rect.y < 200.0);
    }

    // ================================================================
    // Monsters
    // ================================================================

    #[test]
    fn monster_contact_deals_damage_per_invincibility_window() {
        let mut game = game();
        let cfg = game.config().monsters.clone();
        let mut chaser = Actor::boss(5, 0.0, 0.0, &cfg);
        chaser.kind = ActorKind::Chaser;
        chaser.rect = game.player().rect;
        game.actors.push(chaser);

        let events = game.update(DT);
        let damage: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Damaged { amount, .. } => Some(*amount),
                _ => None,
            })
            .collect();
        assert_eq!(damage, vec![5.0]);

        // Invincible on the next tick.
        let events = game.update(DT);
        assert!(!events.iter().any(|e| matches!(e, SimEvent::Damaged { .. })));
    }

    #[test]
    fn perched_monster_despawns_with_its_block() {
        let mut game = game();
        let cfg = game.config().monsters.clone();
        let tile = Rect::new(5000.0, -3000.0, 96.0, 96.0);
        let actor = Actor::perched(3, ActorKind::Patroller, BlockId(u64::MAX), &tile, &cfg);
        game.actors.push(actor);
        game.update(DT);
        assert!(game.actors().iter().all(|a| a.id != 3));
    }

    #[test]
    fn defeated_monsters_are_removed_with_an_event() {
        let mut game = game();
        let cfg = game.config().monsters.clone();
        let mut actor = Actor::boss(9, 8000.0, -3000.0, &cfg);
        actor.hp = 0.0;
        game.actors.push(actor);
        let events = game.update(DT);
        assert!(events.contains(&SimEvent::MonsterDefeated {
            actor: 9,
            kind: ActorKind::GroundBoss,
        }));
        assert!(game.actors().is_empty());
    }

    // ================================================================
    // Boss encounter
    // ================================================================

    #[test]
    fn countdown_seals_arena_and_spawns_boss() {
        let mut cfg = PlatformerConfig::default();
        cfg.encounter.boss_countdown = 0.05;
        let mut game = Platformer::new(cfg);
        let events = run(&mut game, &MotionInput::default(), 10);

        let sealed = events.iter().find_map(|e| match e {
            SimEvent::ArenaSealed { left, right } => Some((*left, *right)),
            _ => None,
        });
        let (left, right) = sealed.expect("arena sealed");
        assert_eq!(right - left, 1500);
        let boss = game
            .actors()
            .iter()
            .find(|a| a.kind == ActorKind::GroundBoss)
            .expect("boss spawned");
        assert!(events.contains(&SimEvent::BossSpawned { actor: boss.id }));
        assert_eq!(game.encounter().boss(), Some(boss.id));

        let visible_walls = game
            .world()
            .iter()
            .filter(|(_, b)| b.kind == BlockKind::Wall && !b.invisible)
            .count();
        assert_eq!(visible_walls, 2);
        assert!(
            game.world()
                .iter()
                .filter(|(_, b)| b.is_generated())
                .all(|(_, b)| b.x >= left && b.x <= right),
            "generated blocks outside the arena are culled"
        );
        assert!(game.stats().arena_sealed);
    }

    #[test]
    fn killing_the_boss_is_recorded() {
        let mut cfg = PlatformerConfig::default();
        cfg.encounter.boss_countdown = 0.0;
        let mut game = Platformer::new(cfg);
        game.update(DT);
        let boss_id = game.encounter().boss().expect("boss spawned");
        if let Some(boss) = game.actors.iter_mut().find(|a| a.id == boss_id) {
            boss.hp = 0.0;
        }
        game.update(DT);
        assert!(game.stats().boss_defeated);
        assert_eq!(game.encounter().phase(), encounter::EncounterPhase::Defeated);
    }

    // ================================================================
    // Input and control
    // ================================================================

    #[test]
    fn jump_input_not_lost_across_overwrites() {
        let mut game = game();
        game.apply_input(&MotionInput {
            jump: true,
            ..MotionInput::default()
        });
        game.apply_input(&MotionInput {
            right: true,
            ..MotionInput::default()
        });
        assert!(game.pending_input.jump, "edge press survives a later sample");
        assert!(game.pending_input.right);

        game.update(DT);
        assert_eq!(game.pending_input, MotionInput::default(), "input is consumed");
    }

    #[test]
    fn paused_game_does_not_advance() {
        let mut game = game();
        game.pause();
        let before = game.player().rect;
        assert!(game.update(DT).is_empty());
        assert_eq!(game.player().rect, before);
        assert_eq!(game.stats().ticks, 0);
        game.resume();
        game.update(DT);
        assert_eq!(game.stats().ticks, 1);
    }

    #[test]
    fn camera_tracks_player_after_update() {
        let mut game = game();
        game.update(DT);
        let rect = game.player().rect;
        let view = game.camera().visible();
        assert!((view.center_x() - rect.center_x()).abs() < 1e-3);
        assert!((view.center_y() - rect.center_y()).abs() < 1e-3);
    }

    #[test]
    fn non_finite_dt_is_ignored() {
        let mut game = game();
        game.update(f32::NAN);
        game.update(f32::INFINITY);
        assert!(game.player().rect.x.is_finite() && game.player().rect.y.is_finite());
    }
}
