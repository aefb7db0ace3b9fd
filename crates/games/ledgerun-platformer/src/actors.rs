use ledgerun_core::block::BlockId;
use ledgerun_core::collision::{Body, probe_horizontal, resolve_vertical};
use ledgerun_core::geometry::Rect;
use ledgerun_core::registry::BlockRegistry;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::MonsterConfig;

/// Gravity added to walking monsters each tick.
const MONSTER_GRAVITY: f32 = 1.0;
/// How far below the leading foot a patroller looks for ground.
const FOOT_PROBE_DEPTH: f32 = 5.0;
/// Contact reach around a monster for damaging the player.
const CONTACT_PAD: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    /// Flies straight at the player, ignoring terrain.
    Chaser,
    /// Walks with gravity, turns at ledges, rushes a nearby player.
    Patroller,
    /// Large walker that jumps over obstacles; spawned by the encounter.
    GroundBoss,
}

/// A monster. Behavior is selected by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub kind: ActorKind,
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    /// -1 facing left, 1 facing right.
    pub dir: f32,
    pub hp: f32,
    pub on_ground: bool,
    /// Block the actor stands on. The actor is removed if it disappears.
    pub anchor: Option<BlockId>,
}

impl Body for Actor {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }
}

/// What an actor sees during its update.
pub struct ActorEnv<'a> {
    pub world: &'a BlockRegistry,
    pub target: Rect,
    pub cfg: &'a MonsterConfig,
    pub player_vel: f32,
    pub max_fall_speed: f32,
    pub block_size: f32,
}

impl Actor {
    fn new(id: u64, kind: ActorKind, rect: Rect, hp: f32) -> Self {
        Self {
            id,
            kind,
            rect,
            vx: 0.0,
            vy: 0.0,
            dir: 1.0,
            hp,
            on_ground: false,
            anchor: None,
        }
    }

    /// A regular monster standing on `block`.
    pub fn perched(id: u64, kind: ActorKind, block: BlockId, block_rect: &Rect, cfg: &MonsterConfig) -> Self {
        let size = cfg.size;
        let mut rect = Rect::new(block_rect.center_x() - size / 2.0, 0.0, size, size);
        rect.set_bottom(block_rect.top());
        let mut actor = Self::new(id, kind, rect, 1.0);
        actor.anchor = Some(block);
        actor.on_ground = true;
        actor
    }

    /// The encounter boss with its bottom at `bottom`.
    pub fn boss(id: u64, center_x: f32, bottom: f32, cfg: &MonsterConfig) -> Self {
        let size = cfg.boss_size;
        let mut rect = Rect::new(center_x - size / 2.0, 0.0, size, size);
        rect.set_bottom(bottom);
        Self::new(id, ActorKind::GroundBoss, rect, cfg.boss_hp)
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Returns true if this hit killed the actor.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if amount.is_finite() && amount > 0.0 {
            self.hp -= amount;
        }
        self.is_dead()
    }

    /// Contact damage per second.
    pub fn contact_dps(&self, cfg: &MonsterConfig) -> f32 {
        match self.kind {
            ActorKind::Chaser => cfg.chaser_damage,
            ActorKind::Patroller => cfg.patroller_damage,
            ActorKind::GroundBoss => cfg.boss_damage,
        }
    }

    /// Whether the actor is close enough to hurt the player.
    pub fn touches(&self, player: &Rect) -> bool {
        self.rect.inflated(CONTACT_PAD, CONTACT_PAD).intersects(player)
    }

    pub fn update(&mut self, env: &ActorEnv<'_>) {
        match self.kind {
            ActorKind::Chaser => update_chaser(self, env),
            ActorKind::Patroller => update_patroller(self, env),
            ActorKind::GroundBoss => update_boss(self, env),
        }
    }

    fn fall(&mut self, env: &ActorEnv<'_>) {
        let dy = (self.vy + MONSTER_GRAVITY).min(env.max_fall_speed);
        self.vy = dy;
        self.rect.translate(0.0, dy);
        let contacts = resolve_vertical(self, env.world, dy);
        self.on_ground = contacts.landed;
        if contacts.landed || contacts.hit_head {
            self.vy = 0.0;
        }
        self.anchor = if contacts.landed {
            contacts.touched.first().copied()
        } else {
            None
        };
    }

    /// Walk `dx` unless a block is in the way. Returns false when blocked.
    fn walk(&mut self, env: &ActorEnv<'_>, dx: f32) -> bool {
        if probe_horizontal(&*self, env.world, dx).is_some() {
            return false;
        }
        self.rect.translate(dx, 0.0);
        true
    }
}

fn update_chaser(actor: &mut Actor, env: &ActorEnv<'_>) {
    let speed = env.player_vel * env.cfg.chaser_speed_factor;
    let dx = env.target.center_x() - actor.rect.center_x();
    let dy = env.target.center_y() - actor.rect.center_y();
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > f32::EPSILON {
        actor.vx = dx / dist * speed;
        actor.vy = dy / dist * speed;
    }
    actor.rect.translate(actor.vx, actor.vy);
    actor.dir = if dx > 0.0 { 1.0 } else { -1.0 };
    if actor.vx != 0.0 || actor.vy != 0.0 {
        actor.anchor = None;
        actor.on_ground = false;
    }
}

fn update_patroller(actor: &mut Actor, env: &ActorEnv<'_>) {
    actor.fall(env);

    let dx = env.target.center_x() - actor.rect.center_x();
    let dy = env.target.center_y() - actor.rect.center_y();
    let speed = env.cfg.patroller_speed;
    if dx.abs() + dy.abs() < env.cfg.patroller_detection {
        actor.dir = if dx < 0.0 { -1.0 } else { 1.0 };
        actor.vx = actor.dir * speed * 2.0;
        actor.walk(env, actor.vx);
        return;
    }

    actor.vx = actor.dir * speed;
    if !actor.walk(env, actor.vx) {
        actor.dir = -actor.dir;
        return;
    }
    if actor.on_ground {
        let foot_x = actor.rect.center_x() + actor.dir * actor.rect.w / 2.0;
        let foot_y = actor.rect.bottom() + FOOT_PROBE_DEPTH;
        let probe = Rect::new(foot_x, foot_y, 1.0, 1.0);
        let ground_ahead = env.world.query_rect(&probe).into_iter().any(|id| {
            env.world
                .get(id)
                .is_some_and(|b| b.rect().contains_point(foot_x, foot_y))
        });
        if !ground_ahead {
            actor.dir = -actor.dir;
        }
    }
}

fn update_boss(actor: &mut Actor, env: &ActorEnv<'_>) {
    actor.dir = if env.target.center_x() > actor.rect.center_x() {
        1.0
    } else {
        -1.0
    };
    actor.vx = actor.dir * env.player_vel;
    actor.walk(env, actor.vx);
    actor.fall(env);
    // Bosses never despawn with the terrain.
    actor.anchor = None;

    if actor.on_ground {
        let ahead = actor.rect.translated(actor.dir * env.block_size, 0.0);
        if env.world.any_overlap(&ahead, None) {
            actor.vy = -env.player_vel * env.cfg.boss_jump_factor;
            actor.on_ground = false;
        }
    }
}

/// Periodically drops monsters onto free block tops.
#[derive(Debug, Clone, Default)]
pub struct MonsterSpawner {
    elapsed: f32,
    next_id: u64,
}

impl MonsterSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Advance the spawn timer and, when it fires, spawn monsters on
    /// blocks inside `area` that have nothing standing on them.
    ///
    /// At most `max_monsters` live at once; each wave adds a quarter of the
    /// free blocks (at least one).
    pub fn tick(
        &mut self,
        dt: f32,
        world: &BlockRegistry,
        actors: &[Actor],
        area: &Rect,
        cfg: &MonsterConfig,
        rng: &mut impl Rng,
    ) -> Vec<Actor> {
        self.elapsed += dt;
        if self.elapsed < cfg.spawn_interval {
            return Vec::new();
        }
        self.elapsed = 0.0;
        if actors.len() >= cfg.max_monsters {
            return Vec::new();
        }

        let mut candidates: Vec<(BlockId, Rect)> = world
            .query_rect(area)
            .into_iter()
            .filter_map(|id| world.get(id).map(|b| (id, b)))
            .filter(|(_, b)| b.is_grabbable() && !b.invisible)
            .map(|(id, b)| (id, b.rect()))
            .filter(|(id, r)| {
                let spot = Rect::new(r.center_x() - cfg.size / 2.0, r.top() - cfg.size, cfg.size, cfg.size);
                !world.any_overlap(&spot, Some(*id))
                    && !actors.iter().any(|a| a.anchor == Some(*id) || a.rect.intersects(&spot))
            })
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let count = (cfg.max_monsters - actors.len()).min((candidates.len() / 4).max(1));
        candidates.shuffle(rng);
        let spawned: Vec<Actor> = candidates
            .into_iter()
            .take(count)
            .map(|(block, rect)| {
                let kind = if rng.random_bool(0.5) {
                    ActorKind::Chaser
                } else {
                    ActorKind::Patroller
                };
                let mut actor = Actor::perched(self.next_id(), kind, block, &rect, cfg);
                actor.dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                actor
            })
            .collect();
        tracing::debug!(count = spawned.len(), live = actors.len(), "monsters spawned");
        spawned
    }
}
