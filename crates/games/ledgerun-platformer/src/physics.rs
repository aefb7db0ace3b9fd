use ledgerun_core::block::BlockId;
use ledgerun_core::collision::{Body, VerticalContacts, probe_horizontal, resolve_vertical};
use ledgerun_core::geometry::Rect;
use ledgerun_core::mask::CollisionMask;
use ledgerun_core::registry::BlockRegistry;
use ledgerun_core::timer::{Cooldown, Countdown};
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::events::{ReleaseReason, SimEvent};

/// Ticks without a landing before a walking player counts as airborne.
const GROUNDED_GRACE_TICKS: u32 = 3;
/// Floor for the horizontal grab tolerance (px).
const MIN_GRAB_TOLERANCE: f32 = 8.0;
/// Padding around the player when searching for grabbable blocks.
const LEDGE_SEARCH_PAD: f32 = 128.0;
/// Upper bound on simulated ticks when measuring a jump.
const MAX_ASCENT_TICKS: u32 = 10_000;

/// Per-tick vertical velocity gain from the gravity ramp, capped at 1.
///
/// `fall_count` is ticks since the last landing, so gravity eases in after a
/// landing or first jump instead of applying at full strength.
pub fn gravity_increment(fall_count: u32, fps: f32, gravity: f32) -> f32 {
    (fall_count as f32 / fps * gravity).min(1.0)
}

/// Height a jump reaches under the ramped gravity model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpEnvelope {
    /// Single jump from the ground (px).
    pub single: f32,
    /// Second jump pressed at the apex of the first (px).
    pub double: f32,
}

fn ascend(cfg: &PhysicsConfig, mut vy: f32, mut fall_count: u32) -> (f32, u32) {
    let mut rise = 0.0;
    for _ in 0..MAX_ASCENT_TICKS {
        vy = (vy + gravity_increment(fall_count, cfg.fps, cfg.gravity)).min(cfg.max_fall_speed);
        fall_count += 1;
        if vy >= 0.0 {
            break;
        }
        rise -= vy;
    }
    (rise, fall_count)
}

/// Simulate single and double jump heights for the given tuning.
pub fn jump_envelope(cfg: &PhysicsConfig) -> JumpEnvelope {
    let impulse = -cfg.gravity * cfg.jump_impulse;
    let (single, fall_count) = ascend(cfg, impulse, 0);
    let double = if cfg.max_jumps >= 2 {
        single + ascend(cfg, impulse, fall_count).0
    } else {
        single
    };
    JumpEnvelope { single, double }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Which side of the player the held block is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    pub block: BlockId,
    pub side: HoldSide,
    pub time: f32,
}

/// Mutually exclusive movement modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionMode {
    Normal,
    Holding(Hold),
    Dashing { dir: f32, timer: Countdown },
    Stomping { timer: Countdown },
}

/// Sampled input for one tick. `jump`, `dash`, `stomp` and `hold_jump` are
/// edge-triggered; `left`, `right` and `hold` are held state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub dash: bool,
    pub stomp: bool,
    pub hold: bool,
    pub hold_jump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationKey {
    Idle,
    Run,
    Jump,
    DoubleJump,
    Fall,
    Hit,
    Hold,
    Dash,
    Stomp,
}

/// What the renderer should draw for the player this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub key: AnimationKey,
    pub facing: Facing,
}

/// The player's motion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    /// Ticks since last grounded; drives the gravity ramp.
    pub fall_count: u32,
    /// 0 = grounded, 1 = jump used, 2 = double jump used.
    pub jump_count: u8,
    pub grounded: bool,
    pub mode: MotionMode,
    pub dash_cooldown: Cooldown,
    pub stomp_cooldown: Cooldown,
    /// Refuses a new grab until expired.
    pub regrab: Countdown,
    pub health: f32,
    pub max_health: f32,
    pub invincible: Countdown,
    /// Transient flag for the hit animation.
    pub hit: bool,
    pub hit_ticks: u32,
    pub mask: CollisionMask,
    pub spawn_x: f32,
    pub spawn_y: f32,
}

impl Body for PlayerState {
    fn rect(&self) -> Rect {
        self.rect
    }

    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    fn mask(&self) -> &CollisionMask {
        &self.mask
    }
}

impl PlayerState {
    pub fn new(cfg: &PhysicsConfig, spawn_x: f32, spawn_y: f32) -> Self {
        Self {
            rect: Rect::new(spawn_x, spawn_y, cfg.player_width, cfg.player_height),
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Left,
            fall_count: 0,
            jump_count: 0,
            grounded: false,
            mode: MotionMode::Normal,
            dash_cooldown: Cooldown::ready(cfg.dash_cooldown),
            stomp_cooldown: Cooldown::ready(cfg.stomp_cooldown),
            regrab: Countdown::expired(),
            health: cfg.max_health,
            max_health: cfg.max_health,
            invincible: Countdown::expired(),
            hit: false,
            hit_ticks: 0,
            mask: CollisionMask::Solid,
            spawn_x,
            spawn_y,
        }
    }

    /// Full reset to the spawn point: position, velocity, timers, and modes.
    pub fn respawn(&mut self, cfg: &PhysicsConfig) {
        *self = Self::new(cfg, self.spawn_x, self.spawn_y);
    }

    pub fn is_normal(&self) -> bool {
        matches!(self.mode, MotionMode::Normal)
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.mode, MotionMode::Holding(_))
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.mode, MotionMode::Dashing { .. })
    }

    pub fn is_stomping(&self) -> bool {
        matches!(self.mode, MotionMode::Stomping { .. })
    }

    pub fn hold(&self) -> Option<&Hold> {
        match &self.mode {
            MotionMode::Holding(hold) => Some(hold),
            _ => None,
        }
    }

    /// In the air for ledge-grab purposes.
    pub fn is_airborne(&self) -> bool {
        self.jump_count > 0 || !self.grounded
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Apply the jump impulse unconditionally.
    pub fn jump(&mut self, cfg: &PhysicsConfig) {
        self.vy = -cfg.gravity * cfg.jump_impulse;
        self.jump_count = self.jump_count.saturating_add(1);
        self.grounded = false;
        if self.jump_count == 1 {
            self.fall_count = 0;
        }
    }

    pub fn try_jump(&mut self, cfg: &PhysicsConfig) -> bool {
        if !self.is_normal() || self.jump_count >= cfg.max_jumps {
            return false;
        }
        self.jump(cfg);
        true
    }

    /// Start a dash in the facing direction. Replaces a stomp in progress.
    pub fn try_dash(&mut self, cfg: &PhysicsConfig) -> bool {
        if self.is_holding() || self.is_dashing() || !self.dash_cooldown.is_ready() {
            return false;
        }
        self.mode = MotionMode::Dashing {
            dir: self.facing.sign(),
            timer: Countdown::new(cfg.dash_duration),
        };
        self.vx = 0.0;
        self.dash_cooldown.trigger();
        true
    }

    pub fn try_stomp(&mut self, cfg: &PhysicsConfig) -> bool {
        if !self.is_normal() || !self.stomp_cooldown.is_ready() {
            return false;
        }
        self.mode = MotionMode::Stomping {
            timer: Countdown::new(cfg.stomp_duration),
        };
        self.vy = self.vy.max(0.0);
        self.stomp_cooldown.trigger();
        true
    }

    /// Turn a landed stomp into an upward bounce with one air jump left.
    pub fn stomp_bounce(&mut self, cfg: &PhysicsConfig) {
        if !self.is_stomping() {
            return;
        }
        self.mode = MotionMode::Normal;
        self.vy = -cfg.stomp_bounce;
        self.jump_count = 1;
        self.fall_count = 0;
        self.grounded = false;
    }

    /// Resting on a surface.
    pub fn land(&mut self) {
        self.fall_count = 0;
        self.vy = 0.0;
        self.jump_count = 0;
        self.grounded = true;
    }

    pub fn hit_head(&mut self) {
        self.vy = -self.vy;
    }

    /// Apply the outcome of a vertical resolve.
    pub fn apply_contacts(&mut self, contacts: &VerticalContacts) {
        if contacts.landed {
            self.land();
        }
        if contacts.hit_head {
            self.hit_head();
        }
    }

    /// Begin holding `block` on `side`, snapped flush against it with the
    /// feet level with its top.
    pub fn start_hold(&mut self, block: BlockId, block_rect: &Rect, side: HoldSide) {
        self.rect = ledge_snap(&self.rect, block_rect, side);
        self.vx = 0.0;
        self.vy = 0.0;
        self.fall_count = 0;
        self.jump_count = 0;
        self.grounded = false;
        self.mode = MotionMode::Holding(Hold {
            block,
            side,
            time: 0.0,
        });
    }

    pub fn end_hold(&mut self, cfg: &PhysicsConfig) {
        if self.is_holding() {
            self.mode = MotionMode::Normal;
            self.regrab = Countdown::new(cfg.hold_regrab_cooldown);
        }
    }

    /// Apply damage unless invincible. Returns the damage dealt.
    pub fn take_damage(&mut self, amount: f32, cfg: &PhysicsConfig) -> Option<f32> {
        if !self.invincible.is_expired() || !(amount.is_finite() && amount > 0.0) {
            return None;
        }
        self.health = (self.health - amount).max(0.0);
        self.hit = true;
        self.hit_ticks = 0;
        self.invincible = Countdown::new(cfg.invincibility);
        Some(amount)
    }

    pub fn heal(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    pub fn animation(&self, cfg: &PhysicsConfig) -> Animation {
        let key = match &self.mode {
            MotionMode::Holding(_) => AnimationKey::Hold,
            MotionMode::Dashing { .. } => AnimationKey::Dash,
            MotionMode::Stomping { .. } => AnimationKey::Stomp,
            MotionMode::Normal if self.hit => AnimationKey::Hit,
            MotionMode::Normal if self.vy < 0.0 && self.jump_count >= 2 => AnimationKey::DoubleJump,
            MotionMode::Normal if self.vy < 0.0 && self.jump_count == 1 => AnimationKey::Jump,
            MotionMode::Normal if self.vy > cfg.gravity * 2.0 => AnimationKey::Fall,
            MotionMode::Normal if self.vx != 0.0 => AnimationKey::Run,
            MotionMode::Normal => AnimationKey::Idle,
        };
        Animation {
            key,
            facing: self.facing,
        }
    }
}

fn ledge_snap(rect: &Rect, block: &Rect, side: HoldSide) -> Rect {
    let mut snapped = *rect;
    snapped.x = match side {
        HoldSide::Right => block.left() - rect.w,
        HoldSide::Left => block.right(),
    };
    snapped.set_bottom(block.top());
    snapped
}

/// Find a ledge the player can grab: a block edge within horizontal
/// tolerance of the player's leading edge whose top is near the player's
/// vertical footprint, where the snapped position is free.
pub fn find_ledge(player: &PlayerState, world: &BlockRegistry) -> Option<(BlockId, Rect, HoldSide)> {
    let p = player.rect;
    if p.is_degenerate() {
        return None;
    }
    for id in world.query_rect(&p.inflated(LEDGE_SEARCH_PAD, LEDGE_SEARCH_PAD)) {
        let Some(block) = world.get(id) else {
            continue;
        };
        if !block.is_grabbable() {
            continue;
        }
        let b = block.rect();
        let horiz_tol = (b.w / 8.0).max(MIN_GRAB_TOLERANCE);
        let vert_tol = b.h / 2.0;
        if !(p.bottom() > b.top() - vert_tol && p.top() < b.top() + vert_tol) {
            continue;
        }
        let side = if (p.right() - b.left()).abs() <= horiz_tol {
            HoldSide::Right
        } else if (p.left() - b.right()).abs() <= horiz_tol {
            HoldSide::Left
        } else {
            continue;
        };
        let snapped = ledge_snap(&p, &b, side);
        if world.any_overlap(&snapped, None) {
            continue;
        }
        return Some((id, b, side));
    }
    None
}

fn update_hold(
    player: &mut PlayerState,
    input: &MotionInput,
    world: &BlockRegistry,
    cfg: &PhysicsConfig,
    dt: f32,
    events: &mut Vec<SimEvent>,
) {
    if let MotionMode::Holding(hold) = &mut player.mode {
        let release = match world.get(hold.block) {
            None => Some(ReleaseReason::BlockMissing),
            Some(_) if !input.hold => Some(ReleaseReason::KeyReleased),
            Some(_) if input.hold_jump => Some(ReleaseReason::Jumped),
            Some(block) => {
                hold.time += dt;
                if hold.time >= cfg.hold_max {
                    Some(ReleaseReason::Timeout)
                } else {
                    let side = hold.side;
                    let block_rect = block.rect();
                    player.rect = ledge_snap(&player.rect, &block_rect, side);
                    player.vx = 0.0;
                    player.vy = 0.0;
                    None
                }
            },
        };
        if let Some(reason) = release {
            player.end_hold(cfg);
            tracing::trace!(?reason, "ledge released");
            events.push(SimEvent::LedgeReleased { reason });
            if reason == ReleaseReason::Jumped {
                player.jump(cfg);
                events.push(SimEvent::Jumped {
                    jump_count: player.jump_count,
                });
            }
        }
        return;
    }

    if !input.hold || !player.is_normal() || !player.regrab.is_expired() || !player.is_airborne() {
        return;
    }
    if let Some((id, block_rect, side)) = find_ledge(player, world) {
        player.start_hold(id, &block_rect, side);
        tracing::trace!(block = id.0, ?side, "ledge grabbed");
        events.push(SimEvent::LedgeGrabbed { block: id });
    }
}

/// Advance the player one tick: actions, timers, horizontal probe,
/// integration, vertical resolve, ledge handling, then bookkeeping.
pub fn step_player(
    player: &mut PlayerState,
    input: &MotionInput,
    world: &BlockRegistry,
    cfg: &PhysicsConfig,
    dt: f32,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

    match (input.left, input.right) {
        (true, false) => player.facing = Facing::Left,
        (false, true) => player.facing = Facing::Right,
        _ => {},
    }

    if input.jump && player.try_jump(cfg) {
        events.push(SimEvent::Jumped {
            jump_count: player.jump_count,
        });
    }
    if input.dash && player.try_dash(cfg) {
        events.push(SimEvent::DashStarted {
            dir: player.facing.sign(),
        });
    }
    if input.stomp && player.try_stomp(cfg) {
        events.push(SimEvent::StompStarted);
    }

    player.invincible.tick(dt);
    player.regrab.tick(dt);
    player.dash_cooldown.recover(dt);
    player.stomp_cooldown.recover(dt);

    // Probe ahead before moving so velocity never carries the player into a wall.
    player.vx = 0.0;
    if matches!(player.mode, MotionMode::Normal | MotionMode::Stomping { .. }) {
        let reach = cfg.player_vel * 2.0;
        let blocked_left = probe_horizontal(&*player, world, -reach).is_some();
        let blocked_right = probe_horizontal(&*player, world, reach).is_some();
        if input.left && !blocked_left {
            player.vx = -cfg.player_vel;
        }
        if input.right && !blocked_right {
            player.vx = cfg.player_vel;
        }
    }

    let was_grounded = player.grounded;
    let mut dy = None;
    let mut mode_ended = None;
    match &mut player.mode {
        MotionMode::Holding(_) => {
            player.vy = 0.0;
        },
        MotionMode::Dashing { dir, timer } => {
            player.rect.translate(*dir * cfg.dash_speed * dt, 0.0);
            if timer.tick(dt) {
                mode_ended = Some(SimEvent::DashEnded);
            }
        },
        MotionMode::Stomping { timer } => {
            let gain = gravity_increment(
                player.fall_count,
                cfg.fps,
                cfg.gravity * cfg.stomp_gravity_multiplier,
            );
            player.vy = (player.vy + gain).min(cfg.max_fall_speed);
            player.rect.translate(player.vx, player.vy);
            player.fall_count += 1;
            dy = Some(player.vy);
            if timer.tick(dt) {
                mode_ended = Some(SimEvent::StompEnded);
            }
        },
        MotionMode::Normal => {
            let gain = gravity_increment(player.fall_count, cfg.fps, cfg.gravity);
            player.vy = (player.vy + gain).min(cfg.max_fall_speed);
            player.rect.translate(player.vx, player.vy);
            player.fall_count += 1;
            dy = Some(player.vy);
        },
    }

    if let Some(dy) = dy {
        if player.fall_count > GROUNDED_GRACE_TICKS {
            player.grounded = false;
        }
        let stomping = player.is_stomping();
        let contacts = resolve_vertical(player, world, dy);
        player.apply_contacts(&contacts);
        if contacts.landed {
            if !was_grounded {
                events.push(SimEvent::Landed);
            }
            if stomping {
                events.push(SimEvent::StompImpact {
                    blocks: contacts.touched.clone(),
                });
            }
        }
        if contacts.hit_head {
            events.push(SimEvent::HitHead);
        }
    }

    if let Some(ended) = mode_ended {
        // A stomp impact may already have been recorded; the mode still ends here.
        player.mode = MotionMode::Normal;
        player.vx = 0.0;
        events.push(ended);
    }

    update_hold(player, input, world, cfg, dt, &mut events);

    if player.hit {
        player.hit_ticks += 1;
        if player.hit_ticks > cfg.hit_flag_ticks {
            player.hit = false;
            player.hit_ticks = 0;
        }
    }
    if !player.is_dead() {
        player.heal(cfg.health_regen * dt);
    }

    events
}
