use ledgerun_core::block::Block;
use ledgerun_core::timer::Countdown;
use serde::{Deserialize, Serialize};

use crate::config::EncounterConfig;

/// Horizontal bounds of the sealed boss arena. Walls stand at `left` and
/// `right` (each extending `wall_width` to the right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub left: i64,
    pub right: i64,
}

impl Arena {
    /// An arena `width` wide centered on `center_x`.
    pub fn around(center_x: f32, width: f32) -> Self {
        let width = width.max(0.0) as i64;
        let left = center_x as i64 - width / 2;
        Self {
            left,
            right: left + width,
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) as f32 / 2.0
    }

    /// Whether a block anchored at `x` is kept once the arena is sealed.
    pub fn keeps(&self, x: i64) -> bool {
        x >= self.left && x <= self.right
    }

    /// The two boundary walls, tall enough to stop any jump.
    pub fn walls(&self, wall_width: i64, view_height: f32) -> [Block; 2] {
        let top = -2 * view_height as i64;
        let height = 6 * view_height as i64;
        [
            Block::wall(self.left, top, wall_width, height, false),
            Block::wall(self.right, top, wall_width, height, false),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterPhase {
    Countdown,
    Fighting,
    Defeated,
}

/// Boss countdown, arena, and fight bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossEncounter {
    countdown: Countdown,
    arena: Option<Arena>,
    boss: Option<u64>,
    defeated: bool,
}

impl BossEncounter {
    pub fn new(cfg: &EncounterConfig) -> Self {
        Self {
            countdown: Countdown::new(cfg.boss_countdown),
            arena: None,
            boss: None,
            defeated: false,
        }
    }

    /// Seconds left before the arena seals.
    pub fn remaining(&self) -> f32 {
        self.countdown.remaining
    }

    pub fn arena(&self) -> Option<Arena> {
        self.arena
    }

    pub fn boss(&self) -> Option<u64> {
        self.boss
    }

    pub fn is_sealed(&self) -> bool {
        self.arena.is_some()
    }

    pub fn phase(&self) -> EncounterPhase {
        match (self.arena, self.defeated) {
            (None, _) => EncounterPhase::Countdown,
            (Some(_), false) => EncounterPhase::Fighting,
            (Some(_), true) => EncounterPhase::Defeated,
        }
    }

    /// Advance the countdown. Returns true on the tick the arena should
    /// seal; afterwards the countdown stays frozen.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.arena.is_some() {
            return false;
        }
        self.countdown.tick(dt);
        self.countdown.is_expired()
    }

    /// Seal the arena around the player and remember the boss actor.
    pub fn seal(
        &mut self,
        player_center_x: f32,
        view_width: f32,
        cfg: &EncounterConfig,
        boss: u64,
    ) -> Arena {
        let arena = Arena::around(player_center_x, view_width * cfg.arena_width_factor);
        self.arena = Some(arena);
        self.boss = Some(boss);
        tracing::info!(left = arena.left, right = arena.right, boss, "boss arena sealed");
        arena
    }

    /// Record a defeated actor. Returns true when it was the boss.
    pub fn actor_defeated(&mut self, actor: u64) -> bool {
        if self.boss == Some(actor) && !self.defeated {
            self.defeated = true;
            tracing::info!(boss = actor, "boss defeated");
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerun_core::block::BlockKind;

    #[test]
    fn countdown_fires_once() {
        let cfg = EncounterConfig {
            boss_countdown: 1.0,
            ..EncounterConfig::default()
        };
        let mut enc = BossEncounter::new(&cfg);
        assert_eq!(enc.phase(), EncounterPhase::Countdown);
        assert!(!enc.tick(0.5));
        assert!(enc.tick(0.5), "countdown reaching zero seals the arena");
        enc.seal(500.0, 1000.0, &cfg, 7);
        assert!(!enc.tick(0.5));
        assert!(!enc.tick(10.0));
        assert_eq!(enc.phase(), EncounterPhase::Fighting);
    }

    #[test]
    fn zero_countdown_seals_immediately() {
        let cfg = EncounterConfig {
            boss_countdown: 0.0,
            ..EncounterConfig::default()
        };
        let mut enc = BossEncounter::new(&cfg);
        assert!(enc.tick(1.0 / 60.0));
    }

    #[test]
    fn arena_is_centered_on_player() {
        let cfg = EncounterConfig::default();
        let mut enc = BossEncounter::new(&cfg);
        let arena = enc.seal(2000.0, 1000.0, &cfg, 1);
        assert_eq!(arena, Arena { left: 1250, right: 2750 });
        assert_eq!(arena.width(), 1500);
        assert_eq!(arena.center_x(), 2000.0);
        assert!(arena.keeps(1250) && arena.keeps(2750));
        assert!(!arena.keeps(1249) && !arena.keeps(2751));
        assert_eq!(enc.arena(), Some(arena));
    }

    #[test]
    fn walls_are_visible_and_tall() {
        let arena = Arena { left: 0, right: 1500 };
        let [left, right] = arena.walls(48, 800.0);
        assert_eq!((left.x, left.y, left.width, left.height), (0, -1600, 48, 4800));
        assert_eq!(right.x, 1500);
        assert_eq!(right.kind, BlockKind::Wall);
        assert!(!left.invisible && !right.invisible);
    }

    #[test]
    fn only_the_boss_ends_the_fight() {
        let cfg = EncounterConfig::default();
        let mut enc = BossEncounter::new(&cfg);
        assert!(!enc.actor_defeated(3), "no boss yet");
        enc.seal(0.0, 1000.0, &cfg, 9);
        assert!(!enc.actor_defeated(3));
        assert!(enc.actor_defeated(9));
        assert!(!enc.actor_defeated(9), "reported once");
        assert_eq!(enc.phase(), EncounterPhase::Defeated);
    }
}
