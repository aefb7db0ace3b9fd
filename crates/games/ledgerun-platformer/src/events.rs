use ledgerun_core::block::BlockId;
use serde::{Deserialize, Serialize};

use crate::actors::ActorKind;

/// Why a ledge hold ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseReason {
    KeyReleased,
    Jumped,
    Timeout,
    /// The held block is no longer in the world.
    BlockMissing,
}

/// Things that happened during one simulation tick, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Jumped { jump_count: u8 },
    Landed,
    HitHead,
    DashStarted { dir: f32 },
    DashEnded,
    StompStarted,
    StompEnded,
    /// A stomp landed on these blocks.
    StompImpact { blocks: Vec<BlockId> },
    BlockBroken { block: BlockId },
    LedgeGrabbed { block: BlockId },
    LedgeReleased { reason: ReleaseReason },
    Damaged { amount: f32, health: f32 },
    PlayerDied,
    Respawned,
    SectionsGenerated { sections: Vec<i64>, blocks: usize },
    SectionsForgotten { sections: Vec<i64>, blocks: usize },
    PlatformsScattered { blocks: usize },
    MonsterSpawned { actor: u64, kind: ActorKind },
    MonsterDefeated { actor: u64, kind: ActorKind },
    ArenaSealed { left: i64, right: i64 },
    BossSpawned { actor: u64 },
}
