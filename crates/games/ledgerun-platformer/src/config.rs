use serde::{Deserialize, Serialize};

/// Frames per second the physics constants are tuned for.
pub const FPS: f32 = 60.0;
/// Horizontal walk speed (px/tick).
pub const PLAYER_VEL: f32 = 5.0;
/// Tile edge length (px).
pub const BLOCK_SIZE: i64 = 96;
/// Viewport width (px).
pub const VIEW_WIDTH: f32 = 1000.0;
/// Viewport height (px).
pub const VIEW_HEIGHT: f32 = 800.0;
/// Maximum continuous ledge hold (s).
pub const HOLD_MAX: f32 = 10.0;
/// Dash burst duration (s).
pub const DASH_DURATION: f32 = 0.18;
/// Time before another dash is allowed (s).
pub const DASH_COOLDOWN: f32 = 1.0;
/// Stomp duration (s).
pub const STOMP_DURATION: f32 = 0.6;
/// Time before another stomp is allowed (s).
pub const STOMP_COOLDOWN: f32 = 1.5;
/// Gravity ramp multiplier while stomping.
pub const STOMP_GRAVITY_MULTIPLIER: f32 = 3.0;

/// Rejected configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("block_size must be positive, got {0}")]
    BlockSize(i64),

    #[error("fps must be positive and finite, got {0}")]
    Fps(f32),

    #[error("section_width must be at least 1 tile, got {0}")]
    SectionWidth(i64),

    #[error("player size must be positive, got {width}x{height}")]
    PlayerSize { width: f32, height: f32 },

    #[error("max_fall_speed {speed} must be positive and below block_size {block_size}")]
    FallSpeed { speed: f32, block_size: i64 },

    #[error("max_vertical_gap {gap} exceeds the double-jump height {reach:.1}")]
    GapBeyondJump { gap: i64, reach: f32 },
}

/// Player movement tuning. All speeds are per tick unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub fps: f32,
    pub player_vel: f32,
    pub gravity: f32,
    /// Jump sets vertical velocity to `-gravity * jump_impulse`.
    pub jump_impulse: f32,
    pub max_jumps: u8,
    /// Terminal falling speed.
    pub max_fall_speed: f32,
    /// Dash speed in px/s.
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub stomp_gravity_multiplier: f32,
    pub stomp_duration: f32,
    pub stomp_cooldown: f32,
    /// Upward speed after a stomp lands.
    pub stomp_bounce: f32,
    pub stomp_damage: f32,
    pub hold_max: f32,
    pub hold_regrab_cooldown: f32,
    pub invincibility: f32,
    /// Ticks the transient hit flag stays raised.
    pub hit_flag_ticks: u32,
    pub player_width: f32,
    pub player_height: f32,
    pub max_health: f32,
    /// HP regenerated per second.
    pub health_regen: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fps: FPS,
            player_vel: PLAYER_VEL,
            gravity: 1.0,
            jump_impulse: 8.0,
            max_jumps: 2,
            max_fall_speed: 30.0,
            dash_speed: 900.0,
            dash_duration: DASH_DURATION,
            dash_cooldown: DASH_COOLDOWN,
            stomp_gravity_multiplier: STOMP_GRAVITY_MULTIPLIER,
            stomp_duration: STOMP_DURATION,
            stomp_cooldown: STOMP_COOLDOWN,
            stomp_bounce: 10.0,
            stomp_damage: 50.0,
            hold_max: HOLD_MAX,
            hold_regrab_cooldown: 0.25,
            invincibility: 0.5,
            hit_flag_ticks: 120,
            player_width: 50.0,
            player_height: 50.0,
            max_health: 100.0,
            health_regen: 1.0,
        }
    }
}

/// World generator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub block_size: i64,
    /// Tiles per generation section.
    pub section_width: i64,
    /// Highest climb (px) a support may be below a platform.
    pub max_vertical_gap: i64,
    /// Horizontal reach from a support, in blocks.
    pub horizontal_reach_blocks: i64,
    /// Extra spacing (px) between co-height scattered platforms.
    pub min_gap: i64,
    /// Scatter attempts per requested platform.
    pub attempts_per_cube: usize,
    pub connectors_min: u32,
    pub connectors_max: u32,
    pub advanced_min: u32,
    pub advanced_max: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            block_size: BLOCK_SIZE,
            section_width: 20,
            max_vertical_gap: 200,
            horizontal_reach_blocks: 4,
            min_gap: BLOCK_SIZE / 2,
            attempts_per_cube: 80,
            connectors_min: 3,
            connectors_max: 6,
            advanced_min: 2,
            advanced_max: 4,
        }
    }
}

impl GeneratorConfig {
    pub fn section_px(&self) -> i64 {
        self.section_width * self.block_size
    }

    pub fn horizontal_reach(&self) -> i64 {
        self.horizontal_reach_blocks * self.block_size
    }

    /// Most helper rungs a single placement may synthesize.
    pub fn max_helpers(&self) -> i64 {
        self.max_vertical_gap / self.block_size
    }
}

/// Level layout and streaming windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub view_width: f32,
    pub view_height: f32,
    /// Top edge of the ground row.
    pub ground_y: i64,
    pub spawn_x: f32,
    pub spawn_y: f32,
    /// Sections are generated this far beyond the visible area.
    pub generate_margin: f32,
    /// Sections further than this outside the view, on either side, are forgotten.
    pub cleanup_distance: f32,
    /// Scattered blocks further than this outside the view are culled.
    pub cull_margin: f32,
    pub vertical_step_blocks: i64,
    pub cube_batch: usize,
    pub left_wall: bool,
    /// Falling this far below the ground respawns the player.
    pub kill_depth: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            view_width: VIEW_WIDTH,
            view_height: VIEW_HEIGHT,
            ground_y: VIEW_HEIGHT as i64 - BLOCK_SIZE,
            spawn_x: 100.0,
            spawn_y: 100.0,
            generate_margin: 2.0 * VIEW_WIDTH,
            cleanup_distance: 4.0 * VIEW_WIDTH,
            cull_margin: VIEW_WIDTH,
            vertical_step_blocks: 4,
            cube_batch: 8,
            left_wall: true,
            kill_depth: 2000.0,
        }
    }
}

/// Boss countdown and arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Seconds until the arena seals.
    pub boss_countdown: f32,
    /// Arena width as a multiple of the view width.
    pub arena_width_factor: f32,
    pub wall_width: i64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            boss_countdown: 180.0,
            arena_width_factor: 1.5,
            wall_width: 48,
        }
    }
}

/// Monster spawning and behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterConfig {
    pub spawn_interval: f32,
    pub max_monsters: usize,
    pub size: f32,
    /// Chaser speed as a multiple of the player's walk speed.
    pub chaser_speed_factor: f32,
    /// Contact damage per second.
    pub chaser_damage: f32,
    pub patroller_speed: f32,
    pub patroller_detection: f32,
    pub patroller_damage: f32,
    pub boss_size: f32,
    pub boss_hp: f32,
    pub boss_damage: f32,
    /// Boss jump speed as a multiple of the player's walk speed.
    pub boss_jump_factor: f32,
}

impl Default for MonsterConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 3.0,
            max_monsters: 12,
            size: 40.0,
            chaser_speed_factor: 1.5,
            chaser_damage: 10.0,
            patroller_speed: 1.0,
            patroller_detection: 400.0,
            patroller_damage: 5.0,
            boss_size: 100.0,
            boss_hp: 100.0,
            boss_damage: 20.0,
            boss_jump_factor: 4.0,
        }
    }
}

/// Top-level platformer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerConfig {
    pub physics: PhysicsConfig,
    pub generator: GeneratorConfig,
    pub world: WorldConfig,
    pub encounter: EncounterConfig,
    pub monsters: MonsterConfig,
}

impl PlatformerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is
    /// missing, unparseable, or fails validation.
    pub fn load() -> Self {
        let path = std::env::var("LEDGERUN_CONFIG")
            .unwrap_or_else(|_| "config/ledgerun.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to load {path}: {e}, using defaults");
                    PlatformerConfig::default()
                },
            },
            Err(_) => PlatformerConfig::default(),
        }
    }

    /// Parse and validate a TOML document. Omitted keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: PlatformerConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would break the generator's reachability
    /// guarantee or let a fall tunnel through a platform.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        let g = &self.generator;
        if g.block_size <= 0 {
            return Err(ConfigError::BlockSize(g.block_size));
        }
        if !(p.fps.is_finite() && p.fps > 0.0) {
            return Err(ConfigError::Fps(p.fps));
        }
        if g.section_width < 1 {
            return Err(ConfigError::SectionWidth(g.section_width));
        }
        if !(p.player_width > 0.0 && p.player_height > 0.0) {
            return Err(ConfigError::PlayerSize {
                width: p.player_width,
                height: p.player_height,
            });
        }
        if !(p.max_fall_speed > 0.0 && p.max_fall_speed < g.block_size as f32) {
            return Err(ConfigError::FallSpeed {
                speed: p.max_fall_speed,
                block_size: g.block_size,
            });
        }
        let reach = crate::physics::jump_envelope(p).double;
        if g.max_vertical_gap as f32 > reach {
            return Err(ConfigError::GapBeyondJump {
                gap: g.max_vertical_gap,
                reach,
            });
        }
        Ok(())
    }
}
