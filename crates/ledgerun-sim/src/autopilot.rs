use ledgerun_platformer::physics::{MotionInput, PlayerState};

/// Ticks between scheduled jumps.
const JUMP_EVERY: u64 = 50;
/// Ticks between dash attempts.
const DASH_EVERY: u64 = 150;
/// Ticks between stomp attempts.
const STOMP_EVERY: u64 = 230;
/// Ticks spent hanging on a ledge before jumping off it.
const HOLD_TICKS: u64 = 20;

/// Scripted input: run right, jump over obstacles and on a timer, dash and
/// stomp now and then, and climb ledges it catches.
#[derive(Debug, Default)]
pub struct Autopilot {
    tick: u64,
    last_x: Option<f32>,
    held_for: u64,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_input(&mut self, player: &PlayerState) -> MotionInput {
        self.tick += 1;
        let x = player.rect.x;
        let stuck = self.last_x.is_some_and(|last| (x - last).abs() < 0.5);
        self.last_x = Some(x);

        let mut input = MotionInput {
            right: true,
            hold: true,
            ..MotionInput::default()
        };

        if player.is_holding() {
            self.held_for += 1;
            if self.held_for >= HOLD_TICKS {
                input.hold_jump = true;
                self.held_for = 0;
            }
            return input;
        }
        self.held_for = 0;

        input.jump = (stuck && player.is_normal()) || self.tick % JUMP_EVERY == 0;
        input.dash = self.tick % DASH_EVERY == 0;
        input.stomp = self.tick % STOMP_EVERY == 0 && player.is_airborne() && player.vy > 0.0;
        input
    }
}
