use std::f64::consts::PI;

use dash_core::config::GameConfig;

use crate::collision::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerForm {
    Square,
    Jet,
}

/// Where the player rests while in up-down mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Ground,
    Ceiling,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub bounds: Aabb,
    pub velocity_y: f64,
    pub airborne: bool,
    pub rotation: f64,
    pub form: PlayerForm,
}

impl Player {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            bounds: Aabb::square(config.player_screen_x, config.ground_y(), config.player_size),
            velocity_y: 0.0,
            airborne: false,
            rotation: 0.0,
            form: PlayerForm::Square,
        }
    }

    pub fn reset(&mut self, config: &GameConfig) {
        *self = Self::new(config);
    }

    /// Resting y for the current size.
    pub fn ground_y(&self, config: &GameConfig) -> f64 {
        config.ground_height - self.bounds.height
    }

    /// Jump is only legal from the ground (or a stair top).
    pub fn jump(&mut self, config: &GameConfig) -> bool {
        if self.airborne {
            return false;
        }
        self.velocity_y = config.jump_force;
        self.airborne = true;
        true
    }

    pub fn step_normal(&mut self, config: &GameConfig) {
        self.velocity_y += config.gravity;
        self.bounds.y += self.velocity_y;

        let ground_y = self.ground_y(config);
        if self.bounds.y >= ground_y {
            self.bounds.y = ground_y;
            self.velocity_y = 0.0;
            self.airborne = false;
        }
    }

    pub fn step_flying(&mut self, thrust_held: bool, config: &GameConfig) {
        self.velocity_y += if thrust_held {
            config.thrust_power
        } else {
            config.flying_gravity
        };
        self.velocity_y *= config.air_resistance;
        self.velocity_y = self
            .velocity_y
            .clamp(-config.max_vertical_speed, config.max_vertical_speed);
        self.bounds.y += self.velocity_y;

        // Screen edges stop the jet dead.
        if self.bounds.y < 0.0 {
            self.bounds.y = 0.0;
            self.velocity_y = 0.0;
        }
        let floor = config.canvas_height - self.bounds.height;
        if self.bounds.y > floor {
            self.bounds.y = floor;
            self.velocity_y = 0.0;
        }
    }

    pub fn land_on(&mut self, platform: &Aabb) {
        self.bounds.y = platform.y - self.bounds.height;
        self.velocity_y = 0.0;
        self.airborne = false;
    }

    pub fn snap_to_ground(&mut self, config: &GameConfig) {
        self.bounds.y = self.ground_y(config);
        self.velocity_y = 0.0;
        self.airborne = false;
    }

    pub fn transform_to_jet(&mut self, config: &GameConfig) {
        self.form = PlayerForm::Jet;
        self.bounds.width = config.jet_width;
        self.bounds.height = config.jet_height;
        self.bounds.y = config.canvas_height / 2.0;
    }

    pub fn transform_to_square(&mut self, config: &GameConfig) {
        self.form = PlayerForm::Square;
        self.bounds.width = config.player_size;
        self.bounds.height = config.player_size;
    }
}

/// Ceiling/floor swapping used in up-down mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpDownMotion {
    pub position: PositionState,
    pub transition_timer_ms: f64,
    pub start_y: f64,
    pub target_y: f64,
    last_toggle_ms: Option<f64>,
}

impl Default for UpDownMotion {
    fn default() -> Self {
        Self {
            position: PositionState::Ground,
            transition_timer_ms: 0.0,
            start_y: 0.0,
            target_y: 0.0,
            last_toggle_ms: None,
        }
    }
}

impl UpDownMotion {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Back to resting on the ground with no swap in flight. The debounce
    /// window carries over.
    pub fn settle_on_ground(&mut self) {
        self.position = PositionState::Ground;
        self.transition_timer_ms = 0.0;
    }

    /// Begin a swap to the opposite surface. Requests closer than the
    /// debounce window to the previous accepted request are dropped, and a
    /// swap already in flight is never interrupted.
    pub fn toggle(&mut self, player: &Player, now_ms: f64, config: &GameConfig) -> bool {
        if let Some(last) = self.last_toggle_ms {
            if now_ms - last <= config.toggle_debounce_ms {
                return false;
            }
        }
        self.last_toggle_ms = Some(now_ms);

        let target_y = match self.position {
            PositionState::Transitioning => return false,
            PositionState::Ground => config.ceiling_y,
            PositionState::Ceiling => player.ground_y(config),
        };
        self.start_y = player.bounds.y;
        self.target_y = target_y;
        self.transition_timer_ms = 0.0;
        self.position = PositionState::Transitioning;
        log::debug!("Up-down swap {:.1} -> {:.1}", self.start_y, self.target_y);
        true
    }

    /// Advance an in-flight swap by one frame.
    pub fn advance(&mut self, player: &mut Player, config: &GameConfig) {
        if self.position != PositionState::Transitioning {
            player.rotation = 0.0;
            return;
        }
        self.transition_timer_ms += config.frame_ms();
        let progress = self.progress(config);
        let eased = 0.5 * (1.0 - (PI * progress).cos());
        player.bounds.y = self.start_y + (self.target_y - self.start_y) * eased;
        player.rotation = (PI * progress).sin() * 0.5;

        if progress >= 1.0 {
            player.bounds.y = self.target_y;
            player.rotation = 0.0;
            self.transition_timer_ms = 0.0;
            self.position = if self.target_y == config.ceiling_y {
                PositionState::Ceiling
            } else {
                PositionState::Ground
            };
        }
    }

    pub fn progress(&self, config: &GameConfig) -> f64 {
        if config.up_down_transition_ms <= 0.0 {
            return 1.0;
        }
        (self.transition_timer_ms / config.up_down_transition_ms).min(1.0)
    }
}
