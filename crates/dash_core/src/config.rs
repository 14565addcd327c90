//! Tunable game constants.
//!
//! `GameConfig::default()` is the endless-mode baseline. A level may override
//! a subset through its `gameConstants` block; switching back to endless mode
//! starts again from the default.

use crate::level::GameConstants;
use crate::time::FRAME_TIME_MS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Top of the ground strip in screen space.
    pub ground_height: f64,
    pub ceiling_y: f64,

    pub player_size: f64,
    pub player_screen_x: f64,
    pub gravity: f64,
    pub jump_force: f64,
    /// Scroll speed in units per frame.
    pub move_speed: f64,

    pub flying_gravity: f64,
    pub thrust_power: f64,
    pub air_resistance: f64,
    pub max_vertical_speed: f64,
    pub jet_width: f64,
    pub jet_height: f64,

    pub frame_time_ms: u32,
    pub flying_duration_ms: f64,
    pub up_down_duration_ms: f64,
    pub up_down_transition_ms: f64,
    pub toggle_debounce_ms: f64,
    pub invincibility_duration_ms: f64,
    pub super_invincibility_duration_ms: f64,
    pub auto_replay_delay_ms: f64,

    /// Score distance between portal spawns.
    pub portal_spawn_interval: f64,
    pub orb_spawn_interval: f64,
    pub green_orb_spawn_interval: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 400.0,
            ground_height: 350.0,
            ceiling_y: 50.0,

            player_size: 30.0,
            player_screen_x: 100.0,
            gravity: 0.8,
            jump_force: -15.0,
            move_speed: 5.0,

            flying_gravity: 0.4,
            thrust_power: -0.5,
            air_resistance: 0.9,
            max_vertical_speed: 8.0,
            jet_width: 40.0,
            jet_height: 20.0,

            frame_time_ms: FRAME_TIME_MS,
            flying_duration_ms: 30_000.0,
            up_down_duration_ms: 25_000.0,
            up_down_transition_ms: 800.0,
            toggle_debounce_ms: 200.0,
            invincibility_duration_ms: 10_000.0,
            super_invincibility_duration_ms: 8_000.0,
            auto_replay_delay_ms: 1_000.0,

            portal_spawn_interval: 30_000.0,
            orb_spawn_interval: 100.0,
            green_orb_spawn_interval: 1_000.0,
        }
    }
}

impl GameConfig {
    /// Resting y of the square player.
    pub fn ground_y(&self) -> f64 {
        self.ground_height - self.player_size
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_time_ms as f64
    }

    pub fn green_portal_spawn_interval(&self) -> f64 {
        self.portal_spawn_interval * 1.5
    }

    pub fn apply_overrides(&mut self, overrides: &GameConstants) {
        let fields: [(&mut f64, Option<f64>); 10] = [
            (&mut self.player_size, overrides.player_size),
            (&mut self.gravity, overrides.gravity),
            (&mut self.jump_force, overrides.jump_force),
            (&mut self.move_speed, overrides.move_speed),
            (&mut self.portal_spawn_interval, overrides.portal_spawn_interval),
            (&mut self.flying_duration_ms, overrides.flying_duration),
            (&mut self.invincibility_duration_ms, overrides.invincibility_duration),
            (
                &mut self.super_invincibility_duration_ms,
                overrides.super_invincibility_duration,
            ),
            (&mut self.orb_spawn_interval, overrides.orb_spawn_interval),
            (&mut self.green_orb_spawn_interval, overrides.green_orb_spawn_interval),
        ];
        for (slot, value) in fields {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                *slot = value;
            }
        }
    }

    /// Ground sits one eighth of the canvas height above the bottom edge.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas_width = width;
        self.canvas_height = height;
        self.ground_height = height - height * 0.125;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_baseline_tuning() {
        let config = GameConfig::default();
        assert_eq!(config.ground_y(), 320.0);
        assert_eq!(config.green_portal_spawn_interval(), 45_000.0);
        assert_eq!(config.frame_ms(), 16.0);
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let mut config = GameConfig::default();
        config.apply_overrides(&GameConstants {
            move_speed: Some(7.0),
            flying_duration: Some(5_000.0),
            gravity: Some(f64::NAN),
            ..GameConstants::default()
        });
        assert_eq!(config.move_speed, 7.0);
        assert_eq!(config.flying_duration_ms, 5_000.0);
        assert_eq!(config.gravity, 0.8);
        assert_eq!(config.jump_force, -15.0);
    }

    #[test]
    fn resize_recomputes_ground() {
        let mut config = GameConfig::default();
        config.resize(1200.0, 800.0);
        assert_eq!(config.canvas_width, 1200.0);
        assert!((config.ground_height - 700.0).abs() < 1e-9);
        assert!((config.ground_y() - 670.0).abs() < 1e-9);
    }
}
