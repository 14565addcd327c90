//! Scripted spawning for level mode.
//!
//! A level's events are authored in world coordinates. The world scrolls at
//! `move_speed` units per frame, so after `timer_ms` the player has travelled
//! `(timer_ms / frame_ms) * move_speed` units. An event with an `x` fires
//! once its converted screen position is about to enter the right edge;
//! events without one fire when the level timer reaches their `time`.

use std::collections::VecDeque;

use glam::DVec2;

use dash_core::config::GameConfig;
use dash_core::level::{EventParams, LevelFile, TimelineAction, TimelineEvent, VictoryKind};

use crate::entities::{
    Asteroid, CeilingSpike, Coin, EntityRegistry, GreenOrb, Obstacle, OrangeOrb, Portal, Stair,
    COIN_POINTS, GREEN_ORB_SIZE, ORANGE_ORB_SIZE, PORTAL_SIZE, SPIKE_SIZE,
};

/// How far past the right edge an event may be converted and still spawn.
const SPAWN_LOOKAHEAD: f64 = 50.0;
pub const COMPLETION_BONUS: i64 = 500;
pub const COMPLETION_NOTICE_MS: f64 = 3000.0;

pub struct TimelinePlayer {
    level: LevelFile,
    queue: VecDeque<TimelineEvent>,
    pub timer_ms: f64,
    fired: usize,
}

impl TimelinePlayer {
    pub fn new(level: LevelFile) -> Self {
        let queue = sorted_queue(&level);
        Self {
            level,
            queue,
            timer_ms: 0.0,
            fired: 0,
        }
    }

    pub fn level(&self) -> &LevelFile {
        &self.level
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn fired_events(&self) -> usize {
        self.fired
    }

    /// Rewind to the first event, keeping the loaded level.
    pub fn restart(&mut self) {
        self.queue = sorted_queue(&self.level);
        self.timer_ms = 0.0;
        self.fired = 0;
    }

    /// Advance one frame and fire every event that has come due. Returns the
    /// number of events fired.
    pub fn update(&mut self, entities: &mut EntityRegistry, config: &GameConfig) -> usize {
        self.timer_ms += config.frame_ms();

        let mut fired = 0;
        while let Some(event) = self.queue.front() {
            let screen_x = event
                .params
                .x
                .map(|x| world_to_screen_x(x, self.timer_ms, config));
            let due = match screen_x {
                Some(screen_x) => screen_x <= config.canvas_width + SPAWN_LOOKAHEAD,
                None => event.time <= self.timer_ms,
            };
            if !due {
                break;
            }
            if let Some(event) = self.queue.pop_front() {
                execute_event(&event, screen_x, entities, config);
                fired += 1;
            }
        }
        self.fired += fired;
        fired
    }

    pub fn check_victory(&self, score: f64, config: &GameConfig) -> bool {
        let condition = self.level.victory_condition;
        match condition.kind {
            VictoryKind::Survival => self.timer_ms >= condition.target,
            VictoryKind::Score => score >= condition.target,
            VictoryKind::Distance => self.timer_ms * config.move_speed >= condition.target,
        }
    }

    /// Percentage of the nominal duration elapsed, capped at 100.
    pub fn progress(&self) -> f64 {
        if self.level.duration == 0 {
            return 100.0;
        }
        (self.timer_ms / self.level.duration as f64 * 100.0).min(100.0)
    }
}

fn sorted_queue(level: &LevelFile) -> VecDeque<TimelineEvent> {
    let mut events = level.timeline.clone();
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events.into()
}

pub fn world_to_screen_x(world_x: f64, timer_ms: f64, config: &GameConfig) -> f64 {
    let travelled = (timer_ms / config.frame_ms()) * config.move_speed;
    world_x - travelled + config.player_screen_x
}

fn execute_event(
    event: &TimelineEvent,
    screen_x: Option<f64>,
    entities: &mut EntityRegistry,
    config: &GameConfig,
) {
    let Some(action) = TimelineAction::from_name(&event.action) else {
        log::warn!("Unknown timeline action '{}', skipping", event.action);
        return;
    };
    let params = &event.params;
    let gh = config.ground_height;
    let x = screen_x.unwrap_or(config.canvas_width + 20.0);
    log::debug!("Timeline {:?} at t={} x={x:.1}", action, event.time);

    match action {
        TimelineAction::SpawnCoin => entities.coins.push(Coin::new(
            x,
            params.y.unwrap_or(gh - 30.0),
            params.points.unwrap_or(COIN_POINTS),
        )),
        TimelineAction::SpawnSpike => entities
            .obstacles
            .push(Obstacle::new(x, params.y.unwrap_or(gh - SPIKE_SIZE))),
        TimelineAction::SpawnStair => entities.stairs.push(Stair::new(
            x,
            params.y.unwrap_or(gh - 50.0),
            params.width.unwrap_or(60.0),
            params.height.unwrap_or(50.0),
        )),
        TimelineAction::SpawnPortal => entities.portals.push(portal_from(params, x, gh)),
        TimelineAction::SpawnGreenPortal => entities.green_portals.push(portal_from(params, x, gh)),
        TimelineAction::SpawnOrangeOrb => entities.orange_orbs.push(OrangeOrb::new(
            x,
            params.y.unwrap_or(gh - 80.0),
            params.size.unwrap_or(ORANGE_ORB_SIZE),
        )),
        TimelineAction::SpawnGreenOrb => entities.green_orbs.push(GreenOrb::new(
            x,
            params.y.unwrap_or(gh - 90.0),
            params.size.unwrap_or(GREEN_ORB_SIZE),
        )),
        TimelineAction::SpawnAsteroid => entities.asteroids.push(Asteroid::new(
            x,
            params.y.unwrap_or(200.0),
            params.size.unwrap_or(50.0),
            params.rotation_speed.unwrap_or(0.05),
        )),
        TimelineAction::SpawnCeilingSpike => entities.ceiling_spikes.push(CeilingSpike::new(
            x,
            params.y.unwrap_or(30.0),
            params.width.unwrap_or(20.0),
            params.height.unwrap_or(20.0),
        )),
    }
}

fn portal_from(params: &EventParams, x: f64, ground_height: f64) -> Portal {
    Portal::new(
        x,
        params.y.unwrap_or(ground_height - 120.0),
        params.width.unwrap_or(PORTAL_SIZE),
        params.height.unwrap_or(PORTAL_SIZE),
    )
}

/// Notification shown when a level is beaten.
pub fn announce_completion(entities: &mut EntityRegistry, config: &GameConfig) {
    entities.notify(
        format!("LEVEL COMPLETE! +{COMPLETION_BONUS}"),
        DVec2::new(config.canvas_width / 2.0, config.canvas_height / 2.0),
        COMPLETION_NOTICE_MS,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::level::{parse_level, VictoryCondition};

    fn level_with(victory: &str, timeline: &str) -> LevelFile {
        parse_level(&format!(
            r#"{{
                "levelId": "level-1",
                "name": "Test",
                "duration": 10000,
                "victoryCondition": {victory},
                "timeline": {timeline}
            }}"#
        ))
        .expect("test level parses")
    }

    #[test]
    fn events_fire_in_time_order() {
        let level = level_with(
            r#"{"type":"survival","target":99999}"#,
            r#"[
                {"time": 48, "action": "spawnStair"},
                {"time": 16, "action": "spawnCoin"},
                {"time": 32, "action": "spawnOrangeOrb", "params": {"y": 100}}
            ]"#,
        );
        let config = GameConfig::default();
        let mut entities = EntityRegistry::new();
        let mut timeline = TimelinePlayer::new(level);

        assert_eq!(timeline.update(&mut entities, &config), 1);
        assert_eq!(entities.coins.len(), 1);
        assert_eq!(entities.coins[0].bounds.y, config.ground_height - 30.0);
        assert_eq!(entities.coins[0].bounds.x, config.canvas_width + 20.0);

        assert_eq!(timeline.update(&mut entities, &config), 1);
        assert_eq!(entities.orange_orbs[0].bounds.y, 100.0);

        assert_eq!(timeline.update(&mut entities, &config), 1);
        assert_eq!(entities.stairs[0].bounds.width, 60.0);
        assert_eq!(timeline.pending_events(), 0);
    }

    #[test]
    fn world_x_converts_with_scroll_distance() {
        let config = GameConfig::default();
        assert_eq!(world_to_screen_x(1000.0, 0.0, &config), 1100.0);
        // 16 frames at 5 units per frame.
        assert_eq!(world_to_screen_x(1000.0, 256.0, &config), 1020.0);
    }

    #[test]
    fn positioned_event_waits_until_near_right_edge() {
        let level = level_with(
            r#"{"type":"survival","target":99999}"#,
            r#"[{"time": 0, "action": "spawnSpike", "params": {"x": 900}}]"#,
        );
        let config = GameConfig::default();
        let mut entities = EntityRegistry::new();
        let mut timeline = TimelinePlayer::new(level);

        // Screen x = 1000 - 5n; due once <= 850, i.e. on frame 30.
        for _ in 0..29 {
            timeline.update(&mut entities, &config);
        }
        assert!(entities.obstacles.is_empty());
        timeline.update(&mut entities, &config);
        assert_eq!(entities.obstacles.len(), 1);
        assert_eq!(entities.obstacles[0].bounds.x, 850.0);
        assert_eq!(
            entities.obstacles[0].bounds.y,
            config.ground_height - SPIKE_SIZE
        );
    }

    #[test]
    fn unknown_actions_are_consumed_without_spawning() {
        let level = level_with(
            r#"{"type":"survival","target":99999}"#,
            r#"[{"time": 0, "action": "spawnDragon"}, {"time": 0, "action": "spawnCeilingSpike"}]"#,
        );
        let config = GameConfig::default();
        let mut entities = EntityRegistry::new();
        let mut timeline = TimelinePlayer::new(level);
        assert_eq!(timeline.update(&mut entities, &config), 2);
        assert_eq!(entities.world_entity_count(), 1);
        assert_eq!(entities.ceiling_spikes[0].bounds.y, 30.0);
    }

    #[test]
    fn asteroid_and_portal_defaults() {
        let level = level_with(
            r#"{"type":"survival","target":99999}"#,
            r#"[{"action": "spawnAsteroid"}, {"action": "spawnGreenPortal"}, {"action": "spawnCoin", "params": {"points": 25}}]"#,
        );
        let config = GameConfig::default();
        let mut entities = EntityRegistry::new();
        let mut timeline = TimelinePlayer::new(level);
        timeline.update(&mut entities, &config);

        let asteroid = &entities.asteroids[0];
        assert_eq!(asteroid.bounds.y, 200.0);
        assert_eq!(asteroid.bounds.width, 50.0);
        assert_eq!(asteroid.rotation_speed, 0.05);
        assert_eq!(entities.green_portals[0].bounds.height, PORTAL_SIZE);
        assert_eq!(entities.coins[0].points, 25);
    }

    #[test]
    fn victory_conditions() {
        let config = GameConfig::default();
        let mut survival = TimelinePlayer::new(level_with(
            r#"{"type":"survival","target":32}"#,
            "[]",
        ));
        assert!(!survival.check_victory(0.0, &config));
        survival.timer_ms = 32.0;
        assert!(survival.check_victory(0.0, &config));

        let score = TimelinePlayer::new(level_with(r#"{"type":"score","target":500}"#, "[]"));
        assert!(!score.check_victory(499.9, &config));
        assert!(score.check_victory(500.0, &config));

        let mut distance =
            TimelinePlayer::new(level_with(r#"{"type":"distance","target":5000}"#, "[]"));
        distance.timer_ms = 992.0;
        assert!(!distance.check_victory(0.0, &config));
        distance.timer_ms = 1000.0;
        assert!(distance.check_victory(0.0, &config));
        assert_eq!(
            distance.level().victory_condition,
            VictoryCondition {
                kind: VictoryKind::Distance,
                target: 5000.0
            }
        );
    }

    #[test]
    fn progress_caps_at_hundred_and_restart_rewinds() {
        let level = level_with(
            r#"{"type":"survival","target":99999}"#,
            r#"[{"time": 16, "action": "spawnCoin"}]"#,
        );
        let config = GameConfig::default();
        let mut entities = EntityRegistry::new();
        let mut timeline = TimelinePlayer::new(level);
        timeline.update(&mut entities, &config);
        assert_eq!(timeline.fired_events(), 1);
        assert!((timeline.progress() - 0.16).abs() < 1e-9);

        timeline.timer_ms = 50_000.0;
        assert_eq!(timeline.progress(), 100.0);

        timeline.restart();
        assert_eq!(timeline.timer_ms, 0.0);
        assert_eq!(timeline.pending_events(), 1);
        assert_eq!(timeline.fired_events(), 0);
    }
}
