//! Top-level game state machine and per-frame orchestration.
//!
//! A `Session` owns everything a run needs: the player, every entity list,
//! score, power-ups, mode timers and the optional level timeline. The host
//! drives it with one `tick()` per virtual 16 ms frame. Each running frame
//! does, in order:
//!
//! 1. advance the top-level state (transitions, mode timers)
//! 2. player physics for the current state
//! 3. scroll entities, asteroids while flying, procedural generation
//!    (endless mode)
//! 4. level timeline and victory check (level mode)
//! 5. portal contact, hazards and pickups
//! 6. power-up timers and continuous score

use glam::DVec2;
use rand::Rng;

use dash_core::config::GameConfig;
use dash_core::input::FrameInput;
use dash_core::level::LevelFile;
use dash_core::store::{LevelSource, StoreError};

use crate::collision::{boxes_overlap, circular_overlap, landing_check, side_collision_check};
use crate::entities::EntityRegistry;
use crate::player::{Player, PlayerForm, UpDownMotion};
use crate::spawner::{self, SpawnCounters};
use crate::timeline::{announce_completion, TimelinePlayer, COMPLETION_BONUS};

const ORANGE_ORB_POINTS: i64 = 25;
const GREEN_ORB_POINTS: i64 = 100;
const PROXIMITY_RADIUS: f64 = 80.0;
const PROXIMITY_NOTICE_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Normal,
    PortalTransition,
    Flying,
    /// Pass-through back to `Normal`; nothing currently enters it.
    PortalExit,
    GreenPortalTransition,
    UpDownMode,
    /// Pass-through back to `Normal`; nothing currently enters it.
    UpDownExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Endless,
    Level,
}

/// Score in thousandths of a point, so per-frame fractional accrual sums
/// exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(i64);

impl Score {
    const SCALE: f64 = 1000.0;

    pub fn from_points(points: f64) -> Self {
        Self((points * Self::SCALE).round() as i64)
    }

    pub fn add_points(&mut self, points: f64) {
        self.0 = self.0.saturating_add((points * Self::SCALE).round() as i64);
    }

    pub fn add_whole(&mut self, points: i64) {
        self.0 = self
            .0
            .saturating_add(points.saturating_mul(Self::SCALE as i64));
    }

    pub fn points(&self) -> f64 {
        self.0 as f64 / Self::SCALE
    }

    /// Floored integer score, as displayed and stored.
    pub fn whole(&self) -> i64 {
        self.0.div_euclid(Self::SCALE as i64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerUps {
    pub invincible: bool,
    pub invincibility_timer_ms: f64,
    pub super_invincible: bool,
    pub super_invincibility_timer_ms: f64,
}

impl PowerUps {
    pub fn any(&self) -> bool {
        self.invincible || self.super_invincible
    }

    fn grant_invincibility(&mut self) {
        self.invincible = true;
        self.invincibility_timer_ms = 0.0;
    }

    fn grant_super_invincibility(&mut self) {
        self.super_invincible = true;
        self.super_invincibility_timer_ms = 0.0;
    }

    fn advance(&mut self, config: &GameConfig) {
        let frame_ms = config.frame_ms();
        if self.invincible {
            self.invincibility_timer_ms += frame_ms;
            if self.invincibility_timer_ms >= config.invincibility_duration_ms {
                self.invincible = false;
                self.invincibility_timer_ms = 0.0;
                log::info!("Invincibility ended");
            }
        }
        if self.super_invincible {
            self.super_invincibility_timer_ms += frame_ms;
            if self.super_invincibility_timer_ms >= config.super_invincibility_duration_ms {
                self.super_invincible = false;
                self.super_invincibility_timer_ms = 0.0;
                log::info!("Super invincibility ended");
            }
        }
    }
}

pub struct Session {
    /// Active constants (base plus any level overrides).
    pub config: GameConfig,
    base_config: GameConfig,
    pub state: GameState,
    pub mode: GameMode,
    pub player: Player,
    pub up_down: UpDownMotion,
    pub entities: EntityRegistry,
    pub score: Score,
    pub power_ups: PowerUps,
    pub counters: SpawnCounters,
    pub flying_timer_ms: f64,
    pub up_down_timer_ms: f64,
    /// Running time of the current attempt; debounces up-down toggles.
    pub elapsed_ms: f64,
    pub frame: u64,
    pub started: bool,
    pub paused: bool,
    pub game_over: bool,
    pub level_complete: bool,
    pub auto_replay: bool,
    auto_replay_timer_ms: f64,
    timeline: Option<TimelinePlayer>,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            base_config: config,
            state: GameState::Normal,
            mode: GameMode::Endless,
            player: Player::new(&config),
            up_down: UpDownMotion::default(),
            entities: EntityRegistry::new(),
            score: Score::default(),
            power_ups: PowerUps::default(),
            counters: SpawnCounters::default(),
            flying_timer_ms: 0.0,
            up_down_timer_ms: 0.0,
            elapsed_ms: 0.0,
            frame: 0,
            started: false,
            paused: false,
            game_over: false,
            level_complete: false,
            auto_replay: false,
            auto_replay_timer_ms: 0.0,
            timeline: None,
        }
    }

    pub fn timeline(&self) -> Option<&TimelinePlayer> {
        self.timeline.as_ref()
    }

    pub fn start(&mut self) {
        if !self.started {
            log::info!("Session started in {:?} mode", self.mode);
        }
        self.started = true;
    }

    pub fn toggle_pause(&mut self) {
        if !self.started || self.game_over {
            return;
        }
        self.paused = !self.paused;
        log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
    }

    pub fn toggle_auto_replay(&mut self) {
        self.auto_replay = !self.auto_replay;
        log::info!("Auto replay {}", if self.auto_replay { "on" } else { "off" });
    }

    /// Fresh attempt in the current mode. A loaded level is kept and rewound.
    pub fn restart(&mut self) {
        self.player.reset(&self.config);
        self.up_down.reset();
        self.entities.clear();
        self.score = Score::default();
        self.power_ups = PowerUps::default();
        self.counters = SpawnCounters::default();
        self.state = GameState::Normal;
        self.flying_timer_ms = 0.0;
        self.up_down_timer_ms = 0.0;
        self.elapsed_ms = 0.0;
        self.frame = 0;
        self.paused = false;
        self.game_over = false;
        self.level_complete = false;
        self.auto_replay_timer_ms = 0.0;
        if let Some(timeline) = &mut self.timeline {
            timeline.restart();
        }
        log::info!("Session restarted");
    }

    /// Fetch and start a level. On failure the session falls back to endless
    /// mode and the error is returned for the host to report.
    pub fn load_level(
        &mut self,
        source: &impl LevelSource,
        level_id: &str,
    ) -> Result<(), StoreError> {
        match source.fetch_level(level_id) {
            Ok(level) => {
                self.start_level(level);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load level '{level_id}': {e}. Falling back to endless mode");
                self.switch_to_endless();
                Err(e)
            }
        }
    }

    pub fn start_level(&mut self, level: LevelFile) {
        self.config = self.base_config;
        if let Some(overrides) = &level.game_constants {
            self.config.apply_overrides(overrides);
        }
        log::info!(
            "Level loaded: {} ({}), {} events",
            level.name,
            level.level_id,
            level.timeline.len()
        );
        self.mode = GameMode::Level;
        self.timeline = Some(TimelinePlayer::new(level));
        self.restart();
        self.started = true;
    }

    pub fn switch_to_endless(&mut self) {
        self.mode = GameMode::Endless;
        self.timeline = None;
        self.config = self.base_config;
        self.restart();
        self.started = true;
        log::info!("Switched to endless mode");
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.base_config.resize(width, height);
        self.config.resize(width, height);
        self.entities.reseat_on_ground(self.config.ground_height);
        if self.started {
            self.player.snap_to_ground(&self.config);
        }
        log::debug!("Resized to {width}x{height}");
    }

    /// Level progress in percent; zero outside level mode.
    pub fn level_progress(&self) -> f64 {
        self.timeline.as_ref().map_or(0.0, TimelinePlayer::progress)
    }

    /// One virtual frame.
    pub fn tick(&mut self, input: FrameInput, rng: &mut impl Rng) {
        if self.paused || !self.started {
            return;
        }
        if self.game_over {
            self.run_auto_replay();
            return;
        }
        if self.level_complete {
            return;
        }

        let frame_ms = self.config.frame_ms();
        self.frame += 1;
        self.elapsed_ms += frame_ms;

        self.advance_state();
        self.update_player(input);

        self.entities.update(self.config.move_speed, frame_ms);
        if self.state == GameState::Flying {
            spawner::spawn_asteroid(&mut self.entities, &self.config, rng);
        }
        if self.mode == GameMode::Endless {
            spawner::generate(
                &mut self.entities,
                &self.config,
                self.state,
                self.score.points(),
                &mut self.counters,
                rng,
            );
        }
        if let Some(timeline) = &mut self.timeline {
            timeline.update(&mut self.entities, &self.config);
        }
        if self.check_level_victory() {
            return;
        }

        self.check_portals();
        self.check_collisions(rng);
        if self.game_over {
            return;
        }

        self.power_ups.advance(&self.config);
        self.accrue_score();
    }

    /// Complete the level if its victory condition holds. Returns true only
    /// on the frame the level is completed.
    pub fn check_level_victory(&mut self) -> bool {
        if self.level_complete {
            return false;
        }
        let Some(timeline) = &self.timeline else {
            return false;
        };
        if !timeline.check_victory(self.score.points(), &self.config) {
            return false;
        }
        self.level_complete = true;
        self.score.add_whole(COMPLETION_BONUS);
        announce_completion(&mut self.entities, &self.config);
        log::info!(
            "Level '{}' complete, score {}",
            timeline.level().level_id,
            self.score.whole()
        );
        true
    }

    fn run_auto_replay(&mut self) {
        if !self.auto_replay {
            return;
        }
        self.auto_replay_timer_ms += self.config.frame_ms();
        if self.auto_replay_timer_ms >= self.config.auto_replay_delay_ms {
            self.restart();
        }
    }

    fn advance_state(&mut self) {
        let frame_ms = self.config.frame_ms();
        match self.state {
            GameState::Normal => {}
            GameState::PortalTransition => self.state = GameState::Flying,
            GameState::GreenPortalTransition => self.state = GameState::UpDownMode,
            GameState::PortalExit | GameState::UpDownExit => self.state = GameState::Normal,
            GameState::Flying => {
                self.flying_timer_ms += frame_ms;
                if self.flying_timer_ms >= self.config.flying_duration_ms {
                    self.state = GameState::Normal;
                    self.player.transform_to_square(&self.config);
                    self.player.snap_to_ground(&self.config);
                    log::info!("Flying mode ended");
                }
            }
            GameState::UpDownMode => {
                self.up_down_timer_ms += frame_ms;
                if self.up_down_timer_ms >= self.config.up_down_duration_ms {
                    self.state = GameState::Normal;
                    self.up_down.settle_on_ground();
                    self.player.rotation = 0.0;
                    self.player.snap_to_ground(&self.config);
                    log::info!("Up-down mode ended");
                }
            }
        }
    }

    fn update_player(&mut self, input: FrameInput) {
        match self.state {
            GameState::Normal => {
                if input.jump_pressed {
                    self.player.jump(&self.config);
                }
                self.player.step_normal(&self.config);
            }
            GameState::Flying => self.player.step_flying(input.thrust_held, &self.config),
            GameState::UpDownMode => {
                if input.jump_pressed || input.thrust_held {
                    self.up_down
                        .toggle(&self.player, self.elapsed_ms, &self.config);
                }
                self.up_down.advance(&mut self.player, &self.config);
            }
            _ => {}
        }
    }

    /// Portal contact only counts from `Normal`, once per portal.
    fn check_portals(&mut self) {
        if self.state != GameState::Normal {
            return;
        }
        let player = self.player.bounds;

        if let Some(portal) = self
            .entities
            .portals
            .iter_mut()
            .find(|p| !p.entered && boxes_overlap(&player, &p.bounds))
        {
            portal.entered = true;
            self.state = GameState::PortalTransition;
            self.flying_timer_ms = 0.0;
            self.player.transform_to_jet(&self.config);
            log::info!("Entered portal, flying mode");
            return;
        }

        if let Some(portal) = self
            .entities
            .green_portals
            .iter_mut()
            .find(|p| !p.entered && boxes_overlap(&player, &p.bounds))
        {
            portal.entered = true;
            self.state = GameState::GreenPortalTransition;
            self.up_down_timer_ms = 0.0;
            self.up_down.settle_on_ground();
            self.player.snap_to_ground(&self.config);
            log::info!("Entered green portal, up-down mode");
        }
    }

    fn check_collisions(&mut self, rng: &mut impl Rng) {
        match self.state {
            GameState::Normal | GameState::UpDownMode => self.check_ground_hazards(),
            GameState::Flying => self.check_flying_hazards(),
            _ => {}
        }
        self.check_pickups(rng);
    }

    fn check_ground_hazards(&mut self) {
        if !self.power_ups.any() {
            let player = self.player.bounds;
            let vy = self.player.velocity_y;
            if self
                .entities
                .obstacles
                .iter()
                .any(|o| boxes_overlap(&player, &o.bounds))
            {
                self.end_game("hit a spike");
                return;
            }
            if self
                .entities
                .stairs
                .iter()
                .any(|s| side_collision_check(&player, vy, &s.bounds))
            {
                self.end_game("hit the side of a stair");
                return;
            }
            if self.state == GameState::UpDownMode
                && self
                    .entities
                    .ceiling_spikes
                    .iter()
                    .any(|s| boxes_overlap(&player, &s.bounds))
            {
                self.end_game("hit a ceiling spike");
                return;
            }
        }

        for stair in &self.entities.stairs {
            if landing_check(&self.player.bounds, self.player.velocity_y, &stair.bounds) {
                self.player.land_on(&stair.bounds);
            }
        }
    }

    fn check_flying_hazards(&mut self) {
        let player = self.player.bounds;
        if !self.power_ups.any()
            && self
                .entities
                .asteroids
                .iter()
                .any(|a| boxes_overlap(&player, &a.bounds))
        {
            self.end_game("hit an asteroid");
            return;
        }

        let center = player.center();
        let mut notices = Vec::new();
        for asteroid in &mut self.entities.asteroids {
            if asteroid.bonus_awarded {
                continue;
            }
            let distance = center.distance(asteroid.bounds.center());
            if distance >= PROXIMITY_RADIUS {
                continue;
            }
            let bonus = (1.0 - distance / PROXIMITY_RADIUS).max(0.1) * 2.0;
            asteroid.bonus_awarded = true;
            self.score.add_points(bonus);
            notices.push((
                format!("+{}", bonus.floor() as i64),
                DVec2::new(asteroid.bounds.center().x, asteroid.bounds.y - 20.0),
            ));
        }
        for (text, at) in notices {
            self.entities.notify(text, at, PROXIMITY_NOTICE_MS);
        }
    }

    fn check_pickups(&mut self, rng: &mut impl Rng) {
        let player = self.player.bounds;

        let mut bursts = Vec::new();
        for coin in &mut self.entities.coins {
            if !coin.collected && circular_overlap(&player, &coin.bounds) {
                coin.collected = true;
                self.score.add_whole(coin.points);
                bursts.push(coin.bounds.center());
            }
        }
        for origin in bursts {
            self.entities.burst(origin, rng);
        }

        for orb in &mut self.entities.orange_orbs {
            if !orb.collected && circular_overlap(&player, &orb.bounds) {
                orb.collected = true;
                self.score.add_whole(ORANGE_ORB_POINTS);
                self.power_ups.grant_invincibility();
                log::info!(
                    "Orange orb collected, invincible for {}ms",
                    self.config.invincibility_duration_ms
                );
            }
        }
        for orb in &mut self.entities.green_orbs {
            if !orb.collected && circular_overlap(&player, &orb.bounds) {
                orb.collected = true;
                self.score.add_whole(GREEN_ORB_POINTS);
                self.power_ups.grant_super_invincibility();
                log::info!(
                    "Green orb collected, super invincible for {}ms",
                    self.config.super_invincibility_duration_ms
                );
            }
        }
    }

    /// The only place continuous score is added.
    fn accrue_score(&mut self) {
        let per_frame = match self.state {
            GameState::Normal | GameState::UpDownMode => 0.1,
            GameState::Flying => 0.15,
            _ => 0.0,
        };
        self.score.add_points(per_frame);
    }

    fn end_game(&mut self, cause: &str) {
        self.game_over = true;
        self.auto_replay_timer_ms = 0.0;
        log::info!(
            "Game over: {cause} (score {}, frame {})",
            self.score.whole(),
            self.frame
        );
    }

    pub fn is_jet(&self) -> bool {
        self.player.form == PlayerForm::Jet
    }
}
