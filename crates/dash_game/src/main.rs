//! Portal Dash headless runner.
//!
//! Drives a `Session` the way an interactive host would: script frames become key
//! events on an `InputState`, hotkeys are handled between ticks, and each
//! tick is one fixed 16 ms step of a `FrameClock`. In realtime mode the clock
//! is fed from the wall clock; otherwise steps run back to back.
//!
//! Everything is configured from the environment:
//!
//!   DASH_DATA_DIR      data directory (levels/, high-scores.md), default `data`
//!   DASH_LEVEL         level id (`level-2` or `2`); endless mode when unset
//!   DASH_FRAMES        host steps to run, default 3600
//!   DASH_SEED          RNG seed; random when unset
//!   DASH_INPUT_SCRIPT  JSON input script; idle input when unset
//!   DASH_PLAYER        initials recorded to the high-score table
//!   DASH_AUTO_REPLAY   restart automatically after game over
//!   DASH_REALTIME      pace steps against the wall clock
//!   DASH_CANVAS        canvas size as `WIDTHxHEIGHT`

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use dash_core::config::GameConfig;
use dash_core::highscores::{normalize_name, HighScoreEntry, HighScoreTable};
use dash_core::input::{InputState, Key};
use dash_core::store::{DataDir, HighScoreStore, LevelSource};
use dash_core::time::FrameClock;
use dash_game::replay::{load_input_script_from_path, InputScript};
use dash_game::session::{GameMode, Session};

const DEFAULT_FRAMES: u64 = 3600;

#[derive(Debug, Clone, PartialEq)]
struct RunConfig {
    data_dir: PathBuf,
    level: Option<String>,
    frames: u64,
    seed: Option<u64>,
    input_script: Option<PathBuf>,
    player: Option<String>,
    auto_replay: bool,
    realtime: bool,
    canvas: Option<(f64, f64)>,
}

impl RunConfig {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_dir: lookup("DASH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            level: lookup("DASH_LEVEL").and_then(|raw| level_id_from(&raw)),
            frames: parse_or("DASH_FRAMES", lookup("DASH_FRAMES"), DEFAULT_FRAMES),
            seed: lookup("DASH_SEED").and_then(|raw| parse_logged("DASH_SEED", &raw)),
            input_script: lookup("DASH_INPUT_SCRIPT").map(PathBuf::from),
            player: lookup("DASH_PLAYER").and_then(|raw| normalize_name(&raw)),
            auto_replay: lookup("DASH_AUTO_REPLAY").is_some_and(|raw| flag(&raw)),
            realtime: lookup("DASH_REALTIME").is_some_and(|raw| flag(&raw)),
            canvas: lookup("DASH_CANVAS").and_then(|raw| parse_canvas(&raw)),
        }
    }
}

fn parse_logged<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {key}='{raw}': not a valid value");
            None
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    raw.and_then(|raw| parse_logged(key, &raw)).unwrap_or(default)
}

fn flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Accepts `level-3` or a bare `3`.
fn level_id_from(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("level-{raw}"));
    }
    Some(raw.to_string())
}

fn parse_canvas(raw: &str) -> Option<(f64, f64)> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    let width: f64 = parse_logged("DASH_CANVAS", w)?;
    let height: f64 = parse_logged("DASH_CANVAS", h)?;
    (width > 0.0 && height > 0.0).then_some((width, height))
}

/// Host-side state around the session: keys, hotkeys and score recording.
struct Runner {
    session: Session,
    input: InputState,
    store: DataDir,
    rng: StdRng,
    high_scores: HighScoreTable,
    player: Option<String>,
    quit: bool,
    was_over: bool,
    was_complete: bool,
}

impl Runner {
    fn new(config: &RunConfig, seed: u64) -> Self {
        let store = DataDir::new(&config.data_dir);
        let high_scores = HighScoreTable::new(store.load_high_scores());
        let mut session = Session::new(GameConfig::default());
        if let Some((width, height)) = config.canvas {
            session.resize(width, height);
        }
        if config.auto_replay {
            session.toggle_auto_replay();
        }
        Self {
            session,
            input: InputState::new(),
            store,
            rng: StdRng::seed_from_u64(seed),
            high_scores,
            player: config.player.clone(),
            quit: false,
            was_over: false,
            was_complete: false,
        }
    }

    fn start(&mut self, level: Option<&str>) {
        match self.store.list_levels() {
            Ok(levels) => {
                for level in &levels {
                    log::info!("Level available: {} ({})", level.level_id, level.name);
                }
            }
            Err(e) => log::warn!("Could not list levels: {e}"),
        }
        match level {
            // Errors are logged by the session, which falls back to endless.
            Some(level_id) => {
                let _ = self.session.load_level(&self.store, level_id);
            }
            None => self.session.start(),
        }
    }

    fn handle_hotkeys(&mut self) {
        if self.input.is_just_pressed(Key::Escape) {
            log::info!("Escape pressed, stopping run");
            self.quit = true;
            return;
        }
        if self.input.is_just_pressed(Key::P) {
            self.session.toggle_pause();
        }
        if self.input.is_just_pressed(Key::R) {
            self.session.toggle_auto_replay();
        }
        if self.input.is_just_pressed(Key::E) && self.session.mode == GameMode::Level {
            self.session.switch_to_endless();
        }
        if let Some(number) = self.input.level_hotkey() {
            let _ = self
                .session
                .load_level(&self.store, &format!("level-{number}"));
        }
    }

    fn step(&mut self) {
        self.handle_hotkeys();
        if self.quit {
            return;
        }
        let frame_input = self.input.frame_input();
        self.session.tick(frame_input, &mut self.rng);
        self.input.end_frame();

        if self.session.game_over && !self.was_over {
            self.record_score("game over");
        }
        if self.session.level_complete && !self.was_complete {
            self.record_score("level complete");
        }
        self.was_over = self.session.game_over;
        self.was_complete = self.session.level_complete;
    }

    /// Nothing further can happen without a restart.
    fn finished(&self) -> bool {
        self.quit
            || self.session.level_complete
            || (self.session.game_over && !self.session.auto_replay)
    }

    fn record_score(&mut self, reason: &str) {
        let score = self.session.score.whole();
        log::info!("Run ended ({reason}) with score {score}");
        let Some(name) = self.player.clone() else {
            return;
        };
        if !self.high_scores.qualifies(score) {
            log::info!("Score {score} does not make the high-score table");
            return;
        }
        if let Some(rank) = self.high_scores.insert(HighScoreEntry { name, score }) {
            log::info!("New high score at rank {rank}");
            if let Err(e) = self.store.save_high_scores(self.high_scores.entries()) {
                log::error!("Failed to save high scores: {e}");
            }
        }
    }

    fn summary(&self) {
        let session = &self.session;
        log::info!(
            "Finished after {} frames: score {}, mode {:?}, state {:?}, jet {}, game over {}",
            session.frame,
            session.score.whole(),
            session.mode,
            session.state,
            session.is_jet(),
            session.game_over
        );
        if let Some(timeline) = session.timeline() {
            log::info!(
                "Level {}: {:.1}% progress, {} events fired, {} pending",
                timeline.level().level_id,
                session.level_progress(),
                timeline.fired_events(),
                timeline.pending_events()
            );
        }
        for (rank, entry) in self.high_scores.entries().iter().enumerate() {
            log::info!("{:>2}. {} - {}", rank + 1, entry.name, entry.score);
        }
    }
}

/// Feeds script frames into the runner; idle input once the script runs out.
struct ScriptCursor {
    script: Option<InputScript>,
    frame: usize,
    repeat: u32,
}

impl ScriptCursor {
    fn new(script: Option<InputScript>) -> Self {
        Self {
            script,
            frame: 0,
            repeat: 0,
        }
    }

    fn drive(&mut self, input: &mut InputState) {
        let Some(script) = &self.script else {
            return;
        };
        let Some(frame) = script.frames.get(self.frame) else {
            input.key_up(Key::Space);
            input.key_up(Key::Up);
            return;
        };
        frame.drive(input, self.repeat == 0);
        self.repeat += 1;
        if self.repeat >= frame.repeat.max(1) {
            self.frame += 1;
            self.repeat = 0;
        }
    }
}

fn run(config: &RunConfig) -> Result<(), String> {
    let script = match &config.input_script {
        Some(path) => {
            let script = load_input_script_from_path(path)?;
            log::info!(
                "Loaded input script {} ({} entries)",
                path.display(),
                script.frames.len()
            );
            Some(script)
        }
        None => None,
    };
    let seed = config.seed.unwrap_or_else(rand::random);
    log::info!("Seed: {seed}");

    let mut runner = Runner::new(config, seed);
    let mut cursor = ScriptCursor::new(script);
    let mut clock = FrameClock::new(runner.session.config.frame_time_ms);
    runner.start(config.level.as_deref());

    let mut steps = 0;
    while steps < config.frames && !runner.finished() {
        if config.realtime {
            clock.begin_frame();
            while steps < config.frames && clock.should_step() {
                cursor.drive(&mut runner.input);
                runner.step();
                steps += 1;
            }
            std::thread::sleep(Duration::from_millis(1));
        } else {
            clock.step_once();
            cursor.drive(&mut runner.input);
            runner.step();
            steps += 1;
        }
    }

    if !runner.session.game_over && !runner.session.level_complete {
        runner.record_score("frame limit");
    }
    log::info!(
        "{} fixed steps over {} host frames",
        clock.fixed_step_count,
        clock.frame_count
    );
    runner.summary();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Portal Dash runner starting...");

    let config = RunConfig::from_env();
    if let Err(e) = run(&config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn config_from(pairs: &[(&str, &str)]) -> RunConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn temp_root(hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "dash_runner_test_{}_{}_{}",
            hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.frames, DEFAULT_FRAMES);
        assert_eq!(config.level, None);
        assert!(!config.auto_replay);
        assert!(!config.realtime);
    }

    #[test]
    fn environment_values_are_parsed() {
        let config = config_from(&[
            ("DASH_LEVEL", "2"),
            ("DASH_FRAMES", "120"),
            ("DASH_SEED", "99"),
            ("DASH_PLAYER", "ab1c"),
            ("DASH_AUTO_REPLAY", "true"),
            ("DASH_CANVAS", "1200x800"),
        ]);
        assert_eq!(config.level.as_deref(), Some("level-2"));
        assert_eq!(config.frames, 120);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.player.as_deref(), Some("ABC"));
        assert!(config.auto_replay);
        assert_eq!(config.canvas, Some((1200.0, 800.0)));
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[
            ("DASH_FRAMES", "lots"),
            ("DASH_SEED", "-1"),
            ("DASH_CANVAS", "wide"),
            ("DASH_PLAYER", "123"),
        ]);
        assert_eq!(config.frames, DEFAULT_FRAMES);
        assert_eq!(config.seed, None);
        assert_eq!(config.canvas, None);
        assert_eq!(config.player, None);
    }

    #[test]
    fn pause_hotkey_stops_the_simulation() {
        let root = temp_root("pause");
        let config = config_from(&[("DASH_DATA_DIR", root.to_str().expect("utf8 path"))]);
        let mut runner = Runner::new(&config, 1);
        runner.start(None);

        runner.step();
        assert_eq!(runner.session.frame, 1);
        runner.input.key_down(Key::P);
        runner.step();
        assert!(runner.session.paused);
        assert_eq!(runner.session.frame, 1);

        runner.input.key_down(Key::Escape);
        runner.step();
        assert!(runner.finished());
    }

    #[test]
    fn game_over_records_a_high_score() {
        let root = temp_root("record");
        let config = config_from(&[
            ("DASH_DATA_DIR", root.to_str().expect("utf8 path")),
            ("DASH_PLAYER", "zed"),
        ]);
        let mut runner = Runner::new(&config, 1);
        runner.start(None);
        runner.session.score.add_whole(321);
        runner.session.entities.obstacles.push(dash_game::entities::Obstacle::new(
            110.0,
            runner.session.config.ground_height - 20.0,
        ));
        runner.step();
        assert!(runner.session.game_over);
        assert!(runner.finished());

        let saved = DataDir::new(&root).load_high_scores();
        assert_eq!(
            saved,
            vec![HighScoreEntry {
                name: "ZED".to_string(),
                score: 321
            }]
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_level_falls_back_to_endless() {
        let root = temp_root("missing");
        let config = config_from(&[("DASH_DATA_DIR", root.to_str().expect("utf8 path"))]);
        let mut runner = Runner::new(&config, 1);
        runner.start(Some("level-7"));
        assert!(runner.session.started);
        assert_eq!(runner.session.mode, GameMode::Endless);
    }

    #[test]
    fn script_cursor_walks_repeats_then_idles() {
        let script = dash_game::replay::parse_input_script(
            r#"{ "frames": [ { "thrust_held": true, "repeat": 2 } ] }"#,
        )
        .expect("script parses");
        let mut cursor = ScriptCursor::new(Some(script));
        let mut input = InputState::new();
        cursor.drive(&mut input);
        assert!(input.is_held(Key::Space));
        cursor.drive(&mut input);
        assert!(input.is_held(Key::Space));
        cursor.drive(&mut input);
        assert!(!input.is_held(Key::Space));
    }
}
