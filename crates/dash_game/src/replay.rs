use dash_core::input::{FrameInput, InputState, Key};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Scripted input for headless runs: one entry per run of identical frames.
#[derive(Debug, Deserialize, Clone)]
pub struct InputScript {
    pub frames: Vec<ScriptFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScriptFrame {
    #[serde(default)]
    pub jump_pressed: bool,
    #[serde(default)]
    pub thrust_held: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Hotkeys tapped on the first frame of this run.
    #[serde(default)]
    pub press: Vec<Key>,
}

impl ScriptFrame {
    /// Replays this frame as key events. Thrust holds Space, so the first
    /// held frame also jumps, exactly as a real Space press does. Jumps tap Up.
    pub fn drive(&self, input: &mut InputState, first_of_run: bool) {
        if self.thrust_held {
            input.key_down(Key::Space);
        } else {
            input.key_up(Key::Space);
        }
        input.key_up(Key::Up);
        if self.jump_pressed {
            input.key_down(Key::Up);
        }
        if first_of_run {
            for key in &self.press {
                input.key_up(*key);
                input.key_down(*key);
            }
        }
    }
}

impl InputScript {
    pub fn expanded_inputs(&self) -> Vec<FrameInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(FrameInput {
                    jump_pressed: frame.jump_pressed,
                    thrust_held: frame.thrust_held,
                });
            }
        }
        out
    }
}

pub fn parse_input_script(raw: &str) -> Result<InputScript, String> {
    let script: InputScript =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse input script: {e}"))?;
    validate_input_script(&script)?;
    Ok(script)
}

pub fn load_input_script_from_path(path: &Path) -> Result<InputScript, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let script: InputScript = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse input script {}: {e}", path.display()))?;
    validate_input_script(&script)?;
    Ok(script)
}

fn validate_input_script(script: &InputScript) -> Result<(), String> {
    if script.frames.is_empty() {
        return Err("Input script validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use dash_core::config::GameConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "dash_script_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn script_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "repeat": 3 },
                { "jump_pressed": true },
                { "thrust_held": true, "repeat": 0 }
              ]
            }"#,
        )
        .expect("write script file");

        let script = load_input_script_from_path(&path).expect("script should load");
        let expanded = script.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(!expanded[2].jump_pressed);
        assert!(expanded[3].jump_pressed);
        assert!(expanded[4].thrust_held);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn driving_keys_reproduces_frame_input() {
        let script = parse_input_script(
            r#"{
              "frames": [
                { "jump_pressed": true },
                { "thrust_held": true, "repeat": 2, "press": ["P"] }
              ]
            }"#,
        )
        .expect("script parses");
        let mut input = InputState::new();

        script.frames[0].drive(&mut input, true);
        assert_eq!(
            input.frame_input(),
            FrameInput {
                jump_pressed: true,
                thrust_held: false
            }
        );
        input.end_frame();

        script.frames[1].drive(&mut input, true);
        assert!(input.is_just_pressed(Key::P));
        assert!(input.frame_input().jump_pressed);
        assert!(input.frame_input().thrust_held);
        input.end_frame();

        script.frames[1].drive(&mut input, false);
        assert!(!input.is_just_pressed(Key::P));
        assert_eq!(
            input.frame_input(),
            FrameInput {
                jump_pressed: false,
                thrust_held: true
            }
        );
    }

    #[test]
    fn empty_script_is_rejected() {
        let err = parse_input_script(r#"{ "frames": [] }"#).expect_err("empty script");
        assert!(err.contains("frames list is empty"));
        assert!(parse_input_script("not json").is_err());
    }

    #[test]
    fn seeded_run_is_deterministic() {
        let script = parse_input_script(
            r#"{
              "frames": [
                { "repeat": 90 },
                { "jump_pressed": true, "thrust_held": true },
                { "repeat": 400 },
                { "jump_pressed": true, "thrust_held": true },
                { "repeat": 1500 }
              ]
            }"#,
        )
        .expect("script parses");
        let inputs = script.expanded_inputs();

        let run = |seed: u64| {
            let mut session = Session::new(GameConfig::default());
            session.start();
            let mut rng = StdRng::seed_from_u64(seed);
            for input in &inputs {
                session.tick(*input, &mut rng);
            }
            (
                session.score,
                session.frame,
                session.game_over,
                session.player.bounds,
                session.entities.world_entity_count(),
            )
        };

        assert_eq!(run(7), run(7));
    }
}
