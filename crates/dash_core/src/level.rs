use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A scripted level as stored in `levels/level-N.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelFile {
    pub level_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form label ("easy", 3, ...); only echoed back to clients.
    #[serde(default)]
    pub difficulty: serde_json::Value,
    /// Nominal length in milliseconds, used for the progress bar.
    pub duration: u64,
    pub victory_condition: VictoryCondition,
    pub timeline: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_constants: Option<GameConstants>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VictoryCondition {
    #[serde(rename = "type")]
    pub kind: VictoryKind,
    pub target: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VictoryKind {
    /// Survive until the level timer reaches `target` ms.
    Survival,
    /// Reach `target` points.
    Score,
    /// Scroll `target` world units.
    Distance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub time: f64,
    pub action: String,
    #[serde(default)]
    pub params: EventParams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_speed: Option<f64>,
}

/// Per-level overrides of the base game constants. Absent fields keep the
/// base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConstants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_force: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_spawn_interval: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flying_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invincibility_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_invincibility_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_spawn_interval: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_orb_spawn_interval: Option<f64>,
}

/// Entry of the level listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub level_id: String,
    pub name: String,
    pub description: String,
    pub difficulty: serde_json::Value,
    pub duration: u64,
}

impl From<&LevelFile> for LevelSummary {
    fn from(level: &LevelFile) -> Self {
        Self {
            level_id: level.level_id.clone(),
            name: level.name.clone(),
            description: level.description.clone(),
            difficulty: level.difficulty.clone(),
            duration: level.duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineAction {
    SpawnCoin,
    SpawnSpike,
    SpawnStair,
    SpawnPortal,
    SpawnGreenPortal,
    SpawnOrangeOrb,
    SpawnGreenOrb,
    SpawnAsteroid,
    SpawnCeilingSpike,
}

impl TimelineAction {
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "spawnCoin" => Self::SpawnCoin,
            "spawnSpike" => Self::SpawnSpike,
            "spawnStair" => Self::SpawnStair,
            "spawnPortal" => Self::SpawnPortal,
            "spawnGreenPortal" => Self::SpawnGreenPortal,
            "spawnOrangeOrb" => Self::SpawnOrangeOrb,
            "spawnGreenOrb" => Self::SpawnGreenOrb,
            "spawnAsteroid" => Self::SpawnAsteroid,
            "spawnCeilingSpike" => Self::SpawnCeilingSpike,
            _ => return None,
        };
        Some(action)
    }
}

/// Largest per-coin value a level may script.
pub const MAX_COIN_POINTS: i64 = 1_000_000;

/// Numeric suffix of a `level-N` id. Anything else (including path-like ids)
/// yields `None`.
pub fn level_number(level_id: &str) -> Option<u32> {
    let digits = level_id.strip_prefix("level-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn parse_level(raw: &str) -> Result<LevelFile, String> {
    let level: LevelFile =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse level JSON: {e}"))?;
    validate_level(&level)?;
    Ok(level)
}

pub fn load_level_from_path(level_path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(level_path)
        .map_err(|e| format!("Failed to read level file {}: {e}", level_path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", level_path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

pub fn validate_level(level: &LevelFile) -> Result<(), String> {
    if level_number(&level.level_id).is_none() {
        return Err(format!(
            "Level validation failed: levelId '{}' must look like 'level-N'",
            level.level_id
        ));
    }
    if level.name.trim().is_empty() {
        return Err(format!(
            "Level validation failed: level '{}' has an empty name",
            level.level_id
        ));
    }
    if level.duration < 1000 {
        return Err(format!(
            "Level validation failed: level '{}' duration {} is below 1000ms",
            level.level_id, level.duration
        ));
    }
    if !level.victory_condition.target.is_finite() {
        return Err(format!(
            "Level validation failed: level '{}' victory target is not a number",
            level.level_id
        ));
    }
    for (index, event) in level.timeline.iter().enumerate() {
        if !event.time.is_finite() || event.time < 0.0 {
            return Err(format!(
                "Level validation failed: event {index} of '{}' has invalid time {}",
                level.level_id, event.time
            ));
        }
        if let Some(points) = event.params.points {
            if !(0..=MAX_COIN_POINTS).contains(&points) {
                return Err(format!(
                    "Level validation failed: event {index} of '{}' has points {points} outside 0..={MAX_COIN_POINTS}",
                    level.level_id
                ));
            }
        }
        if TimelineAction::from_name(&event.action).is_none() {
            log::warn!(
                "Level '{}' event {index} uses unknown action '{}'. It will be skipped.",
                level.level_id,
                event.action
            );
        }
    }
    Ok(())
}
