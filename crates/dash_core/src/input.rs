//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every frame the key is
//!   physically down. Thrust in flying mode reads this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only until
//!   `end_frame()`, which the host calls after a tick has consumed them. Jumps
//!   and the pause/replay/level hotkeys read this.
//!
//! Touch screens have a single "button": a touch behaves exactly like Space.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Key {
    Space,
    Up,
    Escape,
    /// Pause toggle.
    P,
    /// Auto-replay toggle.
    R,
    /// Switch to endless mode.
    E,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
}

/// The two gameplay signals a tick needs from the keyboard or touch screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub jump_pressed: bool,
    pub thrust_held: bool,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn touch_start(&mut self) {
        self.key_down(Key::Space);
    }

    pub fn touch_end(&mut self) {
        self.key_up(Key::Space);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    /// Space and Up both jump; only Space thrusts.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            jump_pressed: self.is_just_pressed(Key::Space) || self.is_just_pressed(Key::Up),
            thrust_held: self.is_held(Key::Space),
        }
    }

    /// Level number selected by a digit hotkey this frame, if any.
    pub fn level_hotkey(&self) -> Option<u32> {
        [
            (Key::Digit1, 1),
            (Key::Digit2, 2),
            (Key::Digit3, 3),
            (Key::Digit4, 4),
        ]
        .into_iter()
        .find(|(key, _)| self.is_just_pressed(*key))
        .map(|(_, number)| number)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
