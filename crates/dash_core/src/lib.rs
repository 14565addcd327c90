//! Render-free foundations shared by the simulation and the REST server:
//! the fixed-step clock, input tracking, game constants, the level document
//! schema, the high-score format and the on-disk data directory.

pub mod config;
pub mod highscores;
pub mod input;
pub mod level;
pub mod store;
pub mod time;
