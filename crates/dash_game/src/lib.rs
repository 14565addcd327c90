//! Simulation core for Portal Dash. `Session` is the entry point; everything
//! else is the machinery it drives one 16 ms frame at a time.

pub mod collision;
pub mod entities;
pub mod player;
pub mod replay;
pub mod session;
pub mod spawner;
pub mod timeline;
