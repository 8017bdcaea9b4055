//! Game Server Module
//!
//! Hosts a kart race headlessly: simulated karts, a race clock and the race
//! flow controller, ticked from the JS frontend via Tauri commands.

pub mod simulation;

pub use simulation::{GameState, RaceServer, RaceSnapshot, ServerConfig, ServerStats};
