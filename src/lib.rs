//! Kart Race Flow
//!
//! Race-flow controller for a kart racing game, plus a headless race server
//! and (with the `desktop` feature) the Tauri commands the frontend uses to
//! drive it.

pub mod game_server;
pub mod race_flow;

pub use game_server::{GameState, RaceServer, RaceSnapshot, ServerConfig, ServerStats};
pub use race_flow::{RaceFlowConfig, RaceFlowController, RaceState, SetupError};

#[cfg(feature = "desktop")]
mod commands {
    use crate::game_server::simulation::SharedRaceServer;
    use crate::game_server::{GameState, RaceSnapshot, ServerConfig, ServerStats};
    use tauri::State;

    /// Set up a new race, optionally with a custom configuration
    #[tauri::command]
    pub fn init_race(
        server: State<'_, SharedRaceServer>,
        config: Option<ServerConfig>,
    ) -> Result<(), String> {
        let mut server = server.write().map_err(|e| e.to_string())?;
        let config = config.unwrap_or_default();
        let kart_count = config.kart_count;
        server.init_race(config).map_err(|e| e.to_string())?;
        log::info!("Race initialized with {} karts", kart_count);
        Ok(())
    }

    /// Start the race countdown
    #[tauri::command]
    pub fn start_race(server: State<'_, SharedRaceServer>) -> Result<(), String> {
        let mut server = server.write().map_err(|e| e.to_string())?;
        server.start_race().map_err(|e| e.to_string())?;
        log::info!("Race countdown started");
        Ok(())
    }

    /// Perform a simulation tick and return the current state
    #[tauri::command]
    pub fn tick(server: State<'_, SharedRaceServer>) -> Result<Option<RaceSnapshot>, String> {
        let mut server = server.write().map_err(|e| e.to_string())?;
        Ok(server.tick())
    }

    /// Get current race snapshot without advancing simulation
    #[tauri::command]
    pub fn get_snapshot(
        server: State<'_, SharedRaceServer>,
    ) -> Result<Option<RaceSnapshot>, String> {
        let server = server.read().map_err(|e| e.to_string())?;
        Ok(server.get_snapshot())
    }

    /// Get server statistics
    #[tauri::command]
    pub fn get_stats(server: State<'_, SharedRaceServer>) -> Result<ServerStats, String> {
        let server = server.read().map_err(|e| e.to_string())?;
        Ok(server.get_stats())
    }

    /// Get current game state
    #[tauri::command]
    pub fn get_game_state(server: State<'_, SharedRaceServer>) -> Result<GameState, String> {
        let server = server.read().map_err(|e| e.to_string())?;
        Ok(server.get_state())
    }

    /// Feed the player's steering axis
    #[tauri::command]
    pub fn set_turn_input(server: State<'_, SharedRaceServer>, value: f32) -> Result<(), String> {
        let mut server = server.write().map_err(|e| e.to_string())?;
        server.set_turn_input(value);
        Ok(())
    }

    /// Tear down the race and return to idle
    #[tauri::command]
    pub fn reset_race(server: State<'_, SharedRaceServer>) -> Result<(), String> {
        let mut server = server.write().map_err(|e| e.to_string())?;
        server.reset();
        log::info!("Race reset");
        Ok(())
    }
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .manage(game_server::simulation::create_shared_server())
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }
            log::info!("Kart race server initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::init_race,
            commands::start_race,
            commands::tick,
            commands::get_snapshot,
            commands::get_stats,
            commands::get_game_state,
            commands::set_turn_input,
            commands::reset_race,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
