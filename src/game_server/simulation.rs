//! Simulation - Headless race server and loop
//!
//! Owns the karts, objectives, race clock and presentation log of one race,
//! drives the race flow controller every tick, and provides the interface for
//! Tauri commands.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::race_flow::{
    CompetitorId, CompetitorRoster, EventLog, FlowEvent, Grid, Objective, ObjectiveBoard,
    RaceClock, RaceContext, RaceFlowConfig, RaceFlowController, RaceState, SetupError,
};

/// Server-side race configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Number of karts, the first one is the player's
    pub kart_count: u32,
    /// Checkpoints the player must pass to complete the race objective
    pub checkpoints_to_win: u32,
    /// Race time limit in seconds, none for an untimed race
    pub time_limit: Option<f32>,
    /// Average checkpoints per second for AI karts
    pub ai_pace: f32,
    /// Average checkpoints per second for the player's kart
    pub player_pace: f32,
    pub flow: RaceFlowConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            kart_count: 8,
            checkpoints_to_win: 24,
            time_limit: Some(180.0),
            ai_pace: 0.18,
            player_pace: 0.2,
            flow: RaceFlowConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Largest grid the server will build
    pub const MAX_KARTS: u32 = 64;

    /// Check the host settings and the race flow settings
    pub fn validate(&self) -> Result<(), SetupError> {
        self.flow.validate()?;
        if self.kart_count == 0 {
            return Err(SetupError::NoCompetitors);
        }
        if self.kart_count > Self::MAX_KARTS {
            return Err(SetupError::InvalidConfig(format!(
                "kart_count must be at most {}, got {}",
                Self::MAX_KARTS,
                self.kart_count
            )));
        }
        if self.checkpoints_to_win == 0 {
            return Err(SetupError::InvalidConfig(
                "checkpoints_to_win must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Game state of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Idle,
    Ready,
    Racing,
    Results,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub kart_count: u32,
    pub game_state: GameState,
}

/// One row of the standings for the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingSnapshot {
    pub id: CompetitorId,
    pub name: String,
    pub checkpoints_passed: u32,
    pub can_move: bool,
}

/// Compact race snapshot for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub state: Option<RaceState>,
    pub race_time: f32,
    pub time_remaining: Option<f32>,
    pub player: Option<CompetitorId>,
    pub standings: Vec<StandingSnapshot>,
    pub rank_label: Option<String>,
    pub final_rank: Option<usize>,
    pub fade_opacity: f32,
    pub master_volume: f32,
    pub wheel_rotation: f32,
    /// Presentation requests since the previous tick
    pub events: Vec<FlowEvent>,
}

/// Everything belonging to the race being hosted
struct ActiveRace {
    config: ServerConfig,
    grid: Grid,
    objectives: ObjectiveBoard,
    clock: RaceClock,
    log: EventLog,
    controller: Option<RaceFlowController>,
    objectives_registered: bool,
}

impl ActiveRace {
    fn new(config: ServerConfig) -> Self {
        let grid = Grid::with_count(config.kart_count).with_player(CompetitorId(0));
        let clock = match config.time_limit {
            Some(limit) => RaceClock::limited(limit),
            None => RaceClock::unlimited(),
        };
        Self {
            config,
            grid,
            objectives: ObjectiveBoard::new(),
            clock,
            log: EventLog::new(),
            controller: None,
            objectives_registered: false,
        }
    }

    fn start(&mut self) -> Result<(), SetupError> {
        let mut ctx = RaceContext {
            roster: &mut self.grid,
            objectives: &self.objectives,
            timer: &mut self.clock,
            presenter: &mut self.log,
        };
        let controller = RaceFlowController::initialize(self.config.flow.clone(), &mut ctx)?;
        self.controller = Some(controller);
        Ok(())
    }

    /// Objectives arrive a frame after the race scene, like any other
    /// late-initialised collaborator.
    fn register_objectives(&mut self) {
        if self.objectives_registered {
            return;
        }
        let goal = self.config.checkpoints_to_win;
        self.objectives.register(
            Objective::new(format!("Pass {} checkpoints", goal))
                .with_message(format!("Pass {} checkpoints before time runs out!", goal)),
        );
        self.objectives_registered = true;
    }

    /// Karts that may move cross checkpoints at random around their pace
    fn simulate_karts(&mut self, delta: f32) {
        let player = self.grid.player();
        let (ai_pace, player_pace) = (self.config.ai_pace, self.config.player_pace);
        for kart in self.grid.karts_mut() {
            let pace = if Some(kart.id) == player { player_pace } else { ai_pace };
            if rand::random::<f32>() < pace * delta {
                kart.pass_checkpoint();
            }
        }

        let player_progress = player.and_then(|id| self.grid.checkpoints_passed(id));
        if player_progress.is_some_and(|c| c >= self.config.checkpoints_to_win) {
            self.objectives.complete(0);
        }
    }

    fn update(&mut self, delta: f32) {
        self.register_objectives();
        self.simulate_karts(delta);
        self.clock.update(delta);

        let ActiveRace {
            grid,
            objectives,
            clock,
            log,
            controller,
            ..
        } = self;
        if let Some(controller) = controller {
            let mut ctx = RaceContext {
                roster: grid,
                objectives: &*objectives,
                timer: clock,
                presenter: log,
            };
            controller.tick(delta, &mut ctx);
        }
    }

    /// The race is over once the end scene has been requested
    fn is_complete(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|c| c.is_finished() && c.schedule().is_none())
    }

    fn snapshot(&self, events: Vec<FlowEvent>) -> RaceSnapshot {
        let (state, race_time, player, rank_label, final_rank, order) = match &self.controller {
            Some(c) => (
                Some(c.state()),
                c.now(),
                Some(c.player()),
                c.rank_label().map(str::to_owned),
                c.final_rank(),
                c.standings().ids(),
            ),
            None => (None, 0.0, self.grid.player(), None, None, self.grid.competitor_ids()),
        };

        let standings = order
            .into_iter()
            .filter_map(|id| self.grid.kart(id))
            .map(|kart| StandingSnapshot {
                id: kart.id,
                name: kart.name.clone(),
                checkpoints_passed: kart.checkpoints_passed,
                can_move: kart.can_move,
            })
            .collect();

        RaceSnapshot {
            state,
            race_time,
            time_remaining: self.clock.remaining(),
            player,
            standings,
            rank_label,
            final_rank,
            fade_opacity: self.log.fade_opacity(),
            master_volume: self.log.master_volume(),
            wheel_rotation: self.log.wheel_rotation(),
            events,
        }
    }
}

/// Main race server
pub struct RaceServer {
    /// Current game state
    state: GameState,
    /// Active race (if any)
    race: Option<ActiveRace>,
    /// Target tick rate (ticks per second)
    tick_rate: f32,
    /// Last tick timestamp
    last_tick: Instant,
    /// Recent tick durations for averaging
    tick_times: Vec<f32>,
    /// Whether the server is running
    running: bool,
}

impl RaceServer {
    /// Create a new race server
    pub fn new() -> Self {
        Self {
            state: GameState::Idle,
            race: None,
            tick_rate: 60.0,
            last_tick: Instant::now(),
            tick_times: Vec::with_capacity(60),
            running: false,
        }
    }

    /// Set up karts, objectives and clock for a new race
    pub fn init_race(&mut self, config: ServerConfig) -> Result<(), SetupError> {
        config.validate()?;
        self.reset();
        self.race = Some(ActiveRace::new(config));
        self.state = GameState::Ready;
        Ok(())
    }

    /// Hand the race to the flow controller, which starts the countdown
    pub fn start_race(&mut self) -> Result<(), SetupError> {
        let Some(race) = self.race.as_mut() else {
            return Err(SetupError::MissingCollaborator("race"));
        };
        if race.controller.is_some() {
            log::warn!("Race already started");
            return Ok(());
        }
        race.start()?;
        self.state = GameState::Racing;
        self.running = true;
        self.last_tick = Instant::now();
        Ok(())
    }

    /// Perform a simulation tick using wall-clock time
    pub fn tick(&mut self) -> Option<RaceSnapshot> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.advance(delta)
    }

    /// Perform a simulation tick of `delta` seconds
    pub fn advance(&mut self, delta: f32) -> Option<RaceSnapshot> {
        if !self.running {
            return self.get_snapshot();
        }

        let tick_start = Instant::now();

        let race = self.race.as_mut()?;
        race.update(delta);
        if race.is_complete() {
            log::info!("Race complete; showing results");
            self.state = GameState::Results;
            self.running = false;
        }
        let events = race.log.drain();
        let snapshot = race.snapshot(events);

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > 60 {
            self.tick_times.remove(0);
        }

        Some(snapshot)
    }

    /// Current race snapshot, including events not yet handed out by a tick
    pub fn get_snapshot(&self) -> Option<RaceSnapshot> {
        self.race
            .as_ref()
            .map(|race| race.snapshot(race.log.events().to_vec()))
    }

    /// Feed the player's steering axis
    pub fn set_turn_input(&mut self, value: f32) {
        if let Some(race) = self.race.as_mut() {
            race.grid.set_turn_input(value);
        }
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            tick_rate: self.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            kart_count: self
                .race
                .as_ref()
                .map(|r| r.grid.karts().len() as u32)
                .unwrap_or(0),
            game_state: self.state,
        }
    }

    /// Get current game state
    pub fn get_state(&self) -> GameState {
        self.state
    }

    /// Tear down the current race and return to idle
    pub fn reset(&mut self) {
        if let Some(controller) = self.race.as_mut().and_then(|r| r.controller.as_mut()) {
            controller.shutdown();
        }
        self.state = GameState::Idle;
        self.race = None;
        self.running = false;
        self.tick_times.clear();
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for RaceServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe race server wrapper for use with Tauri state
pub type SharedRaceServer = Arc<RwLock<RaceServer>>;

/// Create a new shared race server
pub fn create_shared_server() -> SharedRaceServer {
    Arc::new(RwLock::new(RaceServer::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(player_pace: f32, time_limit: Option<f32>) -> ServerConfig {
        ServerConfig {
            kart_count: 4,
            checkpoints_to_win: 3,
            time_limit,
            ai_pace: 0.0,
            player_pace,
            flow: RaceFlowConfig::default(),
        }
    }

    fn run_to_results(server: &mut RaceServer) -> Vec<FlowEvent> {
        let mut events = Vec::new();
        for _ in 0..200 {
            if let Some(snapshot) = server.advance(0.5) {
                events.extend(snapshot.events);
            }
            if server.get_state() == GameState::Results {
                break;
            }
        }
        events
    }

    #[test]
    fn test_idle_server_has_no_snapshot() {
        let mut server = RaceServer::new();
        assert!(server.advance(0.5).is_none());
        assert!(server.start_race().is_err());
        assert_eq!(server.get_stats().kart_count, 0);
    }

    #[test]
    fn test_init_rejects_empty_grid() {
        let mut server = RaceServer::new();
        let result = server.init_race(ServerConfig {
            kart_count: 0,
            ..config(1.0, None)
        });
        assert!(matches!(result, Err(SetupError::NoCompetitors)));
        assert_eq!(server.get_state(), GameState::Idle);
    }

    #[test]
    fn test_init_rejects_oversized_grid_and_trivial_goal() {
        let mut server = RaceServer::new();
        let result = server.init_race(ServerConfig {
            kart_count: u32::MAX,
            ..config(1.0, None)
        });
        assert!(matches!(result, Err(SetupError::InvalidConfig(_))));

        let result = server.init_race(ServerConfig {
            checkpoints_to_win: 0,
            ..config(1.0, None)
        });
        assert!(matches!(result, Err(SetupError::InvalidConfig(_))));
        assert_eq!(server.get_state(), GameState::Idle);

        let largest = ServerConfig {
            kart_count: ServerConfig::MAX_KARTS,
            ..config(1.0, None)
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_player_wins_race() {
        let mut server = RaceServer::new();
        server.init_race(config(1000.0, Some(60.0))).unwrap();
        assert_eq!(server.get_state(), GameState::Ready);
        server.start_race().unwrap();
        assert_eq!(server.get_state(), GameState::Racing);

        let events = run_to_results(&mut server);
        assert_eq!(server.get_state(), GameState::Results);
        assert!(!server.is_running());
        assert!(events.contains(&FlowEvent::SceneLoad {
            name: "WinScene".into()
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::ObjectiveRevealed { index: 0, .. })));

        let snapshot = server.get_snapshot().unwrap();
        assert_eq!(snapshot.final_rank, Some(1));
        assert_eq!(snapshot.standings[0].id, CompetitorId(0));
        assert!(snapshot.standings[0].checkpoints_passed >= 3);
    }

    #[test]
    fn test_player_loses_on_time() {
        let mut server = RaceServer::new();
        server.init_race(config(0.0, Some(1.0))).unwrap();
        server.start_race().unwrap();

        let events = run_to_results(&mut server);
        assert_eq!(server.get_state(), GameState::Results);
        assert!(events.contains(&FlowEvent::SceneLoad {
            name: "LoseScene".into()
        }));
        let snapshot = server.get_snapshot().unwrap();
        assert_eq!(snapshot.time_remaining, Some(0.0));
        assert!(!snapshot.standings.iter().find(|s| s.id == CompetitorId(0)).unwrap().can_move);
    }

    #[test]
    fn test_turn_input_reaches_wheel() {
        let mut server = RaceServer::new();
        server.init_race(config(0.0, None)).unwrap();
        server.start_race().unwrap();
        server.set_turn_input(-1.0);
        let snapshot = server.advance(0.1).unwrap();
        assert!(snapshot.wheel_rotation > 0.0);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut server = RaceServer::new();
        server.init_race(config(1.0, None)).unwrap();
        server.start_race().unwrap();
        server.advance(0.5);
        server.reset();
        assert_eq!(server.get_state(), GameState::Idle);
        assert!(server.get_snapshot().is_none());
        assert!(!server.is_running());
    }
}
