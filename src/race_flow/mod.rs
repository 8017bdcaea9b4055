//! Race Flow Module
//!
//! Countdown, live standings, win/lose detection and the end-of-race fade for
//! a single kart race. Everything outside the race logic (karts, objectives,
//! timer, presentation) is reached through the traits re-exported here.

pub mod competitor;
pub mod config;
pub mod controller;
pub mod error;
pub mod objectives;
pub mod presenter;
pub mod rank;
pub mod steering;
pub mod tasks;
pub mod timer;

pub use competitor::{CompetitorId, CompetitorRoster, Grid, Kart};
pub use config::RaceFlowConfig;
pub use controller::{
    fade_levels, EndGameSchedule, FadeLevels, RaceContext, RaceContextBuilder, RaceFlowController,
    RaceState,
};
pub use error::SetupError;
pub use objectives::{Objective, ObjectiveBoard, ObjectiveTracker};
pub use presenter::{EventLog, FlowEvent, FlowPresenter, Outcome};
pub use rank::{rank, rank_label, RankTable, Standing};
pub use steering::SteeringWheel;
pub use timer::{RaceClock, RaceTimer};
