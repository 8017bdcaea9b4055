//! Controller - Race flow state machine
//!
//! Drives one race instance from the pre-race countdown through live play to
//! the end-of-race fade and scene change. The host owns the frame loop and
//! calls [`RaceFlowController::tick`] once per frame with the collaborators
//! borrowed in a [`RaceContext`].

use serde::{Deserialize, Serialize};

use crate::race_flow::competitor::{CompetitorId, CompetitorRoster};
use crate::race_flow::config::RaceFlowConfig;
use crate::race_flow::error::SetupError;
use crate::race_flow::objectives::ObjectiveTracker;
use crate::race_flow::presenter::{FlowPresenter, Outcome};
use crate::race_flow::rank::{rank_label, RankTable};
use crate::race_flow::steering::SteeringWheel;
use crate::race_flow::tasks::{RaceTask, TaskRunner, TaskSignal};
use crate::race_flow::timer::RaceTimer;

/// Race state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceState {
    Countdown,
    Playing,
    Won,
    Lost,
}

impl RaceState {
    /// Whether the race has been decided
    pub fn is_terminal(self) -> bool {
        matches!(self, RaceState::Won | RaceState::Lost)
    }
}

/// When and where to go once the race is decided. Fixed at end of race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndGameSchedule {
    pub outcome: Outcome,
    pub scene_name: String,
    /// Race time at which the race ended
    pub ended_at: f32,
    /// Race time from which the fade is sampled
    pub fade_start: f32,
    /// Race time at which the scene change is requested
    pub deadline: f32,
}

/// Overlay opacity and master volume for one fade sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeLevels {
    pub opacity: f32,
    pub volume: f32,
}

/// Levels for a fade ratio. The ratio runs negative early in the fade window
/// and reaches 1 at the deadline; volume follows `1 - |ratio|`.
pub fn fade_levels(time_ratio: f32) -> FadeLevels {
    FadeLevels {
        opacity: time_ratio.clamp(0.0, 1.0),
        volume: (1.0 - time_ratio.abs()).clamp(0.0, 1.0),
    }
}

/// Collaborators borrowed for the duration of a call
pub struct RaceContext<'a> {
    pub roster: &'a mut dyn CompetitorRoster,
    pub objectives: &'a dyn ObjectiveTracker,
    pub timer: &'a mut dyn RaceTimer,
    pub presenter: &'a mut dyn FlowPresenter,
}

impl<'a> RaceContext<'a> {
    /// Start assembling a context
    pub fn builder() -> RaceContextBuilder<'a> {
        RaceContextBuilder::default()
    }
}

/// Assembles a [`RaceContext`] from collaborators found at scene start
#[derive(Default)]
pub struct RaceContextBuilder<'a> {
    roster: Option<&'a mut dyn CompetitorRoster>,
    objectives: Option<&'a dyn ObjectiveTracker>,
    timer: Option<&'a mut dyn RaceTimer>,
    presenter: Option<&'a mut dyn FlowPresenter>,
}

impl<'a> RaceContextBuilder<'a> {
    /// Set the competitor roster
    pub fn roster(mut self, roster: &'a mut dyn CompetitorRoster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Set the objective tracker
    pub fn objectives(mut self, objectives: &'a dyn ObjectiveTracker) -> Self {
        self.objectives = Some(objectives);
        self
    }

    /// Set the race timer
    pub fn timer(mut self, timer: &'a mut dyn RaceTimer) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Set the presenter
    pub fn presenter(mut self, presenter: &'a mut dyn FlowPresenter) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Finish the context, failing on the first collaborator not supplied
    pub fn build(self) -> Result<RaceContext<'a>, SetupError> {
        Ok(RaceContext {
            roster: self
                .roster
                .ok_or(SetupError::MissingCollaborator("competitor roster"))?,
            objectives: self
                .objectives
                .ok_or(SetupError::MissingCollaborator("objective tracker"))?,
            timer: self
                .timer
                .ok_or(SetupError::MissingCollaborator("race timer"))?,
            presenter: self
                .presenter
                .ok_or(SetupError::MissingCollaborator("presenter"))?,
        })
    }
}

/// Race flow controller for a single race instance
#[derive(Debug)]
pub struct RaceFlowController {
    config: RaceFlowConfig,
    state: RaceState,
    /// Race time in seconds since initialisation
    now: f32,
    player: CompetitorId,
    /// Last computed standings; its order breaks ties on the next ranking
    table: RankTable,
    rank_label: Option<String>,
    tasks: TaskRunner,
    /// Set once the race has been decided, never cleared
    end_game_fired: bool,
    schedule: Option<EndGameSchedule>,
    elapsed_before_end_scene: f32,
    final_rank: Option<usize>,
    wheel: SteeringWheel,
    shut_down: bool,
}

impl RaceFlowController {
    /// Set up a race: hold every kart, stop the timer, hide end messages,
    /// play the countdown and start the countdown and objective tasks.
    pub fn initialize(config: RaceFlowConfig, ctx: &mut RaceContext<'_>) -> Result<Self, SetupError> {
        config.validate()?;

        let ids = ctx.roster.competitor_ids();
        let Some(&first) = ids.first() else {
            return Err(SetupError::NoCompetitors);
        };
        let player = ctx.roster.player().unwrap_or(first);
        if !ids.contains(&player) {
            return Err(SetupError::UnknownPlayer(player));
        }

        ctx.presenter.set_master_volume(1.0);
        ctx.presenter.set_end_message(Outcome::Won, false, 0.0);
        ctx.presenter.set_end_message(Outcome::Lost, false, 0.0);

        ctx.timer.stop();
        for &id in &ids {
            ctx.roster.set_can_move(id, false);
        }

        ctx.presenter.play_countdown();

        let mut tasks = TaskRunner::new();
        tasks.spawn(RaceTask::reveal_objectives(
            config.objective_reveal_delay,
            config.objective_reveal_interval,
        ));
        tasks.spawn(RaceTask::countdown(0.0, config.countdown_duration));

        let roster = &*ctx.roster;
        let table = RankTable::from_progress(&ids, |id| roster.checkpoints_passed(id).unwrap_or(0));

        log::info!(
            "Race initialized with {} competitors, player {}",
            ids.len(),
            player
        );

        Ok(Self {
            config,
            state: RaceState::Countdown,
            now: 0.0,
            player,
            table,
            rank_label: None,
            tasks,
            end_game_fired: false,
            schedule: None,
            elapsed_before_end_scene: 0.0,
            final_rank: None,
            wheel: SteeringWheel::new(),
            shut_down: false,
        })
    }

    /// Advance the race by one frame
    pub fn tick(&mut self, delta: f32, ctx: &mut RaceContext<'_>) -> RaceState {
        if self.shut_down {
            return self.state;
        }
        self.now += delta;

        let degrees = self.wheel.update(ctx.roster.turn_input(), delta);
        ctx.presenter.set_wheel_rotation(degrees);

        match self.state {
            state if state.is_terminal() => self.update_fade(delta, ctx),
            RaceState::Playing => self.evaluate_playing(ctx),
            _ => {}
        }

        for signal in self.tasks.run(self.now, ctx.objectives, ctx.presenter) {
            match signal {
                TaskSignal::StartRace => self.start_race(ctx),
            }
        }

        self.state
    }

    fn start_race(&mut self, ctx: &mut RaceContext<'_>) {
        if self.state != RaceState::Countdown {
            log::debug!("Countdown finished in state {:?}; not starting", self.state);
            return;
        }
        for id in ctx.roster.competitor_ids() {
            ctx.roster.set_can_move(id, true);
        }
        ctx.timer.start();
        self.state = RaceState::Playing;
        log::info!("Race started at t={:.2}", self.now);
    }

    fn evaluate_playing(&mut self, ctx: &mut RaceContext<'_>) {
        if self.end_game_fired {
            return;
        }
        self.rank_racers(ctx);

        if self.config.is_multiplayer {
            if ctx.objectives.all_completed() {
                self.leave_session(ctx);
            }
            return;
        }

        if ctx.objectives.all_completed() {
            self.end_game(true, ctx);
        } else if ctx.timer.is_finite() && ctx.timer.is_over() {
            self.end_game(false, ctx);
        }
    }

    fn leave_session(&mut self, ctx: &mut RaceContext<'_>) {
        self.end_game_fired = true;
        ctx.presenter.disconnect_session();
        ctx.presenter.load_scene(&self.config.multiplayer_menu_scene);
        log::info!(
            "Online race complete; returning to {}",
            self.config.multiplayer_menu_scene
        );
    }

    /// Decide the race. Only the first call per race instance has any effect;
    /// later calls are logged and return false.
    pub fn end_game(&mut self, win: bool, ctx: &mut RaceContext<'_>) -> bool {
        if self.end_game_fired {
            log::warn!("End of race already triggered; ignoring end_game(win={})", win);
            return false;
        }
        self.end_game_fired = true;

        ctx.presenter.release_cursor();
        ctx.timer.stop();

        let player = self.player;
        let rank = self.rank_racers(ctx).index_of(player) + 1;
        self.final_rank = Some(rank);

        let (outcome, scene_name) = if win {
            (Outcome::Won, self.config.win_scene_name.clone())
        } else {
            (Outcome::Lost, self.config.lose_scene_name.clone())
        };
        self.state = match outcome {
            Outcome::Won => RaceState::Won,
            Outcome::Lost => RaceState::Lost,
        };
        ctx.presenter.set_fade_overlay_active(true);

        self.elapsed_before_end_scene = 0.0;
        self.schedule = Some(EndGameSchedule {
            outcome,
            scene_name,
            ended_at: self.now,
            fade_start: self.now + self.config.end_scene_load_delay,
            deadline: self.now + self.config.transition_delay(),
        });

        let delay = self.config.delay_before_win_message;
        match outcome {
            Outcome::Won => {
                ctx.presenter.schedule_victory_cue(delay);
                ctx.presenter.set_end_message(Outcome::Won, true, delay);
            }
            Outcome::Lost => {
                ctx.roster.set_can_move(player, false);
                ctx.presenter.set_end_message(Outcome::Lost, true, delay);
            }
        }

        log::info!(
            "Race over at t={:.2}: {:?}, player finished {}",
            self.now,
            outcome,
            rank_label(rank - 1)
        );
        true
    }

    fn update_fade(&mut self, delta: f32, ctx: &mut RaceContext<'_>) {
        let Some(schedule) = &self.schedule else {
            return;
        };
        self.elapsed_before_end_scene += delta;
        if self.elapsed_before_end_scene < self.config.end_scene_load_delay {
            return;
        }

        let time_ratio = 1.0 - (schedule.deadline - self.now) / self.config.end_scene_load_delay;
        let levels = fade_levels(time_ratio);
        ctx.presenter.set_fade_opacity(levels.opacity);
        ctx.presenter.set_master_volume(levels.volume);

        if self.now >= schedule.deadline {
            ctx.presenter.load_scene(&schedule.scene_name);
            log::info!("Loading scene {}", schedule.scene_name);
            self.schedule = None;
            // Back to Playing rather than staying terminal; the end game guard
            // keeps the race from being decided again.
            self.state = RaceState::Playing;
        }
    }

    /// Re-rank the competitors and refresh the player's rank label
    /// (single-player only). Returns the new standings.
    pub fn rank_racers(&mut self, ctx: &mut RaceContext<'_>) -> &RankTable {
        let order = self.table.ids();
        let roster = &*ctx.roster;
        self.table = RankTable::from_progress(&order, |id| roster.checkpoints_passed(id).unwrap_or(0));

        if !self.config.is_multiplayer {
            let label = rank_label(self.table.index_of(self.player));
            ctx.presenter.set_rank_label(&label);
            self.rank_label = Some(label);
        }
        &self.table
    }

    /// Competitor one place ahead of `id`, wrapping for the leader
    pub fn kart_ahead_of(&self, id: CompetitorId) -> Option<CompetitorId> {
        self.table
            .neighbor_ahead(self.table.index_of(id))
            .map(|s| s.id)
    }

    /// Leader of the race as seen from `id`; the leader itself gets the
    /// last-placed competitor
    pub fn leader_for(&self, id: CompetitorId) -> Option<CompetitorId> {
        self.table.first_place(self.table.index_of(id)).map(|s| s.id)
    }

    /// Stop all pending work. Later ticks do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let cancelled = self.tasks.cancel_all();
        self.schedule = None;
        self.shut_down = true;
        log::debug!("Race flow shut down, {} pending tasks cancelled", cancelled);
    }

    /// Current race state
    pub fn state(&self) -> RaceState {
        self.state
    }

    /// Race time in seconds since initialisation
    pub fn now(&self) -> f32 {
        self.now
    }

    /// The local player's competitor
    pub fn player(&self) -> CompetitorId {
        self.player
    }

    /// Pending scene change, if the race has ended and it has not fired yet
    pub fn schedule(&self) -> Option<&EndGameSchedule> {
        self.schedule.as_ref()
    }

    /// Standings from the last ranking
    pub fn standings(&self) -> &RankTable {
        &self.table
    }

    /// Player's rank label as last displayed
    pub fn rank_label(&self) -> Option<&str> {
        self.rank_label.as_deref()
    }

    /// 1-based rank captured when the race ended
    pub fn final_rank(&self) -> Option<usize> {
        self.final_rank
    }

    /// Whether the race has been decided (or an online race left)
    pub fn is_finished(&self) -> bool {
        self.end_game_fired
    }

    /// Check if the controller has been shut down
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
