//! Tasks - Cooperative sequences resumed once per tick
//!
//! The pre-race countdown and the objective reveal run alongside the main
//! tick. Each task waits on a timestamp or a polling predicate and advances at
//! most one step per tick, so neither can stall the frame.

use crate::race_flow::objectives::ObjectiveTracker;
use crate::race_flow::presenter::FlowPresenter;

/// Something a task needs the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSignal {
    /// Countdown elapsed: release the karts and start the timer
    StartRace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RevealPhase {
    /// Polling until the objective list is populated
    WaitingForObjectives,
    /// List populated, short pause before the first message
    Settling { until: f32 },
    /// Next reveal index and the time it is due
    Revealing { next: usize, at: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RaceTask {
    Countdown { release_at: f32 },
    RevealObjectives {
        phase: RevealPhase,
        delay: f32,
        interval: f32,
    },
}

impl RaceTask {
    /// Countdown that releases the race `duration` seconds after `now`
    pub fn countdown(now: f32, duration: f32) -> Self {
        RaceTask::Countdown {
            release_at: now + duration,
        }
    }

    /// Objective reveal with an initial delay and a gap between messages
    pub fn reveal_objectives(delay: f32, interval: f32) -> Self {
        RaceTask::RevealObjectives {
            phase: RevealPhase::WaitingForObjectives,
            delay,
            interval,
        }
    }

    /// Advance one step. Returns true once the task has finished.
    fn resume(
        &mut self,
        now: f32,
        objectives: &dyn ObjectiveTracker,
        presenter: &mut dyn FlowPresenter,
        signals: &mut Vec<TaskSignal>,
    ) -> bool {
        match self {
            RaceTask::Countdown { release_at } => {
                if now < *release_at {
                    return false;
                }
                signals.push(TaskSignal::StartRace);
                true
            }
            RaceTask::RevealObjectives {
                phase,
                delay,
                interval,
            } => match *phase {
                RevealPhase::WaitingForObjectives => {
                    if objectives.objective_count() > 0 {
                        *phase = RevealPhase::Settling { until: now + *delay };
                    }
                    false
                }
                RevealPhase::Settling { until } => {
                    if now >= until {
                        *phase = RevealPhase::Revealing { next: 0, at: now };
                        return Self::reveal_next(phase, *interval, now, objectives, presenter);
                    }
                    false
                }
                RevealPhase::Revealing { at, .. } if now < at => false,
                RevealPhase::Revealing { .. } => {
                    Self::reveal_next(phase, *interval, now, objectives, presenter)
                }
            },
        }
    }

    fn reveal_next(
        phase: &mut RevealPhase,
        interval: f32,
        now: f32,
        objectives: &dyn ObjectiveTracker,
        presenter: &mut dyn FlowPresenter,
    ) -> bool {
        let RevealPhase::Revealing { next, .. } = *phase else {
            return false;
        };
        // Objectives registered while revealing are picked up too.
        if next >= objectives.objective_count() {
            return true;
        }
        if let Some(message) = objectives.display_message(next) {
            log::debug!("Revealing objective {}: {}", next, message);
            presenter.reveal_objective(next, message);
        }
        *phase = RevealPhase::Revealing {
            next: next + 1,
            at: now + interval,
        };
        false
    }
}

/// Owns the live tasks of one race instance
#[derive(Debug, Default)]
pub struct TaskRunner {
    tasks: Vec<RaceTask>,
}

impl TaskRunner {
    /// Create an idle runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task to run from the next tick
    pub fn spawn(&mut self, task: RaceTask) {
        self.tasks.push(task);
    }

    /// Resume every task once, dropping those that finished
    pub fn run(
        &mut self,
        now: f32,
        objectives: &dyn ObjectiveTracker,
        presenter: &mut dyn FlowPresenter,
    ) -> Vec<TaskSignal> {
        let mut signals = Vec::new();
        self.tasks
            .retain_mut(|task| !task.resume(now, objectives, presenter, &mut signals));
        signals
    }

    /// Drop all pending tasks; returns how many were cancelled
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tasks.len();
        self.tasks.clear();
        cancelled
    }

    /// Check if no task is pending
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }
}
