//! Objectives - What the player must achieve to win
//!
//! The objective list may still be empty for a few frames after the race
//! scene comes up; consumers must poll rather than assume it is populated.

use serde::{Deserialize, Serialize};

/// Narrow interface the controller needs from the objective system
pub trait ObjectiveTracker {
    fn objective_count(&self) -> usize;

    /// True once every registered objective is complete.
    /// An empty list is never complete.
    fn all_completed(&self) -> bool;

    /// Message to show when revealing objective `index`, if it has one
    fn display_message(&self, index: usize) -> Option<&str>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub title: String,
    pub display_message: Option<String>,
    pub completed: bool,
}

impl Objective {
    /// Create an objective with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            display_message: None,
            completed: false,
        }
    }

    /// Set the message shown when the objective is revealed
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.display_message = Some(message.into());
        self
    }
}

/// Objective list used by the headless server and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectiveBoard {
    objectives: Vec<Objective>,
}

impl ObjectiveBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an objective, returning its index
    pub fn register(&mut self, objective: Objective) -> usize {
        self.objectives.push(objective);
        self.objectives.len() - 1
    }

    /// Mark objective `index` complete; returns false for an unknown index
    pub fn complete(&mut self, index: usize) -> bool {
        match self.objectives.get_mut(index) {
            Some(objective) => {
                objective.completed = true;
                true
            }
            None => false,
        }
    }

    /// Get all registered objectives
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }
}

impl ObjectiveTracker for ObjectiveBoard {
    fn objective_count(&self) -> usize {
        self.objectives.len()
    }

    fn all_completed(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    fn display_message(&self, index: usize) -> Option<&str> {
        self.objectives
            .get(index)
            .and_then(|o| o.display_message.as_deref())
    }
}
