//! Competitor - Karts taking part in the race and the roster seam
//!
//! The controller never owns karts. It reaches them through [`CompetitorRoster`],
//! which the host implements over whatever storage it uses.

use serde::{Deserialize, Serialize};

/// Stable handle for a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorId(pub u32);

impl std::fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "kart#{}", self.0)
    }
}

/// Inbound/outbound interface to the karts of a race.
///
/// Checkpoint counters are mutated by the host as karts cross checkpoints;
/// the controller only reads them and toggles movement.
pub trait CompetitorRoster {
    /// Every competitor known at race setup, in discovery order
    fn competitor_ids(&self) -> Vec<CompetitorId>;

    /// Checkpoints passed so far, `None` for an unknown id
    fn checkpoints_passed(&self, id: CompetitorId) -> Option<u32>;

    /// Allow or block movement of a competitor
    fn set_can_move(&mut self, id: CompetitorId, can_move: bool);

    /// The competitor driven by the local viewer, if one was designated
    fn player(&self) -> Option<CompetitorId>;

    /// Player steering axis in `[-1, 1]`
    fn turn_input(&self) -> f32 {
        0.0
    }
}

/// State for a single kart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kart {
    pub id: CompetitorId,
    pub name: String,
    /// Monotonic checkpoint counter
    pub checkpoints_passed: u32,
    pub can_move: bool,
}

impl Kart {
    /// Create a kart at the start line
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: CompetitorId(id),
            name: name.into(),
            checkpoints_passed: 0,
            can_move: true,
        }
    }

    /// Record a checkpoint crossing. Ignored while the kart is held in place.
    pub fn pass_checkpoint(&mut self) -> bool {
        if !self.can_move {
            return false;
        }
        self.checkpoints_passed += 1;
        true
    }
}

/// Starting grid: the concrete roster used by the headless server and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    karts: Vec<Kart>,
    player: Option<CompetitorId>,
    turn_input: f32,
}

impl Grid {
    /// Create a grid from existing karts
    pub fn new(karts: Vec<Kart>) -> Self {
        Self {
            karts,
            player: None,
            turn_input: 0.0,
        }
    }

    /// Grid of `count` karts named "Kart 1".."Kart N"
    pub fn with_count(count: u32) -> Self {
        Self::new((0..count).map(|i| Kart::new(i, format!("Kart {}", i + 1))).collect())
    }

    /// Designate the viewer's kart
    pub fn with_player(mut self, id: CompetitorId) -> Self {
        self.player = Some(id);
        self
    }

    /// Get all karts in grid order
    pub fn karts(&self) -> &[Kart] {
        &self.karts
    }

    /// Get a kart by id
    pub fn kart(&self, id: CompetitorId) -> Option<&Kart> {
        self.karts.iter().find(|k| k.id == id)
    }

    /// Get a mutable kart by id
    pub fn kart_mut(&mut self, id: CompetitorId) -> Option<&mut Kart> {
        self.karts.iter_mut().find(|k| k.id == id)
    }

    /// Iterate mutably over all karts
    pub fn karts_mut(&mut self) -> impl Iterator<Item = &mut Kart> {
        self.karts.iter_mut()
    }

    /// Steering axis, clamped to `[-1, 1]`
    pub fn set_turn_input(&mut self, value: f32) {
        self.turn_input = value.clamp(-1.0, 1.0);
    }
}

impl CompetitorRoster for Grid {
    fn competitor_ids(&self) -> Vec<CompetitorId> {
        self.karts.iter().map(|k| k.id).collect()
    }

    fn checkpoints_passed(&self, id: CompetitorId) -> Option<u32> {
        self.kart(id).map(|k| k.checkpoints_passed)
    }

    fn set_can_move(&mut self, id: CompetitorId, can_move: bool) {
        if let Some(kart) = self.kart_mut(id) {
            kart.can_move = can_move;
        }
    }

    fn player(&self) -> Option<CompetitorId> {
        self.player
    }

    fn turn_input(&self) -> f32 {
        self.turn_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_kart_does_not_count_checkpoints() {
        let mut kart = Kart::new(0, "Kart 1");
        kart.can_move = false;
        assert!(!kart.pass_checkpoint());
        assert_eq!(kart.checkpoints_passed, 0);

        kart.can_move = true;
        assert!(kart.pass_checkpoint());
        assert_eq!(kart.checkpoints_passed, 1);
    }

    #[test]
    fn test_grid_roster() {
        let mut grid = Grid::with_count(3).with_player(CompetitorId(1));
        assert_eq!(
            grid.competitor_ids(),
            vec![CompetitorId(0), CompetitorId(1), CompetitorId(2)]
        );
        assert_eq!(grid.player(), Some(CompetitorId(1)));

        grid.set_can_move(CompetitorId(2), false);
        assert!(!grid.kart(CompetitorId(2)).unwrap().can_move);
        assert_eq!(grid.checkpoints_passed(CompetitorId(9)), None);

        grid.set_turn_input(3.0);
        assert_eq!(grid.turn_input(), 1.0);
    }
}
