//! Rank - Live standings from checkpoint progress
//!
//! Standings are sorted descending by checkpoints passed. Ties keep the order
//! they had going in, so a kart that reached a checkpoint count first stays
//! ahead of karts that catch up to the same count later, as long as the
//! previous table order is fed back in on the next ranking.

use serde::{Deserialize, Serialize};

use crate::race_flow::competitor::CompetitorId;

/// One row of the rank table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub id: CompetitorId,
    pub checkpoints_passed: u32,
}

/// Sort standings in place, descending by checkpoints passed.
///
/// Adjacent-swap passes from the back of the table that only swap on a strict
/// `>`, which keeps equal entries in their incoming order. Finishes within
/// `standings.len()` passes.
pub fn rank(standings: &mut [Standing]) {
    let mut swapped = true;
    let mut passes = 0;
    while swapped {
        swapped = false;
        for i in (1..standings.len()).rev() {
            if standings[i].checkpoints_passed > standings[i - 1].checkpoints_passed {
                standings.swap(i - 1, i);
                swapped = true;
            }
        }
        passes += 1;
    }
    debug_assert!(passes <= standings.len().max(1));
}

/// Rank display string, `"1º"` for `index == 0`
pub fn rank_label(index: usize) -> String {
    format!("{}º", index + 1)
}

/// Ordered standings, leader first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTable {
    standings: Vec<Standing>,
}

impl RankTable {
    /// Rank a caller-owned list of standings
    pub fn ranked(mut standings: Vec<Standing>) -> Self {
        rank(&mut standings);
        Self { standings }
    }

    /// Read each competitor's progress through `progress` and rank them,
    /// starting from `order` for tie-breaking.
    pub fn from_progress<F>(order: &[CompetitorId], progress: F) -> Self
    where
        F: Fn(CompetitorId) -> u32,
    {
        Self::ranked(
            order
                .iter()
                .map(|&id| Standing {
                    id,
                    checkpoints_passed: progress(id),
                })
                .collect(),
        )
    }

    /// Get standings, leader first
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Get competitor ids, leader first
    pub fn ids(&self) -> Vec<CompetitorId> {
        self.standings.iter().map(|s| s.id).collect()
    }

    /// Number of ranked competitors
    pub fn len(&self) -> usize {
        self.standings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.standings.is_empty()
    }

    /// 0-based position of `id`.
    ///
    /// An id that is not in the table also yields 0, indistinguishable from
    /// the leader. Callers must only ask about members.
    pub fn index_of(&self, id: CompetitorId) -> usize {
        self.standings.iter().position(|s| s.id == id).unwrap_or(0)
    }

    /// Competitor one place ahead of `index`. The leader wraps around to the
    /// last-placed competitor.
    pub fn neighbor_ahead(&self, index: usize) -> Option<&Standing> {
        if index != 0 {
            return self.standings.get(index - 1);
        }
        self.standings.last()
    }

    /// The leader, except for the leader itself, which gets the last-placed
    /// competitor.
    pub fn first_place(&self, index: usize) -> Option<&Standing> {
        if index != 0 {
            return self.standings.first();
        }
        self.standings.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn table(checkpoints: &[u32]) -> Vec<Standing> {
        checkpoints
            .iter()
            .enumerate()
            .map(|(i, &c)| Standing {
                id: CompetitorId(i as u32),
                checkpoints_passed: c,
            })
            .collect()
    }

    #[test]
    fn test_rank_example_roster() {
        let ranked = RankTable::ranked(table(&[3, 1, 2]));
        assert_eq!(
            ranked.ids(),
            vec![CompetitorId(0), CompetitorId(2), CompetitorId(1)]
        );
        assert_eq!(rank_label(ranked.index_of(CompetitorId(0))), "1º");
        assert_eq!(rank_label(ranked.index_of(CompetitorId(1))), "3º");
    }

    #[test]
    fn test_rank_matches_stable_sort_on_random_rosters() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let len = rng.gen_range(0..12);
            let checkpoints: Vec<u32> = (0..len).map(|_| rng.gen_range(0..5)).collect();

            let mut expected = table(&checkpoints);
            expected.sort_by(|a, b| b.checkpoints_passed.cmp(&a.checkpoints_passed));

            let ranked = RankTable::ranked(table(&checkpoints));
            assert_eq!(ranked.standings(), expected.as_slice(), "roster {:?}", checkpoints);
        }
    }

    #[test]
    fn test_ties_keep_previous_order() {
        let order = [CompetitorId(4), CompetitorId(2), CompetitorId(9)];
        let ranked = RankTable::from_progress(&order, |_| 5);
        assert_eq!(ranked.ids(), order.to_vec());
    }

    #[test]
    fn test_index_of() {
        let ranked = RankTable::ranked(table(&[1, 4, 2, 0]));
        for (position, standing) in ranked.standings().iter().enumerate() {
            assert_eq!(ranked.index_of(standing.id), position);
        }
        assert_eq!(ranked.index_of(CompetitorId(42)), 0);
    }

    #[test]
    fn test_neighbor_ahead_wraps_for_leader() {
        let ranked = RankTable::ranked(table(&[3, 2, 1]));
        assert_eq!(ranked.neighbor_ahead(0).unwrap().id, CompetitorId(2));
        assert_eq!(ranked.neighbor_ahead(1).unwrap().id, CompetitorId(0));
        assert_eq!(ranked.neighbor_ahead(2).unwrap().id, CompetitorId(1));
        assert!(ranked.neighbor_ahead(9).is_none());
    }

    #[test]
    fn test_first_place_for_leader_is_last() {
        let ranked = RankTable::ranked(table(&[3, 2, 1]));
        assert_eq!(ranked.first_place(0).unwrap().id, CompetitorId(2));
        assert_eq!(ranked.first_place(1).unwrap().id, CompetitorId(0));
        assert_eq!(ranked.first_place(2).unwrap().id, CompetitorId(0));
    }

    #[test]
    fn test_empty_table() {
        let ranked = RankTable::ranked(Vec::new());
        assert!(ranked.is_empty());
        assert_eq!(ranked.index_of(CompetitorId(0)), 0);
        assert!(ranked.neighbor_ahead(0).is_none());
        assert!(ranked.first_place(0).is_none());
    }
}
