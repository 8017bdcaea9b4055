//! Integration tests for a complete race through the public API.
//!
//! Uses a hand-written roster instead of the bundled grid to exercise the
//! collaborator traits the way a game host would.

use approx::assert_relative_eq;
use kart_race_flow::race_flow::{
    CompetitorId, CompetitorRoster, EventLog, FlowEvent, Objective, ObjectiveBoard, Outcome,
    RaceClock, RaceContext, RaceFlowConfig, RaceFlowController, RaceState,
};

const DT: f32 = 0.25;

/// Roster backed by parallel vectors, player is the last kart
struct Pack {
    checkpoints: Vec<u32>,
    can_move: Vec<bool>,
}

impl Pack {
    fn new(count: usize) -> Self {
        Self {
            checkpoints: vec![0; count],
            can_move: vec![true; count],
        }
    }

    fn advance_movable(&mut self, who: usize) {
        if self.can_move[who] {
            self.checkpoints[who] += 1;
        }
    }
}

impl CompetitorRoster for Pack {
    fn competitor_ids(&self) -> Vec<CompetitorId> {
        (0..self.checkpoints.len() as u32).map(CompetitorId).collect()
    }

    fn checkpoints_passed(&self, id: CompetitorId) -> Option<u32> {
        self.checkpoints.get(id.0 as usize).copied()
    }

    fn set_can_move(&mut self, id: CompetitorId, can_move: bool) {
        if let Some(flag) = self.can_move.get_mut(id.0 as usize) {
            *flag = can_move;
        }
    }

    fn player(&self) -> Option<CompetitorId> {
        Some(CompetitorId(self.checkpoints.len() as u32 - 1))
    }
}

struct Race {
    pack: Pack,
    board: ObjectiveBoard,
    clock: RaceClock,
    log: EventLog,
}

impl Race {
    fn ctx(&mut self) -> RaceContext<'_> {
        RaceContext::builder()
            .roster(&mut self.pack)
            .objectives(&self.board)
            .timer(&mut self.clock)
            .presenter(&mut self.log)
            .build()
            .unwrap()
    }

    fn step(&mut self, controller: &mut RaceFlowController) -> RaceState {
        self.clock.update(DT);
        controller.tick(DT, &mut self.ctx())
    }
}

#[test]
fn test_full_race_player_wins_from_behind() {
    let config = RaceFlowConfig::from_json(
        r#"{ "endSceneLoadDelay": 3, "delayBeforeFadeToBlack": 4, "delayBeforeWinMessage": 2 }"#,
    )
    .unwrap();

    let mut race = Race {
        pack: Pack::new(3),
        board: ObjectiveBoard::new(),
        clock: RaceClock::limited(120.0),
        log: EventLog::new(),
    };
    let mut controller = RaceFlowController::initialize(config, &mut race.ctx()).unwrap();
    assert_eq!(controller.player(), CompetitorId(2));
    assert!(race.pack.can_move.iter().all(|&m| !m));

    // Objectives show up late.
    race.step(&mut controller);
    let objective = race
        .board
        .register(Objective::new("Pass 6 checkpoints").with_message("Pass 6 checkpoints!"));

    while controller.state() == RaceState::Countdown {
        race.step(&mut controller);
    }
    assert_relative_eq!(controller.now(), 3.0);
    assert!(race.pack.can_move.iter().all(|&m| m));

    // AI kart 0 leads early, the player overtakes later.
    let mut frame = 0;
    while controller.state() == RaceState::Playing {
        if frame % 2 == 0 {
            race.pack.advance_movable(0);
        }
        if frame % 2 == 0 && frame > 0 {
            race.pack.advance_movable(2);
            race.pack.advance_movable(2);
        }
        if race.pack.checkpoints[2] >= 6 {
            race.board.complete(objective);
        }
        race.step(&mut controller);
        frame += 1;
        assert!(frame < 100, "race never ended");
    }

    assert_eq!(controller.state(), RaceState::Won);
    assert_eq!(controller.final_rank(), Some(1));
    assert_eq!(controller.rank_label(), Some("1º"));
    let schedule = controller.schedule().unwrap().clone();
    assert_eq!(schedule.outcome, Outcome::Won);
    assert_relative_eq!(schedule.deadline, schedule.ended_at + 7.0);

    // The player keeps control after winning.
    assert!(race.pack.can_move[2]);

    while controller.now() + DT < schedule.deadline {
        race.step(&mut controller);
        assert!(race.log.scene_loads().is_empty());
    }
    race.step(&mut controller);
    assert_eq!(race.log.scene_loads(), vec!["WinScene"]);
    assert_eq!(controller.state(), RaceState::Playing);

    let events = race.log.events();
    let revealed = events
        .iter()
        .position(|e| matches!(e, FlowEvent::ObjectiveRevealed { index: 0, .. }));
    let countdown = events.iter().position(|e| *e == FlowEvent::CountdownStarted);
    assert!(countdown.unwrap() < revealed.unwrap());

    let labels: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            FlowEvent::RankLabel { label } => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert!(labels.contains(&"2º"));
    assert_eq!(labels.last(), Some(&"1º"));
}

#[test]
fn test_rank_example_from_roster() {
    let mut race = Race {
        pack: Pack::new(3),
        board: ObjectiveBoard::new(),
        clock: RaceClock::unlimited(),
        log: EventLog::new(),
    };
    race.pack.checkpoints = vec![3, 1, 2];

    let mut controller =
        RaceFlowController::initialize(RaceFlowConfig::default(), &mut race.ctx()).unwrap();
    let table = controller.rank_racers(&mut race.ctx()).clone();
    assert_eq!(
        table.ids(),
        vec![CompetitorId(0), CompetitorId(2), CompetitorId(1)]
    );
    assert_eq!(table.index_of(CompetitorId(0)), 0);
    assert_eq!(controller.rank_label(), Some("2º"));
    assert_eq!(race.log.rank_label(), Some("2º"));
}
