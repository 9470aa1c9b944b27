use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use grid_traffic_core::{AgentSpec, Cell, Event, TickReport};
use grid_traffic_simulation::{Simulation, SimulationConfig};
use grid_traffic_world::WallPattern;

#[test]
fn deterministic_replay_produces_identical_reports() {
    let first = replay();
    let second = replay();

    assert_eq!(first.reports.len(), second.reports.len());
    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn replay_exercises_conflict_resolution() {
    let outcome = replay();

    let movement_ticks = outcome
        .reports
        .iter()
        .filter(|report| report.movement_tick)
        .count();
    assert!(movement_ticks > 0);
    assert!(outcome
        .reports
        .iter()
        .flat_map(|report| report.events.iter())
        .any(|event| matches!(event, Event::ConflictResolved { .. })));
}

fn replay() -> ReplayOutcome {
    let config = SimulationConfig {
        movement_interval: 4,
        plan_cooldown: 3,
        ..SimulationConfig::default()
    };
    let mut simulation =
        Simulation::with_config(config, 21, &WallPattern::default(), &scripted_agents())
            .expect("scripted agents are valid");

    let reports = (0..2_000).map(|_| simulation.advance_tick()).collect();
    ReplayOutcome { reports }
}

fn scripted_agents() -> Vec<AgentSpec> {
    [
        ((0, 0), (8, 0)),
        ((8, 0), (0, 0)),
        ((4, 4), (16, 4)),
        ((16, 4), (4, 4)),
        ((12, 0), (12, 20)),
        ((12, 20), (12, 0)),
        ((20, 8), (0, 8)),
    ]
    .into_iter()
    .map(|((sx, sy), (dx, dy))| AgentSpec::new(Cell::new(sx, sy), Cell::new(dx, dy)))
    .collect()
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    reports: Vec<TickReport>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
