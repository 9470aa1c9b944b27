use std::collections::HashSet;

use grid_traffic_core::{AgentId, AgentSpec, AgentState, Cell, ConflictKind, Event, TickReport};
use grid_traffic_simulation::{InitError, Simulation, SimulationConfig};
use grid_traffic_system_agents::SpawnRejection;
use grid_traffic_world::{GridError, WallPattern};

fn ring() -> WallPattern {
    WallPattern::Arterial { period: 4 }
}

fn spec(start: (u32, u32), destination: (u32, u32)) -> AgentSpec {
    AgentSpec::new(
        Cell::new(start.0, start.1),
        Cell::new(destination.0, destination.1),
    )
}

fn run(simulation: &mut Simulation, max_ticks: u64) -> Vec<TickReport> {
    let mut reports = Vec::new();
    for _ in 0..max_ticks {
        if simulation.all_arrived() {
            break;
        }
        reports.push(simulation.advance_tick());
    }
    reports
}

fn conflicts(reports: &[TickReport]) -> Vec<(ConflictKind, AgentId, AgentId)> {
    reports
        .iter()
        .flat_map(|report| report.events.iter())
        .filter_map(|event| match event {
            Event::ConflictResolved {
                kind,
                prevailing,
                yielding,
                ..
            } => Some((*kind, *prevailing, *yielding)),
            _ => None,
        })
        .collect()
}

#[test]
fn single_agent_follows_the_ring_to_its_destination() {
    let mut simulation =
        Simulation::initialize(5, &ring(), &[spec((0, 0), (4, 4))]).expect("valid scenario");

    let first = simulation.advance_tick();
    assert_eq!(
        first.events,
        vec![Event::PathPlanned {
            agent: AgentId::new(0),
            steps: 8
        }]
    );
    let planned = first.agent(AgentId::new(0)).expect("agent snapshot");
    assert_eq!(planned.state, AgentState::HasPath);
    assert!(planned
        .path
        .iter()
        .all(|cell| cell.x() % 4 == 0 || cell.y() % 4 == 0));

    let reports = run(&mut simulation, 1_000);

    assert!(simulation.all_arrived());
    assert_eq!(simulation.tick(), 8 * 30);
    let last = reports.last().expect("at least one tick");
    assert!(last.events.contains(&Event::AgentArrived {
        agent: AgentId::new(0),
        cell: Cell::new(4, 4),
    }));
    let moves = reports
        .iter()
        .flat_map(|report| report.events.iter())
        .filter(|event| matches!(event, Event::AgentAdvanced { .. }))
        .count();
    assert_eq!(moves, 8);
}

/// Starting four cells apart, both agents propose (2, 0) on the same movement
/// tick while it is still free, so the two-phase commit reports a contested
/// target rather than a head-on swap. The lower id takes the cell.
#[test]
fn opposing_agents_resolve_their_conflict_and_both_arrive() {
    let mut simulation = Simulation::initialize(
        5,
        &ring(),
        &[spec((0, 0), (4, 0)), spec((4, 0), (0, 0))],
    )
    .expect("valid scenario");

    let reports = run(&mut simulation, 2_000);

    assert!(simulation.all_arrived(), "both agents must arrive");
    let conflicts = conflicts(&reports);
    let (kind, prevailing, yielding) = *conflicts.first().expect("a conflict is detected");
    assert_eq!(kind, ConflictKind::ContestedTarget);
    assert_eq!(prevailing, AgentId::new(0));
    assert_eq!(yielding, AgentId::new(1));

    let snapshot = simulation.snapshot();
    assert_eq!(snapshot[0].position, Cell::new(4, 0));
    assert_eq!(snapshot[1].position, Cell::new(0, 0));
}

#[test]
fn head_on_swap_makes_the_lower_id_detour() {
    let mut simulation = Simulation::initialize(
        5,
        &ring(),
        &[spec((0, 0), (3, 0)), spec((3, 0), (0, 0))],
    )
    .expect("valid scenario");

    let reports = run(&mut simulation, 2_000);

    assert!(simulation.all_arrived());
    let conflicts = conflicts(&reports);
    assert_eq!(
        conflicts.first().copied(),
        Some((ConflictKind::HeadOn, AgentId::new(1), AgentId::new(0)))
    );

    let detour = reports
        .iter()
        .flat_map(|report| report.events.iter())
        .filter_map(|event| match event {
            Event::PathPlanned { agent, steps } if *agent == AgentId::new(0) => Some(*steps),
            _ => None,
        })
        .last();
    assert_eq!(detour, Some(14));

    let waited = reports
        .iter()
        .flat_map(|report| report.events.iter())
        .any(|event| {
            matches!(
                event,
                Event::AgentWaited { agent, blocked_by }
                    if *agent == AgentId::new(1) && *blocked_by == AgentId::new(0)
            )
        });
    assert!(waited, "the higher id keeps its path and waits");
}

/// Corridor along row 1 with a short passing loop through (2..=4, 0).
fn corridor_with_passing_loop() -> WallPattern {
    let open = |cell: &Cell| cell.y() == 1 || (cell.y() == 0 && (2..=4).contains(&cell.x()));
    let walls = (0..7)
        .flat_map(|y| (0..7).map(move |x| Cell::new(x, y)))
        .filter(|cell| !open(cell))
        .collect();
    WallPattern::Explicit { walls }
}

#[test]
fn repeated_head_on_swaps_converge_with_the_same_agent_yielding() {
    let config = SimulationConfig {
        movement_interval: 2,
        plan_cooldown: 1,
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::with_config(
        config,
        7,
        &corridor_with_passing_loop(),
        &[spec((0, 1), (4, 0)), spec((6, 1), (2, 1))],
    )
    .expect("valid scenario");

    let reports = run(&mut simulation, 1_000);

    assert!(simulation.all_arrived(), "both agents must arrive");
    let head_on: Vec<(Cell, AgentId, AgentId)> = reports
        .iter()
        .flat_map(|report| report.events.iter())
        .filter_map(|event| match event {
            Event::ConflictResolved {
                kind: ConflictKind::HeadOn,
                cell,
                prevailing,
                yielding,
            } => Some((*cell, *prevailing, *yielding)),
            _ => None,
        })
        .collect();

    assert!(
        head_on.len() >= 2,
        "expected repeated head-on swaps, got {head_on:?}"
    );
    let (cell, prevailing, yielding) = head_on[0];
    assert_eq!(yielding, AgentId::new(0));
    assert_eq!(prevailing, AgentId::new(1));
    assert!(head_on
        .iter()
        .all(|conflict| *conflict == (cell, prevailing, yielding)));

    let snapshot = simulation.snapshot();
    assert_eq!(snapshot[0].position, Cell::new(4, 0));
    assert_eq!(snapshot[1].position, Cell::new(2, 1));
}

#[test]
fn destination_on_a_wall_is_rejected() {
    let error = Simulation::initialize(5, &ring(), &[spec((0, 0), (2, 2))])
        .expect_err("wall destination must be rejected");

    assert_eq!(
        error,
        InitError::InvalidSpawn {
            agent: 0,
            reason: SpawnRejection::DestinationOnWall(Cell::new(2, 2)),
        }
    );
}

#[test]
fn invalid_inputs_never_build_a_simulation() {
    let shared = Simulation::initialize(
        5,
        &ring(),
        &[spec((0, 0), (4, 4)), spec((0, 0), (4, 0))],
    )
    .expect_err("shared start must be rejected");
    assert_eq!(
        shared,
        InitError::InvalidSpawn {
            agent: 1,
            reason: SpawnRejection::SharedStart {
                cell: Cell::new(0, 0),
                other: AgentId::new(0),
            },
        }
    );

    let out_of_bounds = Simulation::initialize(5, &ring(), &[spec((0, 0), (0, 7))])
        .expect_err("out of bounds destination must be rejected");
    assert!(matches!(
        out_of_bounds,
        InitError::InvalidSpawn {
            reason: SpawnRejection::DestinationOutOfBounds(_),
            ..
        }
    ));

    let same_cell = Simulation::initialize(5, &ring(), &[spec((4, 4), (4, 4))])
        .expect_err("start equal to destination must be rejected");
    assert!(matches!(
        same_cell,
        InitError::InvalidSpawn {
            reason: SpawnRejection::StartIsDestination(_),
            ..
        }
    ));

    assert_eq!(
        Simulation::initialize(0, &ring(), &[]).expect_err("empty grid"),
        InitError::Grid(GridError::EmptyGrid)
    );

    let config = SimulationConfig {
        movement_interval: 0,
        ..SimulationConfig::default()
    };
    assert_eq!(
        Simulation::with_config(config, 5, &ring(), &[]).expect_err("zero interval"),
        InitError::InvalidConfig
    );
}

#[test]
fn agents_stay_on_streets_and_never_share_a_cell() {
    let config = SimulationConfig {
        movement_interval: 3,
        plan_cooldown: 2,
        ..SimulationConfig::default()
    };
    let specs = [
        spec((0, 0), (20, 20)),
        spec((20, 20), (0, 0)),
        spec((20, 0), (0, 20)),
        spec((0, 20), (20, 0)),
        spec((8, 0), (8, 20)),
        spec((8, 20), (8, 0)),
        spec((0, 12), (20, 12)),
        spec((20, 12), (0, 12)),
    ];
    let mut simulation =
        Simulation::with_config(config, 21, &WallPattern::default(), &specs).expect("valid");

    for _ in 0..3_000 {
        let report = simulation.advance_tick();
        let mut seen = HashSet::new();
        for agent in &report.agents {
            assert!(
                simulation.world().is_street(agent.position),
                "{} left the streets at {}",
                agent.id,
                agent.position
            );
            assert!(
                seen.insert(agent.position),
                "two agents share {} on tick {}",
                agent.position,
                report.tick
            );
        }
    }
}

#[test]
fn walled_off_destination_does_not_stall_other_agents() {
    let pattern = WallPattern::Explicit {
        walls: vec![Cell::new(3, 4), Cell::new(4, 3)],
    };
    let config = SimulationConfig {
        movement_interval: 2,
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::with_config(
        config,
        5,
        &pattern,
        &[spec((0, 0), (4, 4)), spec((0, 4), (4, 0))],
    )
    .expect("unreachable destinations are accepted");

    let reports = run(&mut simulation, 500);

    let agents = simulation.agents();
    assert!(!agents[0].has_arrived());
    assert_eq!(agents[0].position(), Cell::new(0, 0));
    assert!(agents[1].has_arrived());

    let failures = reports
        .iter()
        .flat_map(|report| report.events.iter())
        .filter(|event| matches!(event, Event::PlanFailed { agent } if *agent == AgentId::new(0)))
        .count();
    assert!(failures > 1, "the stranded agent keeps retrying");
}

#[test]
fn run_until_settled_reports_arrivals() {
    let mut simulation =
        Simulation::initialize(5, &ring(), &[spec((0, 0), (0, 4))]).expect("valid scenario");

    let summary = simulation.run_until_settled(10_000);

    assert!(summary.settled);
    assert_eq!(summary.arrived, vec![AgentId::new(0)]);
    assert_eq!(summary.ticks, 4 * 30);
}

#[test]
fn run_until_settled_stops_at_the_tick_cap() {
    let mut simulation =
        Simulation::initialize(5, &ring(), &[spec((0, 0), (4, 4))]).expect("valid scenario");

    let summary = simulation.run_until_settled(45);

    assert!(!summary.settled);
    assert!(summary.arrived.is_empty());
    assert_eq!(summary.ticks, 45);
}

#[test]
fn config_files_may_override_a_subset_of_fields() {
    let config: SimulationConfig =
        serde_json::from_str(r#"{ "movement_interval": 5 }"#).expect("valid json");

    assert_eq!(config.movement_interval, 5);
    assert_eq!(config.plan_cooldown, 10);
    assert_eq!(config.wait_patience, 3);
    assert_eq!(config.planner_budget, None);
}
