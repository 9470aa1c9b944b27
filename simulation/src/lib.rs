#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven simulation root owning the street grid and every agent.
//!
//! Callers build a [`Simulation`] with [`Simulation::initialize`] and then
//! call [`Simulation::advance_tick`] repeatedly. Each tick runs a planning
//! pass over all agents against an occupancy snapshot taken before anyone
//! plans; movement ticks additionally run a propose, resolve, commit pass.
//! The returned [`TickReport`] is the only thing presentation layers need.

mod config;
mod scheduler;

use grid_traffic_core::{AgentId, AgentSnapshot, AgentSpec, Event, TickReport};
use grid_traffic_system_agents::{Agent, PlanningContext, SpawnRejection};
use grid_traffic_system_movement::{Decision, Movement, Proposal};
use grid_traffic_system_planner::PathPlanner;
use grid_traffic_world::{GridError, GridWorld, OccupancyIndex, WallPattern};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use config::{SimulationConfig, DEFAULT_MOVEMENT_INTERVAL};
pub use scheduler::{TickPhase, TickScheduler};

/// Reasons a simulation cannot be initialised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InitError {
    /// The grid description is invalid.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// One of the requested agents cannot be spawned.
    #[error("invalid spawn for agent {agent}: {reason}")]
    InvalidSpawn {
        /// Position of the offending entry in the input list.
        agent: usize,
        /// Specific rule the entry violates.
        reason: SpawnRejection,
    },
    /// The configuration cannot drive a simulation.
    #[error("movement interval must be at least one tick")]
    InvalidConfig,
}

/// Outcome of driving a simulation until it settles or hits a tick cap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Last tick that was processed.
    pub ticks: u64,
    /// Whether every agent arrived before the cap.
    pub settled: bool,
    /// Agents that arrived, in identifier order.
    pub arrived: Vec<AgentId>,
}

/// In-memory simulation handle.
#[derive(Debug)]
pub struct Simulation {
    world: GridWorld,
    agents: Vec<Agent>,
    scheduler: TickScheduler,
    planner: PathPlanner,
    movement: Movement,
    config: SimulationConfig,
}

impl Simulation {
    /// Builds a simulation with the default configuration.
    pub fn initialize(
        grid_size: u32,
        pattern: &WallPattern,
        agents: &[AgentSpec],
    ) -> Result<Self, InitError> {
        Self::with_config(SimulationConfig::default(), grid_size, pattern, agents)
    }

    /// Builds a simulation, validating the grid and every agent up front.
    ///
    /// Agents receive identifiers in input order, starting at zero.
    pub fn with_config(
        config: SimulationConfig,
        grid_size: u32,
        pattern: &WallPattern,
        specs: &[AgentSpec],
    ) -> Result<Self, InitError> {
        let scheduler =
            TickScheduler::new(config.movement_interval).ok_or(InitError::InvalidConfig)?;
        let world = GridWorld::new(grid_size, pattern)?;
        let tuning = config.tuning();

        let mut agents: Vec<Agent> = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            let invalid = |reason| InitError::InvalidSpawn {
                agent: index,
                reason,
            };

            if let Some(other) = agents.iter().find(|agent| agent.position() == spec.start) {
                return Err(invalid(SpawnRejection::SharedStart {
                    cell: spec.start,
                    other: other.id(),
                }));
            }

            let id = AgentId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let agent = Agent::spawn(id, *spec, &world, tuning).map_err(invalid)?;
            if world.static_distance(spec.start, spec.destination).is_none() {
                warn!(agent = %id, start = %spec.start, destination = %spec.destination, "destination unreachable on the static grid");
            }
            agents.push(agent);
        }

        info!(
            grid_size,
            agents = agents.len(),
            movement_interval = config.movement_interval,
            "simulation initialised"
        );

        Ok(Self {
            world,
            agents,
            scheduler,
            planner: config.planner(),
            movement: Movement::default(),
            config,
        })
    }

    /// Runs one tick: a planning pass, plus a movement pass on movement ticks.
    pub fn advance_tick(&mut self) -> TickReport {
        let phase = self.scheduler.advance();
        let mut events = Vec::new();

        self.planning_pass(&mut events);
        if phase.movement {
            self.movement_pass(&mut events);
        }

        TickReport {
            tick: phase.tick,
            movement_tick: phase.movement,
            agents: self.snapshot(),
            events,
        }
    }

    /// Advances until every agent arrived or `max_ticks` further ticks ran.
    pub fn run_until_settled(&mut self, max_ticks: u64) -> RunSummary {
        for _ in 0..max_ticks {
            if self.all_arrived() {
                break;
            }
            let _ = self.advance_tick();
        }

        RunSummary {
            ticks: self.scheduler.tick(),
            settled: self.all_arrived(),
            arrived: self
                .agents
                .iter()
                .filter(|agent| agent.has_arrived())
                .map(Agent::id)
                .collect(),
        }
    }

    /// Presentation snapshot of every agent, ordered by identifier.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }

    /// Read-only access to the agents.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Read-only access to the street grid.
    #[must_use]
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// Index of the last completed tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.scheduler.tick()
    }

    /// Configuration the simulation was built with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Whether every agent has latched as arrived.
    #[must_use]
    pub fn all_arrived(&self) -> bool {
        self.agents.iter().all(Agent::has_arrived)
    }

    fn occupancy(&self) -> OccupancyIndex {
        OccupancyIndex::from_positions(
            &self.world,
            self.agents
                .iter()
                .map(|agent| (agent.id(), agent.position())),
        )
    }

    fn planning_pass(&mut self, out: &mut Vec<Event>) {
        let occupancy = self.occupancy();
        let context = PlanningContext::new(&self.world, &occupancy, &self.planner);

        for agent in &mut self.agents {
            agent.update(&context, out);
        }
    }

    fn movement_pass(&mut self, out: &mut Vec<Event>) {
        let proposals: Vec<Proposal> = self
            .agents
            .iter()
            .filter_map(|agent| {
                agent.proposal().map(|to| Proposal {
                    agent: agent.id(),
                    from: agent.position(),
                    to,
                })
            })
            .collect();

        if proposals.is_empty() {
            return;
        }

        let mut occupancy = self.occupancy();
        let verdicts = self.movement.resolve(&proposals, &mut occupancy, out);
        debug!(
            tick = self.scheduler.tick(),
            proposals = proposals.len(),
            "movement resolved"
        );

        for verdict in verdicts {
            let Some(agent) = self
                .agents
                .iter_mut()
                .find(|agent| agent.id() == verdict.agent)
            else {
                continue;
            };

            match verdict.decision {
                Decision::Advance { to, .. } => agent.advance(to, out),
                Decision::Wait { blocked_by } => agent.wait(blocked_by, out),
                Decision::Replan => agent.request_replan(out),
            }
        }
    }
}
