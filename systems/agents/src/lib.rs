#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent state machine deciding when to plan and when to move.
//!
//! Every tick the scheduler calls [`Agent::update`] with a read-only
//! [`PlanningContext`]. The agent only mutates itself, so the planning pass
//! gives the same result regardless of the order agents are visited in. On
//! movement ticks the agent exposes a [`Agent::proposal`] and later receives
//! exactly one verdict: [`Agent::advance`], [`Agent::wait`] or
//! [`Agent::request_replan`].

use std::collections::VecDeque;

use grid_traffic_core::{AgentId, AgentSnapshot, AgentSpec, AgentState, Cell, Event};
use grid_traffic_system_planner::PathPlanner;
use grid_traffic_world::{GridWorld, OccupancyIndex};
use thiserror::Error;
use tracing::{debug, info, trace};

/// Ticks an agent must wait between two planning attempts.
pub const DEFAULT_PLAN_COOLDOWN: u32 = 10;
/// Consecutive movement ticks an agent waits behind a moving agent before re-planning.
pub const DEFAULT_WAIT_PATIENCE: u32 = 3;

/// Reasons an agent cannot be spawned with the requested cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpawnRejection {
    /// The start cell lies outside the grid.
    #[error("start {0} lies outside the grid")]
    StartOutOfBounds(Cell),
    /// The destination cell lies outside the grid.
    #[error("destination {0} lies outside the grid")]
    DestinationOutOfBounds(Cell),
    /// The start cell is a wall.
    #[error("start {0} is a wall")]
    StartOnWall(Cell),
    /// The destination cell is a wall.
    #[error("destination {0} is a wall")]
    DestinationOnWall(Cell),
    /// The agent would already stand on its destination.
    #[error("start and destination coincide at {0}")]
    StartIsDestination(Cell),
    /// Another agent already starts on the same cell.
    #[error("start {cell} is already taken by {other}")]
    SharedStart {
        /// Contested start cell.
        cell: Cell,
        /// Agent that claimed the cell first.
        other: AgentId,
    },
}

/// Timing parameters shared by every agent of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentTuning {
    plan_cooldown: u32,
    wait_patience: u32,
}

impl AgentTuning {
    /// Creates tuning with explicit cooldown and patience values.
    ///
    /// A patience of zero is treated as one: an agent always waits at least
    /// one movement tick before giving up on a blocked cell.
    #[must_use]
    pub const fn new(plan_cooldown: u32, wait_patience: u32) -> Self {
        Self {
            plan_cooldown,
            wait_patience,
        }
    }
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN_COOLDOWN, DEFAULT_WAIT_PATIENCE)
    }
}

/// Read-only inputs available to an agent during the planning pass.
#[derive(Clone, Copy, Debug)]
pub struct PlanningContext<'a> {
    world: &'a GridWorld,
    occupancy: &'a OccupancyIndex,
    planner: &'a PathPlanner,
}

impl<'a> PlanningContext<'a> {
    /// Bundles the immutable world, the occupancy snapshot and the planner.
    #[must_use]
    pub const fn new(
        world: &'a GridWorld,
        occupancy: &'a OccupancyIndex,
        planner: &'a PathPlanner,
    ) -> Self {
        Self {
            world,
            occupancy,
            planner,
        }
    }
}

/// One mover travelling across the street grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    id: AgentId,
    position: Cell,
    destination: Cell,
    path: VecDeque<Cell>,
    state: AgentState,
    plan_cooldown_remaining: u32,
    arrived: bool,
    waited_ticks: u32,
    tuning: AgentTuning,
}

impl Agent {
    /// Validates the requested cells against the grid and creates an agent awaiting its first plan.
    pub fn spawn(
        id: AgentId,
        spec: AgentSpec,
        world: &GridWorld,
        tuning: AgentTuning,
    ) -> Result<Self, SpawnRejection> {
        let AgentSpec { start, destination } = spec;

        if !world.in_bounds(start) {
            return Err(SpawnRejection::StartOutOfBounds(start));
        }
        if !world.in_bounds(destination) {
            return Err(SpawnRejection::DestinationOutOfBounds(destination));
        }
        if !world.is_street(start) {
            return Err(SpawnRejection::StartOnWall(start));
        }
        if !world.is_street(destination) {
            return Err(SpawnRejection::DestinationOnWall(destination));
        }
        if start == destination {
            return Err(SpawnRejection::StartIsDestination(start));
        }

        Ok(Self {
            id,
            position: start,
            destination,
            path: VecDeque::new(),
            state: AgentState::NeedsPlan,
            plan_cooldown_remaining: 0,
            arrived: false,
            waited_ticks: 0,
            tuning,
        })
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Cell currently occupied.
    #[must_use]
    pub const fn position(&self) -> Cell {
        self.position
    }

    /// Cell the agent travels toward.
    #[must_use]
    pub const fn destination(&self) -> Cell {
        self.destination
    }

    /// Remaining cells of the current plan, excluding the current position.
    pub fn path(&self) -> impl Iterator<Item = Cell> + '_ {
        self.path.iter().copied()
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Ticks left before the agent may plan again.
    #[must_use]
    pub const fn plan_cooldown_remaining(&self) -> u32 {
        self.plan_cooldown_remaining
    }

    /// Whether the agent has reached its destination. Never resets.
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Captures the presentation snapshot of the agent.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            destination: self.destination,
            path: self.path.iter().copied().collect(),
            state: self.state,
        }
    }

    /// Runs the per-tick planning check.
    pub fn update(&mut self, context: &PlanningContext<'_>, out: &mut Vec<Event>) {
        match self.state {
            AgentState::Arrived => {}
            AgentState::HasPath => {
                if self.path.is_empty() {
                    self.request_replan(out);
                }
            }
            AgentState::Cooldown => {
                self.plan_cooldown_remaining = self.plan_cooldown_remaining.saturating_sub(1);
                if self.plan_cooldown_remaining == 0 {
                    self.state = AgentState::NeedsPlan;
                }
            }
            AgentState::NeedsPlan => {
                if self.position == self.destination {
                    self.arrive(out);
                } else if self.plan_cooldown_remaining > 0 {
                    self.plan_cooldown_remaining -= 1;
                } else {
                    self.plan(context, out);
                }
            }
        }
    }

    /// Next cell the agent wants to enter this movement tick.
    #[must_use]
    pub fn proposal(&self) -> Option<Cell> {
        if self.state == AgentState::HasPath {
            self.path.front().copied()
        } else {
            None
        }
    }

    /// Moves onto `to`, which must be the head of the current path.
    pub fn advance(&mut self, to: Cell, out: &mut Vec<Event>) {
        if self.state != AgentState::HasPath || self.path.front() != Some(&to) {
            self.request_replan(out);
            return;
        }

        let from = self.position;
        let _ = self.path.pop_front();
        self.position = to;
        self.waited_ticks = 0;
        out.push(Event::AgentAdvanced {
            agent: self.id,
            from,
            to,
        });

        if self.position == self.destination {
            self.arrive(out);
        } else if self.path.is_empty() {
            self.request_replan(out);
        }
    }

    /// Keeps the current path without moving this movement tick.
    ///
    /// Once the agent has waited for its configured patience it re-plans.
    pub fn wait(&mut self, blocked_by: AgentId, out: &mut Vec<Event>) {
        if self.arrived {
            return;
        }

        self.waited_ticks = self.waited_ticks.saturating_add(1);
        out.push(Event::AgentWaited {
            agent: self.id,
            blocked_by,
        });

        if self.waited_ticks >= self.tuning.wait_patience.max(1) {
            debug!(agent = %self.id, waited = self.waited_ticks, "patience exhausted");
            self.request_replan(out);
        }
    }

    /// Drops the current move and asks for a fresh path.
    pub fn request_replan(&mut self, out: &mut Vec<Event>) {
        if self.arrived {
            return;
        }

        self.waited_ticks = 0;
        self.state = if self.plan_cooldown_remaining > 0 {
            AgentState::Cooldown
        } else {
            AgentState::NeedsPlan
        };
        debug!(agent = %self.id, state = ?self.state, "replan requested");
        out.push(Event::ReplanRequested { agent: self.id });
    }

    fn plan(&mut self, context: &PlanningContext<'_>, out: &mut Vec<Event>) {
        let own = self.id;
        let destination = self.destination;
        let occupancy = context.occupancy;

        let result = context
            .planner
            .plan(context.world, self.position, destination, |cell| {
                cell != destination && occupancy.is_held_by_other(cell, own)
            });
        self.plan_cooldown_remaining = self.tuning.plan_cooldown;

        match result {
            Ok(path) => {
                self.path = path.into_iter().skip(1).collect();
                self.state = AgentState::HasPath;
                self.waited_ticks = 0;
                trace!(agent = %own, steps = self.path.len(), "path planned");
                out.push(Event::PathPlanned {
                    agent: own,
                    steps: self.path.len(),
                });
            }
            Err(error) => {
                self.path.clear();
                self.state = AgentState::NeedsPlan;
                debug!(agent = %own, %error, "planning failed");
                out.push(Event::PlanFailed { agent: own });
            }
        }
    }

    fn arrive(&mut self, out: &mut Vec<Event>) {
        self.arrived = true;
        self.state = AgentState::Arrived;
        self.path.clear();
        info!(agent = %self.id, cell = %self.position, "success - path found");
        out.push(Event::AgentArrived {
            agent: self.id,
            cell: self.position,
        });
    }
}
