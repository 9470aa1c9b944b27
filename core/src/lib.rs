#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Traffic simulation.
//!
//! This crate defines the value types that connect the street world, the
//! pure planning and movement systems, and the adapters that present the
//! simulation. Systems never reach into each other's state; they exchange
//! [`Cell`] coordinates, [`AgentId`] handles, and broadcast [`Event`] values
//! describing what happened during a tick. Adapters consume [`TickReport`]
//! snapshots and nothing else.

use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as column (`x`) and row (`y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    x: u32,
    y: u32,
}

impl Cell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the straight-line distance between two cells.
    ///
    /// Never exceeds [`Cell::manhattan_distance`], which makes it an
    /// admissible estimate for unit-cost four-directional travel.
    #[must_use]
    pub fn euclidean_distance(self, other: Cell) -> f64 {
        let dx = f64::from(self.x.abs_diff(other.x));
        let dy = f64::from(self.y.abs_diff(other.y));
        dx.hypot(dy)
    }

    /// Reports whether `other` shares an edge with this cell.
    #[must_use]
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Returns the neighbouring cell in the provided direction.
    ///
    /// Yields `None` when the step would leave the non-negative quadrant.
    /// Upper bounds are the grid's concern, not the coordinate's.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Cell> {
        match direction {
            Direction::North => self.y.checked_sub(1).map(|y| Cell::new(self.x, y)),
            Direction::East => self.x.checked_add(1).map(|x| Cell::new(x, self.y)),
            Direction::South => self.y.checked_add(1).map(|y| Cell::new(self.x, y)),
            Direction::West => self.x.checked_sub(1).map(|x| Cell::new(x, self.y)),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement directions available to agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in neighbour generation order.
    ///
    /// The order decides search tie-breaks and must stay fixed for replays to
    /// remain reproducible.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Terrain tag attached to every cell of the street grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Traversable road surface.
    Street,
    /// Impassable block between streets.
    Wall,
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Lifecycle stage of an agent's plan-or-move state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// The agent must search for a path on its next eligible planning check.
    NeedsPlan,
    /// A re-plan was requested but the planning cooldown has not elapsed.
    Cooldown,
    /// The agent follows a planned path, one cell per movement tick.
    HasPath,
    /// The agent reached its destination. Terminal.
    Arrived,
}

/// Start and destination requested for one agent at initialisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Cell the agent occupies when the simulation starts.
    pub start: Cell,
    /// Cell the agent travels toward.
    pub destination: Cell,
}

impl AgentSpec {
    /// Creates a request travelling from `start` to `destination`.
    #[must_use]
    pub const fn new(start: Cell, destination: Cell) -> Self {
        Self { start, destination }
    }
}

/// Immutable representation of a single agent's state used for presentation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Grid cell currently occupied by the agent.
    pub position: Cell,
    /// Grid cell the agent travels toward.
    pub destination: Cell,
    /// Remaining cells of the current plan, excluding the current position.
    pub path: Vec<Cell>,
    /// Current lifecycle stage.
    pub state: AgentState,
}

/// Classification of a contested movement proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Two agents tried to swap cells with each other.
    HeadOn,
    /// The proposed cell was held by an agent that was not swapping back.
    BlockedTarget,
    /// Several agents proposed the same free cell.
    ContestedTarget,
}

/// Events broadcast by the simulation while processing a tick.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// An agent computed a fresh path to its destination.
    PathPlanned {
        /// Agent that planned.
        agent: AgentId,
        /// Number of steps in the new path.
        steps: usize,
    },
    /// An agent's search failed; it will retry once its cooldown elapses.
    PlanFailed {
        /// Agent whose search failed.
        agent: AgentId,
    },
    /// Confirms that an agent moved between two adjacent cells.
    AgentAdvanced {
        /// Agent that advanced.
        agent: AgentId,
        /// Cell the agent occupied before moving.
        from: Cell,
        /// Cell the agent occupies after completing the move.
        to: Cell,
    },
    /// An agent kept its path but did not move this movement tick.
    AgentWaited {
        /// Agent that waited.
        agent: AgentId,
        /// Agent holding the cell the waiting agent wants.
        blocked_by: AgentId,
    },
    /// An agent dropped its move and asked for a new path.
    ReplanRequested {
        /// Agent that will re-plan.
        agent: AgentId,
    },
    /// Reports how a movement conflict between two agents was settled.
    ConflictResolved {
        /// Kind of conflict that was detected.
        kind: ConflictKind,
        /// Cell the yielding agent failed to enter.
        cell: Cell,
        /// Agent whose claim stood.
        prevailing: AgentId,
        /// Agent that gave way.
        yielding: AgentId,
    },
    /// An agent reached its destination and latched as arrived.
    AgentArrived {
        /// Agent that arrived.
        agent: AgentId,
        /// Destination cell.
        cell: Cell,
    },
}

/// Snapshot produced by every call that advances the simulation clock.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickReport {
    /// Index of the tick that just completed, starting at one.
    pub tick: u64,
    /// Whether agents were allowed to move during the tick.
    pub movement_tick: bool,
    /// Per-agent state after the tick, ordered by identifier.
    pub agents: Vec<AgentSnapshot>,
    /// Events emitted while processing the tick, in emission order.
    pub events: Vec<Event>,
}

impl TickReport {
    /// Finds the snapshot captured for the provided agent.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|snapshot| snapshot.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentId, AgentSpec, Cell, ConflictKind, Direction, Event};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = Cell::new(1, 1);
        let destination = Cell::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn euclidean_never_exceeds_manhattan() {
        let origin = Cell::new(0, 0);
        for cell in [Cell::new(4, 4), Cell::new(3, 0), Cell::new(7, 2)] {
            assert!(origin.euclidean_distance(cell) <= f64::from(origin.manhattan_distance(cell)));
        }
        assert!((origin.euclidean_distance(Cell::new(3, 4)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn step_refuses_negative_coordinates() {
        let corner = Cell::new(0, 0);
        assert_eq!(corner.step(Direction::North), None);
        assert_eq!(corner.step(Direction::West), None);
        assert_eq!(corner.step(Direction::East), Some(Cell::new(1, 0)));
        assert_eq!(corner.step(Direction::South), Some(Cell::new(0, 1)));
    }

    #[test]
    fn every_direction_steps_to_an_adjacent_cell() {
        let origin = Cell::new(3, 3);
        let steps: Vec<Cell> = Direction::ALL
            .into_iter()
            .filter_map(|direction| origin.step(direction))
            .collect();

        assert_eq!(
            steps,
            vec![
                Cell::new(3, 2),
                Cell::new(4, 3),
                Cell::new(3, 4),
                Cell::new(2, 3)
            ]
        );
        assert!(steps.iter().all(|cell| origin.is_adjacent(*cell)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn agent_spec_round_trips_through_bincode() {
        assert_round_trip(&AgentSpec::new(Cell::new(0, 0), Cell::new(4, 4)));
    }

    #[test]
    fn conflict_event_round_trips_through_bincode() {
        assert_round_trip(&Event::ConflictResolved {
            kind: ConflictKind::HeadOn,
            cell: Cell::new(2, 0),
            prevailing: AgentId::new(1),
            yielding: AgentId::new(0),
        });
    }
}
