//! Dense per-tick index from cells to the agents standing on them.

use grid_traffic_core::{AgentId, Cell};

use crate::{cell_index, GridWorld};

/// Snapshot of which agent occupies which cell.
///
/// Built once at the start of a planning or movement phase and queried by
/// every agent, replacing per-query scans over the agent list. Cells outside
/// the grid are never occupied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyIndex {
    size: u32,
    cells: Vec<Option<AgentId>>,
}

impl OccupancyIndex {
    /// Creates an empty index matching the grid dimensions.
    #[must_use]
    pub fn new(world: &GridWorld) -> Self {
        Self {
            size: world.size(),
            cells: vec![None; world.cell_count()],
        }
    }

    /// Creates an index populated with the provided agent positions.
    #[must_use]
    pub fn from_positions<I>(world: &GridWorld, positions: I) -> Self
    where
        I: IntoIterator<Item = (AgentId, Cell)>,
    {
        let mut index = Self::new(world);
        for (agent, cell) in positions {
            let _ = index.occupy(agent, cell);
        }
        index
    }

    /// Returns the agent occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: Cell) -> Option<AgentId> {
        cell_index(self.size, cell).and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether no agent stands on the cell.
    #[must_use]
    pub fn is_free(&self, cell: Cell) -> bool {
        self.occupant(cell).is_none()
    }

    /// Reports whether an agent other than `agent` stands on the cell.
    #[must_use]
    pub fn is_held_by_other(&self, cell: Cell, agent: AgentId) -> bool {
        matches!(self.occupant(cell), Some(occupant) if occupant != agent)
    }

    /// Marks the cell as held by `agent`, returning the previous occupant.
    pub fn occupy(&mut self, agent: AgentId, cell: Cell) -> Option<AgentId> {
        let index = cell_index(self.size, cell)?;
        self.cells.get_mut(index).and_then(|slot| slot.replace(agent))
    }

    /// Clears the cell, returning the agent that stood there.
    pub fn vacate(&mut self, cell: Cell) -> Option<AgentId> {
        let index = cell_index(self.size, cell)?;
        self.cells.get_mut(index).and_then(Option::take)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_some()).count()
    }
}
