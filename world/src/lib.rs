#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable street grid shared by every agent of the Grid Traffic simulation.
//!
//! The [`GridWorld`] is built once from a [`WallPattern`] and never mutated
//! afterwards. It answers pure adjacency and walkability queries; dynamic
//! obstacles (other agents) are tracked separately by the per-tick
//! [`OccupancyIndex`].

mod navigation;
mod occupancy;

use grid_traffic_core::{Cell, Direction, Terrain};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use occupancy::OccupancyIndex;

/// Number of cells along each edge of the default square grid.
pub const DEFAULT_GRID_SIZE: u32 = 21;
/// Default spacing between arterial streets.
pub const DEFAULT_STREET_PERIOD: u32 = 4;

/// Describes which cells of the grid are walls.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WallPattern {
    /// Streets run along every row and column whose index is divisible by
    /// `period`; every other cell is a wall.
    Arterial {
        /// Spacing between consecutive streets.
        period: u32,
    },
    /// Every cell is street except the listed walls.
    Explicit {
        /// Cells that carry wall terrain.
        walls: Vec<Cell>,
    },
}

impl Default for WallPattern {
    fn default() -> Self {
        Self::Arterial {
            period: DEFAULT_STREET_PERIOD,
        }
    }
}

/// Reasons a grid cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The requested grid has no cells.
    #[error("grid must contain at least one cell")]
    EmptyGrid,
    /// The arterial pattern was configured without spacing.
    #[error("arterial street period must be positive")]
    ZeroPeriod,
    /// An explicit wall lies outside the grid.
    #[error("wall {cell} lies outside the {size}x{size} grid")]
    WallOutOfBounds {
        /// Offending wall cell.
        cell: Cell,
        /// Edge length of the grid.
        size: u32,
    },
}

/// Fixed-size square mapping from cells to terrain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridWorld {
    size: u32,
    terrain: Vec<Terrain>,
}

impl GridWorld {
    /// Builds a `size × size` grid whose walls follow the provided pattern.
    pub fn new(size: u32, pattern: &WallPattern) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::EmptyGrid);
        }

        let capacity = usize::try_from(u64::from(size) * u64::from(size))
            .map_err(|_| GridError::EmptyGrid)?;

        let terrain = match pattern {
            WallPattern::Arterial { period } => {
                if *period == 0 {
                    return Err(GridError::ZeroPeriod);
                }
                let mut terrain = Vec::with_capacity(capacity);
                for y in 0..size {
                    for x in 0..size {
                        terrain.push(if x % period == 0 || y % period == 0 {
                            Terrain::Street
                        } else {
                            Terrain::Wall
                        });
                    }
                }
                terrain
            }
            WallPattern::Explicit { walls } => {
                let mut terrain = vec![Terrain::Street; capacity];
                for wall in walls {
                    let index = cell_index(size, *wall).ok_or(GridError::WallOutOfBounds {
                        cell: *wall,
                        size,
                    })?;
                    terrain[index] = Terrain::Wall;
                }
                terrain
            }
        };

        Ok(Self { size, terrain })
    }

    /// Builds the classic arterial lattice with the provided street spacing.
    pub fn arterial(size: u32, period: u32) -> Result<Self, GridError> {
        Self::new(size, &WallPattern::Arterial { period })
    }

    /// Number of cells along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.terrain.len()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, cell: Cell) -> bool {
        cell.x() < self.size && cell.y() < self.size
    }

    /// Terrain of the cell, or `None` outside the grid.
    #[must_use]
    pub fn terrain(&self, cell: Cell) -> Option<Terrain> {
        self.index(cell)
            .and_then(|index| self.terrain.get(index).copied())
    }

    /// Reports whether the cell is traversable. Out-of-bounds cells are not.
    #[must_use]
    pub fn is_street(&self, cell: Cell) -> bool {
        self.terrain(cell) == Some(Terrain::Street)
    }

    /// In-bounds neighbours of `cell` in north, east, south, west order.
    ///
    /// Cells beyond the grid edge are skipped; terrain is not consulted.
    #[must_use]
    pub fn neighbors(&self, cell: Cell) -> Neighbors {
        let mut neighbors = Neighbors::default();
        for direction in Direction::ALL {
            if let Some(candidate) = cell.step(direction) {
                if self.in_bounds(candidate) {
                    neighbors.push(candidate);
                }
            }
        }
        neighbors
    }

    /// Iterates every street cell in row-major order.
    pub fn street_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let size = self.size;
        self.terrain
            .iter()
            .enumerate()
            .filter(|(_, terrain)| **terrain == Terrain::Street)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(Cell::new(index % size, index / size))
            })
    }

    /// Dense row-major index of the cell, or `None` outside the grid.
    #[must_use]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        cell_index(self.size, cell)
    }

    /// Length of the shortest street route between two cells, ignoring agents.
    ///
    /// Returns `None` when either cell is a wall or no route exists.
    #[must_use]
    pub fn static_distance(&self, from: Cell, to: Cell) -> Option<u32> {
        if !self.is_street(from) || !self.is_street(to) {
            return None;
        }

        let mut field = navigation::DistanceField::default();
        field.rebuild_with(self, &[to], |cell| !self.is_street(cell));
        field.distance(from)
    }
}

/// Fixed-capacity iterator over the neighbours of a cell.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<Cell>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, cell: Cell) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

pub(crate) fn cell_index(size: u32, cell: Cell) -> Option<usize> {
    if cell.x() >= size || cell.y() >= size {
        return None;
    }

    let x = usize::try_from(cell.x()).ok()?;
    let y = usize::try_from(cell.y()).ok()?;
    let width = usize::try_from(size).ok()?;
    y.checked_mul(width)?.checked_add(x)
}
