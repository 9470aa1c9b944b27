//! Static breadth-first distance field over the street grid.

use std::collections::VecDeque;

use grid_traffic_core::Cell;

use crate::GridWorld;

/// Dense step-count grid seeded from one or more source cells.
///
/// Distances default to `u32::MAX` for unreachable cells so callers can
/// distinguish walls and isolated pockets from traversable streets.
#[derive(Clone, Debug, Default)]
pub(crate) struct DistanceField {
    distances: Vec<u32>,
    size: u32,
}

impl DistanceField {
    /// Rebuilds the field using a breadth-first search from `sources`.
    pub(crate) fn rebuild_with<F>(&mut self, world: &GridWorld, sources: &[Cell], mut is_blocked: F)
    where
        F: FnMut(Cell) -> bool,
    {
        let cell_count = world.cell_count();
        if self.distances.len() != cell_count {
            self.distances = vec![u32::MAX; cell_count];
        } else {
            self.distances.fill(u32::MAX);
        }
        self.size = world.size();

        let mut queue = VecDeque::new();

        for &source in sources {
            if is_blocked(source) {
                continue;
            }

            if let Some(index) = world.index(source) {
                if self.distances[index] == 0 {
                    continue;
                }

                self.distances[index] = 0;
                queue.push_back(source);
            }
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = world.index(cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for neighbor in world.neighbors(cell) {
                if is_blocked(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = world.index(neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Steps from the provided cell to the nearest source, if reachable.
    #[must_use]
    pub(crate) fn distance(&self, cell: Cell) -> Option<u32> {
        let index = crate::cell_index(self.size, cell)?;
        self.distances
            .get(index)
            .copied()
            .filter(|distance| *distance != u32::MAX)
    }
}
