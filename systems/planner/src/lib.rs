#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stateless A* planner that routes a single agent across the street grid.
//!
//! The planner only reads the immutable [`GridWorld`]. Dynamic obstacles are
//! injected per call through an `is_blocked` predicate, which callers build
//! from an occupancy snapshot taken at the start of the tick. Searches are
//! deterministic: ties on `f = g + h` fall back to insertion order, and
//! neighbours are generated north, east, south, west.

use std::{cmp::Ordering, collections::BinaryHeap};

use grid_traffic_core::Cell;
use grid_traffic_world::GridWorld;
use thiserror::Error;
use tracing::warn;

/// Reasons a search can end without a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The open set ran dry before the goal was reached.
    #[error("no path from {start} to {goal}")]
    NoPathFound {
        /// Cell the search started from.
        start: Cell,
        /// Cell the search tried to reach.
        goal: Cell,
    },
    /// The configured expansion budget ran out before the goal was reached.
    #[error("search from {start} to {goal} exceeded {expansions} expansions")]
    BudgetExhausted {
        /// Cell the search started from.
        start: Cell,
        /// Cell the search tried to reach.
        goal: Cell,
        /// Number of nodes expanded before giving up.
        expansions: usize,
    },
}

/// A* search over the street grid with unit step costs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathPlanner {
    expansion_budget: Option<usize>,
}

impl PathPlanner {
    /// Creates a planner without an expansion budget.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expansion_budget: None,
        }
    }

    /// Creates a planner that gives up after expanding `budget` nodes.
    #[must_use]
    pub const fn with_expansion_budget(budget: usize) -> Self {
        Self {
            expansion_budget: Some(budget),
        }
    }

    /// Finds a shortest street route from `start` to `goal`.
    ///
    /// The returned path includes both endpoints; `start == goal` yields a
    /// single-cell path. Cells rejected by `is_blocked` are never entered,
    /// including the goal. The start cell itself is not tested against the
    /// predicate because the caller already stands on it.
    pub fn plan<F>(
        &self,
        world: &GridWorld,
        start: Cell,
        goal: Cell,
        is_blocked: F,
    ) -> Result<Vec<Cell>, PlanError>
    where
        F: Fn(Cell) -> bool,
    {
        let no_path = PlanError::NoPathFound { start, goal };

        if !world.is_street(start) || !world.is_street(goal) {
            return Err(no_path);
        }
        if start == goal {
            return Ok(vec![start]);
        }

        let cell_count = world.cell_count();
        let mut closed = vec![false; cell_count];
        let mut best_cost = vec![u32::MAX; cell_count];
        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut open = BinaryHeap::new();

        let start_index = world.index(start).ok_or(no_path)?;
        best_cost[start_index] = 0;
        nodes.push(SearchNode {
            cell: start,
            parent: None,
            cost: 0,
            estimate: start.euclidean_distance(goal),
        });
        open.push(OpenEntry::for_node(&nodes[0], 0));

        let mut expansions = 0usize;

        while let Some(entry) = open.pop() {
            let node = nodes[entry.sequence];
            let Some(index) = world.index(node.cell) else {
                continue;
            };
            if closed[index] {
                continue;
            }
            closed[index] = true;

            if node.cell == goal {
                return Ok(reconstruct(&nodes, entry.sequence));
            }

            if let Some(budget) = self.expansion_budget {
                if expansions >= budget {
                    warn!(%start, %goal, budget, "path search budget exhausted");
                    return Err(PlanError::BudgetExhausted {
                        start,
                        goal,
                        expansions,
                    });
                }
            }
            expansions += 1;

            let cost = node.cost.saturating_add(1);
            for neighbor in world.neighbors(node.cell) {
                if !world.is_street(neighbor) || is_blocked(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = world.index(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] || cost >= best_cost[neighbor_index] {
                    continue;
                }

                best_cost[neighbor_index] = cost;
                let sequence = nodes.len();
                nodes.push(SearchNode {
                    cell: neighbor,
                    parent: Some(entry.sequence),
                    cost,
                    estimate: neighbor.euclidean_distance(goal),
                });
                open.push(OpenEntry::for_node(&nodes[sequence], sequence));
            }
        }

        Err(no_path)
    }
}

/// Searches with an unbounded [`PathPlanner`].
pub fn plan<F>(world: &GridWorld, start: Cell, goal: Cell, is_blocked: F) -> Result<Vec<Cell>, PlanError>
where
    F: Fn(Cell) -> bool,
{
    PathPlanner::new().plan(world, start, goal, is_blocked)
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    cell: Cell,
    parent: Option<usize>,
    cost: u32,
    estimate: f64,
}

/// Heap entry ordered so the smallest `f`, then the oldest insertion, pops first.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    total: f64,
    sequence: usize,
}

impl OpenEntry {
    fn for_node(node: &SearchNode, sequence: usize) -> Self {
        Self {
            total: f64::from(node.cost) + node.estimate,
            sequence,
        }
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .total
            .total_cmp(&self.total)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

fn reconstruct(nodes: &[SearchNode], goal_sequence: usize) -> Vec<Cell> {
    let mut path = Vec::new();
    let mut cursor = Some(goal_sequence);
    while let Some(sequence) = cursor {
        let node = nodes[sequence];
        path.push(node.cell);
        cursor = node.parent;
    }
    path.reverse();
    path
}
