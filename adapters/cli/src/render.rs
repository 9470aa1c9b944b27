use grid_traffic_core::{AgentSnapshot, Cell, Event};
use grid_traffic_world::GridWorld;

const WALL: char = '#';
const STREET: char = '.';
const PATH: char = '*';

/// Draws the grid row by row with planned paths and agents layered on top.
///
/// Agents are drawn as the last digit of their identifier.
pub(crate) fn grid(world: &GridWorld, agents: &[AgentSnapshot]) -> String {
    let size = world.size();
    let mut canvas: Vec<Vec<char>> = (0..size)
        .map(|y| {
            (0..size)
                .map(|x| {
                    if world.is_street(Cell::new(x, y)) {
                        STREET
                    } else {
                        WALL
                    }
                })
                .collect()
        })
        .collect();

    let mut paint = |cell: Cell, symbol: char| {
        if let Some(slot) = canvas
            .get_mut(cell.y() as usize)
            .and_then(|row| row.get_mut(cell.x() as usize))
        {
            *slot = symbol;
        }
    };

    for agent in agents {
        for cell in &agent.path {
            paint(*cell, PATH);
        }
    }
    for agent in agents {
        let digit = char::from_digit(agent.id.get() % 10, 10).unwrap_or('@');
        paint(agent.position, digit);
    }

    canvas
        .into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line narration for the events worth showing in text mode.
pub(crate) fn describe(event: &Event) -> Option<String> {
    match event {
        Event::AgentArrived { agent, cell } => Some(format!("{agent} success - path found, arrived at {cell}")),
        Event::PlanFailed { agent } => Some(format!("{agent} found no path, retrying after cooldown")),
        Event::ConflictResolved {
            kind,
            cell,
            prevailing,
            yielding,
        } => Some(format!(
            "{kind:?} conflict at {cell}: {prevailing} keeps its move, {yielding} yields"
        )),
        _ => None,
    }
}
