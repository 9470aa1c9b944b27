use std::{fs, path::Path};

use anyhow::{Context, Result};
use grid_traffic_core::AgentSpec;
use grid_traffic_simulation::{InitError, Simulation, SimulationConfig};
use grid_traffic_world::{WallPattern, DEFAULT_GRID_SIZE};
use serde::{Deserialize, Serialize};

/// Complete description of a run loaded from a JSON file.
///
/// Only `agents` is required; the grid, its walls and the simulation
/// configuration fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Number of cells along each edge of the square grid.
    #[serde(default = "default_grid_size")]
    pub(crate) grid_size: u32,
    /// Wall layout of the grid.
    #[serde(default)]
    pub(crate) pattern: WallPattern,
    /// Timing and planner parameters.
    #[serde(default)]
    pub(crate) config: SimulationConfig,
    /// Agents to spawn, in identifier order.
    pub(crate) agents: Vec<AgentSpec>,
}

impl Scenario {
    /// Parses a scenario from its JSON representation.
    pub(crate) fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    /// Builds the simulation the scenario describes.
    pub(crate) fn build(&self) -> Result<Simulation, InitError> {
        Simulation::with_config(self.config, self.grid_size, &self.pattern, &self.agents)
    }
}

const fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

#[cfg(test)]
mod tests {
    use grid_traffic_core::Cell;

    use super::*;

    #[test]
    fn minimal_scenario_uses_defaults() {
        let scenario = Scenario::parse(
            r#"{ "agents": [ { "start": { "x": 0, "y": 0 }, "destination": { "x": 4, "y": 4 } } ] }"#,
        )
        .expect("valid scenario");

        assert_eq!(scenario.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(scenario.pattern, WallPattern::default());
        assert_eq!(scenario.config, SimulationConfig::default());
        assert_eq!(
            scenario.agents,
            vec![AgentSpec::new(Cell::new(0, 0), Cell::new(4, 4))]
        );
    }

    #[test]
    fn explicit_walls_and_config_overrides_are_honoured() {
        let scenario = Scenario::parse(
            r#"{
                "grid_size": 5,
                "pattern": { "kind": "explicit", "walls": [ { "x": 2, "y": 2 } ] },
                "config": { "movement_interval": 1, "plan_cooldown": 0 },
                "agents": [
                    { "start": { "x": 0, "y": 2 }, "destination": { "x": 4, "y": 2 } }
                ]
            }"#,
        )
        .expect("valid scenario");

        let mut simulation = scenario.build().expect("buildable scenario");
        let summary = simulation.run_until_settled(100);

        assert!(summary.settled);
        assert!(!simulation.world().is_street(Cell::new(2, 2)));
        assert_eq!(scenario.config.wait_patience, 3);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Scenario::parse(r#"{ "agents": [], "lanes": [] }"#)
            .expect_err("unknown field must fail");

        assert!(error.to_string().contains("lanes"));
    }

    #[test]
    fn invalid_agents_surface_init_errors() {
        let scenario = Scenario::parse(
            r#"{ "grid_size": 5, "agents": [ { "start": { "x": 0, "y": 0 }, "destination": { "x": 1, "y": 1 } } ] }"#,
        )
        .expect("valid json");

        assert!(matches!(
            scenario.build(),
            Err(InitError::InvalidSpawn { agent: 0, .. })
        ));
    }
}
