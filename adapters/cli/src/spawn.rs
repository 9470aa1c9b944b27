use anyhow::{ensure, Result};
use grid_traffic_core::{AgentSpec, Cell};
use grid_traffic_world::GridWorld;
use rand::{seq::SliceRandom, Rng};

/// Picks `count` agents with distinct street starts and street destinations
/// that differ from their start.
pub(crate) fn random_specs<R: Rng>(
    world: &GridWorld,
    count: usize,
    rng: &mut R,
) -> Result<Vec<AgentSpec>> {
    let streets: Vec<Cell> = world.street_cells().collect();
    if count == 0 {
        return Ok(Vec::new());
    }
    ensure!(
        streets.len() >= 2,
        "grid needs at least two street cells to spawn agents"
    );
    ensure!(
        count <= streets.len(),
        "cannot place {count} agents on {} street cells",
        streets.len()
    );

    let mut starts = streets.clone();
    starts.shuffle(rng);
    starts.truncate(count);

    Ok(starts
        .into_iter()
        .map(|start| {
            let destination = loop {
                let candidate = streets[rng.gen_range(0..streets.len())];
                if candidate != start {
                    break candidate;
                }
            };
            AgentSpec::new(start, destination)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn spawns_are_valid_and_unique() {
        let world = GridWorld::arterial(21, 4).expect("valid grid");
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let specs = random_specs(&world, 40, &mut rng).expect("enough streets");

        assert_eq!(specs.len(), 40);
        let starts: HashSet<Cell> = specs.iter().map(|spec| spec.start).collect();
        assert_eq!(starts.len(), specs.len());
        for spec in &specs {
            assert!(world.is_street(spec.start));
            assert!(world.is_street(spec.destination));
            assert_ne!(spec.start, spec.destination);
        }
    }

    #[test]
    fn identical_seeds_yield_identical_spawns() {
        let world = GridWorld::arterial(21, 4).expect("valid grid");

        let first = random_specs(&world, 6, &mut ChaCha8Rng::seed_from_u64(3)).expect("spawns");
        let second = random_specs(&world, 6, &mut ChaCha8Rng::seed_from_u64(3)).expect("spawns");

        assert_eq!(first, second);
    }

    #[test]
    fn overcrowded_grids_are_rejected() {
        let world = GridWorld::arterial(5, 4).expect("valid grid");
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(random_specs(&world, 17, &mut rng).is_err());
        assert!(random_specs(&world, 0, &mut rng)
            .expect("no agents requested")
            .is_empty());
    }
}
