//! Random world generation for headless runs.
//!
//! The start cell and its orthogonal neighbours stay clear so the first
//! tick is never a forced death.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use wumpus_core::grid::orthogonal;
use wumpus_core::{Cell, Tile, World, WorldError};

/// Parameters for a generated world.
#[derive(Clone, Debug)]
pub struct WorldSpec {
    pub size: usize,
    /// Pit probability per eligible cell.
    pub pit_density: f64,
    pub wumpus_count: usize,
    pub arrow_count: usize,
}

impl Default for WorldSpec {
    fn default() -> Self {
        Self {
            size: 4,
            pit_density: 0.12,
            wumpus_count: 1,
            arrow_count: 1,
        }
    }
}

/// Roll a world: one gold, then wumpuses and arrow pickups, then pits over
/// whatever is left.
pub fn generate(spec: &WorldSpec, rng: &mut StdRng) -> Result<World, WorldError> {
    let size = spec.size.max(2);
    let mut rows = vec![vec![Tile::Empty; size]; size];

    let start_pocket: Vec<Cell> = std::iter::once((0, 0))
        .chain(orthogonal(size, 0, 0))
        .collect();
    let mut open: Vec<Cell> = (0..size)
        .flat_map(|i| (0..size).map(move |j| (i, j)))
        .filter(|cell| !start_pocket.contains(cell))
        .collect();
    open.shuffle(rng);

    if let Some((i, j)) = open.pop() {
        rows[i][j] = Tile::Gold;
    }
    for _ in 0..spec.wumpus_count {
        if let Some((i, j)) = open.pop() {
            rows[i][j] = Tile::Wumpus;
        }
    }
    for _ in 0..spec.arrow_count {
        if let Some((i, j)) = open.pop() {
            rows[i][j] = Tile::Arrow;
        }
    }
    let density = spec.pit_density.clamp(0.0, 1.0);
    for (i, j) in open {
        if rng.gen_bool(density) {
            rows[i][j] = Tile::Pit;
        }
    }

    World::from_rows(rows)
}
