//! Grid world and local percepts.
//!
//! The world is a square, row-major grid of labelled tiles; `(0, 0)` is the
//! agent's start, coordinates are `(row, col)`. Percepts are computed on
//! demand from the tiles around a cell — nothing in this module is stateful.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `(row, col)` grid coordinates.
pub type Cell = (usize, usize);

/// Label carried by a single world tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tile {
    Empty,
    Pit,
    Wumpus,
    Gold,
    Arrow,
}

/// Errors raised while constructing a world from row data.
#[derive(Error, Debug)]
pub enum WorldError {
    #[error("world must be square: row {row} has {len} tiles, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("world side must be at least 2, got {0}")]
    TooSmall(usize),
}

/// Square grid of tiles. Mutated only by the agent: pickups and kills turn a
/// tile back into [`Tile::Empty`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    size: usize,
    tiles: Vec<Tile>,
}

impl World {
    /// Build a world from row-major rows. The grid must be square with side
    /// at least 2.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, WorldError> {
        let size = rows.len();
        if size < 2 {
            return Err(WorldError::TooSmall(size));
        }
        let mut tiles = Vec::with_capacity(size * size);
        for (row, r) in rows.into_iter().enumerate() {
            if r.len() != size {
                return Err(WorldError::NotSquare {
                    row,
                    len: r.len(),
                    expected: size,
                });
            }
            tiles.extend(r);
        }
        Ok(Self { size, tiles })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> Tile {
        self.tiles[i * self.size + j]
    }

    pub fn set(&mut self, i: usize, j: usize, tile: Tile) {
        self.tiles[i * self.size + j] = tile;
    }

    /// Row-major copy of the tiles, one `Vec` per row.
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.tiles.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    /// Percepts at `(i, j)`: glitter and arrow come from the tile itself,
    /// breeze and stench from the orthogonal neighbourhood.
    pub fn percepts(&self, i: usize, j: usize) -> Percepts {
        let mut p = Percepts {
            glitter: self.get(i, j) == Tile::Gold,
            arrow: self.get(i, j) == Tile::Arrow,
            ..Percepts::default()
        };
        for (ni, nj) in orthogonal(self.size, i, j) {
            match self.get(ni, nj) {
                Tile::Pit => p.breeze = true,
                Tile::Wumpus => p.stench = true,
                _ => {}
            }
        }
        p
    }
}

/// Local observations available while standing on a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percepts {
    pub breeze: bool,
    pub stench: bool,
    pub glitter: bool,
    pub arrow: bool,
}

/// Orthogonal neighbours in N, S, W, E order — the tie-break order every
/// controller rule relies on.
pub fn orthogonal(size: usize, i: usize, j: usize) -> impl Iterator<Item = Cell> {
    const DELTAS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    DELTAS
        .iter()
        .filter_map(move |&(di, dj)| offset(size, i, j, di, dj))
}

/// Diagonal neighbours: Chebyshev distance 1, Manhattan distance 2.
pub fn diagonal(size: usize, i: usize, j: usize) -> impl Iterator<Item = Cell> {
    const DELTAS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
    DELTAS
        .iter()
        .filter_map(move |&(di, dj)| offset(size, i, j, di, dj))
}

/// True when both coordinates sit on an edge.
pub fn is_corner(size: usize, i: usize, j: usize) -> bool {
    (i == 0 || i == size - 1) && (j == 0 || j == size - 1)
}

fn offset(size: usize, i: usize, j: usize, di: isize, dj: isize) -> Option<Cell> {
    let ni = i as isize + di;
    let nj = j as isize + dj;
    if ni >= 0 && ni < size as isize && nj >= 0 && nj < size as isize {
        Some((ni as usize, nj as usize))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_world(size: usize) -> World {
        World::from_rows(vec![vec![Tile::Empty; size]; size]).unwrap()
    }

    #[test]
    fn test_orthogonal_order_is_n_s_w_e() {
        let n: Vec<Cell> = orthogonal(4, 1, 1).collect();
        assert_eq!(n, vec![(0, 1), (2, 1), (1, 0), (1, 2)]);
    }

    #[test]
    fn test_orthogonal_clips_at_edges() {
        let n: Vec<Cell> = orthogonal(4, 0, 0).collect();
        assert_eq!(n, vec![(1, 0), (0, 1)]);
    }

    #[test]
    fn test_diagonal_neighbours() {
        let n: Vec<Cell> = diagonal(4, 0, 0).collect();
        assert_eq!(n, vec![(1, 1)]);
        let n: Vec<Cell> = diagonal(4, 2, 2).collect();
        assert_eq!(n, vec![(1, 1), (1, 3), (3, 1), (3, 3)]);
    }

    #[test]
    fn test_corner_predicate() {
        assert!(is_corner(4, 0, 0));
        assert!(is_corner(4, 3, 0));
        assert!(is_corner(4, 0, 3));
        assert!(is_corner(4, 3, 3));
        assert!(!is_corner(4, 0, 1));
        assert!(!is_corner(4, 2, 2));
    }

    #[test]
    fn test_world_rejects_bad_shapes() {
        assert!(matches!(
            World::from_rows(vec![vec![Tile::Empty]]),
            Err(WorldError::TooSmall(1))
        ));
        let ragged = vec![vec![Tile::Empty, Tile::Empty], vec![Tile::Empty]];
        assert!(matches!(
            World::from_rows(ragged),
            Err(WorldError::NotSquare { row: 1, .. })
        ));
    }

    #[test]
    fn test_percepts_from_neighbours() {
        let mut world = empty_world(4);
        world.set(1, 1, Tile::Pit);
        world.set(0, 2, Tile::Wumpus);
        world.set(0, 0, Tile::Gold);

        let p = world.percepts(0, 1);
        assert!(p.breeze, "pit south of (0,1) should raise breeze");
        assert!(p.stench, "wumpus east of (0,1) should raise stench");
        assert!(!p.glitter);

        let p = world.percepts(0, 0);
        assert!(p.glitter, "standing on gold raises glitter");
        assert!(!p.breeze);

        let p = world.percepts(3, 3);
        assert_eq!(p, Percepts::default());
    }

    #[test]
    fn test_tile_serde_labels_are_lowercase() {
        let json = serde_json::to_string(&Tile::Wumpus).unwrap();
        assert_eq!(json, "\"wumpus\"");
        let tile: Tile = serde_json::from_str("\"empty\"").unwrap();
        assert_eq!(tile, Tile::Empty);
    }
}
