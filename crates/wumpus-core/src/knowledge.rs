//! Per-cell beliefs and the rebuild pipeline.
//!
//! `rebuild` runs five passes in a fixed order: reset, logical entailment,
//! support counting, support-to-probability, dominance. The order is load
//! bearing — logical conclusions override heuristic mass, and confirmed
//! hazards suppress heuristic mass across their 8-neighbourhood after the
//! support pass has already assigned it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grid::{diagonal, is_corner, orthogonal, Cell, Percepts};
use crate::logic::{self, Atom, Lit, VarRegistry};

/// Support-to-probability curve: `0.32 * log2(s + 1)^1.1`, boosted 1.6x at
/// corners, clamped to 0.82. Support saturates at 4 distinct witnesses.
const PROB_BASE: f64 = 0.32;
const PROB_EXPONENT: f64 = 1.1;
const CORNER_BOOST: f64 = 1.6;
const PROB_CAP: f64 = 0.82;
const SUPPORT_SATURATION: u32 = 4;

/// Everything the agent believes about one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellBelief {
    /// The agent has stood here.
    pub visited: bool,
    /// Proven free of hazards.
    pub safe: bool,
    /// Pit established by entailment.
    pub confirmed_pit: bool,
    /// Wumpus established by entailment.
    pub confirmed_wumpus: bool,
    /// Percepts observed the last time the agent stood here. Meaningful only
    /// when `visited`.
    pub percepts: Percepts,
    /// Heuristic pit probability in [0, 1].
    pub p_pit: f64,
    /// Heuristic wumpus probability in [0, 1].
    pub p_wumpus: f64,
}

/// The agent's whole belief state: one [`CellBelief`] per cell plus the SAT
/// variable registry. Cells are created once at construction and mutated only
/// by `update` and the post-shot refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct KnowledgeGrid {
    size: usize,
    cells: Vec<CellBelief>,
    vars: VarRegistry,
}

impl KnowledgeGrid {
    /// A blank belief grid. The origin starts known-safe before any percept.
    pub fn new(size: usize) -> Self {
        let mut cells = vec![CellBelief::default(); size * size];
        cells[0].safe = true;
        Self {
            size,
            cells,
            vars: VarRegistry::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell(&self, cell: Cell) -> &CellBelief {
        &self.cells[cell.0 * self.size + cell.1]
    }

    pub(crate) fn cell_mut(&mut self, cell: Cell) -> &mut CellBelief {
        &mut self.cells[cell.0 * self.size + cell.1]
    }

    /// Row-major copy of the beliefs, one `Vec` per row.
    pub fn rows(&self) -> Vec<Vec<CellBelief>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    /// Record the percepts observed at `pos`, then rebuild every derived
    /// field from scratch.
    pub fn update(&mut self, pos: Cell, percepts: Percepts) {
        let cell = self.cell_mut(pos);
        cell.visited = true;
        cell.safe = true;
        cell.percepts = percepts;
        cell.p_pit = 0.0;
        cell.p_wumpus = 0.0;
        self.rebuild();
    }

    /// Does the knowledge base entail `lit`?
    pub fn entails(&mut self, lit: Lit) -> bool {
        let clauses = self.hazard_clauses();
        let v = self.vars.var(lit.atom);
        logic::entails(&clauses, if lit.negated { -v } else { v })
    }

    /// Recompute all derived fields from the visited cells' percepts.
    pub fn rebuild(&mut self) {
        self.reset_pass();
        self.logical_pass();
        let (pit_support, wumpus_support) = self.count_support();
        self.assign_probabilities(&pit_support, &wumpus_support);
        self.dominance_pass();
    }

    /// Translate the visited cells' percepts into a fresh clause set.
    ///
    /// For every cell: a pit/wumpus mutex. For every visited cell: hazard
    /// absence units, plus either the breeze disjunction over orthogonal
    /// neighbours or per-neighbour absence units — symmetrically for stench.
    fn hazard_clauses(&mut self) -> Vec<Vec<i32>> {
        let size = self.size;
        let mut clauses = Vec::new();
        for i in 0..size {
            for j in 0..size {
                let p = self.vars.var(Atom::pit((i, j)));
                let w = self.vars.var(Atom::wumpus((i, j)));
                clauses.push(vec![-p, -w]);

                let (visited, percepts) = {
                    let c = &self.cells[i * size + j];
                    (c.visited, c.percepts)
                };
                if !visited {
                    continue;
                }
                clauses.push(vec![-p]);
                clauses.push(vec![-w]);

                let mut pit_vars = Vec::with_capacity(4);
                let mut wumpus_vars = Vec::with_capacity(4);
                for n in orthogonal(size, i, j) {
                    pit_vars.push(self.vars.var(Atom::pit(n)));
                    wumpus_vars.push(self.vars.var(Atom::wumpus(n)));
                }

                if percepts.breeze {
                    clauses.push(pit_vars);
                } else {
                    clauses.extend(pit_vars.into_iter().map(|v| vec![-v]));
                }
                if percepts.stench {
                    clauses.push(wumpus_vars);
                } else {
                    clauses.extend(wumpus_vars.into_iter().map(|v| vec![-v]));
                }
            }
        }
        clauses
    }

    /// Pass 1: clear heuristic mass everywhere and derived flags on
    /// unvisited cells. Visited-cell fields survive.
    fn reset_pass(&mut self) {
        for cell in &mut self.cells {
            cell.p_pit = 0.0;
            cell.p_wumpus = 0.0;
            if !cell.visited {
                cell.safe = false;
                cell.confirmed_pit = false;
                cell.confirmed_wumpus = false;
            }
        }
    }

    /// Pass 2: ask the oracle about every unvisited cell.
    fn logical_pass(&mut self) {
        for i in 0..self.size {
            for j in 0..self.size {
                if self.cells[i * self.size + j].visited {
                    continue;
                }
                let pit = Atom::pit((i, j));
                let wumpus = Atom::wumpus((i, j));

                if self.entails(Lit::holds(pit)) {
                    let cell = self.cell_mut((i, j));
                    cell.confirmed_pit = true;
                    cell.safe = false;
                } else if self.entails(Lit::holds(wumpus)) {
                    let cell = self.cell_mut((i, j));
                    cell.confirmed_wumpus = true;
                    cell.safe = false;
                } else if self.entails(Lit::not(pit)) && self.entails(Lit::not(wumpus)) {
                    self.cell_mut((i, j)).safe = true;
                }
            }
        }
    }

    /// Pass 3: count, for every open cell, how many visited breeze/stench
    /// cells list it as a candidate hazard.
    fn count_support(&self) -> (HashMap<Cell, u32>, HashMap<Cell, u32>) {
        let mut pit_support: HashMap<Cell, u32> = HashMap::new();
        let mut wumpus_support: HashMap<Cell, u32> = HashMap::new();
        for i in 0..self.size {
            for j in 0..self.size {
                let cell = &self.cells[i * self.size + j];
                if !cell.visited {
                    continue;
                }
                let open: Vec<Cell> = orthogonal(self.size, i, j)
                    .filter(|&n| {
                        let b = self.cell(n);
                        !b.visited && !b.safe && !b.confirmed_pit && !b.confirmed_wumpus
                    })
                    .collect();
                if cell.percepts.breeze {
                    for &n in &open {
                        *pit_support.entry(n).or_insert(0) += 1;
                    }
                }
                if cell.percepts.stench {
                    for &n in &open {
                        *wumpus_support.entry(n).or_insert(0) += 1;
                    }
                }
            }
        }
        (pit_support, wumpus_support)
    }

    /// Pass 4: turn support counts into probabilities, skipping cells the
    /// logical pass already settled.
    fn assign_probabilities(
        &mut self,
        pit_support: &HashMap<Cell, u32>,
        wumpus_support: &HashMap<Cell, u32>,
    ) {
        for (&(i, j), &s) in pit_support {
            let corner = is_corner(self.size, i, j);
            let cell = self.cell_mut((i, j));
            if !cell.safe && !cell.confirmed_pit {
                cell.p_pit = support_to_prob(s, corner);
            }
        }
        for (&(i, j), &s) in wumpus_support {
            let corner = is_corner(self.size, i, j);
            let cell = self.cell_mut((i, j));
            if !cell.safe && !cell.confirmed_wumpus {
                cell.p_wumpus = support_to_prob(s, corner);
            }
        }
    }

    /// Pass 5: pin confirmed cells to probability 1, suppress the same
    /// hazard across their 8-neighbourhood, and zero everything on safe
    /// cells.
    fn dominance_pass(&mut self) {
        for i in 0..self.size {
            for j in 0..self.size {
                let idx = i * self.size + j;
                if self.cells[idx].confirmed_pit {
                    self.cells[idx].p_pit = 1.0;
                    self.cells[idx].p_wumpus = 0.0;
                    for n in orthogonal(self.size, i, j).chain(diagonal(self.size, i, j)) {
                        self.cell_mut(n).p_pit = 0.0;
                    }
                } else if self.cells[idx].confirmed_wumpus {
                    self.cells[idx].p_wumpus = 1.0;
                    self.cells[idx].p_pit = 0.0;
                    for n in orthogonal(self.size, i, j).chain(diagonal(self.size, i, j)) {
                        self.cell_mut(n).p_wumpus = 0.0;
                    }
                } else if self.cells[idx].safe {
                    self.cells[idx].p_pit = 0.0;
                    self.cells[idx].p_wumpus = 0.0;
                }
            }
        }
    }
}

fn support_to_prob(support: u32, corner: bool) -> f64 {
    let s = support.min(SUPPORT_SATURATION);
    if s == 0 {
        return 0.0;
    }
    let mut p = PROB_BASE * ((s as f64) + 1.0).log2().powf(PROB_EXPONENT);
    if corner {
        p *= CORNER_BOOST;
    }
    p.min(PROB_CAP)
}
