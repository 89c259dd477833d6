//! Risk scoring and risk-weighted A*.
//!
//! Risk fuses the heuristic hazard probabilities with three modifiers: a
//! tiny revisit penalty, a both-hazards compounding penalty, and an option
//! bonus when the agent still carries an arrow for a likely wumpus. A* uses
//! `1 + risk` edge costs with a Manhattan heuristic; edge costs never drop
//! below 1, so the heuristic stays admissible.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::grid::{orthogonal, Cell};
use crate::knowledge::{CellBelief, KnowledgeGrid};

/// Scalar risk of stepping onto a cell. Confirmed hazards are impassable.
pub fn risk(belief: &CellBelief, arrows: u32) -> f64 {
    if belief.confirmed_pit || belief.confirmed_wumpus {
        return f64::INFINITY;
    }
    let death = 1.0 - (1.0 - belief.p_pit) * (1.0 - belief.p_wumpus);
    let revisit = if belief.visited { 0.05 } else { 0.0 };
    let compound = if belief.p_pit > 0.4 && belief.p_wumpus > 0.4 {
        0.3
    } else {
        0.0
    };
    let arrow_option = if arrows > 0 && belief.p_wumpus > 0.5 {
        -0.15
    } else {
        0.0
    };
    death * 100.0 + revisit + compound + arrow_option
}

/// A successful search: the cells to step through, first step first, target
/// last. The start cell is implicit and the path is empty when the agent is
/// already standing on the target.
#[derive(Clone, Debug, PartialEq)]
pub struct PathPlan {
    pub path: Vec<Cell>,
    pub cost: f64,
}

/// Risk-weighted A* from `start` to `target`.
///
/// Cells with a confirmed pit are never expanded; a confirmed wumpus blocks
/// too unless it is the target and `allow_target_wumpus` is set (hunting).
/// The exempted target also contributes no step risk. Returns `None` when the
/// target is unreachable.
pub fn astar(
    knowledge: &KnowledgeGrid,
    start: Cell,
    target: Cell,
    arrows: u32,
    allow_target_wumpus: bool,
) -> Option<PathPlan> {
    if start == target {
        return Some(PathPlan {
            path: Vec::new(),
            cost: 0.0,
        });
    }

    let size = knowledge.size();
    let mut open = BinaryHeap::new();
    let mut best: HashMap<Cell, f64> = HashMap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();

    best.insert(start, 0.0);
    open.push(Node {
        f: manhattan(start, target) as f64,
        g: 0.0,
        cell: start,
    });

    while let Some(Node { g, cell, .. }) = open.pop() {
        if cell == target {
            return Some(PathPlan {
                path: reconstruct(&came_from, start, target),
                cost: g,
            });
        }
        if g > best.get(&cell).copied().unwrap_or(f64::INFINITY) {
            continue; // stale heap entry
        }
        for next in orthogonal(size, cell.0, cell.1) {
            let belief = knowledge.cell(next);
            if belief.confirmed_pit {
                continue;
            }
            let exempt = allow_target_wumpus && next == target;
            if belief.confirmed_wumpus && !exempt {
                continue;
            }
            let step_risk = if exempt { 0.0 } else { risk(belief, arrows) };
            let tentative = g + 1.0 + step_risk;
            if tentative < best.get(&next).copied().unwrap_or(f64::INFINITY) {
                best.insert(next, tentative);
                came_from.insert(next, cell);
                open.push(Node {
                    f: tentative + manhattan(next, target) as f64,
                    g: tentative,
                    cell: next,
                });
            }
        }
    }

    None
}

fn manhattan(a: Cell, b: Cell) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, target: Cell) -> Vec<Cell> {
    let mut path = vec![target];
    let mut cursor = target;
    while let Some(&prev) = came_from.get(&cursor) {
        if prev == start {
            break;
        }
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    path
}

#[derive(Clone, Copy, Debug)]
struct Node {
    f: f64,
    g: f64,
    cell: Cell,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the lowest f pops first.
        other.f.partial_cmp(&self.f).unwrap_or(Ordering::Equal)
    }
}
