//! Hazard atoms, the variable registry, and SAT-backed entailment.
//!
//! Every `(hazard, cell)` pair maps to a dense, 1-based DIMACS variable.
//! Clause sets are ephemeral: the knowledge base rebuilds one per query and
//! throws it away after the solver answers. Entailment is the classic
//! refutation check — assert the negation of the queried literal and ask the
//! solver whether the formula became unsatisfiable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use varisat::{ExtendFormula, Lit as SatLit, Solver};

use crate::grid::Cell;

/// The two hazard kinds the knowledge base reasons about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hazard {
    Pit,
    Wumpus,
}

/// A ground fact: "cell `(i, j)` holds this hazard".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    pub hazard: Hazard,
    pub cell: Cell,
}

impl Atom {
    pub fn pit(cell: Cell) -> Self {
        Self {
            hazard: Hazard::Pit,
            cell,
        }
    }

    pub fn wumpus(cell: Cell) -> Self {
        Self {
            hazard: Hazard::Wumpus,
            cell,
        }
    }
}

/// A possibly negated atom, the unit of entailment queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lit {
    pub atom: Atom,
    pub negated: bool,
}

impl Lit {
    /// Positive literal: the hazard is present.
    pub fn holds(atom: Atom) -> Self {
        Self {
            atom,
            negated: false,
        }
    }

    /// Negative literal: the hazard is absent.
    pub fn not(atom: Atom) -> Self {
        Self {
            atom,
            negated: true,
        }
    }
}

/// Bijection between atoms and positive DIMACS variables.
///
/// Ids are allocated lazily on first reference, strictly positive, and dense.
/// Entries are never removed; the reverse map exists for diagnostics only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VarRegistry {
    ids: HashMap<Atom, i32>,
    atoms: Vec<Atom>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The DIMACS variable for `atom`, allocating the next dense id on first
    /// use.
    pub fn var(&mut self, atom: Atom) -> i32 {
        if let Some(&v) = self.ids.get(&atom) {
            return v;
        }
        self.atoms.push(atom);
        let v = self.atoms.len() as i32;
        self.ids.insert(atom, v);
        v
    }

    /// Reverse lookup for diagnostics.
    pub fn atom(&self, var: i32) -> Option<Atom> {
        if var <= 0 {
            return None;
        }
        self.atoms.get(var as usize - 1).copied()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Does the clause set entail the DIMACS literal `lit`?
///
/// A contradictory clause set entails nothing here — the caller falls back to
/// heuristic-only reasoning when the logical model has broken down. Solver
/// errors are treated the same way: entailment unknown, answer `false`.
pub fn entails(clauses: &[Vec<i32>], lit: i32) -> bool {
    let mut solver = Solver::new();
    for clause in clauses {
        solver.add_clause(&dimacs_clause(clause));
    }
    match solver.solve() {
        Ok(true) => {}
        Ok(false) | Err(_) => return false,
    }
    solver.add_clause(&[SatLit::from_dimacs(-lit as isize)]);
    matches!(solver.solve(), Ok(false))
}

fn dimacs_clause(lits: &[i32]) -> Vec<SatLit> {
    lits.iter().map(|&l| SatLit::from_dimacs(l as isize)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ids_are_dense_and_stable() {
        let mut reg = VarRegistry::new();
        let a = reg.var(Atom::pit((0, 0)));
        let b = reg.var(Atom::wumpus((0, 0)));
        let c = reg.var(Atom::pit((2, 3)));
        assert_eq!((a, b, c), (1, 2, 3));

        // Re-asking never allocates.
        assert_eq!(reg.var(Atom::wumpus((0, 0))), 2);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_registry_reverse_lookup() {
        let mut reg = VarRegistry::new();
        let v = reg.var(Atom::wumpus((1, 2)));
        assert_eq!(reg.atom(v), Some(Atom::wumpus((1, 2))));
        assert_eq!(reg.atom(0), None);
        assert_eq!(reg.atom(99), None);
    }

    #[test]
    fn test_entails_unit_clause() {
        let clauses = vec![vec![1]];
        assert!(entails(&clauses, 1));
        assert!(!entails(&clauses, -1));
        assert!(!entails(&clauses, 2), "unconstrained variable is not forced");
    }

    #[test]
    fn test_entails_by_resolution() {
        // (a or b) and not a  |=  b
        let clauses = vec![vec![1, 2], vec![-1]];
        assert!(entails(&clauses, 2));
        assert!(!entails(&clauses, -2));
    }

    #[test]
    fn test_contradictory_kb_entails_nothing() {
        let clauses = vec![vec![1], vec![-1]];
        assert!(!entails(&clauses, 1));
        assert!(!entails(&clauses, -1));
        assert!(!entails(&clauses, 2));
    }

    #[test]
    fn test_empty_kb_entails_nothing() {
        assert!(!entails(&[], 1));
        assert!(!entails(&[], -1));
    }
}
