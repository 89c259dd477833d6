//! Invariants that must hold after every knowledge rebuild, checked over a
//! full run and over direct knowledge-grid manipulation.

use wumpus_core::grid::{diagonal, orthogonal};
use wumpus_core::logic::{Atom, Lit};
use wumpus_core::{Agent, KnowledgeGrid, Percepts, Tile, World};

fn world(rows: &[&str]) -> World {
    let rows = rows
        .iter()
        .map(|r| {
            r.chars()
                .map(|c| match c {
                    'P' => Tile::Pit,
                    'W' => Tile::Wumpus,
                    'G' => Tile::Gold,
                    'A' => Tile::Arrow,
                    _ => Tile::Empty,
                })
                .collect()
        })
        .collect();
    World::from_rows(rows).unwrap()
}

/// The belief invariants, asserted over the whole grid.
fn assert_belief_invariants(agent: &Agent) {
    let kg = agent.knowledge();
    let size = kg.size();

    for i in 0..size {
        for j in 0..size {
            let c = kg.cell((i, j));

            // Visited cells are settled: safe, unconfirmed, zero mass.
            if c.visited {
                assert!(c.safe, "visited ({i},{j}) not safe");
                assert!(!c.confirmed_pit && !c.confirmed_wumpus);
                assert_eq!(c.p_pit, 0.0, "visited ({i},{j}) keeps pit mass");
                assert_eq!(c.p_wumpus, 0.0, "visited ({i},{j}) keeps wumpus mass");
            }

            // Never both hazards at once.
            assert!(
                !(c.confirmed_pit && c.confirmed_wumpus),
                "({i},{j}) confirmed as both"
            );

            // Safe cells carry no mass.
            if c.safe {
                assert_eq!(c.p_pit, 0.0);
                assert_eq!(c.p_wumpus, 0.0);
            }

            // A confirmed hazard is pinned to 1 and suppresses its own kind
            // across the 8-neighbourhood.
            if c.confirmed_pit {
                assert_eq!(c.p_pit, 1.0);
                assert_eq!(c.p_wumpus, 0.0);
                for n in orthogonal(size, i, j).chain(diagonal(size, i, j)) {
                    assert_eq!(
                        kg.cell(n).p_pit,
                        0.0,
                        "pit mass beside the confirmed pit ({i},{j}) at {n:?}"
                    );
                }
            }
            if c.confirmed_wumpus {
                assert_eq!(c.p_wumpus, 1.0);
                assert_eq!(c.p_pit, 0.0);
                for n in orthogonal(size, i, j).chain(diagonal(size, i, j)) {
                    assert_eq!(kg.cell(n).p_wumpus, 0.0);
                }
            }

            // Percept consistency: a quiet visited cell clears its
            // neighbours of the matching hazard.
            if c.visited && !c.percepts.breeze {
                for n in orthogonal(size, i, j) {
                    let b = kg.cell(n);
                    assert!(!b.confirmed_pit, "quiet ({i},{j}) beside confirmed pit {n:?}");
                    assert_eq!(b.p_pit, 0.0, "quiet ({i},{j}) beside pit mass at {n:?}");
                }
            }
            if c.visited && !c.percepts.stench {
                for n in orthogonal(size, i, j) {
                    let b = kg.cell(n);
                    assert!(!b.confirmed_wumpus);
                    assert_eq!(b.p_wumpus, 0.0);
                }
            }
        }
    }
}

#[test]
fn invariants_hold_across_a_pit_world_run() {
    let mut agent = Agent::new(world(&["____", "_P_G", "____", "____"]), 0);
    assert_belief_invariants(&agent);
    for _ in 0..100 {
        if !agent.alive() || agent.returned_home() {
            break;
        }
        agent.step();
        assert_belief_invariants(&agent);
    }
    assert!(agent.alive());
}

#[test]
fn invariants_hold_across_a_wumpus_hunt() {
    let mut agent = Agent::new(world(&["____", "_W__", "_G__", "____"]), 1);
    for _ in 0..100 {
        if !agent.alive() || agent.returned_home() {
            break;
        }
        agent.step();
        assert_belief_invariants(&agent);
    }
    assert!(agent.alive());
}

#[test]
fn entailment_survives_new_consistent_percepts() {
    let mut kg = KnowledgeGrid::new(4);
    kg.update((0, 0), Percepts::default());
    kg.update((0, 2), Percepts::default());
    kg.update(
        (0, 1),
        Percepts {
            breeze: true,
            ..Percepts::default()
        },
    );
    let pit = Lit::holds(Atom::pit((1, 1)));
    assert!(kg.entails(pit));

    // Clauses only accumulate: a far-away quiet visit cannot retract.
    kg.update((3, 0), Percepts::default());
    assert!(kg.entails(pit));
    kg.update((3, 3), Percepts::default());
    assert!(kg.entails(pit));
}

#[test]
fn snapshot_preserves_the_variable_registry() {
    // Restoring an old snapshot and rebuilding must answer queries the same
    // way even though the registry kept growing in between.
    let mut agent = Agent::new(world(&["____", "_P_G", "____", "____"]), 0);
    for _ in 0..2 {
        agent.step();
    }
    let snap = agent.snapshot();
    let reference = agent.observe();
    for _ in 0..5 {
        agent.step();
    }
    agent.restore(snap);
    assert_eq!(agent.observe(), reference);

    // Continuing after the restore still reasons soundly.
    for _ in 0..30 {
        if !agent.alive() || agent.returned_home() {
            break;
        }
        agent.step();
        assert_belief_invariants(&agent);
    }
    assert!(agent.alive());
    assert!(agent.gold_found());
}
