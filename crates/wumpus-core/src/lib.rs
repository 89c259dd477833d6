//! Belief-and-decision engine for a hazard-grid treasure hunt.
//!
//! An agent explores a partially observable square grid (pits, a wumpus or
//! two, gold, spare arrows), reasoning about unseen hazards from local
//! percepts. Beliefs fuse two layers that must agree wherever they overlap:
//! logical entailment through a SAT oracle over per-cell hazard atoms, and a
//! support-count probability heuristic. Each tick a priority ladder of
//! policies picks one move or one shot.
//!
//! - [`grid`] — tiles, worlds, percepts, neighbourhood iterators
//! - [`logic`] — hazard atoms, the variable registry, SAT entailment
//! - [`knowledge`] — per-cell beliefs and the rebuild pipeline
//! - [`planner`] — risk scoring and risk-weighted A*
//! - [`agent`] — run-state, the decision ladder, shooting
//!
//! The engine is single-threaded and synchronous; transports, pacing, and
//! undo history live with the caller. [`Agent::snapshot`] / [`Agent::restore`]
//! give callers an opaque deep copy for undo.

pub mod agent;
pub mod grid;
pub mod knowledge;
pub mod logic;
pub mod planner;

pub use agent::{Agent, AgentAction, DeathCause, Mode, Observation, Snapshot, StepOutcome};
pub use grid::{Cell, Percepts, Tile, World, WorldError};
pub use knowledge::{CellBelief, KnowledgeGrid};
pub use planner::{astar, risk, PathPlan};
