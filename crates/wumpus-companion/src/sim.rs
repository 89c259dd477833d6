//! Simulation driver: paces ticks, keeps the undo history, reports
//! summaries.
//!
//! The history is a stack of engine snapshots taken before each step; undo
//! pops one and restores it, exactly reversing a tick. Snapshots are taken
//! only at tick boundaries, so every one observes a settled state.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use wumpus_core::{Agent, Cell, DeathCause, Snapshot, StepOutcome, World};

use crate::event_bus::{EventBus, SimEvent};

/// Final report published when a run settles.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub alive: bool,
    pub gold_found: bool,
    pub returned_home: bool,
    pub steps: u64,
    pub path: Vec<Cell>,
    pub death_cause: Option<DeathCause>,
    pub arrows_left: u32,
    pub total_arrows_collected: u32,
    pub wumpus_killed: u32,
}

/// One agent run plus its undo history and event bus.
pub struct Simulation {
    agent: Agent,
    history: Vec<Snapshot>,
    bus: EventBus,
}

impl Simulation {
    pub fn new(world: World, arrows: u32, bus: EventBus) -> Self {
        let agent = Agent::new(world, arrows);
        bus.publish(SimEvent::WorldReady(Box::new(agent.observe())));
        Self {
            agent,
            history: Vec::new(),
            bus,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// One tick: snapshot for undo, step, publish the new observation.
    pub fn step(&mut self) -> StepOutcome {
        self.history.push(self.agent.snapshot());
        let outcome = self.agent.step();
        debug!(pos = ?self.agent.pos(), mode = ?self.agent.mode(), "tick");
        self.bus
            .publish(SimEvent::AgentUpdate(Box::new(self.agent.observe())));
        outcome
    }

    /// Pop one snapshot and restore it. Returns false when there is no
    /// history left.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.agent.restore(snapshot);
                self.bus
                    .publish(SimEvent::AgentUpdate(Box::new(self.agent.observe())));
                true
            }
            None => false,
        }
    }

    /// The run has settled: dead, or gold carried back to the origin.
    pub fn finished(&self) -> bool {
        !self.agent.alive() || self.agent.returned_home()
    }

    /// Auto-run until settled, pacing ticks with `delay`.
    pub async fn run(&mut self, delay: Duration) -> RunSummary {
        while !self.finished() {
            self.step();
            if self.finished() {
                break;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        let summary = self.summary();
        info!(
            steps = summary.steps,
            alive = summary.alive,
            gold = summary.gold_found,
            "run settled"
        );
        self.bus.publish(SimEvent::SimulationEnd(summary.clone()));
        summary
    }

    pub fn summary(&self) -> RunSummary {
        let obs = self.agent.observe();
        RunSummary {
            alive: obs.alive,
            gold_found: obs.gold_found,
            returned_home: self.agent.returned_home(),
            steps: obs.steps,
            path: obs.path,
            death_cause: obs.death_cause,
            arrows_left: obs.arrows,
            total_arrows_collected: obs.total_arrows_collected,
            wumpus_killed: obs.wumpus_kill_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wumpus_core::Tile;

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

    #[test]
    fn test_undo_reverses_one_tick() {
        let mut sim = Simulation::new(world(&["___", "___", "__G"]), 0, EventBus::new(8));
        let before = sim.agent().observe();

        sim.step();
        assert_ne!(sim.agent().observe(), before);

        assert!(sim.undo());
        assert_eq!(sim.agent().observe(), before);
        assert!(!sim.undo(), "history should now be empty");
    }

    #[test]
    fn test_finished_on_gold_at_origin() {
        // Gold on the start cell: one pickup tick settles the run.
        let mut sim = Simulation::new(world(&["G__", "___", "___"]), 0, EventBus::new(8));
        assert!(!sim.finished());
        sim.step();
        assert!(sim.finished());
        let summary = sim.summary();
        assert!(summary.returned_home);
        assert!(summary.alive);
    }

    #[tokio::test]
    async fn test_auto_run_produces_a_summary() {
        let mut sim = Simulation::new(world(&["___", "_G_", "___"]), 0, EventBus::new(8));
        let summary = sim.run(Duration::ZERO).await;
        assert!(summary.alive, "nothing hazardous in this world");
        assert!(summary.gold_found);
        assert!(summary.returned_home);
        assert!(summary.steps <= 54);
    }
}
