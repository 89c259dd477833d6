//! Event bus — tokio::broadcast for simulation events.

use serde::Serialize;
use tokio::sync::broadcast;

use wumpus_core::Observation;

use crate::sim::RunSummary;

/// Events pushed to subscribers as the simulation advances.
#[derive(Debug, Clone, Serialize)]
pub enum SimEvent {
    /// A world was installed and the agent constructed.
    WorldReady(Box<Observation>),
    /// One tick completed (also emitted after an undo).
    AgentUpdate(Box<Observation>),
    /// The run settled: death, timeout, or gold carried home.
    SimulationEnd(RunSummary),
}

/// Broadcast bus for simulation events.
pub struct EventBus {
    sender: broadcast::Sender<SimEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers. Returns the receiver count; zero
    /// subscribers is not an error.
    pub fn publish(&self, event: SimEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wumpus_core::{Agent, Tile, World};

    fn blank_world() -> World {
        World::from_rows(vec![vec![Tile::Empty; 3]; 3]).unwrap()
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let agent = Agent::new(blank_world(), 0);
        let delivered = bus.publish(SimEvent::AgentUpdate(Box::new(agent.observe())));
        assert_eq!(delivered, 1);

        match rx.recv().await.unwrap() {
            SimEvent::AgentUpdate(obs) => assert_eq!(obs.pos, (0, 0)),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new(8);
        let agent = Agent::new(blank_world(), 0);
        assert_eq!(
            bus.publish(SimEvent::WorldReady(Box::new(agent.observe()))),
            0
        );
    }
}
