//! Broadcast event bus implementation.

use combat_core::{BattleAction, BattleId, Conclusion};
use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted after the store accepted a write.
#[derive(Debug, Clone, Serialize)]
pub enum BattleEvent {
    /// A transition was committed.
    Committed {
        battle_id: BattleId,
        version: u64,
        round: u32,
        action: BattleAction,
    },
    /// The battle reached its terminal state with this version.
    Concluded {
        battle_id: BattleId,
        version: u64,
        conclusion: Conclusion,
    },
    /// Stored state failed its integrity checks.
    Frozen { battle_id: BattleId, reason: String },
}

impl BattleEvent {
    pub fn battle_id(&self) -> BattleId {
        match self {
            Self::Committed { battle_id, .. }
            | Self::Concluded { battle_id, .. }
            | Self::Frozen { battle_id, .. } => *battle_id,
        }
    }
}

/// Best-effort fan-out of [`BattleEvent`]s.
///
/// Publishing never blocks; subscribers that fall behind by more than the
/// channel capacity observe `Lagged` and skip ahead.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BattleEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: BattleEvent) {
        let battle_id = event.battle_id();
        if self.sender.send(event).is_err() {
            // No subscribers - this is normal, not an error
            tracing::trace!("No subscribers for events of {}", battle_id);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::with_capacity(4);
        let mut rx = bus.subscribe();
        bus.publish(BattleEvent::Frozen {
            battle_id: BattleId(3),
            reason: "digest mismatch".into(),
        });

        let event = rx.recv().await.expect("event");
        assert_eq!(event.battle_id(), BattleId(3));
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        EventBus::new().publish(BattleEvent::Frozen {
            battle_id: BattleId(1),
            reason: String::new(),
        });
    }
}
