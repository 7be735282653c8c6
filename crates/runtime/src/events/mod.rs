//! Broadcast stream of committed battle transitions.

mod bus;

pub use bus::{BattleEvent, EventBus};
