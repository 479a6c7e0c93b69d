//! Domain events emitted by committed state transitions.

use serde::{Deserialize, Serialize};
use vreg_types::{Address, ShardId, StakeAmount, Verifier};

/// Registry events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    VerifierRegistered {
        id: Address,
        name: String,
        location: String,
        active: bool,
        balance: StakeAmount,
        shard: ShardId,
    },
    VerifierUpdated {
        id: Address,
        name: String,
        location: String,
        active: bool,
        balance: StakeAmount,
        shard: ShardId,
    },
    ActiveStatusChanged {
        executor: Address,
        verifier: Address,
        active: bool,
    },
    EnableStatusChanged {
        executor: Address,
        verifier: Address,
        enable: bool,
    },
    /// A shard aggregate took a new value.
    ShardBalanceChanged {
        shard: ShardId,
        new_balance: StakeAmount,
    },
}

impl RegistryEvent {
    pub fn registered(v: &Verifier) -> Self {
        RegistryEvent::VerifierRegistered {
            id: v.id,
            name: v.name.clone(),
            location: v.location.clone(),
            active: v.active,
            balance: v.balance,
            shard: v.shard,
        }
    }

    pub fn updated(v: &Verifier) -> Self {
        RegistryEvent::VerifierUpdated {
            id: v.id,
            name: v.name.clone(),
            location: v.location.clone(),
            active: v.active,
            balance: v.balance,
            shard: v.shard,
        }
    }
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline, after the transition has committed and
/// while the registry is still marked busy.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&RegistryEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RegistryEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &RegistryEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
