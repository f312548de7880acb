//! Centralized counter store
//!
//! State is only changed by dispatching a [`CounterAction`]; the store runs
//! the pure [`reduce`] function and publishes the result to subscribers.
//! Clones share the same state, so one store can back a whole process.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{Counter, CounterAction, CounterState, reduce};

#[derive(Debug, Clone)]
pub struct CounterStore {
    state: Arc<watch::Sender<CounterState>>,
}

impl CounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(CounterState::default())
    }

    #[must_use]
    pub fn with_state(initial: CounterState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Run the reducer for `action` and publish the new state
    pub fn dispatch(&self, action: CounterAction) -> CounterState {
        let mut next = CounterState::default();
        self.state.send_modify(|state| {
            *state = reduce(*state, action);
            next = *state;
        });
        debug!(?action, %next, "counter action dispatched");
        next
    }

    /// Current state
    #[must_use]
    pub fn get(&self) -> CounterState {
        *self.state.borrow()
    }

    /// Receiver that observes every published state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CounterState> {
        self.state.subscribe()
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for CounterStore {
    fn increment(&mut self) {
        self.dispatch(CounterAction::Increment);
    }

    fn clear(&mut self) {
        self.dispatch(CounterAction::Clear);
    }

    fn toggle_disabled(&mut self) {
        self.dispatch(CounterAction::ToggleDisabled);
    }

    fn state(&self) -> CounterState {
        self.get()
    }
}
