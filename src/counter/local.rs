//! Counter backed by plain owned state

use super::{Counter, CounterState};

/// Counter whose handlers write the fields directly
#[derive(Debug, Default, Clone)]
pub struct LocalCounter {
    count: u64,
    is_disabled: bool,
}

impl LocalCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Counter for LocalCounter {
    fn increment(&mut self) {
        if !self.is_disabled {
            self.count = self.count.saturating_add(1);
        }
    }

    fn clear(&mut self) {
        self.count = 0;
    }

    fn toggle_disabled(&mut self) {
        self.is_disabled = !self.is_disabled;
    }

    fn state(&self) -> CounterState {
        CounterState {
            value: self.count,
            disabled: self.is_disabled,
        }
    }
}
