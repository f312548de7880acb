//! Counter widget state
//!
//! The counter holds a value and a disabled flag. Two backends expose the
//! same operations:
//! - [`LocalCounter`]: state owned and mutated in place by the handlers
//! - [`CounterStore`]: centralized store driven by the [`reduce`] function

pub mod local;
pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

pub use local::LocalCounter;
pub use store::CounterStore;

/// Observable counter state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterState {
    pub value: u64,
    pub disabled: bool,
}

impl CounterState {
    /// Label of the click button, e.g. `CLICK:3`
    #[must_use]
    pub fn click_label(&self) -> String {
        format!("CLICK:{}", self.value)
    }

    /// Label of the toggle button; names the action it performs
    #[must_use]
    pub fn toggle_label(&self) -> &'static str {
        if self.disabled { "ABLE" } else { "DISABLE" }
    }
}

impl fmt::Display for CounterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value={} disabled={}", self.value, self.disabled)
    }
}

/// Named operations accepted by the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterAction {
    Increment,
    Clear,
    ToggleDisabled,
}

impl CounterAction {
    pub const ALL: [CounterAction; 3] = [
        CounterAction::Increment,
        CounterAction::Clear,
        CounterAction::ToggleDisabled,
    ];
}

impl FromStr for CounterAction {
    type Err = DashboardError;

    /// Accepts the API names (`increment`, `clear`, `toggle-disabled`) and
    /// the button names (`click`, `toggle`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increment" | "click" => Ok(Self::Increment),
            "clear" => Ok(Self::Clear),
            "toggle-disabled" | "toggle" => Ok(Self::ToggleDisabled),
            other => Err(DashboardError::validation(format!(
                "Unknown counter action '{other}'"
            ))),
        }
    }
}

/// Pure reducer for the centralized store
#[must_use]
pub fn reduce(state: CounterState, action: CounterAction) -> CounterState {
    match action {
        CounterAction::Increment if state.disabled => state,
        CounterAction::Increment => CounterState {
            value: state.value.saturating_add(1),
            ..state
        },
        CounterAction::Clear => CounterState { value: 0, ..state },
        CounterAction::ToggleDisabled => CounterState {
            disabled: !state.disabled,
            ..state
        },
    }
}

/// Common surface of both counter backends
pub trait Counter {
    /// Add one unless disabled
    fn increment(&mut self);

    /// Reset the value to zero, regardless of the disabled flag
    fn clear(&mut self);

    /// Flip the disabled flag
    fn toggle_disabled(&mut self);

    /// Current `(value, disabled)` snapshot
    fn state(&self) -> CounterState;

    /// Run one named operation and return the resulting state
    fn apply(&mut self, action: CounterAction) -> CounterState {
        match action {
            CounterAction::Increment => self.increment(),
            CounterAction::Clear => self.clear(),
            CounterAction::ToggleDisabled => self.toggle_disabled(),
        }
        self.state()
    }
}

/// Apply `actions` in order and collect the state after each one
pub fn trajectory<C: Counter + ?Sized>(counter: &mut C, actions: &[CounterAction]) -> Vec<CounterState> {
    actions.iter().map(|action| counter.apply(*action)).collect()
}
