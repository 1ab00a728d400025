//=========================================================================
// Load Options
//=========================================================================

//=== External Dependencies ===============================================

use serde_json::Value;

//=== Internal Dependencies ===============================================

use crate::core::state::{ArgMap, StateArgs};

//=== LoadOptions =========================================================

/// Per-call configuration for load and reload operations.
///
/// - `force`: load over an already loaded name, or unload/reload the
///   current state
/// - `args`: arguments applied to every state in the call
/// - `state_args`: arguments applied only to the state they name
///
/// Routed `state_args` override uniform `args` on key collisions.
///
/// ```rust
/// # use game_state::prelude::*;
/// let options = LoadOptions::new()
///     .with_arg("difficulty", "hard")
///     .with_state_args([StateArgs::new("Game").with("player_x", 250)]);
///
/// assert!(!options.force);
/// assert_eq!(options.state_args.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    pub force: bool,
    pub args: ArgMap,
    pub state_args: Vec<StateArgs>,
}

impl LoadOptions {
    /// Options with no arguments and `force` off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with `force` on.
    pub fn forced() -> Self {
        Self::new().with_force(true)
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Adds one argument applied to every state in the call.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_args(mut self, args: ArgMap) -> Self {
        self.args.extend(args);
        self
    }

    /// Adds argument sets routed to individual states by name.
    pub fn with_state_args(mut self, state_args: impl IntoIterator<Item = StateArgs>) -> Self {
        self.state_args.extend(state_args);
        self
    }
}
