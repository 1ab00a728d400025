//=========================================================================
// State Errors
//=========================================================================
//
// Failure and control-flow conditions raised by the state managers.
//
// Every variant records the state that was current when it was raised,
// so callers can log or recover without querying the manager again.
//
// Kinds:
//   Defects      InvalidOperation, LoadConflict, NotFound,
//                InvalidArgs, HookNotFound
//   Signals      LeaveState, LeaveApplication
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Result Alias ========================================================

/// Convenient result alias for state manager operations.
pub type Result<T> = std::result::Result<T, StateError>;

//=== StateError ==========================================================

/// Errors and control-flow signals produced around state transitions.
///
/// `last_state` is the name of the state that was current when the
/// condition was raised, or `None` if no state was active.
#[derive(Debug, Error)]
pub enum StateError {
    /// The request is not valid for the manager's present state.
    ///
    /// Raised when changing to a state that is neither loaded nor lazily
    /// queued, and when unloading the active state without forcing.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        message: String,
        last_state: Option<String>,
    },

    /// A state name is already taken by a loaded or queued state.
    #[error("state `{state}` {reason}")]
    LoadConflict {
        state: String,
        reason: &'static str,
        last_state: Option<String>,
    },

    /// The named state is not loaded.
    #[error("state `{state}` is not loaded")]
    NotFound {
        state: String,
        last_state: Option<String>,
    },

    /// Constructor arguments did not match the state's argument type.
    #[error("invalid arguments for state `{state}`: {source}")]
    InvalidArgs {
        state: String,
        #[source]
        source: serde_json::Error,
        last_state: Option<String>,
    },

    /// No state hook is registered under the requested path.
    #[error("no state hook registered at `{path}`")]
    HookNotFound {
        path: String,
        last_state: Option<String>,
    },

    /// Signal: leave the current state's run loop.
    #[error("leave state requested")]
    LeaveState { last_state: Option<String> },

    /// Signal: shut the whole application down.
    #[error("leave application requested")]
    LeaveApplication { last_state: Option<String> },
}

impl StateError {
    //--- Signal Construction ----------------------------------------------

    /// Builds a [`StateError::LeaveState`] signal with no recorded state.
    ///
    /// Managers fill in `last_state` as the signal passes through them.
    pub fn leave_state() -> Self {
        Self::LeaveState { last_state: None }
    }

    /// Builds a [`StateError::LeaveApplication`] signal with no recorded state.
    pub fn leave_application() -> Self {
        Self::LeaveApplication { last_state: None }
    }

    //--- Queries ----------------------------------------------------------

    /// Name of the state that was current when this error was raised.
    pub fn last_state(&self) -> Option<&str> {
        match self {
            Self::InvalidOperation { last_state, .. }
            | Self::LoadConflict { last_state, .. }
            | Self::NotFound { last_state, .. }
            | Self::InvalidArgs { last_state, .. }
            | Self::HookNotFound { last_state, .. }
            | Self::LeaveState { last_state }
            | Self::LeaveApplication { last_state } => last_state.as_deref(),
        }
    }

    /// True for the control-flow signals, false for genuine failures.
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::LeaveState { .. } | Self::LeaveApplication { .. })
    }

    /// True for failures raised while loading, unloading or hooking states.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::LoadConflict { .. }
                | Self::NotFound { .. }
                | Self::InvalidArgs { .. }
                | Self::HookNotFound { .. }
        )
    }

    //--- Context ----------------------------------------------------------

    /// Records `state` as the last known state if none is recorded yet.
    pub(crate) fn or_last_state(mut self, state: Option<&str>) -> Self {
        let slot = match &mut self {
            Self::InvalidOperation { last_state, .. }
            | Self::LoadConflict { last_state, .. }
            | Self::NotFound { last_state, .. }
            | Self::InvalidArgs { last_state, .. }
            | Self::HookNotFound { last_state, .. }
            | Self::LeaveState { last_state }
            | Self::LeaveApplication { last_state } => last_state,
        };

        if slot.is_none() {
            *slot = state.map(str::to_owned);
        }
        self
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_are_distinguished_from_defects() {
        assert!(StateError::leave_state().is_signal());
        assert!(StateError::leave_application().is_signal());

        let not_found = StateError::NotFound {
            state: "Menu".into(),
            last_state: None,
        };
        assert!(!not_found.is_signal());
        assert!(not_found.is_load_error());
    }

    #[test]
    fn invalid_operation_is_not_a_load_error() {
        let err = StateError::InvalidOperation {
            message: "nope".into(),
            last_state: Some("Game".into()),
        };
        assert!(!err.is_load_error());
        assert_eq!(err.last_state(), Some("Game"));
    }

    #[test]
    fn or_last_state_fills_only_missing_context() {
        let err = StateError::leave_state().or_last_state(Some("Game"));
        assert_eq!(err.last_state(), Some("Game"));

        let err = err.or_last_state(Some("Menu"));
        assert_eq!(err.last_state(), Some("Game"));
    }

    #[test]
    fn display_names_the_state() {
        let err = StateError::LoadConflict {
            state: "Menu".into(),
            reason: "has already been loaded",
            last_state: None,
        };
        assert_eq!(err.to_string(), "state `Menu` has already been loaded");
    }
}
