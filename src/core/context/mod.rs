//=========================================================================
// State Context
//=========================================================================
//
// Shared data handed to every state hook.
//
// Contains:
// - data: the embedding application's payload (window, assets, ...)
// - transitions: requests for the manager, applied after the hook
//
//=========================================================================

//=== Module Declarations =================================================

mod transition_queue;

//=== Public API ==========================================================

pub use transition_queue::{StateTransition, TransitionQueue};

//=== StateContext ========================================================

/// Context data accessible to states during their hooks.
///
/// The manager owns the context and lends it to each hook. `data` is
/// never interpreted by the manager.
///
/// # Example
///
/// ```rust
/// # use game_state::prelude::*;
/// struct Menu;
///
/// impl State<u32> for Menu {
///     fn on_enter(&mut self, ctx: &mut StateContext<u32>, _previous: Option<&str>) {
///         ctx.data += 1;
///         ctx.change_state("Game");
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct StateContext<C> {
    /// Application payload shared by every state.
    pub data: C,

    /// Transitions requested by states, applied by
    /// `StateManager::process_transitions`.
    pub transitions: TransitionQueue,
}

impl<C> StateContext<C> {
    /// Creates a context around the application payload.
    pub fn new(data: C) -> Self {
        Self {
            data,
            transitions: TransitionQueue::new(),
        }
    }

    pub(crate) fn with_capacity(data: C, capacity: usize) -> Self {
        Self {
            data,
            transitions: TransitionQueue::with_capacity(capacity),
        }
    }

    //--- Transition Requests ----------------------------------------------

    /// Requests a change to the named state.
    pub fn change_state(&mut self, name: impl Into<String>) {
        self.transitions.push(StateTransition::Change(name.into()));
    }

    /// Requests a reload of the named state.
    pub fn reload_state(&mut self, name: impl Into<String>) {
        self.transitions.push(StateTransition::Reload(name.into()));
    }

    /// Requests the named state be unloaded.
    pub fn unload_state(&mut self, name: impl Into<String>) {
        self.transitions.push(StateTransition::Unload(name.into()));
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_queued_in_order() {
        let mut ctx = StateContext::new(());
        ctx.change_state("Game");
        ctx.unload_state("Menu");

        let queued: Vec<_> = ctx.transitions.iter().cloned().collect();
        assert_eq!(
            queued,
            vec![
                StateTransition::Change("Game".into()),
                StateTransition::Unload("Menu".into()),
            ]
        );
    }
}
