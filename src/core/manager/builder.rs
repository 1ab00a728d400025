//=========================================================================
// State Manager Builder
//=========================================================================
//
// Fluent configuration shared by StateManager and AsyncStateManager.
//
//   StateManager::builder(ctx)       ──build()──>  StateManager<C>
//   AsyncStateManager::builder(ctx)  ──build()──>  AsyncStateManager<C>
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::global_hooks::{GlobalHooks, HookTarget};
use crate::core::context::StateContext;

//=== Defaults ============================================================

/// Transition requests the context queue holds before reallocating.
pub const DEFAULT_TRANSITION_CAPACITY: usize = 8;

//=== StateManagerBuilder =================================================

/// Builder for configuring a state manager before construction.
///
/// `S` is the state object type the manager stores: `dyn State<C>` or
/// `dyn AsyncState<C>`. The global hook setters are defined next to each
/// manager, since only the async manager requires `Send` hooks.
///
/// # Default Values
///
/// - **Transition capacity**: 8 queued requests
/// - **Global hooks**: none
///
/// # Example
///
/// ```rust
/// # use game_state::prelude::*;
/// let manager = StateManager::builder(())
///     .with_transition_capacity(16)
///     .with_global_on_enter(|_current, _last| {})
///     .build();
///
/// assert!(manager.current_state().is_none());
/// ```
pub struct StateManagerBuilder<C, S: ?Sized + HookTarget> {
    pub(crate) context: C,
    pub(crate) transition_capacity: usize,
    pub(crate) hooks: GlobalHooks<S>,
}

impl<C, S: ?Sized + HookTarget> StateManagerBuilder<C, S> {
    /// Creates a builder around the application context payload.
    pub fn new(context: C) -> Self {
        Self {
            context,
            transition_capacity: DEFAULT_TRANSITION_CAPACITY,
            hooks: GlobalHooks::new(),
        }
    }

    /// Sets the initial capacity of the transition request queue.
    ///
    /// Default: 8
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_transition_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Transition capacity must be positive");
        self.transition_capacity = capacity;
        self
    }

    pub(crate) fn into_parts(self) -> (StateContext<C>, GlobalHooks<S>) {
        let context = StateContext::with_capacity(self.context, self.transition_capacity);
        (context, self.hooks)
    }
}

//=== Tests ===============================================================
