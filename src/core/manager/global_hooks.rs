//=========================================================================
// Global Hooks
//=========================================================================
//
// Callbacks run for every state, alongside each state's own hooks.
//
// Order around a transition:
//   on_leave(last, current) → last.on_leave → on_enter(current, last)
//   → current.on_enter
//
// The boxed callback types come from the state object type, so only the
// async manager requires `Send` callbacks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::state::{AsyncState, State};

//=== HookTarget ==========================================================

/// State object type a set of global hooks is called with.
///
/// Implemented for `dyn State<C>` and `dyn AsyncState<C>`.
pub trait HookTarget {
    /// Runs after a state is stored (load) or before it is removed (unload).
    type LoadHook: ?Sized + FnMut(&mut Self, bool);

    /// Runs with `(current, last)` when a state becomes current.
    type EnterHook: ?Sized + FnMut(&Self, Option<&Self>);

    /// Runs with `(last, current)` when the current state changes.
    type LeaveHook: ?Sized + FnMut(Option<&Self>, &Self);
}

impl<C: 'static> HookTarget for dyn State<C> {
    type LoadHook = dyn FnMut(&mut Self, bool);
    type EnterHook = dyn FnMut(&Self, Option<&Self>);
    type LeaveHook = dyn FnMut(Option<&Self>, &Self);
}

impl<C: Send + 'static> HookTarget for dyn AsyncState<C> {
    type LoadHook = dyn FnMut(&mut Self, bool) + Send;
    type EnterHook = dyn FnMut(&Self, Option<&Self>) + Send;
    type LeaveHook = dyn FnMut(Option<&Self>, &Self) + Send;
}

//=== GlobalHooks =========================================================

/// Optional callbacks shared by every state of one manager.
pub struct GlobalHooks<S: ?Sized + HookTarget> {
    pub(crate) on_load: Option<Box<S::LoadHook>>,
    pub(crate) on_unload: Option<Box<S::LoadHook>>,
    pub(crate) on_enter: Option<Box<S::EnterHook>>,
    pub(crate) on_leave: Option<Box<S::LeaveHook>>,
}

impl<S: ?Sized + HookTarget> GlobalHooks<S> {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self {
            on_load: None,
            on_unload: None,
            on_enter: None,
            on_leave: None,
        }
    }

    //--- Invocation -------------------------------------------------------

    pub(crate) fn load(&mut self, state: &mut S, reload: bool) {
        if let Some(hook) = self.on_load.as_mut() {
            hook(state, reload);
        }
    }

    pub(crate) fn unload(&mut self, state: &mut S, reload: bool) {
        if let Some(hook) = self.on_unload.as_mut() {
            hook(state, reload);
        }
    }

    pub(crate) fn enter(&mut self, current: &S, last: Option<&S>) {
        if let Some(hook) = self.on_enter.as_mut() {
            hook(current, last);
        }
    }

    pub(crate) fn leave(&mut self, last: Option<&S>, current: &S) {
        if let Some(hook) = self.on_leave.as_mut() {
            hook(last, current);
        }
    }
}

impl<S: ?Sized + HookTarget> Default for GlobalHooks<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized + HookTarget> fmt::Debug for GlobalHooks<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalHooks")
            .field("on_load", &self.on_load.is_some())
            .field("on_unload", &self.on_unload.is_some())
            .field("on_enter", &self.on_enter.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .finish()
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Plain;

    impl State for Plain {}

    #[test]
    fn sync_hooks_accept_non_send_captures() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);

        let mut hooks = GlobalHooks::<dyn State>::new();
        hooks.on_load = Some(Box::new(move |_state: &mut (dyn State + 'static), reload: bool| {
            seen.borrow_mut().push(reload);
        }));

        hooks.load(&mut Plain, true);
        hooks.unload(&mut Plain, false);

        assert_eq!(*calls.borrow(), vec![true]);
    }
}
