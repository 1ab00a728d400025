//=========================================================================
// State Hooks
//=========================================================================
//
// Decentralized state registration.
//
// A state hook is a function, usually living next to the states it
// defines, that registers those states into a manager. Hooks are kept
// in a path-keyed registry so a manager can connect them by name:
//
//   manager.register_state_hook("states.menu", menu::hook);
//   manager.connect_state_hook("states.menu", ArgMap::new())?;
//
// Each manager names its stored hook type through HookHost; only the
// async manager requires `Send + Sync` hooks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

//=== Internal Dependencies ===============================================

use crate::core::error::Result;
use crate::core::state::ArgMap;

//=== StateHook Trait =====================================================

/// Registers states into a manager of type `M`.
///
/// Implemented for every `Fn(&mut M, &ArgMap) -> Result<()>`, so plain
/// functions work as hooks.
pub trait StateHook<M> {
    fn hook(&self, manager: &mut M, args: &ArgMap) -> Result<()>;
}

impl<M, F> StateHook<M> for F
where
    F: Fn(&mut M, &ArgMap) -> Result<()>,
{
    fn hook(&self, manager: &mut M, args: &ArgMap) -> Result<()> {
        self(manager, args)
    }
}

//=== HookHost ============================================================

/// A manager that state hooks can be connected to.
pub trait HookHost: Sized {
    /// Hook object stored in the manager's [`HookRegistry`].
    type Hook: ?Sized + StateHook<Self>;
}

//=== HookRegistry ========================================================

/// Path-keyed state hooks.
pub struct HookRegistry<M: HookHost> {
    hooks: HashMap<String, Arc<M::Hook>>,
}

impl<M: HookHost> HookRegistry<M> {
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    /// Stores `hook` under `path`, replacing any previous hook there.
    pub fn register(&mut self, path: impl Into<String>, hook: Arc<M::Hook>) {
        let path = path.into();
        if self.hooks.insert(path.clone(), hook).is_some() {
            warn!("State hook `{}` was already registered and has been replaced", path);
        }
    }

    /// Returns the hook stored under `path`.
    pub fn get(&self, path: &str) -> Option<Arc<M::Hook>> {
        self.hooks.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.hooks.contains_key(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.hooks.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl<M: HookHost> Default for HookRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    impl HookHost for u32 {
        type Hook = dyn StateHook<u32>;
    }

    fn count_hook(counter: &mut u32, args: &ArgMap) -> Result<()> {
        *counter += args.len() as u32 + 1;
        Ok(())
    }

    #[test]
    fn functions_are_hooks() {
        let mut registry = HookRegistry::<u32>::new();
        registry.register("hooks.count", Arc::new(count_hook));

        let hook = registry.get("hooks.count").unwrap();
        let mut counter = 0;
        hook.hook(&mut counter, &ArgMap::new()).unwrap();

        assert_eq!(counter, 1);
    }

    #[test]
    fn missing_paths_resolve_to_none() {
        let mut registry = HookRegistry::<u32>::new();
        registry.register("b", Arc::new(count_hook));
        registry.register("a", Arc::new(count_hook));

        assert!(registry.get("c").is_none());
        assert!(registry.contains("a"));
        assert_eq!(registry.paths(), vec!["a", "b"]);
    }

    #[test]
    fn hooks_may_capture_non_send_state() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let mut registry = HookRegistry::<u32>::new();
        registry.register(
            "hooks.rc",
            Arc::new(move |_: &mut u32, _: &ArgMap| -> Result<()> {
                seen.set(seen.get() + 1);
                Ok(())
            }),
        );

        let hook = registry.get("hooks.rc").unwrap();
        hook.hook(&mut 0, &ArgMap::new()).unwrap();
        assert_eq!(calls.get(), 1);
    }
}
