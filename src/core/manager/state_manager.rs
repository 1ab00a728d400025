//=========================================================================
// State Manager
//=========================================================================
//
// Owns every loaded state, tracks the current and last state, and runs
// lifecycle hooks around load, unload, reload and change operations.
//
// Operation flow:
//   check (registry) → mutate (registry) → hooks (global, then state)
//
// A failed check returns before anything is mutated.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::builder::StateManagerBuilder;
use super::global_hooks::GlobalHooks;
use super::state_hook::{HookHost, HookRegistry, StateHook};
use crate::core::context::{StateContext, StateTransition};
use crate::core::error::{Result, StateError};
use crate::core::registry::{LoadOptions, Registry, StateBlueprint};
use crate::core::state::{route_state_args, ArgMap, State, StateArgs};

//=== Type Aliases ========================================================

/// Blueprint of a synchronous state.
pub type Blueprint<C = ()> = StateBlueprint<dyn State<C>>;

/// A lazily queued blueprint with its deferred arguments.
pub type LazyEntry<C = ()> = (Blueprint<C>, Option<StateArgs>);

//=== StateManager ========================================================

/// Registry of named states and arbiter of every transition.
///
/// # Example
///
/// ```rust
/// # use game_state::prelude::*;
/// struct Menu;
/// impl StateType for Menu {
///     type Args = NoArgs;
///     fn create(_: NoArgs) -> Self { Menu }
/// }
/// impl State for Menu {}
///
/// struct Game;
/// impl StateType for Game {
///     type Args = NoArgs;
///     fn load_mode() -> LoadMode { LoadMode::Lazy }
///     fn create(_: NoArgs) -> Self { Game }
/// }
/// impl State for Game {}
///
/// let mut manager = StateManager::new(());
/// manager.load_states([Menu::blueprint()], LoadOptions::new()).unwrap();
/// manager.register([Game::blueprint()]).unwrap();
///
/// manager.change_state("Menu").unwrap();
/// manager.change_state("Game").unwrap();
///
/// assert_eq!(manager.current_name(), Some("Game"));
/// assert_eq!(manager.last_name(), Some("Menu"));
/// ```
pub struct StateManager<C: 'static = ()> {
    registry: Registry<dyn State<C>>,
    context: StateContext<C>,
    hooks: GlobalHooks<dyn State<C>>,
    state_hooks: HookRegistry<StateManager<C>>,
}

impl<C: 'static> StateManager<C> {
    //--- Construction -----------------------------------------------------

    /// Creates a manager with default settings around `context`.
    pub fn new(context: C) -> Self {
        Self::builder(context).build()
    }

    /// Starts configuring a manager around `context`.
    pub fn builder(context: C) -> StateManagerBuilder<C, dyn State<C>> {
        StateManagerBuilder::new(context)
    }

    //--- Accessors --------------------------------------------------------

    /// The current state, if one has been entered.
    pub fn current_state(&self) -> Option<&dyn State<C>> {
        self.registry
            .current_name()
            .and_then(|name| self.registry.get(name))
    }

    pub fn current_state_mut(&mut self) -> Option<&mut (dyn State<C> + 'static)> {
        let name = self.registry.current_name()?;
        self.registry.get_mut(name)
    }

    /// The state that was current before the last transition.
    pub fn last_state(&self) -> Option<&dyn State<C>> {
        self.registry
            .last_name()
            .and_then(|name| self.registry.get(name))
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.registry.current_name()
    }

    pub fn last_name(&self) -> Option<&'static str> {
        self.registry.last_name()
    }

    /// Snapshot of every loaded state by name.
    pub fn state_map(&self) -> HashMap<&'static str, &(dyn State<C> + 'static)> {
        self.registry.iter().collect()
    }

    /// Loaded state names, sorted.
    pub fn state_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub fn get_state(&self, name: &str) -> Option<&dyn State<C>> {
        self.registry.get(name)
    }

    pub fn get_state_mut(&mut self, name: &str) -> Option<&mut (dyn State<C> + 'static)> {
        self.registry.get_mut(name)
    }

    /// The loaded state named `name`, if it is a `T`.
    pub fn downcast_state<T: 'static>(&self, name: &str) -> Option<&T> {
        self.registry.get(name)?.as_any().downcast_ref::<T>()
    }

    pub fn downcast_state_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.registry.get_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    /// Blueprint of the loaded state named `name`.
    pub fn state_blueprint(&self, name: &str) -> Option<&Blueprint<C>> {
        self.registry.blueprint(name)
    }

    /// Arguments the loaded state named `name` was last built with.
    pub fn state_build_args(&self, name: &str) -> Option<&ArgMap> {
        self.registry.args(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.registry.is_loaded(name)
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.registry.is_lazy(name)
    }

    pub fn is_eager(&self, name: &str) -> bool {
        self.registry.is_eager(name)
    }

    /// Names waiting in the lazy queue, in queue order.
    pub fn lazy_states(&self) -> Vec<&'static str> {
        self.registry.lazy_names()
    }

    /// Names waiting in the eager queue, in queue order.
    pub fn eager_states(&self) -> Vec<&'static str> {
        self.registry.eager_names()
    }

    pub fn context(&self) -> &StateContext<C> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut StateContext<C> {
        &mut self.context
    }

    //--- Global Hooks -----------------------------------------------------

    /// Replaces the global on-load hook. Affects states loaded afterwards.
    pub fn set_global_on_load<F>(&mut self, hook: F)
    where
        F: FnMut(&mut (dyn State<C> + 'static), bool) + 'static,
    {
        self.hooks.on_load = Some(Box::new(hook));
    }

    pub fn set_global_on_unload<F>(&mut self, hook: F)
    where
        F: FnMut(&mut (dyn State<C> + 'static), bool) + 'static,
    {
        self.hooks.on_unload = Some(Box::new(hook));
    }

    pub fn set_global_on_enter<F>(&mut self, hook: F)
    where
        F: FnMut(&(dyn State<C> + 'static), Option<&(dyn State<C> + 'static)>) + 'static,
    {
        self.hooks.on_enter = Some(Box::new(hook));
    }

    pub fn set_global_on_leave<F>(&mut self, hook: F)
    where
        F: FnMut(Option<&(dyn State<C> + 'static)>, &(dyn State<C> + 'static)) + 'static,
    {
        self.hooks.on_leave = Some(Box::new(hook));
    }

    //--- Registration -----------------------------------------------------

    /// Queues blueprints by their load mode: eager ones for
    /// [`load_eager_states`](Self::load_eager_states), lazy ones for their
    /// first [`change_state`](Self::change_state).
    ///
    /// # Errors
    ///
    /// [`StateError::LoadConflict`] if a name is loaded or already queued.
    /// Nothing is queued in that case.
    pub fn register(&mut self, blueprints: impl IntoIterator<Item = Blueprint<C>>) -> Result<()> {
        self.registry.register(blueprints.into_iter().collect())
    }

    /// Queues blueprints for lazy loading, with arguments kept until
    /// each one is first entered.
    ///
    /// `state_args` may also target names queued earlier.
    ///
    /// # Errors
    ///
    /// [`StateError::LoadConflict`] if a name is loaded or already queued.
    /// Nothing is queued in that case.
    pub fn add_lazy_states(
        &mut self,
        blueprints: impl IntoIterator<Item = Blueprint<C>>,
        state_args: impl IntoIterator<Item = StateArgs>,
    ) -> Result<()> {
        self.registry.queue_lazy(blueprints.into_iter().collect())?;
        self.registry.defer_state_args(state_args.into_iter().collect());
        Ok(())
    }

    /// Removes a pending lazy state with its deferred arguments.
    ///
    /// Returns `None` for names that are not lazily queued, including
    /// states that are already loaded.
    pub fn remove_lazy_state(&mut self, name: &str) -> Option<LazyEntry<C>> {
        self.registry.remove_lazy(name)
    }

    //--- Loading ----------------------------------------------------------

    /// Loads each blueprint in order and runs its load hooks.
    ///
    /// # Errors
    ///
    /// - [`StateError::LoadConflict`] if a name is already loaded and
    ///   `options.force` is off
    /// - [`StateError::InvalidArgs`] if arguments do not fit a state
    ///
    /// Blueprints before the failing one stay loaded; later ones are
    /// not attempted.
    pub fn load_states(
        &mut self,
        blueprints: impl IntoIterator<Item = Blueprint<C>>,
        options: LoadOptions,
    ) -> Result<()> {
        let routed = route_state_args(options.state_args.iter().cloned());

        for blueprint in blueprints {
            self.load_one(blueprint, &options, &routed, false)?;
        }
        Ok(())
    }

    /// Drains the eager queue, loading each state as
    /// [`load_states`](Self::load_states) would, in registration order.
    ///
    /// A failing state stays queued along with everything after it.
    pub fn load_eager_states(&mut self, options: LoadOptions) -> Result<()> {
        let routed = route_state_args(options.state_args.iter().cloned());

        while let Some(blueprint) = self.registry.front_eager() {
            self.load_one(blueprint, &options, &routed, false)?;
        }
        Ok(())
    }

    fn load_one(
        &mut self,
        blueprint: Blueprint<C>,
        options: &LoadOptions,
        routed: &HashMap<String, StateArgs>,
        reload: bool,
    ) -> Result<&'static str> {
        let name = self.registry.instantiate(blueprint, options, routed)?;

        if let Some(state) = self.registry.get_mut(name) {
            self.hooks.load(state, reload);
            state.on_load(&mut self.context, reload);
        }
        Ok(name)
    }

    //--- Unloading --------------------------------------------------------

    /// Unloads a state and returns its blueprint for later reloading.
    ///
    /// `on_unload(false)` runs before the state is removed. Unloading the
    /// current or last state clears that pointer.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotFound`] if `name` is not loaded
    /// - [`StateError::InvalidOperation`] if `name` is current and
    ///   `force` is off
    pub fn unload_state(&mut self, name: &str, force: bool) -> Result<Blueprint<C>> {
        let key = self.registry.check_unload(name, force)?;
        self.run_unload_hooks(key, false);

        self.registry
            .remove(key)
            .ok_or_else(|| self.registry.not_found(key))
    }

    /// Replaces a state with a fresh instance, with `reload = true` on both
    /// hooks.
    ///
    /// The new instance is built first, from the arguments the state was
    /// last built with overlaid by `options`. The old instance's
    /// `on_unload` then runs before the new one's `on_load`. Current and
    /// last pointers keep naming the state.
    ///
    /// # Errors
    ///
    /// - [`StateError::NotFound`] if `name` is not loaded
    /// - [`StateError::InvalidOperation`] if `name` is current and
    ///   `options.force` is off
    /// - [`StateError::InvalidArgs`] if the new instance cannot be built;
    ///   the old instance stays loaded and no hook runs
    pub fn reload_state(&mut self, name: &str, options: LoadOptions) -> Result<&dyn State<C>> {
        let key = self.registry.check_unload(name, options.force)?;

        let routed = route_state_args(options.state_args.iter().cloned());
        let (instance, args) = self.registry.rebuild(key, &options, &routed)?;

        self.run_unload_hooks(key, true);
        self.registry.replace(key, instance, args);

        if let Some(state) = self.registry.get_mut(key) {
            self.hooks.load(state, true);
            state.on_load(&mut self.context, true);
        }

        debug!("Reloaded state `{}`", key);
        self.registry
            .get(key)
            .ok_or_else(|| self.registry.not_found(key))
    }

    fn run_unload_hooks(&mut self, name: &str, reload: bool) {
        if let Some(state) = self.registry.get_mut(name) {
            self.hooks.unload(state, reload);
            state.on_unload(&mut self.context, reload);
        }
    }

    //--- Transitions ------------------------------------------------------

    /// Makes `name` the current state.
    ///
    /// Lazily queued states are loaded first, consuming their deferred
    /// arguments. Hooks then run in this order:
    ///
    /// 1. global on-leave `(last, current)`
    /// 2. `last.on_leave(current)`
    /// 3. global on-enter `(current, last)`
    /// 4. `current.on_enter(last)`
    ///
    /// # Errors
    ///
    /// [`StateError::InvalidOperation`] if `name` is neither loaded nor
    /// lazily queued; `current` and `last` are left untouched.
    pub fn change_state(&mut self, name: &str) -> Result<()> {
        self.registry.check_change(name)?;

        if !self.registry.is_loaded(name) {
            if let Some(blueprint) = self.registry.lazy_blueprint(name) {
                debug!("Materializing lazy state `{}`", name);
                self.load_one(blueprint, &LoadOptions::new(), &HashMap::new(), false)?;
            }
        }

        let Some((last, current)) = self.registry.swap_current(name) else {
            return Err(self.registry.invalid(format!("state `{}` could not be entered", name)));
        };

        if let Some(current_state) = self.registry.get(current) {
            let last_state = last.and_then(|n| self.registry.get(n));
            self.hooks.leave(last_state, current_state);
        }

        if let Some(last) = last {
            if let Some(state) = self.registry.get_mut(last) {
                state.on_leave(&mut self.context, current);
            }
        }

        if let Some(current_state) = self.registry.get(current) {
            let last_state = last.and_then(|n| self.registry.get(n));
            self.hooks.enter(current_state, last_state);
        }

        if let Some(state) = self.registry.get_mut(current) {
            state.on_enter(&mut self.context, last);
        }

        Ok(())
    }

    /// Applies transitions queued through [`StateContext`] in FIFO order.
    ///
    /// Requests queued by hooks while a batch is applied are processed
    /// in a following batch. Stops at the first failure and discards the
    /// rest of that batch.
    pub fn process_transitions(&mut self) -> Result<()> {
        loop {
            let batch = self.context.transitions.take();
            if batch.is_empty() {
                return Ok(());
            }

            let total = batch.len();
            for (index, transition) in batch.into_iter().enumerate() {
                if let Err(err) = self.apply_transition(transition) {
                    let dropped = total - index - 1;
                    if dropped > 0 {
                        warn!("Discarding {} queued transitions after failure", dropped);
                    }
                    return Err(err);
                }
            }
        }
    }

    fn apply_transition(&mut self, transition: StateTransition) -> Result<()> {
        match transition {
            StateTransition::Change(name) => self.change_state(&name),
            StateTransition::Reload(name) => self
                .reload_state(&name, LoadOptions::forced())
                .map(|_| ()),
            StateTransition::Unload(name) => self.unload_state(&name, false).map(|_| ()),
        }
    }

    /// Passes a host event to the current state's `on_event`, then
    /// applies queued transitions.
    ///
    /// Does nothing but apply transitions when no state is current.
    pub fn dispatch_event(&mut self, event: &dyn Any) -> Result<()> {
        if let Some(name) = self.registry.current_name() {
            if let Some(state) = self.registry.get_mut(name) {
                state
                    .on_event(&mut self.context, event)
                    .map_err(|err| err.or_last_state(Some(name)))?;
            }
        }

        self.process_transitions()
    }

    /// Runs the current state's `on_update`, then applies queued
    /// transitions.
    ///
    /// Signals returned by the state are passed to the caller with the
    /// state's name attached; queued transitions then stay queued.
    pub fn update(&mut self) -> Result<()> {
        if let Some(name) = self.registry.current_name() {
            if let Some(state) = self.registry.get_mut(name) {
                state
                    .on_update(&mut self.context)
                    .map_err(|err| err.or_last_state(Some(name)))?;
            }
        }

        self.process_transitions()
    }

    //--- State Hooks ------------------------------------------------------

    /// Stores a state hook under `path` for
    /// [`connect_state_hook`](Self::connect_state_hook).
    pub fn register_state_hook<H>(&mut self, path: impl Into<String>, hook: H)
    where
        H: StateHook<Self> + 'static,
    {
        self.state_hooks.register(path, Arc::new(hook));
    }

    /// Runs the state hook registered under `path` with `args`.
    ///
    /// # Errors
    ///
    /// [`StateError::HookNotFound`] if nothing is registered at `path`,
    /// otherwise whatever the hook returns.
    pub fn connect_state_hook(&mut self, path: &str, args: ArgMap) -> Result<()> {
        let Some(hook) = self.state_hooks.get(path) else {
            return Err(StateError::HookNotFound {
                path: path.to_owned(),
                last_state: self.registry.current_name().map(str::to_owned),
            });
        };

        debug!("Connecting state hook `{}`", path);
        hook.hook(self, &args)
    }

    /// Runs a state hook directly.
    pub fn connect_hook<H>(&mut self, hook: H, args: ArgMap) -> Result<()>
    where
        H: StateHook<Self>,
    {
        hook.hook(self, &args)
    }
}

impl<C: Default + 'static> Default for StateManager<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: 'static> HookHost for StateManager<C> {
    type Hook = dyn StateHook<Self>;
}

//=== Builder =============================================================

impl<C: 'static> StateManagerBuilder<C, dyn State<C>> {
    /// Builds the configured manager.
    pub fn build(self) -> StateManager<C> {
        info!(
            "Building state manager (transition capacity: {})",
            self.transition_capacity
        );

        let (context, hooks) = self.into_parts();
        StateManager {
            registry: Registry::new(),
            context,
            hooks,
            state_hooks: HookRegistry::new(),
        }
    }

    /// Sets the hook run for every state right after it is loaded.
    ///
    /// Runs before the state's own `on_load`.
    pub fn with_global_on_load<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut (dyn State<C> + 'static), bool) + 'static,
    {
        self.hooks.on_load = Some(Box::new(hook));
        self
    }

    /// Sets the hook run for every state right before it is unloaded.
    ///
    /// Runs before the state's own `on_unload`.
    pub fn with_global_on_unload<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut (dyn State<C> + 'static), bool) + 'static,
    {
        self.hooks.on_unload = Some(Box::new(hook));
        self
    }

    /// Sets the hook run with `(current, last)` on every transition.
    pub fn with_global_on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&(dyn State<C> + 'static), Option<&(dyn State<C> + 'static)>) + 'static,
    {
        self.hooks.on_enter = Some(Box::new(hook));
        self
    }

    /// Sets the hook run with `(last, current)` on every transition.
    pub fn with_global_on_leave<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Option<&(dyn State<C> + 'static)>, &(dyn State<C> + 'static)) + 'static,
    {
        self.hooks.on_leave = Some(Box::new(hook));
        self
    }
}

//=== Tests ===============================================================
