//=========================================================================
// State Registry
//=========================================================================
//
// Bookkeeping shared by the sync and async state managers.
//
// Architecture:
//   Registry<S>
//     ├─ states: HashMap<name, LoadedState<S>>   (instance + build args)
//     ├─ current / last: Option<name>
//     ├─ eager_queue / lazy_queue: Vec<StateBlueprint<S>>
//     └─ lazy_state_args: HashMap<name, StateArgs>
//
// The registry validates and mutates; it never runs hooks. Managers
// call a check, mutate through the registry, then run hooks in order.
//
// Queues belong to one registry, so independent managers never see
// each other's pending states.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::error::{Result, StateError};
use crate::core::state::{route_state_args, ArgMap, LoadMode, StateArgs};

//=== Module Declarations =================================================

mod blueprint;
mod load_options;

//=== Public API ==========================================================

pub use blueprint::{BuildFn, StateBlueprint};
pub use load_options::LoadOptions;

//=== LoadedState =========================================================

/// A live state instance together with the blueprint and arguments that
/// built it.
pub(crate) struct LoadedState<S: ?Sized> {
    blueprint: StateBlueprint<S>,
    args: ArgMap,
    instance: Box<S>,
}

//=== Registry ============================================================

/// Name-keyed store of loaded and pending states.
pub(crate) struct Registry<S: ?Sized> {
    states: HashMap<&'static str, LoadedState<S>>,
    current: Option<&'static str>,
    last: Option<&'static str>,
    eager_queue: Vec<StateBlueprint<S>>,
    lazy_queue: Vec<StateBlueprint<S>>,
    lazy_state_args: HashMap<String, StateArgs>,
}

impl<S: ?Sized> Registry<S> {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            current: None,
            last: None,
            eager_queue: Vec::new(),
            lazy_queue: Vec::new(),
            lazy_state_args: HashMap::new(),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn current_name(&self) -> Option<&'static str> {
        self.current
    }

    pub fn last_name(&self) -> Option<&'static str> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn is_eager(&self, name: &str) -> bool {
        self.eager_queue.iter().any(|b| b.name() == name)
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.lazy_queue.iter().any(|b| b.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.states.get(name).map(|entry| &*entry.instance)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut S> {
        self.states.get_mut(name).map(|entry| &mut *entry.instance)
    }

    pub fn blueprint(&self, name: &str) -> Option<&StateBlueprint<S>> {
        self.states.get(name).map(|entry| &entry.blueprint)
    }

    /// Arguments the loaded state named `name` was built from.
    pub fn args(&self, name: &str) -> Option<&ArgMap> {
        self.states.get(name).map(|entry| &entry.args)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &S)> + '_ {
        self.states
            .iter()
            .map(|(name, entry)| (*name, &*entry.instance))
    }

    /// Loaded state names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.states.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn eager_names(&self) -> Vec<&'static str> {
        self.eager_queue.iter().map(StateBlueprint::name).collect()
    }

    pub fn lazy_names(&self) -> Vec<&'static str> {
        self.lazy_queue.iter().map(StateBlueprint::name).collect()
    }

    //--- Errors -----------------------------------------------------------

    pub fn not_found(&self, name: &str) -> StateError {
        StateError::NotFound {
            state: name.to_owned(),
            last_state: self.current.map(str::to_owned),
        }
    }

    pub fn conflict(&self, name: &str, reason: &'static str) -> StateError {
        StateError::LoadConflict {
            state: name.to_owned(),
            reason,
            last_state: self.current.map(str::to_owned),
        }
    }

    pub fn invalid(&self, message: String) -> StateError {
        StateError::InvalidOperation {
            message,
            last_state: self.current.map(str::to_owned),
        }
    }

    //--- Queues -----------------------------------------------------------

    /// Rejects names that are loaded or already queued.
    fn check_unqueued(&self, name: &str) -> Result<()> {
        if self.is_loaded(name) {
            return Err(self.conflict(name, "has already been loaded"));
        }
        if self.is_eager(name) {
            return Err(self.conflict(name, "is already queued for eager loading"));
        }
        if self.is_lazy(name) {
            return Err(self.conflict(name, "is already queued for lazy loading"));
        }
        Ok(())
    }

    /// Rejects the whole batch if any entry conflicts with the registry
    /// or with an earlier entry of the batch.
    fn check_batch<'a>(
        &self,
        blueprints: impl IntoIterator<Item = &'a StateBlueprint<S>>,
    ) -> Result<()>
    where
        S: 'a,
    {
        let mut seen: Vec<&str> = Vec::new();

        for blueprint in blueprints {
            let name = blueprint.name();
            self.check_unqueued(name)?;
            if seen.contains(&name) {
                return Err(self.conflict(name, "appears twice in one registration"));
            }
            seen.push(name);
        }

        Ok(())
    }

    /// Queues blueprints according to their load mode.
    ///
    /// Nothing is queued if any blueprint conflicts.
    pub fn register(&mut self, blueprints: Vec<StateBlueprint<S>>) -> Result<()> {
        self.check_batch(
            blueprints
                .iter()
                .filter(|b| b.load_mode() != LoadMode::Manual),
        )?;

        for blueprint in blueprints {
            match blueprint.load_mode() {
                LoadMode::Manual => {
                    debug!("State `{}` is manual, not queued", blueprint.name());
                }
                LoadMode::Eager => {
                    debug!("Queued state `{}` for eager loading", blueprint.name());
                    self.eager_queue.push(blueprint);
                }
                LoadMode::Lazy => {
                    debug!("Queued state `{}` for lazy loading", blueprint.name());
                    self.lazy_queue.push(blueprint);
                }
            }
        }

        Ok(())
    }

    /// Queues blueprints for lazy loading regardless of their load mode.
    ///
    /// Nothing is queued if any blueprint conflicts.
    pub fn queue_lazy(&mut self, blueprints: Vec<StateBlueprint<S>>) -> Result<()> {
        self.check_batch(&blueprints)?;

        for blueprint in blueprints {
            debug!("Queued state `{}` for lazy loading", blueprint.name());
            self.lazy_queue.push(blueprint);
        }

        Ok(())
    }

    /// Stores arguments for lazily queued states until they are built.
    pub fn defer_state_args(&mut self, state_args: Vec<StateArgs>) {
        for (name, args) in route_state_args(state_args) {
            if !self.is_lazy(&name) {
                warn!("Ignoring deferred arguments for `{}`: not lazily queued", name);
                continue;
            }

            match self.lazy_state_args.entry(name) {
                Entry::Occupied(entry) => entry.into_mut().merge(args),
                Entry::Vacant(entry) => {
                    entry.insert(args);
                }
            }
        }
    }

    pub fn front_eager(&self) -> Option<StateBlueprint<S>> {
        self.eager_queue.first().cloned()
    }

    pub fn lazy_blueprint(&self, name: &str) -> Option<StateBlueprint<S>> {
        self.lazy_queue.iter().find(|b| b.name() == name).cloned()
    }

    /// Removes a pending lazy entry with its deferred arguments.
    pub fn remove_lazy(&mut self, name: &str) -> Option<(StateBlueprint<S>, Option<StateArgs>)> {
        let pos = self.lazy_queue.iter().position(|b| b.name() == name)?;
        let blueprint = self.lazy_queue.remove(pos);
        let args = self.lazy_state_args.remove(name);

        debug!("Removed state `{}` from the lazy queue", name);
        Some((blueprint, args))
    }

    //--- Loading ----------------------------------------------------------

    pub fn check_load(&self, name: &str, force: bool) -> Result<()> {
        if !force && self.is_loaded(name) {
            return Err(self.conflict(name, "has already been loaded"));
        }
        Ok(())
    }

    /// Builds and stores an instance without running any hook.
    ///
    /// Arguments merge in order: uniform `options.args`, deferred lazy
    /// arguments, then the routed entry for this name. A built state
    /// leaves both queues.
    pub fn instantiate(
        &mut self,
        blueprint: StateBlueprint<S>,
        options: &LoadOptions,
        routed: &HashMap<String, StateArgs>,
    ) -> Result<&'static str> {
        let name = blueprint.name();
        self.check_load(name, options.force)?;

        let mut args = options.args.clone();
        if let Some(deferred) = self.lazy_state_args.get(name) {
            args.extend(deferred.get_data().clone());
        }
        if let Some(routed) = routed.get(name) {
            args.extend(routed.get_data().clone());
        }

        let instance = blueprint
            .build(args.clone())
            .map_err(|err| err.or_last_state(self.current))?;

        self.lazy_queue.retain(|b| b.name() != name);
        self.eager_queue.retain(|b| b.name() != name);
        self.lazy_state_args.remove(name);

        let entry = LoadedState {
            blueprint,
            args,
            instance,
        };
        if self.states.insert(name, entry).is_some() {
            warn!("State `{}` was already loaded and has been replaced", name);
        } else {
            debug!("Loaded state `{}`", name);
        }

        Ok(name)
    }

    //--- Unloading --------------------------------------------------------

    /// Validates an unload and returns the registered name.
    pub fn check_unload(&self, name: &str, force: bool) -> Result<&'static str> {
        let Some((&key, _)) = self.states.get_key_value(name) else {
            return Err(self.not_found(name));
        };

        if !force && self.current == Some(key) {
            return Err(self.invalid(format!(
                "cannot unload `{}` while it is the current state",
                key
            )));
        }

        Ok(key)
    }

    /// Removes a loaded state, returning its blueprint.
    ///
    /// Pointers naming the state are cleared.
    pub fn remove(&mut self, name: &str) -> Option<StateBlueprint<S>> {
        let (key, entry) = self.states.remove_entry(name)?;

        if self.current == Some(key) {
            self.current = None;
        }
        if self.last == Some(key) {
            self.last = None;
        }

        debug!("Unloaded state `{}`", key);
        Some(entry.blueprint)
    }

    //--- Reloading --------------------------------------------------------

    /// Builds a replacement for a loaded state without touching it.
    ///
    /// Arguments start from the ones the state was last built with, then
    /// `options.args`, then the routed entry for this name.
    pub fn rebuild(
        &self,
        name: &str,
        options: &LoadOptions,
        routed: &HashMap<String, StateArgs>,
    ) -> Result<(Box<S>, ArgMap)> {
        let Some(entry) = self.states.get(name) else {
            return Err(self.not_found(name));
        };

        let mut args = entry.args.clone();
        args.extend(options.args.clone());
        if let Some(routed) = routed.get(name) {
            args.extend(routed.get_data().clone());
        }

        let instance = entry
            .blueprint
            .build(args.clone())
            .map_err(|err| err.or_last_state(self.current))?;

        Ok((instance, args))
    }

    /// Swaps in a rebuilt instance, returning the old one.
    ///
    /// Current and last pointers keep naming the state.
    pub fn replace(&mut self, name: &str, instance: Box<S>, args: ArgMap) -> Option<Box<S>> {
        let entry = self.states.get_mut(name)?;
        entry.args = args;

        debug!("Replaced instance of state `{}`", name);
        Some(std::mem::replace(&mut entry.instance, instance))
    }

    //--- Transitions ------------------------------------------------------

    /// Accepts names that are loaded or lazily queued.
    pub fn check_change(&self, name: &str) -> Result<()> {
        if self.is_loaded(name) || self.is_lazy(name) {
            return Ok(());
        }

        Err(self.invalid(format!(
            "state `{}` isn't present in the available states: `{}`",
            name,
            self.names().join(", ")
        )))
    }

    /// Moves `current` to `last` and makes `name` current.
    ///
    /// Returns `(last, current)`, or `None` if `name` is not loaded.
    pub fn swap_current(&mut self, name: &str) -> Option<(Option<&'static str>, &'static str)> {
        let (&key, _) = self.states.get_key_value(name)?;

        self.last = self.current;
        self.current = Some(key);

        debug!("Changed state {:?} -> `{}`", self.last, key);
        Some((self.last, key))
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{ArgMap, NoArgs, State, StateType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Menu;

    impl StateType for Menu {
        type Args = NoArgs;

        fn load_mode() -> LoadMode {
            LoadMode::Eager
        }

        fn create(_: NoArgs) -> Self {
            Self
        }
    }

    impl State for Menu {}

    struct Pause;

    impl StateType for Pause {
        type Args = NoArgs;

        fn load_mode() -> LoadMode {
            LoadMode::Lazy
        }

        fn create(_: NoArgs) -> Self {
            Self
        }
    }

    impl State for Pause {}

    struct Recorder {
        args: ArgMap,
    }

    impl StateType for Recorder {
        type Args = ArgMap;

        fn create(args: ArgMap) -> Self {
            Self { args }
        }
    }

    impl State for Recorder {}

    type TestRegistry = Registry<dyn State>;

    fn recorded_args(registry: &TestRegistry, name: &str) -> ArgMap {
        registry
            .get(name)
            .and_then(|s| s.as_any().downcast_ref::<Recorder>())
            .map(|r| r.args.clone())
            .unwrap()
    }

    #[test]
    fn register_sorts_by_load_mode() {
        let mut registry = TestRegistry::new();
        registry
            .register(vec![Menu::blueprint(), Pause::blueprint(), Recorder::blueprint()])
            .unwrap();

        assert_eq!(registry.eager_names(), vec!["Menu"]);
        assert_eq!(registry.lazy_names(), vec!["Pause"]);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn register_rejects_whole_batch_on_conflict() {
        let mut registry = TestRegistry::new();
        registry.register(vec![Menu::blueprint()]).unwrap();

        let err = registry
            .register(vec![Pause::blueprint(), Menu::blueprint()])
            .unwrap_err();

        assert!(matches!(err, StateError::LoadConflict { .. }));
        assert!(!registry.is_lazy("Pause"));
    }

    #[test]
    fn lazy_queue_rejects_eager_and_loaded_names() {
        let mut registry = TestRegistry::new();
        registry.register(vec![Menu::blueprint()]).unwrap();
        assert!(registry.queue_lazy(vec![Menu::blueprint()]).is_err());

        registry
            .instantiate(Recorder::blueprint(), &LoadOptions::new(), &HashMap::new())
            .unwrap();
        assert!(registry.queue_lazy(vec![Recorder::blueprint()]).is_err());
    }

    #[test]
    fn instantiate_merges_arguments_in_order() {
        let mut registry = TestRegistry::new();
        registry.queue_lazy(vec![Recorder::blueprint()]).unwrap();
        registry.defer_state_args(vec![StateArgs::new("Recorder").with("b", 2).with("c", 2)]);

        let options = LoadOptions::new().with_arg("a", 1).with_arg("b", 1).with_arg("c", 1);
        let routed = route_state_args(vec![StateArgs::new("Recorder").with("c", 3)]);

        registry
            .instantiate(Recorder::blueprint(), &options, &routed)
            .unwrap();

        let args = recorded_args(&registry, "Recorder");
        assert_eq!(serde_json::Value::Object(args), json!({ "a": 1, "b": 2, "c": 3 }));
        assert!(!registry.is_lazy("Recorder"));
        assert!(registry.remove_lazy("Recorder").is_none());
    }

    #[test]
    fn remove_lazy_returns_blueprint_and_args() {
        let mut registry = TestRegistry::new();
        registry.queue_lazy(vec![Pause::blueprint()]).unwrap();
        registry.defer_state_args(vec![StateArgs::new("Pause").with("x", 1)]);

        let (blueprint, args) = registry.remove_lazy("Pause").unwrap();
        assert!(blueprint.is::<Pause>());
        assert_eq!(args, Some(StateArgs::new("Pause").with("x", 1)));
        assert!(!registry.is_lazy("Pause"));
    }

    #[test]
    fn unload_guards_current_state() {
        let mut registry = TestRegistry::new();
        registry
            .instantiate(Menu::blueprint(), &LoadOptions::new(), &HashMap::new())
            .unwrap();
        registry.swap_current("Menu").unwrap();

        assert!(matches!(
            registry.check_unload("Menu", false),
            Err(StateError::InvalidOperation { .. })
        ));
        assert!(matches!(
            registry.check_unload("Missing", true),
            Err(StateError::NotFound { .. })
        ));
        assert_eq!(registry.check_unload("Menu", true).unwrap(), "Menu");

        registry.remove("Menu").unwrap();
        assert_eq!(registry.current_name(), None);
    }

    #[test]
    fn swap_current_tracks_last() {
        let mut registry = TestRegistry::new();
        let options = LoadOptions::new();
        registry.instantiate(Menu::blueprint(), &options, &HashMap::new()).unwrap();
        registry.instantiate(Pause::blueprint(), &options, &HashMap::new()).unwrap();

        assert_eq!(registry.swap_current("Menu"), Some((None, "Menu")));
        assert_eq!(registry.swap_current("Pause"), Some((Some("Menu"), "Pause")));
        assert_eq!(registry.last_name(), Some("Menu"));
        assert_eq!(registry.swap_current("Nowhere"), None);
    }

    #[test]
    fn rebuild_reuses_stored_arguments() {
        let mut registry = TestRegistry::new();
        let options = LoadOptions::new().with_arg("a", 1).with_arg("b", 1);
        registry
            .instantiate(Recorder::blueprint(), &options, &HashMap::new())
            .unwrap();

        let reload = LoadOptions::new().with_arg("b", 2);
        let (instance, args) = registry.rebuild("Recorder", &reload, &HashMap::new()).unwrap();
        assert_eq!(serde_json::Value::Object(args.clone()), json!({ "a": 1, "b": 2 }));

        assert!(registry.replace("Recorder", instance, args).is_some());
        assert_eq!(
            serde_json::Value::Object(recorded_args(&registry, "Recorder")),
            json!({ "a": 1, "b": 2 })
        );
        assert_eq!(registry.args("Recorder").unwrap().len(), 2);
    }

    #[test]
    fn rebuild_of_missing_state_is_not_found() {
        let registry = TestRegistry::new();
        let result = registry.rebuild("Recorder", &LoadOptions::new(), &HashMap::new());
        assert!(matches!(result, Err(StateError::NotFound { .. })));
    }
}
