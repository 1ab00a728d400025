//=========================================================================
// Async State Manager
//=========================================================================
//
// StateManager counterpart for states whose lifecycle hooks await.
//
// Bookkeeping is shared through Registry, so both managers accept and
// reject exactly the same operations. Only hook invocation differs:
// state hooks are awaited one at a time, in the same order. Global hooks
// and state hooks (registration functions) stay synchronous.
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
use crate::core::state::{route_state_args, ArgMap, AsyncState, StateArgs};

//=== Type Aliases ========================================================

/// Blueprint of an asynchronous state.
pub type AsyncBlueprint<C = ()> = StateBlueprint<dyn AsyncState<C>>;

//=== AsyncStateManager ===================================================

/// Registry of named [`AsyncState`]s and arbiter of every transition.
///
/// # Example
///
/// ```rust
/// # use game_state::prelude::*;
/// # use game_state::async_trait;
/// struct Loading;
///
/// impl StateType for Loading {
///     type Args = NoArgs;
///     fn create(_: NoArgs) -> Self { Loading }
/// }
///
/// #[async_trait]
/// impl AsyncState for Loading {
///     async fn on_enter(&mut self, _ctx: &mut StateContext<()>, _previous: Option<&str>) {}
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut manager = AsyncStateManager::new(());
/// manager.load_states([Loading::blueprint()], LoadOptions::new()).await?;
/// manager.change_state("Loading").await?;
///
/// assert_eq!(manager.current_name(), Some("Loading"));
/// # Ok::<(), StateError>(())
/// # }).unwrap();
/// ```
pub struct AsyncStateManager<C: Send + 'static = ()> {
    registry: Registry<dyn AsyncState<C>>,
    context: StateContext<C>,
    hooks: GlobalHooks<dyn AsyncState<C>>,
    state_hooks: HookRegistry<AsyncStateManager<C>>,
}

impl<C: Send + 'static> AsyncStateManager<C> {
    //--- Construction -----------------------------------------------------

    pub fn new(context: C) -> Self {
        Self::builder(context).build()
    }

    pub fn builder(context: C) -> StateManagerBuilder<C, dyn AsyncState<C>> {
        StateManagerBuilder::new(context)
    }

    //--- Accessors --------------------------------------------------------

    pub fn current_state(&self) -> Option<&dyn AsyncState<C>> {
        self.registry
            .current_name()
            .and_then(|name| self.registry.get(name))
    }

    pub fn current_state_mut(&mut self) -> Option<&mut (dyn AsyncState<C> + 'static)> {
        let name = self.registry.current_name()?;
        self.registry.get_mut(name)
    }

    pub fn last_state(&self) -> Option<&dyn AsyncState<C>> {
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

    pub fn state_map(&self) -> HashMap<&'static str, &(dyn AsyncState<C> + 'static)> {
        self.registry.iter().collect()
    }

    pub fn state_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub fn get_state(&self, name: &str) -> Option<&dyn AsyncState<C>> {
        self.registry.get(name)
    }

    pub fn get_state_mut(&mut self, name: &str) -> Option<&mut (dyn AsyncState<C> + 'static)> {
        self.registry.get_mut(name)
    }

    pub fn downcast_state<T: 'static>(&self, name: &str) -> Option<&T> {
        self.registry.get(name)?.as_any().downcast_ref::<T>()
    }

    pub fn downcast_state_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.registry.get_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn state_blueprint(&self, name: &str) -> Option<&AsyncBlueprint<C>> {
        self.registry.blueprint(name)
    }

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

    pub fn lazy_states(&self) -> Vec<&'static str> {
        self.registry.lazy_names()
    }

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

    pub fn set_global_on_load<F>(&mut self, hook: F)
    where
        F: FnMut(&mut (dyn AsyncState<C> + 'static), bool) + Send + 'static,
    {
        self.hooks.on_load = Some(Box::new(hook));
    }

    pub fn set_global_on_unload<F>(&mut self, hook: F)
    where
        F: FnMut(&mut (dyn AsyncState<C> + 'static), bool) + Send + 'static,
    {
        self.hooks.on_unload = Some(Box::new(hook));
    }

    pub fn set_global_on_enter<F>(&mut self, hook: F)
    where
        F: FnMut(&(dyn AsyncState<C> + 'static), Option<&(dyn AsyncState<C> + 'static)>)
            + Send
            + 'static,
    {
        self.hooks.on_enter = Some(Box::new(hook));
    }

    pub fn set_global_on_leave<F>(&mut self, hook: F)
    where
        F: FnMut(Option<&(dyn AsyncState<C> + 'static)>, &(dyn AsyncState<C> + 'static))
            + Send
            + 'static,
    {
        self.hooks.on_leave = Some(Box::new(hook));
    }

    //--- Registration -----------------------------------------------------

    /// See [`StateManager::register`](super::StateManager::register).
    pub fn register(
        &mut self,
        blueprints: impl IntoIterator<Item = AsyncBlueprint<C>>,
    ) -> Result<()> {
        self.registry.register(blueprints.into_iter().collect())
    }

    /// See [`StateManager::add_lazy_states`](super::StateManager::add_lazy_states).
    pub fn add_lazy_states(
        &mut self,
        blueprints: impl IntoIterator<Item = AsyncBlueprint<C>>,
        state_args: impl IntoIterator<Item = StateArgs>,
    ) -> Result<()> {
        self.registry.queue_lazy(blueprints.into_iter().collect())?;
        self.registry.defer_state_args(state_args.into_iter().collect());
        Ok(())
    }

    pub fn remove_lazy_state(
        &mut self,
        name: &str,
    ) -> Option<(AsyncBlueprint<C>, Option<StateArgs>)> {
        self.registry.remove_lazy(name)
    }

    //--- Loading ----------------------------------------------------------

    /// See [`StateManager::load_states`](super::StateManager::load_states).
    pub async fn load_states(
        &mut self,
        blueprints: impl IntoIterator<Item = AsyncBlueprint<C>>,
        options: LoadOptions,
    ) -> Result<()> {
        let routed = route_state_args(options.state_args.iter().cloned());

        for blueprint in blueprints {
            self.load_one(blueprint, &options, &routed, false).await?;
        }
        Ok(())
    }

    pub async fn load_eager_states(&mut self, options: LoadOptions) -> Result<()> {
        let routed = route_state_args(options.state_args.iter().cloned());

        while let Some(blueprint) = self.registry.front_eager() {
            self.load_one(blueprint, &options, &routed, false).await?;
        }
        Ok(())
    }

    async fn load_one(
        &mut self,
        blueprint: AsyncBlueprint<C>,
        options: &LoadOptions,
        routed: &HashMap<String, StateArgs>,
        reload: bool,
    ) -> Result<&'static str> {
        let name = self.registry.instantiate(blueprint, options, routed)?;

        if let Some(state) = self.registry.get_mut(name) {
            self.hooks.load(state, reload);
            state.on_load(&mut self.context, reload).await;
        }
        Ok(name)
    }

    //--- Unloading --------------------------------------------------------

    /// See [`StateManager::unload_state`](super::StateManager::unload_state).
    pub async fn unload_state(&mut self, name: &str, force: bool) -> Result<AsyncBlueprint<C>> {
        let key = self.registry.check_unload(name, force)?;
        self.run_unload_hooks(key, false).await;

        self.registry
            .remove(key)
            .ok_or_else(|| self.registry.not_found(key))
    }

    /// See [`StateManager::reload_state`](super::StateManager::reload_state).
    pub async fn reload_state(
        &mut self,
        name: &str,
        options: LoadOptions,
    ) -> Result<&dyn AsyncState<C>> {
        let key = self.registry.check_unload(name, options.force)?;

        let routed = route_state_args(options.state_args.iter().cloned());
        let (instance, args) = self.registry.rebuild(key, &options, &routed)?;

        self.run_unload_hooks(key, true).await;
        self.registry.replace(key, instance, args);

        if let Some(state) = self.registry.get_mut(key) {
            self.hooks.load(state, true);
            state.on_load(&mut self.context, true).await;
        }

        debug!("Reloaded state `{}`", key);
        self.registry
            .get(key)
            .ok_or_else(|| self.registry.not_found(key))
    }

    async fn run_unload_hooks(&mut self, name: &str, reload: bool) {
        if let Some(state) = self.registry.get_mut(name) {
            self.hooks.unload(state, reload);
            state.on_unload(&mut self.context, reload).await;
        }
    }

    //--- Transitions ------------------------------------------------------

    /// See [`StateManager::change_state`](super::StateManager::change_state).
    pub async fn change_state(&mut self, name: &str) -> Result<()> {
        self.registry.check_change(name)?;

        if !self.registry.is_loaded(name) {
            if let Some(blueprint) = self.registry.lazy_blueprint(name) {
                debug!("Materializing lazy state `{}`", name);
                self.load_one(blueprint, &LoadOptions::new(), &HashMap::new(), false)
                    .await?;
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
                state.on_leave(&mut self.context, current).await;
            }
        }

        if let Some(current_state) = self.registry.get(current) {
            let last_state = last.and_then(|n| self.registry.get(n));
            self.hooks.enter(current_state, last_state);
        }

        if let Some(state) = self.registry.get_mut(current) {
            state.on_enter(&mut self.context, last).await;
        }

        Ok(())
    }

    /// See [`StateManager::process_transitions`](super::StateManager::process_transitions).
    pub async fn process_transitions(&mut self) -> Result<()> {
        loop {
            let batch = self.context.transitions.take();
            if batch.is_empty() {
                return Ok(());
            }

            let total = batch.len();
            for (index, transition) in batch.into_iter().enumerate() {
                if let Err(err) = self.apply_transition(transition).await {
                    let dropped = total - index - 1;
                    if dropped > 0 {
                        warn!("Discarding {} queued transitions after failure", dropped);
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn apply_transition(&mut self, transition: StateTransition) -> Result<()> {
        match transition {
            StateTransition::Change(name) => self.change_state(&name).await,
            StateTransition::Reload(name) => self
                .reload_state(&name, LoadOptions::forced())
                .await
                .map(|_| ()),
            StateTransition::Unload(name) => self.unload_state(&name, false).await.map(|_| ()),
        }
    }

    /// See [`StateManager::dispatch_event`](super::StateManager::dispatch_event).
    pub async fn dispatch_event(&mut self, event: &(dyn Any + Send + Sync)) -> Result<()> {
        if let Some(name) = self.registry.current_name() {
            if let Some(state) = self.registry.get_mut(name) {
                state
                    .on_event(&mut self.context, event)
                    .await
                    .map_err(|err| err.or_last_state(Some(name)))?;
            }
        }

        self.process_transitions().await
    }

    /// See [`StateManager::update`](super::StateManager::update).
    pub async fn update(&mut self) -> Result<()> {
        if let Some(name) = self.registry.current_name() {
            if let Some(state) = self.registry.get_mut(name) {
                state
                    .on_update(&mut self.context)
                    .await
                    .map_err(|err| err.or_last_state(Some(name)))?;
            }
        }

        self.process_transitions().await
    }

    //--- State Hooks ------------------------------------------------------

    pub fn register_state_hook<H>(&mut self, path: impl Into<String>, hook: H)
    where
        H: StateHook<Self> + Send + Sync + 'static,
    {
        self.state_hooks.register(path, Arc::new(hook));
    }

    /// See [`StateManager::connect_state_hook`](super::StateManager::connect_state_hook).
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

    pub fn connect_hook<H>(&mut self, hook: H, args: ArgMap) -> Result<()>
    where
        H: StateHook<Self>,
    {
        hook.hook(self, &args)
    }
}

impl<C: Default + Send + 'static> Default for AsyncStateManager<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Send + 'static> HookHost for AsyncStateManager<C> {
    type Hook = dyn StateHook<Self> + Send + Sync;
}

//=== Builder =============================================================

impl<C: Send + 'static> StateManagerBuilder<C, dyn AsyncState<C>> {
    /// Builds the configured async manager.
    pub fn build(self) -> AsyncStateManager<C> {
        info!(
            "Building async state manager (transition capacity: {})",
            self.transition_capacity
        );

        let (context, hooks) = self.into_parts();
        AsyncStateManager {
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
        F: FnMut(&mut (dyn AsyncState<C> + 'static), bool) + Send + 'static,
    {
        self.hooks.on_load = Some(Box::new(hook));
        self
    }

    /// Sets the hook run for every state right before it is unloaded.
    ///
    /// Runs before the state's own `on_unload`.
    pub fn with_global_on_unload<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut (dyn AsyncState<C> + 'static), bool) + Send + 'static,
    {
        self.hooks.on_unload = Some(Box::new(hook));
        self
    }

    /// Sets the hook run with `(current, last)` on every transition.
    pub fn with_global_on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&(dyn AsyncState<C> + 'static), Option<&(dyn AsyncState<C> + 'static)>)
            + Send
            + 'static,
    {
        self.hooks.on_enter = Some(Box::new(hook));
        self
    }

    /// Sets the hook run with `(last, current)` on every transition.
    pub fn with_global_on_leave<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Option<&(dyn AsyncState<C> + 'static)>, &(dyn AsyncState<C> + 'static))
            + Send
            + 'static,
    {
        self.hooks.on_leave = Some(Box::new(hook));
        self
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{LoadMode, NoArgs, StateType};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    type Log = Vec<String>;

    struct Title;

    impl StateType for Title {
        type Args = NoArgs;

        fn load_mode() -> LoadMode {
            LoadMode::Eager
        }

        fn create(_: NoArgs) -> Self {
            Title
        }
    }

    #[async_trait]
    impl AsyncState<Log> for Title {
        async fn on_load(&mut self, ctx: &mut StateContext<Log>, reload: bool) {
            ctx.data.push(format!("Title.on_load({})", reload));
        }

        async fn on_unload(&mut self, ctx: &mut StateContext<Log>, reload: bool) {
            ctx.data.push(format!("Title.on_unload({})", reload));
        }

        async fn on_leave(&mut self, ctx: &mut StateContext<Log>, next: &str) {
            ctx.data.push(format!("Title.on_leave({})", next));
        }

        async fn on_update(&mut self, ctx: &mut StateContext<Log>) -> Result<()> {
            ctx.change_state("Level");
            Ok(())
        }

        async fn on_event(
            &mut self,
            ctx: &mut StateContext<Log>,
            event: &(dyn Any + Send + Sync),
        ) -> Result<()> {
            if let Some(key) = event.downcast_ref::<char>() {
                ctx.data.push(format!("Title.on_event({})", key));
            }
            Ok(())
        }
    }

    #[derive(Deserialize)]
    struct LevelArgs {
        number: u32,
    }

    struct Level {
        number: u32,
    }

    impl StateType for Level {
        type Args = LevelArgs;

        fn load_mode() -> LoadMode {
            LoadMode::Lazy
        }

        fn create(args: LevelArgs) -> Self {
            Self {
                number: args.number,
            }
        }
    }

    #[async_trait]
    impl AsyncState<Log> for Level {
        async fn on_load(&mut self, ctx: &mut StateContext<Log>, _reload: bool) {
            ctx.data.push(format!("Level.on_load({})", self.number));
        }

        async fn on_enter(&mut self, ctx: &mut StateContext<Log>, previous: Option<&str>) {
            ctx.data.push(format!("Level.on_enter({:?})", previous));
        }

        async fn on_update(&mut self, _ctx: &mut StateContext<Log>) -> Result<()> {
            Err(StateError::leave_state())
        }
    }

    fn level_args(number: u32) -> StateArgs {
        StateArgs::new("Level").with("number", number)
    }

    #[tokio::test]
    async fn eager_then_lazy_flow() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager.register([Title::blueprint()]).unwrap();
        manager
            .add_lazy_states([Level::blueprint()], [level_args(3)])
            .unwrap();

        manager.load_eager_states(LoadOptions::new()).await.unwrap();
        manager.change_state("Title").await.unwrap();
        manager.update().await.unwrap();

        assert_eq!(manager.current_name(), Some("Level"));
        assert_eq!(manager.last_name(), Some("Title"));
        assert_eq!(manager.downcast_state::<Level>("Level").unwrap().number, 3);
        assert_eq!(
            manager.context().data,
            vec![
                "Title.on_load(false)",
                "Level.on_load(3)",
                "Title.on_leave(Level)",
                "Level.on_enter(Some(\"Title\"))",
            ]
        );
    }

    #[tokio::test]
    async fn update_signal_carries_state_name() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager
            .load_states([Level::blueprint()], LoadOptions::new().with_arg("number", 1))
            .await
            .unwrap();
        manager.change_state("Level").await.unwrap();

        let err = manager.update().await.unwrap_err();

        assert!(matches!(err, StateError::LeaveState { .. }));
        assert_eq!(err.last_state(), Some("Level"));
    }

    #[tokio::test]
    async fn reload_and_unload_run_hooks() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager.load_states([Title::blueprint()], LoadOptions::new()).await.unwrap();
        manager.context_mut().data.clear();

        manager.reload_state("Title", LoadOptions::new()).await.unwrap();
        manager.unload_state("Title", false).await.unwrap();

        assert_eq!(
            manager.context().data,
            vec![
                "Title.on_unload(true)",
                "Title.on_load(true)",
                "Title.on_unload(false)",
            ]
        );
        assert!(manager.state_map().is_empty());
    }

    #[tokio::test]
    async fn change_to_unknown_state_fails() {
        let mut manager = AsyncStateManager::new(Log::new());
        let err = manager.change_state("Nowhere").await.unwrap_err();
        assert!(matches!(err, StateError::InvalidOperation { .. }));
        assert!(manager.current_state().is_none());
    }

    fn hook_adds_level(manager: &mut AsyncStateManager<Log>, args: &ArgMap) -> Result<()> {
        manager.add_lazy_states(
            [Level::blueprint()],
            [StateArgs::from_data("Level", args.clone())],
        )
    }

    #[tokio::test]
    async fn state_hooks_queue_states() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager.register_state_hook("levels", hook_adds_level);

        let mut args = ArgMap::new();
        args.insert("number".into(), 9.into());
        manager.connect_state_hook("levels", args).unwrap();

        assert_eq!(manager.lazy_states(), vec!["Level"]);
        manager.change_state("Level").await.unwrap();
        assert_eq!(manager.downcast_state::<Level>("Level").unwrap().number, 9);
    }

    #[tokio::test]
    async fn unload_guards() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager.load_states([Title::blueprint()], LoadOptions::new()).await.unwrap();
        manager.change_state("Title").await.unwrap();

        assert!(matches!(
            manager.unload_state("Missing", false).await,
            Err(StateError::NotFound { .. })
        ));

        let err = manager.unload_state("Title", false).await.unwrap_err();
        assert!(matches!(err, StateError::InvalidOperation { .. }));
        assert_eq!(err.last_state(), Some("Title"));
        assert!(manager.is_loaded("Title"));

        manager.unload_state("Title", true).await.unwrap();
        assert!(manager.current_state().is_none());
    }

    #[tokio::test]
    async fn lazy_state_with_missing_args_stays_queued() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager
            .add_lazy_states([Level::blueprint()], Vec::<StateArgs>::new())
            .unwrap();

        let err = manager.change_state("Level").await.unwrap_err();

        assert!(matches!(err, StateError::InvalidArgs { .. }));
        assert!(manager.is_lazy("Level"));
        assert!(!manager.is_loaded("Level"));
        assert_eq!(manager.current_name(), None);
    }

    #[tokio::test]
    async fn reload_with_bad_args_keeps_old_instance() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager
            .load_states([Level::blueprint()], LoadOptions::new().with_arg("number", 2))
            .await
            .unwrap();
        manager.change_state("Level").await.unwrap();
        manager.context_mut().data.clear();

        let err = manager
            .reload_state("Level", LoadOptions::forced().with_arg("number", "two"))
            .await
            .map(|_| ()).unwrap_err();

        assert!(matches!(err, StateError::InvalidArgs { .. }));
        assert_eq!(manager.current_name(), Some("Level"));
        assert_eq!(manager.downcast_state::<Level>("Level").unwrap().number, 2);
        assert!(manager.context().data.is_empty());

        manager.reload_state("Level", LoadOptions::forced()).await.unwrap();
        assert_eq!(manager.context().data, vec!["Level.on_load(2)"]);
    }

    #[tokio::test]
    async fn dispatch_event_reaches_current_state() {
        let mut manager = AsyncStateManager::new(Log::new());
        manager.load_states([Title::blueprint()], LoadOptions::new()).await.unwrap();
        manager.dispatch_event(&'q').await.unwrap();
        assert_eq!(manager.context().data, vec!["Title.on_load(false)"]);

        manager.change_state("Title").await.unwrap();
        manager.dispatch_event(&'q').await.unwrap();
        manager.dispatch_event(&7_u8).await.unwrap();

        assert_eq!(
            manager.context().data,
            vec!["Title.on_load(false)", "Title.on_event(q)"]
        );
    }

    //--- Global Hooks -----------------------------------------------------

    type Shared = Arc<std::sync::Mutex<Vec<String>>>;

    fn push(ctx: &StateContext<Shared>, entry: String) {
        ctx.data.lock().unwrap().push(entry);
    }

    struct Gate;

    impl StateType for Gate {
        type Args = NoArgs;

        fn create(_: NoArgs) -> Self {
            Gate
        }
    }

    #[async_trait]
    impl AsyncState<Shared> for Gate {
        async fn on_enter(&mut self, ctx: &mut StateContext<Shared>, previous: Option<&str>) {
            push(ctx, format!("Gate.on_enter({:?})", previous));
        }

        async fn on_leave(&mut self, ctx: &mut StateContext<Shared>, next: &str) {
            push(ctx, format!("Gate.on_leave({})", next));
        }
    }

    #[tokio::test]
    async fn global_hooks_wrap_state_hooks() {
        let shared = Shared::default();
        let leave_log = shared.clone();
        let enter_log = shared.clone();

        let mut manager = AsyncStateManager::builder(shared.clone())
            .with_global_on_leave(move |last, _current| {
                let last = last.map(|_| "some").unwrap_or("none");
                leave_log.lock().unwrap().push(format!("global.on_leave({})", last));
            })
            .with_global_on_enter(move |_current, last| {
                let last = last.map(|_| "some").unwrap_or("none");
                enter_log.lock().unwrap().push(format!("global.on_enter({})", last));
            })
            .build();

        manager.load_states([Gate::blueprint()], LoadOptions::new()).await.unwrap();
        manager.change_state("Gate").await.unwrap();
        manager.change_state("Gate").await.unwrap();

        assert_eq!(
            shared.lock().unwrap().clone(),
            vec![
                "global.on_leave(none)",
                "global.on_enter(none)",
                "Gate.on_enter(None)",
                "global.on_leave(some)",
                "Gate.on_leave(Gate)",
                "global.on_enter(some)",
                "Gate.on_enter(Some(\"Gate\"))",
            ]
        );
    }
}
