//=========================================================================
// State System
//=========================================================================
//
// Defines the screen/scene abstraction driven by the state managers.
//
// Architecture:
//   StateType        type-level identity: name, load mode, typed args
//     └─ State<C>    instance-level lifecycle hooks (object safe)
//   StateBlueprint   type-erased "state class" built from the two
//
// Per-frame work goes through on_event (host events) and on_update.
//
// Hook order is owned by the managers; states never call their own
// hooks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{type_name, Any, TypeId};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

//=== Internal Dependencies ===============================================

use crate::core::context::StateContext;
use crate::core::error::Result;
use crate::core::registry::StateBlueprint;

//=== Module Declarations =================================================

mod async_state;
mod state_args;

//=== Public API ==========================================================

pub use async_state::AsyncState;
pub use state_args::{ArgMap, StateArgs};

pub(crate) use state_args::route_state_args;

//=== LoadMode ============================================================

/// How a state type is queued when registered with a manager.
///
/// A state is eager, lazy, or neither; the enum makes "both" impossible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Loaded only by explicit `load_states` calls.
    #[default]
    Manual,

    /// Queued for the next `load_eager_states` call.
    Eager,

    /// Queued and instantiated on the first `change_state` to it.
    Lazy,
}

//=== NoArgs ==============================================================

/// Argument type for states that take no constructor arguments.
///
/// Deserializes from any argument map, ignoring every key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NoArgs {}

//=== AsAny ===============================================================

/// Downcasting support for state trait objects.
///
/// Blanket-implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== StateType Trait =====================================================

/// Type-level definition of a state: its name, load mode and arguments.
///
/// The name is fixed once per type. It defaults to the type's own name
/// with module path and generic parameters stripped.
///
/// # Example
///
/// ```rust
/// # use game_state::prelude::*;
/// # use serde::Deserialize;
/// #[derive(Deserialize)]
/// struct MenuArgs { title: String }
///
/// struct MainMenu { title: String }
///
/// impl StateType for MainMenu {
///     type Args = MenuArgs;
///
///     fn state_name() -> &'static str { "Menu" }
///     fn load_mode() -> LoadMode { LoadMode::Eager }
///     fn create(args: MenuArgs) -> Self { Self { title: args.title } }
/// }
/// # impl State for MainMenu {}
/// assert_eq!(MainMenu::state_name(), "Menu");
/// ```
pub trait StateType: Sized + 'static {
    /// Typed constructor arguments, deserialized from the routed
    /// argument map. Use [`NoArgs`] when none are needed.
    type Args: DeserializeOwned;

    /// Unique name of the state within one manager.
    fn state_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Queue this type joins on `register`.
    fn load_mode() -> LoadMode {
        LoadMode::Manual
    }

    /// Builds a fresh instance from its arguments.
    fn create(args: Self::Args) -> Self;
}

//=== State Trait =========================================================

/// Lifecycle surface of one screen or scene.
///
/// Every hook defaults to a no-op. Hooks are invoked only by
/// [`StateManager`](crate::core::manager::StateManager):
///
/// - `on_load` after the instance is stored (`reload` is true when
///   triggered by `reload_state`)
/// - `on_unload` before the instance is removed
/// - `on_leave` on the outgoing state of a transition
/// - `on_enter` on the incoming state of a transition
///
/// Transitions pass the other state's name, so a state may transition
/// to itself.
pub trait State<C: 'static = ()>: AsAny {
    /// Called once the state has been stored in the manager.
    fn on_load(&mut self, _ctx: &mut StateContext<C>, _reload: bool) {}

    /// Called right before the state is removed from the manager.
    fn on_unload(&mut self, _ctx: &mut StateContext<C>, _reload: bool) {}

    /// Called when this state becomes current.
    fn on_enter(&mut self, _ctx: &mut StateContext<C>, _previous: Option<&str>) {}

    /// Called when this state stops being current.
    fn on_leave(&mut self, _ctx: &mut StateContext<C>, _next: &str) {}

    /// Handles one input or window event, driven by
    /// [`StateManager::dispatch_event`]. Downcast `event` to the host's
    /// event type.
    ///
    /// [`StateManager::dispatch_event`]: crate::core::manager::StateManager::dispatch_event
    fn on_event(&mut self, _ctx: &mut StateContext<C>, _event: &dyn Any) -> Result<()> {
        Ok(())
    }

    /// Per-frame update, driven by [`StateManager::update`].
    ///
    /// Return [`StateError::LeaveState`](crate::core::error::StateError::LeaveState)
    /// or `LeaveApplication` to signal the host loop.
    ///
    /// [`StateManager::update`]: crate::core::manager::StateManager::update
    fn on_update(&mut self, _ctx: &mut StateContext<C>) -> Result<()> {
        Ok(())
    }

    /// Type-erased blueprint used to load this state into a manager.
    fn blueprint() -> StateBlueprint<dyn State<C>>
    where
        Self: StateType + Sized,
    {
        StateBlueprint::new(
            Self::state_name(),
            type_name::<Self>(),
            TypeId::of::<Self>(),
            Self::load_mode(),
            build_state::<C, Self>,
        )
    }
}

fn build_state<C, T>(args: ArgMap) -> serde_json::Result<Box<dyn State<C>>>
where
    C: 'static,
    T: State<C> + StateType,
{
    let args = serde_json::from_value(Value::Object(args))?;
    Ok(Box::new(T::create(args)))
}

//=== Helpers =============================================================

/// Returns the last path segment of `T`'s type name, without generics.
///
/// `my_game::screens::Menu<u8>` becomes `Menu`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl StateType for Plain {
        type Args = NoArgs;

        fn create(_: NoArgs) -> Self {
            Self
        }
    }

    impl State for Plain {}

    struct Named;

    impl StateType for Named {
        type Args = NoArgs;

        fn state_name() -> &'static str {
            "First Screen"
        }

        fn load_mode() -> LoadMode {
            LoadMode::Lazy
        }

        fn create(_: NoArgs) -> Self {
            Self
        }
    }

    impl State for Named {}

    struct Generic<T>(std::marker::PhantomData<T>);

    #[test]
    fn name_defaults_to_type_name() {
        assert_eq!(Plain::state_name(), "Plain");
        assert_eq!(Plain::load_mode(), LoadMode::Manual);
    }

    #[test]
    fn explicit_name_and_mode_are_kept() {
        assert_eq!(Named::state_name(), "First Screen");

        let blueprint = Named::blueprint();
        assert_eq!(blueprint.name(), "First Screen");
        assert_eq!(blueprint.load_mode(), LoadMode::Lazy);
        assert!(blueprint.is::<Named>());
    }

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name::<Generic<Plain>>(), "Generic");
        assert_eq!(short_type_name::<String>(), "String");
    }

    #[test]
    fn no_args_ignores_unknown_keys() {
        let value = serde_json::json!({ "speed": 200 });
        let args: NoArgs = serde_json::from_value(value).unwrap();
        assert_eq!(args, NoArgs {});
    }
}
