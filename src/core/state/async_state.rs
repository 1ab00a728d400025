//=========================================================================
// Async State
//=========================================================================
//
// Awaitable variant of the State lifecycle surface.
//
// Used with AsyncStateManager when setup or teardown needs to await
// I/O (asset loading, saves). Hook order is identical to State.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{type_name, Any, TypeId};

use async_trait::async_trait;
use serde_json::Value;

//=== Internal Dependencies ===============================================

use super::{ArgMap, AsAny, StateType};
use crate::core::context::StateContext;
use crate::core::error::Result;
use crate::core::registry::StateBlueprint;

//=== AsyncState Trait ====================================================

/// Lifecycle surface of a screen whose hooks may await.
///
/// Mirrors [`State`](super::State); every hook defaults to a no-op and is
/// invoked only by [`AsyncStateManager`](crate::core::manager::AsyncStateManager).
#[async_trait]
pub trait AsyncState<C: Send + 'static = ()>: AsAny + Send {
    async fn on_load(&mut self, _ctx: &mut StateContext<C>, _reload: bool) {}

    async fn on_unload(&mut self, _ctx: &mut StateContext<C>, _reload: bool) {}

    async fn on_enter(&mut self, _ctx: &mut StateContext<C>, _previous: Option<&str>) {}

    async fn on_leave(&mut self, _ctx: &mut StateContext<C>, _next: &str) {}

    async fn on_event(
        &mut self,
        _ctx: &mut StateContext<C>,
        _event: &(dyn Any + Send + Sync),
    ) -> Result<()> {
        Ok(())
    }

    async fn on_update(&mut self, _ctx: &mut StateContext<C>) -> Result<()> {
        Ok(())
    }

    /// Type-erased blueprint used to load this state into an async manager.
    fn blueprint() -> StateBlueprint<dyn AsyncState<C>>
    where
        Self: StateType + Sized,
    {
        StateBlueprint::new(
            Self::state_name(),
            type_name::<Self>(),
            TypeId::of::<Self>(),
            Self::load_mode(),
            build_async_state::<C, Self>,
        )
    }
}

fn build_async_state<C, T>(args: ArgMap) -> serde_json::Result<Box<dyn AsyncState<C>>>
where
    C: Send + 'static,
    T: AsyncState<C> + StateType,
{
    let args = serde_json::from_value(Value::Object(args))?;
    Ok(Box::new(T::create(args)))
}
