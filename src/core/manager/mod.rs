//=========================================================================
// State Managers
//=========================================================================
//
// Public entry points for driving states.
//
// Architecture:
//   StateManagerBuilder ──build()──> StateManager / AsyncStateManager
//     ├─ Registry        (shared bookkeeping, core::registry)
//     ├─ StateContext    (payload + transition requests)
//     ├─ GlobalHooks     (callbacks run for every state)
//     └─ HookRegistry    (path-keyed state registration functions)
//
//=========================================================================

//=== Module Declarations =================================================

mod async_manager;
mod builder;
mod global_hooks;
mod state_hook;
mod state_manager;

//=== Public API ==========================================================

pub use async_manager::{AsyncBlueprint, AsyncStateManager};
pub use builder::{StateManagerBuilder, DEFAULT_TRANSITION_CAPACITY};
pub use global_hooks::{GlobalHooks, HookTarget};
pub use state_hook::{HookHost, HookRegistry, StateHook};
pub use state_manager::{Blueprint, LazyEntry, StateManager};
