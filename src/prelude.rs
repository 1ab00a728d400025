//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use game_state::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// States
pub use crate::core::state::{
    ArgMap, AsAny, AsyncState, LoadMode, NoArgs, State, StateArgs, StateType,
};

// Context
pub use crate::core::context::{StateContext, StateTransition};

// Managers
pub use crate::core::manager::{AsyncStateManager, StateHook, StateManager, StateManagerBuilder};

// Registry
pub use crate::core::registry::{LoadOptions, StateBlueprint};

// Errors
pub use crate::core::error::{Result, StateError};
