//=========================================================================
// Core State Systems
//
// Everything needed to define states and drive them through a manager.
//
// Layout:
// - state:    State / AsyncState / StateType traits and arguments
// - context:  data and transition requests lent to state hooks
// - registry: blueprints, load options and shared bookkeeping
// - manager:  StateManager, AsyncStateManager and their builder
// - error:    StateError and the crate Result alias
//
//=========================================================================

pub mod context;
pub mod error;
pub mod manager;
pub mod registry;
pub mod state;
