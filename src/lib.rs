//=========================================================================
// Game State: Library Root
//
// A state manager for game screens (menus, levels, pause screens).
//
// Responsibilities:
// - Register, load, unload and reload named states
// - Switch the current state while running lifecycle hooks in order
// - Route constructor arguments to the states they name
// - Defer construction of lazy states until first entered
//
// Typical usage:
// ```no_run
// use game_state::prelude::*;
//
// struct Menu;
//
// impl StateType for Menu {
//     type Args = NoArgs;
//     fn create(_: NoArgs) -> Self { Menu }
// }
//
// impl State for Menu {}
//
// fn main() -> game_state::Result<()> {
//     let mut manager = StateManager::new(());
//     manager.load_states([Menu::blueprint()], LoadOptions::new())?;
//     manager.change_state("Menu")?;
//
//     loop {
//         match manager.update() {
//             Ok(()) => {}
//             Err(err) if err.is_signal() => break,
//             Err(err) => return Err(err),
//         }
//     }
//     Ok(())
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds every subsystem. Most applications only need `prelude`.
//
pub mod core;
pub mod prelude;

//--- Public Exports ------------------------------------------------------

pub use crate::core::error::{Result, StateError};
pub use crate::core::manager::{AsyncStateManager, StateManager};

// Implementing `AsyncState` requires the attribute from the same version.
pub use async_trait::async_trait;
