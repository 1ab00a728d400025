//=========================================================================
// State Blueprint
//=========================================================================
//
// Type-erased description of a state type.
//
// Holds what the registry needs to build, name and identify a state
// without knowing its concrete type. Unloading returns the blueprint so
// the same type can be loaded again later.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::error::{Result, StateError};
use crate::core::state::{ArgMap, LoadMode};

//=== Constructor Signature ===============================================

/// Builds a boxed state from its argument map.
pub type BuildFn<S> = fn(ArgMap) -> serde_json::Result<Box<S>>;

//=== StateBlueprint ======================================================

/// Type-erased state type: name, load mode, identity and constructor.
///
/// Obtained from `State::blueprint()` or `AsyncState::blueprint()`.
/// Two blueprints are equal when they describe the same type under the
/// same name.
pub struct StateBlueprint<S: ?Sized> {
    name: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    load_mode: LoadMode,
    build: BuildFn<S>,
}

impl<S: ?Sized> StateBlueprint<S> {
    pub(crate) fn new(
        name: &'static str,
        type_name: &'static str,
        type_id: TypeId,
        load_mode: LoadMode,
        build: BuildFn<S>,
    ) -> Self {
        Self {
            name,
            type_name,
            type_id,
            load_mode,
            build,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Full type name of the state, including its module path.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn load_mode(&self) -> LoadMode {
        self.load_mode
    }

    /// True if this blueprint builds values of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Returns a copy of this blueprint with a different load mode.
    pub fn with_load_mode(mut self, load_mode: LoadMode) -> Self {
        self.load_mode = load_mode;
        self
    }

    //--- Construction -----------------------------------------------------

    /// Builds an instance, mapping argument errors to `InvalidArgs`.
    pub(crate) fn build(&self, args: ArgMap) -> Result<Box<S>> {
        (self.build)(args).map_err(|source| StateError::InvalidArgs {
            state: self.name.to_owned(),
            source,
            last_state: None,
        })
    }
}

//--- Trait Implementations -----------------------------------------------

impl<S: ?Sized> Clone for StateBlueprint<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            type_name: self.type_name,
            type_id: self.type_id,
            load_mode: self.load_mode,
            build: self.build,
        }
    }
}

impl<S: ?Sized> PartialEq for StateBlueprint<S> {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl<S: ?Sized> Eq for StateBlueprint<S> {}

impl<S: ?Sized> fmt::Debug for StateBlueprint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBlueprint")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("load_mode", &self.load_mode)
            .finish()
    }
}
