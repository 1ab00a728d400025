//=========================================================================
// State Arguments
//=========================================================================
//
// Constructor arguments routed to one state by name.
//
// Bulk operations accept a list of StateArgs; each one applies only to
// the state whose name matches its `state_name`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//=== ArgMap ==============================================================

/// Named argument values passed to state constructors.
pub type ArgMap = Map<String, Value>;

//=== StateArgs ===========================================================

/// Constructor arguments addressed to the state named `state_name`.
///
/// Two instances are equal when their names and all data match.
///
/// ```rust
/// # use game_state::prelude::*;
/// let args = StateArgs::new("Game").with("player_x", 250.0);
///
/// assert_eq!(args.state_name(), "Game");
/// assert_eq!(args.get("player_x"), Some(&serde_json::json!(250.0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateArgs {
    state_name: String,
    #[serde(flatten)]
    data: ArgMap,
}

impl StateArgs {
    /// Creates an empty argument set for `state_name`.
    pub fn new(state_name: impl Into<String>) -> Self {
        Self {
            state_name: state_name.into(),
            data: ArgMap::new(),
        }
    }

    /// Creates an argument set from existing data.
    pub fn from_data(state_name: impl Into<String>, data: ArgMap) -> Self {
        Self {
            state_name: state_name.into(),
            data,
        }
    }

    /// Adds one named value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets one named value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Name of the state these arguments are routed to.
    pub fn state_name(&self) -> &str {
        &self.state_name
    }

    /// The argument data, without the routing key.
    pub fn get_data(&self) -> &ArgMap {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> ArgMap {
        self.data
    }

    /// Merges `other`'s data into this set; keys in `other` win.
    pub(crate) fn merge(&mut self, other: StateArgs) {
        self.data.extend(other.data);
    }
}

impl fmt::Display for StateArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateArgs(state_name={}", self.state_name)?;
        for (key, value) in &self.data {
            write!(f, ", {}={}", key, value)?;
        }
        write!(f, ")")
    }
}

//=== Routing =============================================================

/// Groups argument sets by state name, merging duplicates in order.
pub(crate) fn route_state_args(
    state_args: impl IntoIterator<Item = StateArgs>,
) -> HashMap<String, StateArgs> {
    let mut routed: HashMap<String, StateArgs> = HashMap::new();

    for args in state_args {
        match routed.get_mut(args.state_name()) {
            Some(existing) => existing.merge(args),
            None => {
                routed.insert(args.state_name.clone(), args);
            }
        }
    }

    routed
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn equality_covers_name_and_data() {
        let a = StateArgs::new("Menu").with("bg", "green");
        let b = StateArgs::new("Menu").with("bg", "green");
        let c = StateArgs::new("Menu").with("bg", "blue");
        let d = StateArgs::new("Game").with("bg", "green");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn get_data_excludes_state_name() {
        let args = StateArgs::new("Game").with("player_x", 250);
        let data = args.get_data();

        assert_eq!(data.len(), 1);
        assert!(!data.contains_key("state_name"));
    }

    #[test]
    fn display_lists_every_field() {
        let args = StateArgs::new("Game").with("lives", 3);
        assert_eq!(args.to_string(), "StateArgs(state_name=Game, lives=3)");
    }

    #[test]
    fn serializes_flat() {
        let args = StateArgs::new("Game").with("lives", 3);
        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value, json!({ "state_name": "Game", "lives": 3 }));
    }

    #[test]
    fn routing_merges_duplicates_in_order() {
        let routed = route_state_args(vec![
            StateArgs::new("Game").with("lives", 3).with("level", 1),
            StateArgs::new("Menu").with("bg", "green"),
            StateArgs::new("Game").with("lives", 5),
        ]);

        assert_eq!(routed.len(), 2);
        assert_eq!(
            routed["Game"],
            StateArgs::new("Game").with("lives", 5).with("level", 1)
        );
    }
}
