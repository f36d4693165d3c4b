//! Component state
//!
//! State is an immutable key/value map. Updates never mutate it in place; a
//! merge produces a new `State` that shares nothing mutable with the old one.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use smallvec::SmallVec;

/// State values are opaque to the pipeline and compared by equality
pub type Value = serde_json::Value;

/// Keys touched by a state transition
pub type ChangedKeys = SmallVec<[String; 4]>;

/// Immutable snapshot of a component's state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State(Rc<BTreeMap<String, Value>>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a value by key, deserialized into `T`.
    ///
    /// Absent keys and values of the wrong shape both yield `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check if two snapshots are the same allocation
    pub fn ptr_eq(&self, other: &State) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Shallow-merge `patch` over this state.
    ///
    /// Returns `None` when every key in the patch already holds an equal value,
    /// otherwise the new state and the keys whose values changed.
    pub fn merged(&self, patch: StatePatch) -> Option<(State, ChangedKeys)> {
        let mut changed = ChangedKeys::new();
        let mut updates: BTreeMap<String, Value> = BTreeMap::new();

        // Later entries for a key replace earlier ones before comparing
        for (key, value) in patch.entries {
            updates.insert(key, value);
        }
        updates.retain(|key, value| self.0.get(key) != Some(&*value));
        if updates.is_empty() {
            return None;
        }

        let mut next = (*self.0).clone();
        for (key, value) in updates {
            changed.push(key.clone());
            next.insert(key, value);
        }
        Some((State(Rc::new(next)), changed))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for State {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        State(Rc::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}

/// An ordered partial update for [`State::merged`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatePatch {
    entries: Vec<(String, Value)>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key. Later entries for the same key win.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StatePatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
