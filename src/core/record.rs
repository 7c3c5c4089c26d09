//! A dynamic entity backed by maps.
//!
//! `Record` suits config-driven machines and tests: any field name can hold
//! any symbolic value, timestamps land in their own map, and free-form
//! attributes carry whatever guards and effects need.

use super::entity::{BoxError, Entity};
use crate::store::Patch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: String,
    #[serde(default)]
    states: BTreeMap<String, String>,
    #[serde(default)]
    timestamps: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set a state field while building the record.
    pub fn with_state(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_state(field, value);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Set a state field directly, bypassing any registry.
    pub fn insert_state(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.states.insert(field.into(), value.into());
    }

    pub fn clear_state(&mut self, field: &str) {
        self.states.remove(field);
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.timestamps.get(field).copied()
    }

    pub fn timestamps(&self) -> &BTreeMap<String, DateTime<Utc>> {
        &self.timestamps
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }
}

impl Entity for Record {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn state(&self, field: &str) -> Option<String> {
        self.states.get(field).cloned()
    }

    fn set_state(&mut self, field: &str, value: &str) -> Result<(), BoxError> {
        self.insert_state(field, value);
        Ok(())
    }

    fn set_timestamp(&mut self, field: &str, at: DateTime<Utc>) -> Result<(), BoxError> {
        self.timestamps.insert(field.to_string(), at);
        Ok(())
    }
}

impl Patch for Record {
    fn patch(&self, since: &Self, onto: &mut Self) {
        patch_map(&self.states, &since.states, &mut onto.states);
        patch_map(&self.timestamps, &since.timestamps, &mut onto.timestamps);
        patch_map(&self.attributes, &since.attributes, &mut onto.attributes);
    }
}

fn patch_map<V: Clone + PartialEq>(
    ours: &BTreeMap<String, V>,
    since: &BTreeMap<String, V>,
    onto: &mut BTreeMap<String, V>,
) {
    for (key, value) in ours {
        if since.get(key) != Some(value) {
            onto.insert(key.clone(), value.clone());
        }
    }
    for key in since.keys().filter(|key| !ours.contains_key(*key)) {
        onto.remove(key);
    }
}
