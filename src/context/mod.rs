//! # Execution Context
//!
//! Run-scoped values captured from earlier responses. A [`RunState`] pairs
//! the context with the run's own copy of the action registry, so nothing
//! here is process-global and two runs never share state.

use serde::Serialize;
use serde_json::Value;

use crate::catalog::ActionRegistry;
use crate::catalog::template::Slot;

/// Item references in effect before any discovery succeeds.
pub const SEED_ITEM_REFERENCES: [&str; 3] = [
    "spotify:track:27ooJRSmsdwshBQGoUZE3p",
    "spotify:track:3RlsVPIIs5KFhLFhxZ4iDF",
    "spotify:track:0e7ipj03S05BNilyu5bRzt",
];

/// Substituted for a slot that has no value yet.
pub const UNBOUND_SENTINEL: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    dependent_resource_id: Option<String>,
    item_references: Vec<String>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ExecutionContext {
    /// Unbound resource id, seed item references.
    pub fn seeded() -> Self {
        Self {
            dependent_resource_id: None,
            item_references: SEED_ITEM_REFERENCES.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn dependent_resource_id(&self) -> Option<&str> {
        self.dependent_resource_id.as_deref()
    }

    pub fn item_references(&self) -> &[String] {
        &self.item_references
    }

    /// Overwrites the resource id. There is no way to clear it.
    pub fn bind_resource_id(&mut self, id: impl Into<String>) {
        self.dependent_resource_id = Some(id.into());
    }

    /// Replaces the item references wholesale.
    pub fn replace_item_references(&mut self, references: Vec<String>) {
        self.item_references = references;
    }

    /// Context value for `slot`, or `None` when it is still unbound.
    pub fn resolve(&self, slot: Slot) -> Option<Value> {
        match slot {
            Slot::CollectionId => self
                .dependent_resource_id
                .as_ref()
                .map(|id| Value::String(id.clone())),
            Slot::DiscoveredItems => {
                if self.item_references.is_empty() {
                    None
                } else {
                    Some(Value::from(self.item_references.clone()))
                }
            }
            Slot::FirstDiscoveredItem => self
                .item_references
                .first()
                .map(|first| Value::from(vec![first.clone()])),
        }
    }
}

/// Everything one run owns: its registry snapshot and its context.
#[derive(Debug, Clone)]
pub struct RunState {
    pub registry: ActionRegistry,
    pub context: ExecutionContext,
}

impl RunState {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            registry,
            context: ExecutionContext::seeded(),
        }
    }
}
