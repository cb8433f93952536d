//! Typed request templates.
//!
//! Paths are sequences of literal text and named slots; body and query
//! fields are either literal JSON or a slot. Slots are resolved at bind time
//! against the run state, never by string formatting.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;

/// A named value that is only known once the run has observed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Identifier of the collection created earlier in the run.
    CollectionId,
    /// Every item reference discovered so far.
    DiscoveredItems,
    /// The first discovered item reference, as a one-element list.
    FirstDiscoveredItem,
}

impl Slot {
    pub fn placeholder(self) -> &'static str {
        match self {
            Slot::CollectionId => "id",
            Slot::DiscoveredItems => "items",
            Slot::FirstDiscoveredItem => "item",
        }
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.placeholder())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Slot(Slot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn literal(path: &str) -> Self {
        Self {
            segments: vec![Segment::Literal(path.to_string())],
        }
    }

    /// `prefix{slot}suffix`; an empty suffix is dropped.
    pub fn with_slot(prefix: &str, slot: Slot, suffix: &str) -> Self {
        let mut segments = vec![Segment::Literal(prefix.to_string()), Segment::Slot(slot)];
        if !suffix.is_empty() {
            segments.push(Segment::Literal(suffix.to_string()));
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Slot(slot) => Some(*slot),
            Segment::Literal(_) => None,
        })
    }
}

impl Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => write!(f, "{text}")?,
                Segment::Slot(slot) => write!(f, "{slot}")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Literal(Value),
    Slot(Slot),
}

impl TemplateValue {
    pub fn text(value: &str) -> Self {
        TemplateValue::Literal(Value::String(value.to_string()))
    }

    pub fn slot(&self) -> Option<Slot> {
        match self {
            TemplateValue::Slot(slot) => Some(*slot),
            TemplateValue::Literal(_) => None,
        }
    }
}

/// Ordered named fields; used for both JSON bodies and query strings.
pub type FieldTemplate = Vec<(String, TemplateValue)>;
