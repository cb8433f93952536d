//! # Request Binder
//!
//! Turns an [`ActionSpec`] into a [`ConcreteRequest`]. Binding never fails:
//! a slot with no value is sent as [`UNBOUND_SENTINEL`] and listed in
//! [`ConcreteRequest::unresolved`], leaving it to the SUT to reject it.

use serde_json::{Map, Value};

use crate::catalog::ActionSpec;
use crate::catalog::template::{FieldTemplate, Segment, Slot, TemplateValue};
use crate::context::{ExecutionContext, UNBOUND_SENTINEL};
use crate::http::request::ConcreteRequest;

pub fn bind(spec: &ActionSpec, context: &ExecutionContext) -> ConcreteRequest {
    let mut unresolved = Vec::new();

    let mut path = String::new();
    for segment in spec.path.segments() {
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Slot(slot) => {
                let value = resolve_slot(spec, context, *slot, &mut unresolved);
                path.push_str(&path_segment(&value_text(&value)));
            }
        }
    }

    let query = spec
        .query
        .iter()
        .map(|(name, value)| {
            let value = resolve_field(spec, context, value, &mut unresolved);
            (name.clone(), value_text(&value))
        })
        .collect();

    let body = spec
        .body
        .as_ref()
        .map(|fields| bind_body(spec, context, fields, &mut unresolved));

    ConcreteRequest {
        method: spec.method,
        path,
        query,
        body,
        unresolved,
    }
}

fn bind_body(
    spec: &ActionSpec,
    context: &ExecutionContext,
    fields: &FieldTemplate,
    unresolved: &mut Vec<Slot>,
) -> Value {
    let mut object = Map::new();
    for (name, value) in fields {
        object.insert(name.clone(), resolve_field(spec, context, value, unresolved));
    }
    Value::Object(object)
}

fn resolve_field(
    spec: &ActionSpec,
    context: &ExecutionContext,
    value: &TemplateValue,
    unresolved: &mut Vec<Slot>,
) -> Value {
    match value {
        TemplateValue::Literal(literal) => literal.clone(),
        TemplateValue::Slot(slot) => resolve_slot(spec, context, *slot, unresolved),
    }
}

/// Registry-bound value first, then the live context, then the sentinel.
fn resolve_slot(
    spec: &ActionSpec,
    context: &ExecutionContext,
    slot: Slot,
    unresolved: &mut Vec<Slot>,
) -> Value {
    if let Some(value) = spec.bound.get(&slot) {
        return value.clone();
    }
    match context.resolve(slot) {
        Some(value) => value,
        None => {
            if !unresolved.contains(&slot) {
                unresolved.push(slot);
            }
            Value::String(UNBOUND_SENTINEL.to_string())
        }
    }
}

/// Percent-encodes a bound value so it stays one path segment.
fn path_segment(text: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://segment.invalid/") else {
        return text.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(text);
    }
    url.path().trim_start_matches('/').to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
