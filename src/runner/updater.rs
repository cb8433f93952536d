use rand::Rng;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::catalog::Action;
use crate::catalog::template::Slot;
use crate::config::CaptureWindow;
use crate::context::RunState;

use super::outcome::Capture;

/// Pulls values out of successful responses and threads them into the run
/// state. Only [`Action::CreatePlaylist`] and [`Action::Search`] produce
/// state. A body without the expected shape leaves the state untouched.
#[derive(Debug, Clone)]
pub struct StateUpdater {
    capture: CaptureWindow,
    reference_prefix: String,
}

impl StateUpdater {
    pub fn new(capture: CaptureWindow, reference_prefix: impl Into<String>) -> Self {
        Self {
            capture,
            reference_prefix: reference_prefix.into(),
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        &self,
        action: Action,
        body: &str,
        state: &mut RunState,
        rng: &mut R,
    ) -> Option<Capture> {
        if !matches!(action, Action::CreatePlaylist | Action::Search) {
            return None;
        }
        let Ok(body) = serde_json::from_str::<Value>(body) else {
            debug!(%action, "response body not JSON; nothing captured");
            return None;
        };

        match action {
            Action::CreatePlaylist => self.capture_resource_id(&body, state),
            Action::Search => self.capture_item_references(&body, state, rng),
            _ => None,
        }
    }

    fn capture_resource_id(&self, body: &Value, state: &mut RunState) -> Option<Capture> {
        let id = match body.get("playlist")?.get("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };

        state.context.bind_resource_id(id.clone());
        let updated = state.registry.update(Slot::CollectionId, json!(id));
        info!(%id, updated = updated.len(), "captured playlist id");

        Some(Capture::ResourceId { id, updated })
    }

    fn capture_item_references<R: Rng + ?Sized>(
        &self,
        body: &Value,
        state: &mut RunState,
        rng: &mut R,
    ) -> Option<Capture> {
        let items = body.get("tracks")?.get("items")?.as_array()?;
        let keep = self.capture.pick(rng);

        let references: Vec<String> = items
            .iter()
            .take(keep)
            .filter_map(|item| item.get("id").and_then(Value::as_str))
            .map(|id| format!("{}{id}", self.reference_prefix))
            .collect();
        let first = references.first()?.clone();

        state.context.replace_item_references(references.clone());
        let mut updated = state
            .registry
            .update(Slot::DiscoveredItems, json!(references));
        updated.extend(state.registry.update(Slot::FirstDiscoveredItem, json!([first])));
        updated.sort();
        info!(count = references.len(), "captured track references from search");

        Some(Capture::ItemReferences {
            references,
            updated,
        })
    }
}
