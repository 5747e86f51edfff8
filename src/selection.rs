//! Selection bridge — turns widget pick events into user notifications.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Classification metadata attached to a picked entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A pick reported by the widget's `queryPicked` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub entity_id: String,
    pub meta_object: MetaObject,
}

impl SelectionEvent {
    #[must_use]
    pub fn new(entity_id: impl Into<String>, kind: impl Into<String>) -> Self {
        let entity_id = entity_id.into();
        Self { meta_object: MetaObject { id: entity_id.clone(), kind: kind.into(), name: None }, entity_id }
    }

    /// User-facing text for a pick.
    #[must_use]
    pub fn notification_text(&self) -> String {
        format!("Query result:\n\nObject ID = {}\nIFC type = \"{}\"", self.entity_id, self.meta_object.kind)
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that writes to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        info!(%message, "viewer notification");
    }
}

/// Notifier that keeps every message, for hosts that render notices later.
#[derive(Debug, Default, Clone)]
pub struct CollectingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
