use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Storage event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    /// Event key (e.g., "signature.uploaded")
    pub key: String,

    /// Event attributes (reference, image, backend, ...)
    pub attributes: HashMap<String, String>,

    /// Timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StorageEvent {
    /// Create a new event with no attributes
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach an attribute
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Event emitter
///
/// Emitting never blocks and never fails; events sent while nobody is
/// subscribed are dropped.
#[derive(Clone)]
pub struct EventEmitter {
    sender: Arc<broadcast::Sender<StorageEvent>>,
}

impl EventEmitter {
    /// Create a new event emitter
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit an event
    pub fn emit(&self, event: StorageEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Event catalog - predefined event keys
pub mod events {
    pub const SIGNATURE_UPLOADED: &str = "signature.uploaded";
    pub const SIGNATURE_FAILED: &str = "signature.failed";
}
