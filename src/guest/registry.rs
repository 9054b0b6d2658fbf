use super::event::HostEvent;
use ahash::AHashMap;

/// The error type handlers return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A registered event handler.
pub type Handler = Box<dyn FnMut(&HostEvent) -> Result<(), BoxError>>;

/// Handlers of one guest instance, keyed by event type.
#[derive(Default)]
pub struct EventRegistry {
    declared: Vec<String>,
    handlers: AHashMap<String, Vec<Handler>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the handlers of `event_type`. The type is declared
    /// on its first registration only.
    pub fn register(&mut self, event_type: String, handler: Handler) {
        let handlers = self.handlers.entry(event_type).or_insert_with_key(|key| {
            self.declared.push(key.clone());
            Vec::new()
        });
        handlers.push(handler);
    }

    /// Event types in first-registration order.
    pub fn declared_events(&self) -> &[String] {
        &self.declared
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    pub(super) fn handlers_mut(&mut self, event_type: &str) -> Option<&mut Vec<Handler>> {
        self.handlers
            .get_mut(event_type)
            .filter(|handlers| !handlers.is_empty())
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}
