//! Method-name to handler mapping consulted by the dispatch loop.
//!
//! Handlers take no arguments and return nothing. The registry is fully
//! populated before the loop starts and only read afterwards.

use std::collections::HashMap;
use std::fmt;

use mimsy_protocol::method;
use tracing::debug;

use crate::error::ProtocolError;

const REGISTRY_TARGET: &str = "mimsy_extension::registry";

/// Handlers keyed by the notification method they answer.
///
/// Handlers may capture state from the surrounding scope for the lifetime
/// `'h`, and may mutate it since they run one at a time.
#[derive(Default)]
pub struct HandlerRegistry<'h> {
    handlers: HashMap<String, Box<dyn FnMut() + 'h>>,
}

impl<'h> HandlerRegistry<'h> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `handler` with `method`, replacing any earlier handler.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ReservedMethod`] for the fixed protocol
    /// methods: `on_register` is answered by the dispatch loop itself, and the
    /// others never arrive as notifications.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<(), ProtocolError>
    where
        F: FnMut() + 'h,
    {
        let method_name = name.into();
        if method::FIXED.contains(&method_name.as_str()) {
            return Err(ProtocolError::ReservedMethod {
                method: method_name,
            });
        }
        if self.handlers.contains_key(&method_name) {
            debug!(
                target: REGISTRY_TARGET,
                method = method_name.as_str(),
                "replacing registered handler"
            );
        }
        self.handlers.insert(method_name, Box::new(handler));
        Ok(())
    }

    /// Looks up the handler for `method`. Names are compared exactly.
    #[must_use]
    pub fn resolve(&mut self, method: &str) -> Option<&mut (dyn FnMut() + 'h)> {
        self.handlers.get_mut(method).map(|handler| &mut **handler)
    }

    /// Whether a handler is registered for `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered method names in sorted order.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }
}

impl fmt::Debug for HandlerRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
