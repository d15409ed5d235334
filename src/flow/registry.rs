use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::ErrorKind;
use super::handler::ErrorHandler;

/// Registry mapping error kinds to handler instances
///
/// Lookup is by exact kind; there is no fallback between kinds.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<ErrorKind, Arc<dyn ErrorHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, returning the handler it replaced
    pub fn register(
        &mut self,
        kind: ErrorKind,
        handler: Arc<dyn ErrorHandler>,
    ) -> Option<Arc<dyn ErrorHandler>> {
        self.handlers.insert(kind, handler)
    }

    pub fn get(&self, kind: ErrorKind) -> Option<&Arc<dyn ErrorHandler>> {
        self.handlers.get(&kind)
    }

    pub fn has_handler(&self, kind: ErrorKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ErrorKind> + '_ {
        self.handlers.keys().copied()
    }

    /// Kinds that fall through to the default handler
    pub fn unhandled_kinds(&self) -> Vec<ErrorKind> {
        ErrorKind::ALL
            .into_iter()
            .filter(|kind| !self.has_handler(*kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
