//! Per-parse context handed to every parser.

use crate::core::config::ExtractionConfig;
use crate::plugins::ContentParser;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Configuration, nesting depth and a capability bag for one parse.
///
/// Capabilities are stored under the [`TypeId`] of the type they are
/// registered as, and looked up by that same type. Registering a value under
/// its concrete type does not make it visible under a trait it implements:
///
/// ```rust
/// use doctext::plugins::{AutoDetectParser, ContentParser, ParseContext};
/// use std::sync::Arc;
///
/// let parser = Arc::new(AutoDetectParser::default());
///
/// let mut by_concrete_type = ParseContext::default();
/// by_concrete_type.set::<AutoDetectParser>(Arc::clone(&parser));
/// assert!(by_concrete_type.parser().is_none());
///
/// let mut by_capability = ParseContext::default();
/// by_capability.set::<dyn ContentParser>(parser);
/// assert!(by_capability.parser().is_some());
/// ```
#[derive(Clone)]
pub struct ParseContext {
    capabilities: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    config: Arc<ExtractionConfig>,
    depth: usize,
}

impl ParseContext {
    pub fn new(config: Arc<ExtractionConfig>) -> Self {
        Self {
            capabilities: HashMap::new(),
            config,
            depth: 0,
        }
    }

    /// Register `value` under the type `T`, replacing any previous entry.
    pub fn set<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.capabilities.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Look up the value registered under exactly the type `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.capabilities
            .get(&TypeId::of::<T>())
            .and_then(|value| value.as_ref().downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.capabilities.contains_key(&TypeId::of::<T>())
    }

    /// The parser registered under the general parser capability.
    ///
    /// Container formats use it to dispatch their embedded parts.
    pub fn parser(&self) -> Option<Arc<dyn ContentParser>> {
        self.get::<dyn ContentParser>()
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Embedding depth: 0 for the top-level document.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for a document embedded in the current one.
    pub fn nested(&self) -> Self {
        Self {
            capabilities: self.capabilities.clone(),
            config: Arc::clone(&self.config),
            depth: self.depth + 1,
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(Arc::new(ExtractionConfig::default()))
    }
}

impl std::fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("capabilities", &self.capabilities.len())
            .field("config", &self.config)
            .field("depth", &self.depth)
            .finish()
    }
}
