//! Parser registration and lookup.
//!
//! Parsers are keyed by their logical name and by the MIME types they declare.
//! A registry is built mutably, then frozen in an `Arc` and shared read-only by
//! every extraction. The process-wide registry of built-in parsers is
//! [`default_parser_registry`].

use crate::plugins::ContentParser;
use crate::{DoctextError, Result};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Validate a plugin name before registration.
///
/// # Rules
///
/// - Name cannot be empty
/// - Name cannot contain whitespace
///
/// # Errors
///
/// Returns `Validation` if the name is invalid.
fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DoctextError::validation("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(DoctextError::validation(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}

type PriorityMap = BTreeMap<(i32, String), Arc<dyn ContentParser>>;

/// Registry of content parsers.
///
/// Manages parsers with MIME type and priority-based selection. Lookups never
/// involve the parsers' concrete Rust types.
///
/// # Example
///
/// ```rust
/// use doctext::plugins::ParserRegistry;
/// use std::sync::Arc;
///
/// let registry = Arc::new(ParserRegistry::with_defaults());
/// assert!(registry.get("application/pdf").is_ok());
/// assert!(registry.get("video/mp4").is_err());
/// ```
pub struct ParserRegistry {
    parsers: HashMap<String, PriorityMap>,
    name_index: HashMap<String, Vec<(String, i32)>>,
}

impl ParserRegistry {
    /// Create a new empty parser registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in parser enabled by crate features.
    ///
    /// A parser that fails to initialize is logged and left out.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::parsers::register_default_parsers(&mut registry);
        registry
    }

    /// Register a parser for all MIME types it supports.
    ///
    /// A parser already registered under the same name is removed first.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if registration succeeded
    /// - `Err(...)` if the name is invalid or initialization failed
    pub fn register(&mut self, parser: Arc<dyn ContentParser>) -> Result<()> {
        let name = parser.name().to_string();
        let priority = parser.priority();
        let mime_types: Vec<String> = parser.supported_mime_types().iter().map(|s| s.to_string()).collect();

        validate_plugin_name(&name)?;

        parser.initialize()?;

        if self.name_index.contains_key(&name) {
            self.remove(&name)?;
        }

        let mut index_entries = Vec::new();

        for mime_type in &mime_types {
            self.parsers
                .entry(mime_type.clone())
                .or_default()
                .insert((priority, name.clone()), Arc::clone(&parser));
            index_entries.push((mime_type.clone(), priority));
        }

        tracing::debug!(parser = %name, priority, mime_types = ?mime_types, "registered parser");
        self.name_index.insert(name, index_entries);

        Ok(())
    }

    /// Get the highest priority parser for a MIME type.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` if no parser is registered for the type.
    pub fn get(&self, mime_type: &str) -> Result<Arc<dyn ContentParser>> {
        self.candidates(mime_type)
            .into_iter()
            .next()
            .ok_or_else(|| DoctextError::UnsupportedFormat(mime_type.to_string()))
    }

    /// Every parser registered for `mime_type`, in selection order.
    ///
    /// Exact registrations come first in descending priority, followed by
    /// wildcard (`type/*`) registrations in descending priority.
    pub fn candidates(&self, mime_type: &str) -> Vec<Arc<dyn ContentParser>> {
        let mut result: Vec<Arc<dyn ContentParser>> = Vec::new();

        if let Some(priority_map) = self.parsers.get(mime_type) {
            result.extend(priority_map.values().rev().cloned());
        }

        let mut wildcard: Vec<(&(i32, String), &Arc<dyn ContentParser>)> = Vec::new();
        for (registered_mime, priority_map) in &self.parsers {
            if let Some(prefix) = registered_mime.strip_suffix('*')
                && prefix.ends_with('/')
                && mime_type.starts_with(prefix)
                && registered_mime != mime_type
            {
                wildcard.extend(priority_map.iter());
            }
        }
        wildcard.sort_by(|a, b| b.0.cmp(a.0));

        for (_, parser) in wildcard {
            if !result.iter().any(|existing| existing.name() == parser.name()) {
                result.push(Arc::clone(parser));
            }
        }

        result
    }

    /// Look a parser up by its registered name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn ContentParser>> {
        let (mime_type, priority) = self.name_index.get(name)?.first()?;
        self.parsers
            .get(mime_type)
            .and_then(|priority_map| priority_map.get(&(*priority, name.to_string())))
            .cloned()
    }

    /// List all registered parser names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.name_index.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every MIME type with at least one registered parser, sorted.
    pub fn supported_mime_types(&self) -> Vec<String> {
        let mut mime_types: Vec<String> = self.parsers.keys().cloned().collect();
        mime_types.sort();
        mime_types
    }

    /// Remove a parser from the registry and shut it down.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let index_entries = match self.name_index.remove(name) {
            Some(entries) => entries,
            None => return Ok(()),
        };

        let mut parser_to_shutdown: Option<Arc<dyn ContentParser>> = None;

        for (mime_type, priority) in index_entries {
            if let Some(priority_map) = self.parsers.get_mut(&mime_type) {
                if let Some(parser) = priority_map.remove(&(priority, name.to_string()))
                    && parser_to_shutdown.is_none()
                {
                    parser_to_shutdown = Some(parser);
                }

                if priority_map.is_empty() {
                    self.parsers.remove(&mime_type);
                }
            }
        }

        if let Some(parser) = parser_to_shutdown {
            parser.shutdown()?;
        }

        Ok(())
    }

    /// Shutdown all parsers and clear the registry.
    pub fn shutdown_all(&mut self) -> Result<()> {
        let names = self.list();
        for name in names {
            self.remove(&name)?;
        }
        Ok(())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry").field("parsers", &self.list()).finish()
    }
}

static DEFAULT_PARSER_REGISTRY: Lazy<Arc<ParserRegistry>> = Lazy::new(|| Arc::new(ParserRegistry::with_defaults()));

/// The process-wide registry of built-in parsers.
///
/// Built on first use and never mutated afterwards.
pub fn default_parser_registry() -> Arc<ParserRegistry> {
    Arc::clone(&DEFAULT_PARSER_REGISTRY)
}
