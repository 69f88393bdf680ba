//! Document metadata store.
//!
//! [`Metadata`] is an insertion-ordered map from string key to one or more
//! string values. A fresh instance is created for every extraction; the input
//! source factory may seed it with hints, parsers and the dispatcher write into
//! it during parsing, and ownership passes to the caller once extraction
//! completes.
//!
//! Keys are opaque to the pipeline. Well-known names live in [`keys`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Well-known metadata key names.
pub mod keys {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const RESOURCE_NAME: &str = "resourceName";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    /// Multi-valued. Every parser that touched the document, outermost first.
    pub const PARSED_BY: &str = "X-Parsed-By";

    pub const TITLE: &str = "dc:title";
    pub const CREATOR: &str = "dc:creator";
    pub const SUBJECT: &str = "dc:subject";
    pub const DESCRIPTION: &str = "dc:description";
    pub const KEYWORDS: &str = "meta:keyword";
    pub const CREATED: &str = "dcterms:created";
    pub const MODIFIED: &str = "dcterms:modified";
    pub const LAST_AUTHOR: &str = "meta:last-author";

    pub const PAGE_COUNT: &str = "xmpTPg:NPages";
    pub const SLIDE_COUNT: &str = "meta:slide-count";
    pub const PRODUCER: &str = "pdf:producer";

    pub const IMAGE_WIDTH: &str = "tiff:ImageWidth";
    pub const IMAGE_LENGTH: &str = "tiff:ImageLength";

    /// Multi-valued. One entry per embedded document that failed to parse.
    pub const EMBEDDED_EXCEPTION: &str = "X-Embedded-Exception";
}

/// Ordered, multi-valued key/value metadata.
///
/// Serializes as a JSON object mapping each key to its list of values.
///
/// # Example
///
/// ```rust
/// use doctext::Metadata;
///
/// let mut metadata = Metadata::new();
/// metadata.set("Content-Type", "application/pdf");
/// metadata.add("X-Parsed-By", "auto-detect-parser");
/// metadata.add("X-Parsed-By", "pdf-parser");
///
/// assert_eq!(metadata.get("Content-Type"), Some("application/pdf"));
/// assert_eq!(metadata.get_all("X-Parsed-By").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: IndexMap<String, Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of `key`, empty when the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, returning its values. Remaining keys keep their order.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
