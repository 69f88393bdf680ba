//! Handler adapter for documents nested inside another document.

use super::{Attributes, ContentHandler};
use crate::Result;

/// Elements that frame a document and are dropped from embedded output.
const ENVELOPE_ELEMENTS: &[&str] = &["html", "body"];

/// Forwards an embedded document's events into its parent's handler.
///
/// `start_document`, `end_document` and the child's `html`/`body` envelope are
/// swallowed so the child becomes part of the parent's single logical document.
pub struct EmbeddedContentHandler<'h> {
    inner: &'h mut dyn ContentHandler,
}

impl<'h> EmbeddedContentHandler<'h> {
    pub fn new(inner: &'h mut dyn ContentHandler) -> Self {
        Self { inner }
    }
}

impl ContentHandler for EmbeddedContentHandler<'_> {
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_element(&mut self, name: &str, attributes: Attributes<'_>) -> Result<()> {
        if ENVELOPE_ELEMENTS.contains(&name) {
            return Ok(());
        }
        self.inner.start_element(name, attributes)
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        if ENVELOPE_ELEMENTS.contains(&name) {
            return Ok(());
        }
        self.inner.end_element(name)
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.inner.characters(text)
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.inner.ignorable_whitespace(text)
    }
}
