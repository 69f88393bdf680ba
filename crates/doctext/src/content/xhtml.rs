//! Structured event emitter used by parsers.

use super::{Attributes, ContentHandler};
use crate::Result;

/// Elements after whose end a newline is emitted.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "dd", "dt", "dl", "tr", "table",
    "thead", "tbody", "blockquote", "pre", "title", "address",
];

fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Wraps a [`ContentHandler`] with an `html/body` envelope and block newlines.
///
/// Parsers emit structure (`p`, `div`, `h1`, ...) and let the emitter take care
/// of separating blocks. After every block-level end tag a `"\n"` is sent as
/// ignorable whitespace, so a flat-text consumer keeps paragraph breaks
/// without understanding any markup.
pub struct XhtmlEmitter<'h> {
    handler: &'h mut dyn ContentHandler,
    open_elements: Vec<String>,
}

impl<'h> XhtmlEmitter<'h> {
    pub fn new(handler: &'h mut dyn ContentHandler) -> Self {
        Self {
            handler,
            open_elements: Vec::new(),
        }
    }

    /// Start the document and open `html` and `body`.
    pub fn start_document(&mut self) -> Result<()> {
        self.handler.start_document()?;
        self.start_element("html")?;
        self.start_element("body")
    }

    /// Close every element still open, then end the document.
    pub fn end_document(&mut self) -> Result<()> {
        while let Some(name) = self.open_elements.last().cloned() {
            self.end_element(&name)?;
        }
        self.handler.end_document()
    }

    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.start_element_with(name, &[])
    }

    pub fn start_element_with(&mut self, name: &str, attributes: Attributes<'_>) -> Result<()> {
        self.handler.start_element(name, attributes)?;
        self.open_elements.push(name.to_string());
        Ok(())
    }

    pub fn end_element(&mut self, name: &str) -> Result<()> {
        if let Some(pos) = self.open_elements.iter().rposition(|open| open == name) {
            self.open_elements.truncate(pos);
        }
        self.handler.end_element(name)?;
        if is_block(name) {
            self.new_line()?;
        }
        Ok(())
    }

    pub fn characters(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.handler.characters(text)
    }

    /// Emit `<name>text</name>`.
    pub fn element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start_element(name)?;
        self.characters(text)?;
        self.end_element(name)
    }

    pub fn new_line(&mut self) -> Result<()> {
        self.handler.ignorable_whitespace("\n")
    }

    /// The wrapped handler, for handing to embedded document parsers.
    pub fn handler(&mut self) -> &mut dyn ContentHandler {
        &mut *self.handler
    }
}
