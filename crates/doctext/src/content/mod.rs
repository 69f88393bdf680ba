//! Content event stream.
//!
//! Parsers report document structure by pushing events into a
//! [`ContentHandler`]. Events arrive strictly in reading order and are never
//! buffered by the pipeline; the stream lives only for the duration of one
//! parse call.
//!
//! - [`TextTransform`] serializes the stream as flat text into a writer.
//! - [`XhtmlEmitter`] is what parsers write through. It adds the document
//!   envelope and a newline after block elements.
//! - [`EmbeddedContentHandler`] forwards a child document's events into its
//!   parent's stream.

pub mod embedded;
pub mod text;
pub mod xhtml;

pub use embedded::EmbeddedContentHandler;
pub use text::TextTransform;
pub use xhtml::XhtmlEmitter;

use crate::Result;

/// Attribute list for [`ContentHandler::start_element`].
pub type Attributes<'a> = &'a [(&'a str, &'a str)];

/// Push-style consumer of structural content events.
///
/// Every method may fail; a failure aborts the parse that produced the event.
pub trait ContentHandler {
    fn start_document(&mut self) -> Result<()>;

    fn end_document(&mut self) -> Result<()>;

    fn start_element(&mut self, name: &str, attributes: Attributes<'_>) -> Result<()>;

    fn end_element(&mut self, name: &str) -> Result<()>;

    /// A run of document text.
    fn characters(&mut self, text: &str) -> Result<()>;

    /// Whitespace that carries layout rather than content.
    ///
    /// Defaults to [`characters`](Self::characters).
    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.characters(text)
    }
}

impl<H: ContentHandler + ?Sized> ContentHandler for &mut H {
    fn start_document(&mut self) -> Result<()> {
        (**self).start_document()
    }

    fn end_document(&mut self) -> Result<()> {
        (**self).end_document()
    }

    fn start_element(&mut self, name: &str, attributes: Attributes<'_>) -> Result<()> {
        (**self).start_element(name, attributes)
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        (**self).end_element(name)
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        (**self).characters(text)
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        (**self).ignorable_whitespace(text)
    }
}
