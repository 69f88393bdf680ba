//! Content parser plugin trait.

use crate::content::ContentHandler;
use crate::core::io::DocumentStream;
use crate::metadata::Metadata;
use crate::plugins::{ParseContext, Plugin};
use crate::Result;

/// Parses one document format into content events and metadata.
///
/// A parser is registered for the MIME types it understands. When several
/// parsers share a type, they are tried in descending [`priority`](Self::priority)
/// and the first whose [`can_handle`](Self::can_handle) returns `true` is used.
///
/// # Example
///
/// ```rust
/// use doctext::content::{ContentHandler, XhtmlEmitter};
/// use doctext::core::io::DocumentStream;
/// use doctext::plugins::{ContentParser, ParseContext, Plugin};
/// use doctext::{Metadata, Result};
/// use std::io::Read;
///
/// struct ShoutParser;
///
/// impl Plugin for ShoutParser {
///     fn name(&self) -> &str { "shout-parser" }
///     fn version(&self) -> String { "1.0.0".to_string() }
///     fn initialize(&self) -> Result<()> { Ok(()) }
///     fn shutdown(&self) -> Result<()> { Ok(()) }
/// }
///
/// impl ContentParser for ShoutParser {
///     fn supported_mime_types(&self) -> &[&str] {
///         &["text/x-shout"]
///     }
///
///     fn parse(
///         &self,
///         input: &mut DocumentStream<'_>,
///         handler: &mut dyn ContentHandler,
///         _metadata: &mut Metadata,
///         _context: &ParseContext,
///     ) -> Result<()> {
///         let mut text = String::new();
///         input.read_to_string(&mut text)?;
///
///         let mut xhtml = XhtmlEmitter::new(handler);
///         xhtml.start_document()?;
///         xhtml.element("p", &text.to_uppercase())?;
///         xhtml.end_document()
///     }
/// }
/// ```
pub trait ContentParser: Plugin {
    /// MIME types this parser is registered under.
    ///
    /// Entries ending in `/*` (e.g. `image/*`) match every subtype, at lower
    /// precedence than exact registrations.
    fn supported_mime_types(&self) -> &[&str];

    /// Parser priority; higher wins among parsers for the same type.
    ///
    /// Defaults to 50.
    fn priority(&self) -> i32 {
        50
    }

    /// Claim or decline an input after type-based selection.
    ///
    /// `prefix` holds the leading bytes of the input (up to the detection
    /// window) and `mime_type` is the type the parser was selected for.
    fn can_handle(&self, _prefix: &[u8], _mime_type: &str) -> bool {
        true
    }

    /// Parse `input`, pushing content events into `handler` and writing
    /// document properties into `metadata`.
    ///
    /// # Errors
    ///
    /// - `DoctextError::MalformedInput` when the bytes violate the format
    /// - `DoctextError::Io` when reading the input fails
    /// - Any error returned by `handler`, unchanged
    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        context: &ParseContext,
    ) -> Result<()>;
}
