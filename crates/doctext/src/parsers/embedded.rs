//! Recursive parsing of documents embedded in containers.

use crate::content::{EmbeddedContentHandler, XhtmlEmitter};
use crate::core::io::DocumentStream;
use crate::metadata::{Metadata, keys};
use crate::plugins::ParseContext;
use crate::{DoctextError, Result};

/// Parse an embedded document through the parser registered in `context`.
///
/// The child's text is streamed into the parent's output inside a
/// `div class="package-entry"` headed by the entry name. The child gets its
/// own metadata, seeded with `resourceName`.
///
/// Nothing is emitted when:
/// - embedded extraction is disabled in the configuration
/// - the nesting limit is reached
/// - the context holds no parser under the `dyn ContentParser` capability
///
/// A child that fails to parse is logged and recorded in the parent's
/// `X-Embedded-Exception`; the parent carries on. Output sink failures are the
/// exception: they abort the whole extraction.
pub fn parse_embedded(
    bytes: &[u8],
    name: &str,
    xhtml: &mut XhtmlEmitter<'_>,
    parent_metadata: &mut Metadata,
    context: &ParseContext,
) -> Result<()> {
    if !context.config().extract_embedded {
        return Ok(());
    }

    if context.depth() >= context.config().max_embedded_depth {
        tracing::warn!(
            entry = name,
            depth = context.depth(),
            "embedded document nesting limit reached, skipping"
        );
        return Ok(());
    }

    let Some(parser) = context.parser() else {
        tracing::debug!(entry = name, "no parser capability in context, embedded document skipped");
        return Ok(());
    };

    tracing::trace!(entry = name, size = bytes.len(), depth = context.depth() + 1, "parsing embedded document");

    let mut child_metadata = Metadata::new();
    child_metadata.set(keys::RESOURCE_NAME, name);
    let child_context = context.nested();
    let mut input = DocumentStream::from_bytes(bytes);

    xhtml.start_element_with("div", &[("class", "package-entry")])?;
    xhtml.element("h1", name)?;

    let result = {
        let mut embedded = EmbeddedContentHandler::new(xhtml.handler());
        parser.parse(&mut input, &mut embedded, &mut child_metadata, &child_context)
    };

    match result {
        Ok(()) => {}
        Err(e @ DoctextError::TransformIo(_)) => return Err(e),
        Err(e) => {
            tracing::warn!(entry = name, error = %e, "failed to parse embedded document");
            parent_metadata.add(keys::EMBEDDED_EXCEPTION, format!("{}: {}", name, e));
        }
    }

    xhtml.end_element("div")
}
