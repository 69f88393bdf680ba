//! Type-detecting parser dispatcher.

use crate::content::ContentHandler;
use crate::core::io::DocumentStream;
use crate::core::mime::{self, OCTET_STREAM_MIME_TYPE};
use crate::metadata::{Metadata, keys};
use crate::plugins::registry::default_parser_registry;
use crate::plugins::{ContentParser, ParseContext, ParserRegistry, Plugin};
use crate::{DoctextError, Result};
use std::sync::Arc;

/// Parser that detects the input type and delegates to a registered parser.
///
/// Selection walks the detected type and its supertypes (`text/csv`, then
/// `text/plain`); for each type the registered candidates are asked in order
/// whether they claim the input. Before delegating, `Content-Type` is set to
/// the detected type and both this dispatcher and the chosen parser are
/// appended to `X-Parsed-By`.
///
/// The dispatcher is itself a [`ContentParser`], so it can be placed in a
/// [`ParseContext`] under the parser capability and reached again by container
/// formats for their embedded documents.
pub struct AutoDetectParser {
    registry: Arc<ParserRegistry>,
}

impl AutoDetectParser {
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    /// Pick the parser for `mime_type`, falling back along the type hierarchy.
    fn select(&self, mime_type: &str, prefix: &[u8]) -> Result<Arc<dyn ContentParser>> {
        for candidate_type in mime::type_ancestry(mime_type) {
            if candidate_type == OCTET_STREAM_MIME_TYPE {
                break;
            }
            for parser in self.registry.candidates(&candidate_type) {
                if parser.can_handle(prefix, &candidate_type) {
                    if candidate_type != mime_type {
                        tracing::debug!(
                            mime_type,
                            fallback = %candidate_type,
                            "no parser for detected type, using supertype"
                        );
                    }
                    return Ok(parser);
                }
                tracing::trace!(parser = parser.name(), mime_type = %candidate_type, "parser declined input");
            }
        }

        Err(DoctextError::UnsupportedFormat(mime_type.to_string()))
    }
}

impl Default for AutoDetectParser {
    fn default() -> Self {
        Self::new(default_parser_registry())
    }
}

impl Plugin for AutoDetectParser {
    fn name(&self) -> &str {
        "auto-detect-parser"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Detects the document type from its bytes and delegates to the matching parser"
    }
}

impl ContentParser for AutoDetectParser {
    fn supported_mime_types(&self) -> &[&str] {
        &[]
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        metadata: &mut Metadata,
        context: &ParseContext,
    ) -> Result<()> {
        let detection = mime::detect(input, metadata, &context.config().detection)?;
        let prefix = input.peek(context.config().detection.window_size)?;
        let parser = self.select(&detection.mime_type, prefix)?;

        tracing::debug!(
            mime_type = %detection.mime_type,
            parser = parser.name(),
            depth = context.depth(),
            "dispatching document"
        );

        metadata.set(keys::CONTENT_TYPE, detection.mime_type);
        metadata.add(keys::PARSED_BY, self.name());
        metadata.add(keys::PARSED_BY, parser.name());

        parser.parse(input, handler, metadata, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::RecordingHandler;
    use crate::content::XhtmlEmitter;
    use std::io::Read;

    struct UpperParser {
        name: &'static str,
        mime_types: &'static [&'static str],
        claims: bool,
    }

    impl Plugin for UpperParser {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> String {
            "1.0.0".to_string()
        }
        fn initialize(&self) -> Result<()> {
            Ok(())
        }
        fn shutdown(&self) -> Result<()> {
            Ok(())
        }
    }

    impl ContentParser for UpperParser {
        fn supported_mime_types(&self) -> &[&str] {
            self.mime_types
        }

        fn can_handle(&self, _prefix: &[u8], _mime_type: &str) -> bool {
            self.claims
        }

        fn parse(
            &self,
            input: &mut DocumentStream<'_>,
            handler: &mut dyn ContentHandler,
            _metadata: &mut Metadata,
            _context: &ParseContext,
        ) -> Result<()> {
            let mut text = String::new();
            input.read_to_string(&mut text)?;
            let mut xhtml = XhtmlEmitter::new(handler);
            xhtml.start_document()?;
            xhtml.element("p", &text.to_uppercase())?;
            xhtml.end_document()
        }
    }

    fn dispatcher(parsers: Vec<UpperParser>) -> AutoDetectParser {
        let mut registry = ParserRegistry::new();
        for parser in parsers {
            registry.register(Arc::new(parser)).unwrap();
        }
        AutoDetectParser::new(Arc::new(registry))
    }

    #[test]
    fn test_dispatch_sets_metadata() {
        let parser = dispatcher(vec![UpperParser {
            name: "upper",
            mime_types: &["text/plain"],
            claims: true,
        }]);
        let mut handler = RecordingHandler::default();
        let mut metadata = Metadata::new();
        let mut input = DocumentStream::from_bytes(b"hello");

        parser
            .parse(&mut input, &mut handler, &mut metadata, &ParseContext::default())
            .unwrap();

        assert_eq!(handler.text(), "HELLO\n");
        assert_eq!(metadata.get(keys::CONTENT_TYPE), Some("text/plain"));
        assert_eq!(
            metadata.get_all(keys::PARSED_BY),
            &["auto-detect-parser".to_string(), "upper".to_string()]
        );
    }

    #[test]
    fn test_supertype_fallback() {
        let parser = dispatcher(vec![UpperParser {
            name: "upper",
            mime_types: &["text/plain"],
            claims: true,
        }]);
        let mut metadata = Metadata::new();
        metadata.set(keys::RESOURCE_NAME, "table.csv");
        let mut input = DocumentStream::from_bytes(b"a,b\n");

        parser
            .parse(&mut input, &mut RecordingHandler::default(), &mut metadata, &ParseContext::default())
            .unwrap();
        assert_eq!(metadata.get(keys::CONTENT_TYPE), Some("text/csv"));
    }

    #[test]
    fn test_declining_parser_skipped() {
        let parser = dispatcher(vec![
            UpperParser {
                name: "picky",
                mime_types: &["text/plain"],
                claims: false,
            },
            UpperParser {
                name: "easygoing",
                mime_types: &["text/plain"],
                claims: true,
            },
        ]);
        let mut metadata = Metadata::new();
        let mut input = DocumentStream::from_bytes(b"x");

        parser
            .parse(&mut input, &mut RecordingHandler::default(), &mut metadata, &ParseContext::default())
            .unwrap();
        assert_eq!(metadata.get_all(keys::PARSED_BY)[1], "easygoing");
    }

    #[test]
    fn test_unsupported_format() {
        let parser = dispatcher(vec![UpperParser {
            name: "upper",
            mime_types: &["text/plain"],
            claims: true,
        }]);
        let mut metadata = Metadata::new();
        let mut input = DocumentStream::from_bytes(b"%PDF-1.4\n");

        let err = parser
            .parse(&mut input, &mut RecordingHandler::default(), &mut metadata, &ParseContext::default())
            .unwrap_err();
        assert!(matches!(err, DoctextError::UnsupportedFormat(ref m) if m == "application/pdf"));
        assert!(!metadata.contains(keys::PARSED_BY));
    }

    #[test]
    fn test_binary_garbage_unsupported() {
        let parser = dispatcher(vec![UpperParser {
            name: "upper",
            mime_types: &["text/plain"],
            claims: true,
        }]);
        let mut input = DocumentStream::from_bytes(&[0x00, 0x9F, 0x00, 0x01, 0x02]);
        let result = parser.parse(
            &mut input,
            &mut RecordingHandler::default(),
            &mut Metadata::new(),
            &ParseContext::default(),
        );
        assert!(matches!(result, Err(DoctextError::UnsupportedFormat(_))));
    }
}
