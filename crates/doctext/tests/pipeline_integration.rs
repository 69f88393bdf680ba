//! Pipeline-level behaviour: resource release, error normalization, type
//! hints, custom registries and configuration.

mod helpers;

use doctext::content::{ContentHandler, XhtmlEmitter};
use doctext::core::io::DocumentStream;
use doctext::metadata::keys;
use doctext::plugins::{ContentParser, ParseContext, ParserRegistry, Plugin};
use doctext::{DoctextError, ExtractionConfig, ExtractionPhase, HintPolicy, Metadata, StreamTextExtractor};
use helpers::TrackedReader;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

fn extract_tracked(extractor: &StreamTextExtractor, bytes: Vec<u8>) -> (Result<Metadata, doctext::TextExtractionError>, usize) {
    let drops = Arc::new(AtomicUsize::new(0));
    let reader_drops = Arc::clone(&drops);
    let mut output = Vec::new();
    let result = extractor.extract(move |_| Ok(TrackedReader::new(bytes, reader_drops)), &mut output);
    (result, drops.load(Ordering::SeqCst))
}

#[test]
fn test_stream_released_once_on_success() {
    let (result, drops) = extract_tracked(&StreamTextExtractor::default(), b"released text".to_vec());
    assert!(result.is_ok());
    assert_eq!(drops, 1);
}

#[test]
fn test_stream_released_once_on_unsupported_input() {
    let (result, drops) = extract_tracked(&StreamTextExtractor::default(), vec![0x00, 0x01, 0x02, 0x03]);
    assert_eq!(result.unwrap_err().phase(), ExtractionPhase::Parsing);
    assert_eq!(drops, 1);
}

#[cfg(feature = "pdf")]
#[test]
fn test_stream_released_once_on_malformed_input() {
    let (result, drops) = extract_tracked(&StreamTextExtractor::default(), b"%PDF-1.7\ncut short".to_vec());
    let err = result.unwrap_err();
    assert_eq!(err.phase(), ExtractionPhase::Parsing);
    assert!(matches!(err.cause(), DoctextError::MalformedInput { .. }));
    assert_eq!(drops, 1);
}

#[test]
fn test_stream_released_once_on_sink_failure() {
    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let reader_drops = Arc::clone(&drops);
    let err = StreamTextExtractor::default()
        .extract(move |_| Ok(TrackedReader::new(b"text".to_vec(), reader_drops)), &mut ClosedSink)
        .unwrap_err();

    assert_eq!(err.phase(), ExtractionPhase::Transform);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failures_share_one_error_type() {
    let extractor = StreamTextExtractor::default();
    let mut output = Vec::new();

    let acquisition = extractor
        .extract(|_| Err::<&'static [u8], _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied")), &mut output)
        .unwrap_err();
    let parsing = extractor.extract(|_| Ok(&b"\x00\xFF\x00"[..]), &mut output).unwrap_err();

    for err in [&acquisition, &parsing] {
        assert_eq!(err.to_string(), "Extraction failed");
        assert!(std::error::Error::source(err).is_some());
    }
    assert_eq!(acquisition.phase(), ExtractionPhase::Acquisition);
    assert_eq!(parsing.phase(), ExtractionPhase::Parsing);
}

#[test]
fn test_repeated_failure_is_stable() {
    let extractor = StreamTextExtractor::default();
    let first = extractor.extract_bytes(&[0x00, 0x9F, 0x00], None).unwrap_err();
    let second = extractor.extract_bytes(&[0x00, 0x9F, 0x00], None).unwrap_err();

    assert_eq!(first.phase(), second.phase());
    assert_eq!(first.cause().to_string(), second.cause().to_string());
}

#[cfg(feature = "pdf")]
#[test]
fn test_content_outranks_contradicting_name() {
    let bytes = helpers::build_pdf(&["Named wrongly"]);
    let result = doctext::extract_bytes(&bytes, Some("notes.txt")).unwrap();

    assert_eq!(result.metadata.get(keys::CONTENT_TYPE), Some("application/pdf"));
    assert!(result.text.contains("Named wrongly"));
}

#[test]
fn test_name_refines_text_type() {
    let result = doctext::extract_bytes(b"a,b\n1,2\n", Some("table.csv")).unwrap();

    assert_eq!(result.metadata.get(keys::CONTENT_TYPE), Some("text/csv"));
    assert_eq!(result.metadata.get_all(keys::PARSED_BY).last().map(String::as_str), Some("plain-text-parser"));
    assert!(result.text.contains("1,2"));
}

#[test]
fn test_declared_type_recorded_by_factory() {
    let mut output = Vec::new();
    let metadata = StreamTextExtractor::default()
        .extract(
            |metadata| {
                metadata.set(keys::CONTENT_TYPE, "text/csv; charset=utf-8");
                Ok(&b"x,y"[..])
            },
            &mut output,
        )
        .unwrap();

    assert_eq!(metadata.get(keys::CONTENT_TYPE), Some("text/csv"));
}

#[cfg(feature = "pdf")]
#[test]
fn test_override_policy_trusts_hint() {
    let config = ExtractionConfig {
        detection: doctext::core::DetectionConfig {
            hint_policy: HintPolicy::Override,
            ..Default::default()
        },
        ..Default::default()
    };
    let extractor = StreamTextExtractor::new(config).unwrap();
    let err = extractor.extract_bytes(b"just text", Some("fake.pdf")).unwrap_err();

    assert_eq!(err.phase(), ExtractionPhase::Parsing);
    assert!(matches!(err.cause(), DoctextError::MalformedInput { .. }));
}

struct ShoutParser;

impl Plugin for ShoutParser {
    fn name(&self) -> &str {
        "shout-parser"
    }
    fn version(&self) -> String {
        "1.0.0".to_string()
    }
    fn initialize(&self) -> doctext::Result<()> {
        Ok(())
    }
    fn shutdown(&self) -> doctext::Result<()> {
        Ok(())
    }
}

impl ContentParser for ShoutParser {
    fn supported_mime_types(&self) -> &[&str] {
        &["text/plain"]
    }

    fn parse(
        &self,
        input: &mut DocumentStream<'_>,
        handler: &mut dyn ContentHandler,
        _metadata: &mut Metadata,
        _context: &ParseContext,
    ) -> doctext::Result<()> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        let mut xhtml = XhtmlEmitter::new(handler);
        xhtml.start_document()?;
        xhtml.element("p", &text.to_uppercase())?;
        xhtml.end_document()
    }
}

#[test]
fn test_custom_registry() {
    let mut registry = ParserRegistry::new();
    registry.register(Arc::new(ShoutParser)).unwrap();
    let extractor = StreamTextExtractor::with_registry(Arc::new(registry), ExtractionConfig::default()).unwrap();

    let result = extractor.extract_bytes(b"quiet words", None).unwrap();
    assert_eq!(result.text.trim(), "QUIET WORDS");
    assert_eq!(result.metadata.get_all(keys::PARSED_BY).last().map(String::as_str), Some("shout-parser"));

    #[cfg(feature = "pdf")]
    {
        let err = extractor.extract_bytes(&helpers::build_pdf(&["x"]), None).unwrap_err();
        assert!(matches!(err.cause(), DoctextError::UnsupportedFormat(_)));
    }
}

#[cfg(feature = "archives")]
#[test]
fn test_dispatcher_found_only_under_parser_capability() {
    use doctext::AutoDetectParser;
    use doctext::content::TextTransform;
    use doctext::parsers::ZipParser;

    let bytes = helpers::build_zip(&[("inner.txt", "entry text".as_bytes())]);

    let run = |context: &ParseContext| {
        let mut output = Vec::new();
        let mut transform = TextTransform::new(&mut output);
        let mut input = DocumentStream::from_bytes(&bytes);
        ZipParser::new()
            .parse(&mut input, &mut transform, &mut Metadata::new(), context)
            .unwrap();
        drop(transform);
        String::from_utf8(output).unwrap()
    };

    let mut concrete = ParseContext::new(Arc::new(ExtractionConfig::default()));
    concrete.set::<AutoDetectParser>(Arc::new(AutoDetectParser::default()));
    assert!(!run(&concrete).contains("entry text"));

    let mut capability = ParseContext::new(Arc::new(ExtractionConfig::default()));
    capability.set::<dyn ContentParser>(Arc::new(AutoDetectParser::default()));
    assert!(run(&capability).contains("entry text"));
}

#[test]
fn test_shared_extractor_across_threads() {
    let extractor = StreamTextExtractor::default();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let extractor = &extractor;
                scope.spawn(move || extractor.extract_bytes(format!("thread {}", i).as_bytes(), None))
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap().unwrap();
            assert_eq!(result.text.trim(), format!("thread {}", i));
        }
    });
}

#[test]
fn test_config_file_loading() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("doctext.toml");
    std::fs::write(
        &path,
        "max_concurrent_extractions = 4\n\n[detection]\nhint_policy = \"ignore\"\nwindow_size = 4096\n",
    )?;

    let config = ExtractionConfig::from_file(&path)?;
    assert_eq!(config.detection.hint_policy, HintPolicy::Ignore);
    assert_eq!(config.detection.window_size, 4096);
    assert_eq!(config.max_concurrent_extractions, Some(4));

    let discovered = ExtractionConfig::discover_from(dir.path())?;
    assert_eq!(discovered, Some(config));
    Ok(())
}

/// Collects the message of every event it sees.
struct MessageCollector {
    messages: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for MessageCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            self.messages.lock().unwrap().push(message);
        }
    }
}

fn count(messages: &[String], wanted: &str) -> usize {
    messages.iter().filter(|m| m.as_str() == wanted).count()
}

#[test]
fn test_stream_lifecycle_is_logged() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(MessageCollector {
        messages: Arc::clone(&messages),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let extractor = StreamTextExtractor::default();
    extractor.extract_bytes(b"logged text", Some("log.txt")).unwrap();
    assert!(extractor.extract_bytes(&[0x00, 0x9F, 0x92, 0x96, 0x00], None).is_err());

    let messages = messages.lock().unwrap();
    assert_eq!(count(&messages, "input stream acquired"), 2);
    assert_eq!(count(&messages, "input stream released"), 2);
    assert_eq!(count(&messages, "extraction completed"), 1);
    assert_eq!(count(&messages, "extraction failed"), 1);
}

#[test]
fn test_extract_file_records_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.txt");
    std::fs::write(&path, "file contents").unwrap();

    let result = doctext::extract_file(&path).unwrap();
    assert_eq!(result.text.trim(), "file contents");
    assert_eq!(result.metadata.get(keys::RESOURCE_NAME), Some("memo.txt"));
    assert_eq!(result.metadata.get(keys::CONTENT_LENGTH), Some("13"));
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test]
async fn test_batch_mixed_documents() {
    let items = vec![
        (b"first".to_vec(), Some("a.txt".to_string())),
        (vec![0x00, 0x01, 0x02], None),
        (b"third".to_vec(), None),
    ];
    let results = doctext::batch_extract_bytes(items).await;

    assert_eq!(results[0].as_ref().unwrap().text.trim(), "first");
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().text.trim(), "third");
}
