//! Flat-text serialization of the content event stream.

use super::{Attributes, ContentHandler};
use crate::core::config::TransformConfig;
use crate::{DoctextError, Result};
use std::io::Write;

/// Writes every text and whitespace run verbatim to a caller-owned sink.
///
/// Element boundaries produce no output: no markup, no indentation. The sink is
/// flushed at `end_document` but never closed; its lifetime belongs to the
/// caller. Any sink failure surfaces as [`DoctextError::TransformIo`].
///
/// # Example
///
/// ```rust
/// use doctext::content::{ContentHandler, TextTransform};
///
/// let mut out = Vec::new();
/// let mut transform = TextTransform::new(&mut out);
/// transform.start_document().unwrap();
/// transform.start_element("p", &[]).unwrap();
/// transform.characters("Hello").unwrap();
/// transform.end_element("p").unwrap();
/// transform.ignorable_whitespace("\n").unwrap();
/// transform.end_document().unwrap();
///
/// assert_eq!(String::from_utf8(out).unwrap(), "Hello\n");
/// ```
pub struct TextTransform<'w, W: Write + ?Sized> {
    sink: &'w mut W,
    bytes_written: u64,
}

impl<'w, W: Write + ?Sized> TextTransform<'w, W> {
    pub fn new(sink: &'w mut W) -> Self {
        Self { sink, bytes_written: 0 }
    }

    /// Build a transform after checking `config` describes flat, unindented text.
    pub fn with_config(sink: &'w mut W, config: &TransformConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(sink))
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.sink.write_all(text.as_bytes()).map_err(DoctextError::TransformIo)?;
        self.bytes_written += text.len() as u64;
        Ok(())
    }
}

impl<W: Write + ?Sized> ContentHandler for TextTransform<'_, W> {
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.sink.flush().map_err(DoctextError::TransformIo)
    }

    fn start_element(&mut self, _name: &str, _attributes: Attributes<'_>) -> Result<()> {
        Ok(())
    }

    fn end_element(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.write(text)
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.write(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FlushCounter {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for FlushCounter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_elements_produce_no_markup() {
        let mut out = Vec::new();
        let mut transform = TextTransform::new(&mut out);
        transform.start_document().unwrap();
        transform.start_element("div", &[("class", "page")]).unwrap();
        transform.start_element("p", &[]).unwrap();
        transform.characters("A Simple ").unwrap();
        transform.characters("PDF File").unwrap();
        transform.end_element("p").unwrap();
        transform.end_element("div").unwrap();
        transform.end_document().unwrap();

        assert_eq!(transform.bytes_written(), 17);
        assert_eq!(String::from_utf8(out).unwrap(), "A Simple PDF File");
    }

    #[test]
    fn test_whitespace_written_verbatim() {
        let mut out = Vec::new();
        let mut transform = TextTransform::new(&mut out);
        transform.characters("a").unwrap();
        transform.ignorable_whitespace("\n\t ").unwrap();
        transform.characters("b").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\n\t b");
    }

    #[test]
    fn test_end_document_flushes() {
        let mut sink = FlushCounter { data: Vec::new(), flushes: 0 };
        {
            let mut transform = TextTransform::new(&mut sink);
            transform.characters("x").unwrap();
            transform.end_document().unwrap();
        }
        assert_eq!(sink.flushes, 1);
        assert_eq!(sink.data, b"x");
    }

    #[test]
    fn test_sink_failure_is_transform_io() {
        let mut sink = FailingSink;
        let mut transform = TextTransform::new(&mut sink);
        let err = transform.characters("text").unwrap_err();
        assert!(matches!(err, DoctextError::TransformIo(_)));
    }

    #[test]
    fn test_with_config_rejects_indent() {
        let mut out = Vec::new();
        let config = TransformConfig {
            indent: true,
            ..Default::default()
        };
        assert!(TextTransform::with_config(&mut out, &config).is_err());
    }
}
