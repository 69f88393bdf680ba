//! Error types for doctext.
//!
//! Two layers of errors exist:
//!
//! - [`DoctextError`] is the internal taxonomy. Parsers, the dispatcher, the
//!   text transform and the configuration loaders all return it.
//! - [`TextExtractionError`] is the single normalized error that
//!   [`StreamTextExtractor`](crate::core::extractor::StreamTextExtractor) raises.
//!   Its message is always "Extraction failed"; the original [`DoctextError`]
//!   is preserved as its `source()`.
//!
//! Callers of the extraction entry points only ever see `TextExtractionError`
//! and inspect [`TextExtractionError::cause`] for specifics.
//!
//! # Example
//!
//! ```rust
//! use doctext::{DoctextError, TextExtractionError};
//!
//! let err = TextExtractionError::new(DoctextError::UnsupportedFormat("video/mp4".to_string()));
//! assert_eq!(err.to_string(), "Extraction failed");
//! assert!(matches!(err.cause(), DoctextError::UnsupportedFormat(_)));
//! ```
use thiserror::Error;

/// Result type alias using `DoctextError`.
pub type Result<T> = std::result::Result<T, DoctextError>;

/// Internal error taxonomy for all doctext operations.
///
/// # Variants
///
/// - `UnsupportedFormat` - No registered parser claims the input
/// - `MalformedInput` - A parser started but the bytes violate its format grammar
/// - `TransformIo` - The output sink rejected a write or flush
/// - `ResourceAcquisition` - The input source factory failed to produce a stream
/// - `Io` - Reading the input stream failed mid-parse
/// - `Validation` - Invalid configuration or plugin name
/// - `Plugin` - Plugin lifecycle failure
/// - `Other` - Catch-all for uncommon errors
#[derive(Debug, Error)]
pub enum DoctextError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed input: {message}")]
    MalformedInput {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Output sink error: {0}")]
    TransformIo(#[source] std::io::Error),

    #[error("Resource acquisition error: {message}")]
    ResourceAcquisition {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("{0}")]
    Other(String),
}

/// Pipeline phase an extraction failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    /// The input source factory could not produce a stream.
    Acquisition,
    /// Detection, dispatch or parsing failed.
    Parsing,
    /// The output sink rejected serialized text.
    Transform,
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DoctextError {
    error_constructor!(malformed_input, MalformedInput);
    error_constructor!(resource_acquisition, ResourceAcquisition);
    error_constructor!(validation, Validation);

    /// Classify this error into the pipeline phase it belongs to.
    pub fn phase(&self) -> ExtractionPhase {
        match self {
            DoctextError::ResourceAcquisition { .. } => ExtractionPhase::Acquisition,
            DoctextError::TransformIo(_) => ExtractionPhase::Transform,
            _ => ExtractionPhase::Parsing,
        }
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for DoctextError {
    fn from(err: lopdf::Error) -> Self {
        DoctextError::MalformedInput {
            message: format!("PDF structure error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(any(feature = "office", feature = "archives"))]
impl From<zip::result::ZipError> for DoctextError {
    fn from(err: zip::result::ZipError) -> Self {
        DoctextError::MalformedInput {
            message: format!("ZIP container error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "office")]
impl From<roxmltree::Error> for DoctextError {
    fn from(err: roxmltree::Error) -> Self {
        DoctextError::MalformedInput {
            message: format!("XML part error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "images")]
impl From<image::ImageError> for DoctextError {
    fn from(err: image::ImageError) -> Self {
        DoctextError::MalformedInput {
            message: format!("Image decode error: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// The single normalized error raised by the extraction entry points.
///
/// Wraps whatever went wrong in acquisition, detection, parsing or
/// serialization. The wrapped [`DoctextError`] is exposed as the error source.
#[derive(Debug, Error)]
#[error("Extraction failed")]
pub struct TextExtractionError {
    #[source]
    cause: DoctextError,
}

impl TextExtractionError {
    pub fn new(cause: DoctextError) -> Self {
        Self { cause }
    }

    /// The original failure.
    pub fn cause(&self) -> &DoctextError {
        &self.cause
    }

    pub fn into_cause(self) -> DoctextError {
        self.cause
    }

    /// Phase of the pipeline in which the original failure occurred.
    pub fn phase(&self) -> ExtractionPhase {
        self.cause.phase()
    }
}

impl From<DoctextError> for TextExtractionError {
    fn from(cause: DoctextError) -> Self {
        Self::new(cause)
    }
}
