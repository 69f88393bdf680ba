//! Plugin system for extending doctext with custom parsers.
//!
//! # Plugin Types
//!
//! - [`Plugin`] - Base trait that all plugins must implement
//! - [`ContentParser`] - Document format parsers
//!
//! # Lifecycle Pattern
//!
//! Parsers are stored in `Arc<dyn ContentParser>` for thread-safe shared access.
//! A custom registry is built mutably and then frozen:
//!
//! ```rust
//! use doctext::plugins::{AutoDetectParser, ParserRegistry};
//! use doctext::StreamTextExtractor;
//! use std::sync::Arc;
//!
//! // 1. Start from the built-in parsers (or ParserRegistry::new())
//! let mut registry = ParserRegistry::with_defaults();
//!
//! // 2. Register custom parsers (calls initialize internally)
//! // registry.register(Arc::new(MyParser))?;
//!
//! // 3. Freeze and hand to an extractor
//! let extractor = StreamTextExtractor::with_registry(Arc::new(registry), Default::default())?;
//! # Ok::<(), doctext::DoctextError>(())
//! ```

pub mod context;
pub mod dispatch;
pub mod parser;
pub mod registry;
pub mod traits;

pub use context::ParseContext;
pub use dispatch::AutoDetectParser;
pub use parser::ContentParser;
pub use registry::{ParserRegistry, default_parser_registry};
pub use traits::Plugin;
