//! Base plugin trait definition.
//!
//! All plugins must implement the `Plugin` trait, which provides basic lifecycle
//! management and metadata methods.

use crate::Result;

/// Base trait that all plugins must implement.
///
/// # Thread Safety
///
/// All plugins must be `Send + Sync`; the same instance is shared by every
/// extraction running in the process.
///
/// # Example
///
/// ```rust
/// use doctext::plugins::Plugin;
/// use doctext::Result;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct MyPlugin {
///     initialized: AtomicBool,
/// }
///
/// impl Plugin for MyPlugin {
///     fn name(&self) -> &str {
///         "my-plugin"
///     }
///
///     fn version(&self) -> String {
///         "1.0.0".to_string()
///     }
///
///     fn initialize(&self) -> Result<()> {
///         self.initialized.store(true, Ordering::Release);
///         Ok(())
///     }
///
///     fn shutdown(&self) -> Result<()> {
///         self.initialized.store(false, Ordering::Release);
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Returns the unique name/identifier for this plugin.
    ///
    /// The name should be:
    /// - Unique across all plugins
    /// - Lowercase with hyphens (e.g., "pdf-parser")
    /// - Free of whitespace (registration rejects it otherwise)
    ///
    /// The name is what registries key on and what ends up in `X-Parsed-By`.
    fn name(&self) -> &str;

    /// Returns the semantic version of this plugin.
    fn version(&self) -> String;

    /// Initialize the plugin.
    ///
    /// Called once when the plugin is registered. This method takes `&self`
    /// to work with `Arc<dyn Plugin>`; plugins needing mutable state use
    /// interior mutability.
    ///
    /// # Errors
    ///
    /// The plugin is not registered if this method returns an error.
    fn initialize(&self) -> Result<()>;

    /// Shutdown the plugin.
    ///
    /// Called when the plugin is removed from its registry.
    fn shutdown(&self) -> Result<()>;

    /// Optional plugin description for debugging and logging.
    fn description(&self) -> &str {
        ""
    }

    /// Optional plugin author information.
    fn author(&self) -> &str {
        ""
    }
}
