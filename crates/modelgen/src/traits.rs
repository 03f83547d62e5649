//! Traits for model rendering backends.

use crate::ir::Model;
use crate::naming::NamingRules;
use crate::options::GeneratorOptions;

/// A model rendering backend.
///
/// Backends turn a mapped [`Model`] into source code for a target language.
/// The mapper consults [`Backend::naming_rules`] before rendering, so every
/// identifier a backend sees is already valid in its language.
///
/// # Implementing Custom Backends
///
/// ```ignore
/// use modelgen::{Backend, GeneratorOptions, Model, NamingRules, register_backend};
///
/// struct KotlinBackend;
///
/// impl Backend for KotlinBackend {
///     fn name(&self) -> &'static str { "kotlin" }
///     fn language(&self) -> &'static str { "kotlin" }
///     fn extension(&self) -> &'static str { "kt" }
///     fn naming_rules(&self) -> NamingRules { NamingRules::default() }
///     fn render(&self, model: &Model, options: &GeneratorOptions) -> String { /* ... */ }
/// }
///
/// // Register before first use
/// register_backend(&KotlinBackend);
/// ```
pub trait Backend: Send + Sync {
    /// Unique backend identifier (e.g., "pydantic", "rust").
    fn name(&self) -> &'static str;

    /// Target language (e.g., "python", "rust").
    fn language(&self) -> &'static str;

    /// File extension for generated code (e.g., "py", "rs").
    fn extension(&self) -> &'static str;

    /// Identifier policy of the target language.
    fn naming_rules(&self) -> NamingRules;

    /// Base every object model derives from when none is configured.
    fn default_base(&self) -> Option<&'static str> {
        None
    }

    /// Fields with defaults must follow fields without.
    fn requires_defaults_last(&self) -> bool {
        false
    }

    /// Render the whole model as one source file.
    fn render(&self, model: &Model, options: &GeneratorOptions) -> String;
}
