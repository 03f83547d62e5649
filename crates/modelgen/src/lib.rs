//! Typed data model generation from JSON Schema.
//!
//! `modelgen` turns a JSON Schema document into source code declaring one
//! type per object, enumeration, and definition, ready for a validation
//! library to consume.
//!
//! # Architecture
//!
//! ```text
//! Source            Graph            Model             Backends
//! ─────────    ──────────────    ─────────────    ─────────────────
//! file    ─┐
//! URL     ─┼─> SchemaGraph ─> ResolvedGraph ─> Model ─┬─> Pydantic (Python)
//! stdin   ─┘   (node.rs)      (resolve.rs)  (ir.rs)   └─> serde structs (Rust)
//! ```
//!
//! Every stage either succeeds completely or returns an [`Error`] naming the
//! offending schema location. Output is written only after the whole model
//! rendered, and written atomically.
//!
//! # Example
//!
//! ```
//! use modelgen::{Dialect, GeneratorOptions, PYDANTIC_BACKEND, generate_str};
//!
//! let schema = r#"{
//!     "title": "User",
//!     "type": "object",
//!     "properties": { "id": { "type": "string" } },
//!     "required": ["id"]
//! }"#;
//!
//! let code = generate_str(schema, Dialect::Auto, &GeneratorOptions::default(), &PYDANTIC_BACKEND)
//!     .unwrap();
//! assert!(code.contains("class Model(BaseModel):"));
//! assert!(code.contains("    id: str\n"));
//! ```
//!
//! # Feature Flags
//!
//! - `backend-pydantic` - Pydantic v2 models
//! - `backend-rust` - Rust structs with serde
//! - `clap` - derive `clap::ValueEnum` on option enums
//!
//! Language umbrella flags: `pydantic`, `rust-types`.

pub mod emit;
pub mod error;
pub mod ir;
pub mod mapper;
pub mod naming;
pub mod node;
pub mod options;
pub mod output;
pub mod registry;
pub mod resolve;
pub mod source;
pub mod traits;

use std::path::Path;

pub use error::{Error, Result};
pub use ir::{
    Constraints, EnumMember, Field, GeneratedKind, GeneratedType, Model, Primitive,
    TypeDescriptor, TypeId, TypeRef,
};
pub use naming::{MemberCase, NameRegistry, NamingRules};
pub use node::{NodeId, NodeKind, SchemaGraph, SchemaNode};
pub use options::{
    CollectionStyle, DefaultStyle, EnumStyle, FieldOrder, GeneratorOptions, UnionStyle,
};
pub use resolve::{ResolvedGraph, resolve};
pub use source::{Dialect, FetchOptions, LoadOptions, SchemaSource};

// Re-export traits
pub use traits::Backend;

// Re-export registry functions
pub use registry::{backend_names, backends_for_language, get_backend, register_backend};

#[cfg(feature = "backend-pydantic")]
pub use output::{PYDANTIC_BACKEND, PydanticBackend, generate_pydantic};

#[cfg(feature = "backend-rust")]
pub use output::{RUST_BACKEND, RustBackend, generate_rust_types};

/// Resolve `graph` and map it onto types named for `backend`.
pub fn build_model(
    graph: &SchemaGraph,
    options: &GeneratorOptions,
    backend: &dyn Backend,
) -> Result<Model> {
    let resolved = resolve(graph)?;
    tracing::debug!(
        nodes = graph.len(),
        back_references = resolved.back_references(),
        "resolved references"
    );
    let model = mapper::map_model(&resolved, options, backend.naming_rules())?;
    tracing::debug!(types = model.types().len(), "mapped model");
    Ok(model)
}

/// Generate source for an already loaded schema.
pub fn generate_graph(
    graph: &SchemaGraph,
    options: &GeneratorOptions,
    backend: &dyn Backend,
) -> Result<String> {
    let model = build_model(graph, options, backend)?;
    let code = backend.render(&model, options);
    tracing::debug!(backend = backend.name(), bytes = code.len(), "rendered model");
    Ok(code)
}

/// Generate source from schema text.
pub fn generate_str(
    text: &str,
    dialect: Dialect,
    options: &GeneratorOptions,
    backend: &dyn Backend,
) -> Result<String> {
    let graph = source::load_str(text, dialect)?;
    generate_graph(&graph, options, backend)
}

/// Load `source` and generate source for it.
pub fn generate(
    source: &SchemaSource,
    load: &LoadOptions,
    options: &GeneratorOptions,
    backend: &dyn Backend,
) -> Result<String> {
    tracing::debug!(source = %source.locator(), "loading schema");
    let graph = source::load(source, load)?;
    generate_graph(&graph, options, backend)
}

/// Load `source`, generate, and write the result to `output`.
///
/// Nothing is written unless every stage succeeded; an existing file at
/// `output` is replaced in one step.
pub fn generate_to_path(
    source: &SchemaSource,
    load: &LoadOptions,
    options: &GeneratorOptions,
    backend: &dyn Backend,
    output: &Path,
) -> Result<()> {
    let code = generate(source, load, options, backend)?;
    emit::write_atomic(output, &code)
}
