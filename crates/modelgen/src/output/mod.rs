//! Output backends.
//!
//! Each backend renders a [`Model`](crate::ir::Model) as source text. All
//! backends implement the [`Backend`](crate::traits::Backend) trait for
//! uniform access via the registry.

// Pydantic (Python)
#[cfg(feature = "backend-pydantic")]
pub mod pydantic;

#[cfg(feature = "backend-pydantic")]
pub use pydantic::{PYDANTIC_BACKEND, PydanticBackend, generate_pydantic};

// Rust
#[cfg(feature = "backend-rust")]
pub mod rust;

#[cfg(feature = "backend-rust")]
pub use rust::{RUST_BACKEND, RustBackend, generate_rust_types};
