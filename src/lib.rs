//! # FXML Compiler
//!
//! Compiles FXML markup trees into an intermediate representation of the Java statements that build the
//! same object graph, so an application can construct its views without a runtime markup loader.
//!
//! ## Pipeline
//!
//! 1. A [`markup::Document`] (serialized as JSON by the upstream parser) is handed to
//!    [`document::DocumentCompiler`].
//! 2. The controller type is discovered and a fresh [`resolver::Resolvers`] bundle is created for the unit.
//! 3. [`node::compile_node`] walks the tree depth first, emitting [`code::Statement`]s.
//! 4. The statements are wrapped into a [`document::BuilderPlan`].
//!
//! ## Compilation Unit Invariants
//!
//! 1. **Reflection-free**: type information only ever comes from an [`introspect::Introspector`].
//! 2. **Deterministic**: the same document and metadata always yield the same plan, statement for
//!    statement and name for name.
//! 3. **Unit isolation**: resolvers, caches and the name registry are never shared between documents.
//! 4. **Fail fast**: the first error aborts the unit. No partial plan is ever produced.

pub mod bind;
pub mod binding_resolver;
pub mod cache;
pub mod code;
pub mod config;
pub mod constructor;
pub mod discovery;
pub mod document;
pub mod error;
mod events;
pub mod introspect;
pub mod markup;
pub mod method_resolver;
pub mod name_resolver;
pub mod node;
pub mod project;
mod properties;
pub mod resolver;
pub mod type_resolver;
pub mod value_resolver;

#[cfg(test)]
mod test_fixtures;

#[cfg(test)]
mod event_tests;
#[cfg(test)]
mod property_tests;

pub use code::{CodeType, CodeValue, Statement};
pub use config::CompilerConfig;
pub use document::{BuilderPlan, DocumentCompiler};
pub use error::{CompileError, Result};
pub use introspect::{ClassInfo, Introspector, JavaType, MetadataTable};
pub use markup::{ClassInstance, Document, Value};
pub use node::{compile_node, NodeCode};
pub use resolver::Resolvers;
