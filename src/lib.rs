//! Cross-module analysis context and type-inference core for a Lua-like
//! scripting language.
//!
//! Three stages, run in order for a batch of modules:
//!
//! 1. [`AnalysisContext`] ingests each module's parsed `ast::Chunk`,
//!    interning table/function literals, resolving lexical scope, and
//!    recognizing the class idioms under [`patterns`].
//! 2. [`resolver::Resolver`] walks the interned expression graph to
//!    `TypeSet`s, memoized and cycle-safe.
//! 3. [`finalizer::Finalizer`] drives the resolver over every ingested
//!    module and collapses the result into the public [`analyzed_module`]
//!    tree, the only part of this crate an emitter needs to see.
//!
//! ```ignore
//! let mut ctx = AnalysisContext::new(AnalysisConfig::default());
//! ctx.ingest_module("a/b", &chunk)?;
//! let (modules, diagnostics) = ctx.finalize();
//! ```

pub mod alias;
pub mod analyzed_module;
pub mod ast;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod finalizer;
pub mod function_info;
pub mod heuristics;
pub mod ids;
pub mod patterns;
pub mod resolved_module;
pub mod resolver;
pub mod scope;
pub mod table_info;
pub mod types;
pub mod usage;

pub use analyzed_module::AnalyzedModule;
pub use config::AnalysisConfig;
pub use context::{AnalysisContext, AnalysisContextParts};
pub use error::AnalysisError;
pub use finalizer::Finalizer;
