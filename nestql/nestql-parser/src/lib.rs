//! # nestql-parser
//!
//! Lexing and parsing for the NestQL selection query language: a compact,
//! GraphQL-shaped syntax describing hierarchical selections across relational
//! tables.
//!
//! ```text
//! user(id: 4){
//!   name,
//!   age(range: 18..30),
//!   photos(with: [user_id id]){
//!     url,
//!   },
//! }
//! ```
//!
//! The surface syntax is tokenized by a rune-level [lexer::Scanner] with
//! bounded token rewind, and parsed into a [Graph] of [SelectionNode]s. Node
//! and field arguments are resolved through a pluggable [InspectorSet] into
//! typed [Collector]s; the companion `nestql` crate compiles the graph into a
//! flat SQL SELECT and re-assembles the result rows.

pub mod chunk;
pub mod collector;
pub mod error;
pub mod inspect;
pub mod lexer;
pub mod parser;
pub mod span;
mod utils;

pub use chunk::{chunk_source, scan_chunks};
pub use collector::{Collector, CollectorMap};
pub use error::{Annotate, Error, Reason};
pub use inspect::{add_default_inspections, default_inspectors, Inspector, InspectorSet};
pub use parser::gr::{Graph, NodeId, NodeKind, SelectionNode};
pub use parser::Parser;
pub use span::Span;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Parses a single query into its selection graph using the default
/// inspectors.
pub fn parse_source(source: &str) -> Result<Graph> {
    Parser::default().scan(source.as_bytes())
}
