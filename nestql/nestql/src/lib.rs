//! # nestql
//!
//! Compiler and runtime for NestQL, a compact GraphQL-shaped query language
//! over relational tables. Each query — an identifier with an argument list
//! and a nested selection block — compiles into one flat SQL SELECT; after
//! execution, the flat row-set is re-assembled into a nested document shaped
//! like the query.
//!
//! ```ascii
//!   query text
//!      │  (chunk + parse)          nestql_parser
//!      ▼
//!   selection graph
//!      │  (sql::compile)           operator registries
//!      ▼
//!   Statement ── execute ──▶ flat rows ── assemble ──▶ nested document
//! ```
//!
//! Compile a query to SQL:
//!
//! ```
//! # fn main() -> Result<(), nestql::ErrorMessage> {
//! let statements = nestql::compile("user(id: 4){name, age}", &nestql::Options::default())?;
//! assert_eq!(
//!     statements[0].query,
//!     "SELECT t0.name, t0.age FROM USER t0 WHERE t0.id = 4;"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Run queries end to end with an [Engine] over any [execute::DbProtocol]
//! driver (a `rusqlite` implementation ships behind the `test-dbs` feature).

#![forbid(unsafe_code)]

use anstream::adapter::strip_str;

pub use error_message::{ErrorMessage, SourceLocation};
pub use nestql_parser::{
    chunk_source, default_inspectors, parse_source, Annotate, Collector, CollectorMap, Error,
    Graph, InspectorSet, NodeId, NodeKind, Parser, Reason, SelectionNode, Span,
};
pub use sql::Statement;

pub mod assemble;
#[cfg(feature = "cli")]
pub mod cli;
mod error_message;
pub mod execute;
pub mod sql;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Options for a compile run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// How diagnostics are rendered.
    pub display: DisplayOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplayOptions {
    /// Annotated source with ANSI colors.
    #[default]
    AnsiColor,
    /// Annotated source with colors stripped.
    Plain,
}

impl Options {
    pub fn plain(mut self) -> Self {
        self.display = DisplayOptions::Plain;
        self
    }
}

/// Compiles every top-level query in `source` into a SQL statement.
pub fn compile(source: &str, options: &Options) -> Result<Vec<Statement>, ErrorMessage> {
    let chunks = chunk_source(source).map_err(|e| compose_message(e, source, options))?;
    let mut statements = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        statements.push(compile_query(chunk, options)?);
    }
    Ok(statements)
}

/// Compiles a single query into a SQL statement.
pub fn compile_query(source: &str, options: &Options) -> Result<Statement, ErrorMessage> {
    parse_source(source)
        .and_then(sql::compile)
        .map_err(|e| compose_message(e, source, options))
}

/// A query runner bound to one database connection: chunks, parses,
/// compiles, executes, and re-assembles each query of an input.
pub struct Engine<'a, P> {
    conn: P,
    inspect: &'a InspectorSet,
    templates: &'a sql::OperatorSet,
    relations: &'a sql::OperatorSet,
    options: Options,
}

impl<P: execute::DbProtocol> Engine<'static, P> {
    /// An engine over the default registries.
    pub fn new(conn: P) -> Self {
        Engine {
            conn,
            inspect: default_inspectors(),
            templates: sql::default_operators(),
            relations: sql::default_relation_operators(),
            options: Options::default(),
        }
    }
}

impl<'a, P: execute::DbProtocol> Engine<'a, P> {
    /// An engine over caller-provided registries.
    pub fn with_registries(
        conn: P,
        inspect: &'a InspectorSet,
        templates: &'a sql::OperatorSet,
        relations: &'a sql::OperatorSet,
    ) -> Self {
        Engine {
            conn,
            inspect,
            templates,
            relations,
            options: Options::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Runs every query in `source`, returning one nested document per
    /// query.
    pub fn query(&mut self, source: &str) -> Result<Vec<serde_json::Value>, ErrorMessage> {
        let chunks = chunk_source(source).map_err(|e| compose_message(e, source, &self.options))?;

        let mut trees = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let tree = self
                .run_chunk(chunk)
                .map_err(|e| compose_message(e, chunk, &self.options))?;
            trees.push(tree);
        }
        Ok(trees)
    }

    fn run_chunk(&mut self, chunk: &str) -> Result<serde_json::Value> {
        let graph = Parser::new(self.inspect).scan(chunk.as_bytes())?;
        let mut stmt = sql::compile_with(graph, self.templates, self.relations)?;
        stmt.execute(&mut self.conn)?;
        Ok(assemble::assemble(stmt))
    }

    /// Hands the connection back, consuming the engine.
    pub fn into_conn(self) -> P {
        self.conn
    }
}

pub(crate) fn compose_message(e: Error, source: &str, options: &Options) -> ErrorMessage {
    let mut message = ErrorMessage::from(e).composed(source);
    if options.display == DisplayOptions::Plain {
        message.display = message.display.take().map(|s| strip_str(&s).to_string());
    }
    message
}
