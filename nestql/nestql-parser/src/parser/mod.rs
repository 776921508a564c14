pub mod gr;
#[cfg(test)]
mod test;

use std::io::Read;

use itertools::Itertools;

use crate::collector::Collector;
use crate::error::{Annotate, Error};
use crate::inspect::{default_inspectors, InspectorSet};
use crate::lexer::lr::{Token, TokenKind};
use crate::lexer::Scanner;
use crate::Result;
use gr::{Graph, NodeId};

/// The baseline query parser: consumes a token stream and builds a graph of
/// selection nodes, resolving argument tags through an inspector registry.
pub struct Parser<'a> {
    inspect: &'a InspectorSet,
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Parser {
            inspect: default_inspectors(),
        }
    }
}

impl<'a> Parser<'a> {
    pub fn new(inspect: &'a InspectorSet) -> Self {
        Parser { inspect }
    }

    /// Parses a single query into its selection graph.
    pub fn scan<R: Read>(&self, input: R) -> Result<Graph> {
        let mut scan = Scanner::new(input);

        let tok = scan.scan_significant();
        if tok.kind != TokenKind::Ident {
            return Err(tok.syntax_error("an identifier, eg `user(...)`", None));
        }
        log::debug!("parsing query rooted at `{}`", tok.text);

        let mut graph = Graph::new();
        let root = graph.add_root(tok.text);
        self.scan_section(root, &mut graph, &mut scan)?;
        Ok(graph)
    }

    /// One selection body: the optional argument list, then `{`, fields and
    /// nested selections until the matching `}` (or end of input).
    fn scan_section<R: Read>(
        &self,
        target: NodeId,
        graph: &mut Graph,
        scan: &mut Scanner<R>,
    ) -> Result<()> {
        let tok = scan.scan_significant();
        match tok.kind {
            TokenKind::Invalid => return Err(lexical_error(&tok)),
            TokenKind::ArgList => {
                self.scan_ident_with_query(&tok, target, graph)?;
                let nxt = scan.scan_significant();
                if nxt.kind != TokenKind::GroupStart {
                    return Err(nxt.syntax_error("`{`", Some(format!(
                        "`{}`",
                        graph.node(target).name
                    ))));
                }
            }
            TokenKind::GroupStart => {}
            _ => {
                return Err(tok.syntax_error(
                    "an argument list `(..)` or `{`",
                    Some(format!("`{}`", graph.node(target).name)),
                ))
            }
        }

        loop {
            let curtok = scan.scan_significant();
            match curtok.kind {
                TokenKind::Eof | TokenKind::GroupEnd => return Ok(()),
                TokenKind::Comma => continue,
                TokenKind::Invalid => return Err(lexical_error(&curtok)),
                TokenKind::Ident => {
                    self.scan_field(&curtok, target, graph, scan)?;
                }
                _ => {
                    return Err(curtok.syntax_error(
                        "a field, a nested selection, or `}`",
                        Some(format!("`{}`", graph.node(target).name)),
                    ));
                }
            }
        }
    }

    /// A field inside a body. Peeks ahead to decide between a nested
    /// selection (`tag(..){..}`), a field with record conditions
    /// (`tag(..)`), and a keyless field.
    fn scan_field<R: Read>(
        &self,
        curtok: &Token,
        target: NodeId,
        graph: &mut Graph,
        scan: &mut Scanner<R>,
    ) -> Result<()> {
        let nx = scan.scan_significant();
        if nx.kind == TokenKind::Invalid {
            return Err(lexical_error(&nx));
        }
        if nx.kind == TokenKind::ArgList {
            let nxx = scan.scan_significant();
            if nxx.kind == TokenKind::Invalid {
                return Err(lexical_error(&nxx));
            }
            if nxx.kind == TokenKind::GroupStart {
                // rewind both peeks so the child section re-reads its own
                // argument list; interleaved whitespace rewinds with them
                loop {
                    match scan.unread_last_token()? {
                        Some(TokenKind::ArgList) | None => break,
                        Some(_) => continue,
                    }
                }
                let child = graph.add_child(target, curtok.text.clone());
                return self.scan_section(child, graph, scan);
            }

            self.scan_attr_with_query(&curtok.text, &nx, target, graph)?;
            push_back(scan, &nxx)?;
            return Ok(());
        }

        // keyless scalar field; whatever was peeked gets re-processed
        graph.node_mut(target).records.ensure(curtok.text.clone());
        push_back(scan, &nx)?;
        Ok(())
    }

    /// A node-level argument list: bare parts become attrs, `key:value` parts
    /// go through the inspector registry. Unregistered keys degrade to a
    /// literal `is` collector instead of failing.
    fn scan_ident_with_query(
        &self,
        arglist: &Token,
        target: NodeId,
        graph: &mut Graph,
    ) -> Result<()> {
        for part in strip_query(&arglist.text) {
            let Some((key, value)) = part.split_once(':') else {
                let attr = part.trim();
                if !attr.is_empty() {
                    graph.node_mut(target).add_attr(attr);
                }
                continue;
            };

            let tag = key.trim().to_lowercase();
            let collector = match self.inspect.get(&tag) {
                Some(inspector) => inspector.create(value).locate(arglist.span)?,
                None => {
                    let mut cond = Collector::of_kind("is");
                    cond.set("value", value.trim());
                    cond
                }
            };
            graph.node_mut(target).rules.append(tag, collector);
        }
        Ok(())
    }

    /// A field-level argument list: every part must be `key:value`; unknown
    /// keys fall back to the `is` inspector. Collectors land under the field
    /// name.
    fn scan_attr_with_query(
        &self,
        field: &str,
        arglist: &Token,
        target: NodeId,
        graph: &mut Graph,
    ) -> Result<()> {
        let mut conds = Vec::new();
        for part in strip_query(&arglist.text) {
            let Some((key, value)) = part.split_once(':') else {
                return Err(Error::argument(format!(
                    "invalid query option `{}`, pattern should be `key:value` eg `id:400`",
                    part.trim()
                ))
                .locate(arglist.span));
            };

            let mut tag = key.trim().to_lowercase();
            if !self.inspect.has(&tag) {
                tag = "is".to_string();
            }
            let inspector = self.inspect.get(&tag).ok_or_else(|| {
                Error::argument(format!("inspector `{tag}` not found")).locate(arglist.span)
            })?;
            conds.push(inspector.create(value).locate(arglist.span)?);
        }

        if !conds.is_empty() {
            graph.node_mut(target).records.extend(field.to_string(), conds);
        }
        Ok(())
    }
}

/// Re-processes a peeked token by rewinding it, unless it was an unrecorded
/// sentinel.
fn push_back<R: Read>(scan: &mut Scanner<R>, tok: &Token) -> Result<()> {
    if tok.kind != TokenKind::Eof && tok.kind != TokenKind::Invalid {
        scan.unread_last_token()?;
    }
    Ok(())
}

fn lexical_error(tok: &Token) -> Error {
    Error::lexical("unterminated argument list").locate(tok.span)
}

/// Splits the interior of a `(..)` run on commas. An empty interior yields no
/// parts.
fn strip_query(text: &str) -> Vec<String> {
    let inner = text.strip_prefix('(').unwrap_or(text);
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').map(String::from).collect_vec()
}
