//! Splits an input stream holding several top-level queries into individual
//! query texts, so each can be parsed and compiled on its own.

use std::io::Read;

use crate::error::{Annotate, Error, Reason};
use crate::lexer::lr::TokenKind;
use crate::lexer::Scanner;
use crate::Result;

/// Scans out each complete query of `scan`, invoking `emit` with its text.
///
/// A single outermost `{ ... }` envelope around the queries is discarded.
/// Chunks are emitted whole: joining them back with `,` separators re-chunks
/// to the same sequence.
pub fn scan_chunks<R: Read>(scan: &mut Scanner<R>, mut emit: impl FnMut(String)) -> Result<()> {
    let tok = scan.scan_significant();
    match tok.kind {
        TokenKind::Invalid | TokenKind::Eof => {
            return Err(Error::new(Reason::Syntax {
                who: None,
                expected: "a query like `name(..){..}`".to_string(),
                found: tok.kind.to_string(),
            })
            .locate(tok.span));
        }
        // drop the single outermost envelope
        TokenKind::GroupStart => {}
        _ => {
            scan.unread_last_token()?;
        }
    }

    loop {
        let tok = scan.scan_significant();
        match tok.kind {
            TokenKind::Invalid | TokenKind::Eof | TokenKind::GroupEnd => break,
            TokenKind::Comma => continue,
            _ => {
                scan.unread_last_token()?;
                emit(scan_chunk(scan)?);
            }
        }
    }

    Ok(())
}

/// Accumulates one balanced `ident(..){..}` chunk, braces included.
fn scan_chunk<R: Read>(scan: &mut Scanner<R>) -> Result<String> {
    let mut chunk = String::new();
    let mut depth = 0usize;

    loop {
        let tok = scan.scan();
        match tok.kind {
            TokenKind::Eof | TokenKind::Invalid => break,
            TokenKind::GroupStart => {
                depth += 1;
                chunk.push_str(&tok.text);
            }
            TokenKind::GroupEnd => {
                chunk.push_str(&tok.text);
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            _ => chunk.push_str(&tok.text),
        }
    }

    let chunk = chunk.trim();
    let chunk = chunk.strip_suffix(',').unwrap_or(chunk);
    Ok(chunk.to_string())
}

/// Splits `source` into its top-level query texts.
pub fn chunk_source(source: &str) -> Result<Vec<String>> {
    let mut scan = Scanner::new(source.as_bytes());
    let mut chunks = Vec::new();
    scan_chunks(&mut scan, |chunk| chunks.push(chunk))?;
    log::debug!("split input into {} chunk(s)", chunks.len());
    Ok(chunks)
}
