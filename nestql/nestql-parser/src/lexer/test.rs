use insta::assert_snapshot;

use super::lr::{Token, TokenKind, Tokens};
use super::Scanner;

fn lex(source: &str) -> Tokens {
    let mut scan = Scanner::new(source.as_bytes());
    let mut tokens = Vec::new();
    loop {
        let tok = scan.scan();
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    Tokens(tokens)
}

fn kinds(tokens: &Tokens) -> Vec<(TokenKind, &str)> {
    tokens
        .0
        .iter()
        .map(|t| (t.kind, t.text.as_str()))
        .collect()
}

#[test]
fn test_minimal_query_tokens() {
    use TokenKind::*;

    let tokens = lex("user(id:4){name,age}");
    assert_eq!(
        kinds(&tokens),
        vec![
            (Ident, "user"),
            (ArgList, "(id:4)"),
            (GroupStart, "{"),
            (Ident, "name"),
            (Comma, ","),
            (Ident, "age"),
            (GroupEnd, "}"),
            (Eof, ""),
        ]
    );
}

#[test]
fn test_token_debug() {
    let tokens = lex("user(id:4)");
    assert_snapshot!(format!("{:?}", tokens.0[0]), @r#"0..4: Ident "user""#);
    assert_snapshot!(format!("{:?}", tokens.0[1]), @r#"4..10: ArgList "(id:4)""#);
}

#[test]
fn test_whitespace_is_one_token() {
    use TokenKind::*;

    let tokens = lex("user \t\n (id:4)");
    assert_eq!(
        kinds(&tokens),
        vec![
            (Ident, "user"),
            (Whitespace, " \t\n "),
            (ArgList, "(id:4)"),
            (Eof, ""),
        ]
    );
}

#[test]
fn test_lines_and_columns() {
    let tokens = lex("user{\n  name,\n  age\n}");
    let positions: Vec<_> = tokens
        .0
        .iter()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| (t.text.as_str(), t.line, t.pos))
        .collect();
    assert_eq!(
        positions,
        vec![("user", 1, 0), ("name", 2, 2), ("age", 3, 2)]
    );
}

#[test]
fn test_arg_list_swallows_everything_to_paren() {
    let tokens = lex("age(lt:30, gte:40)");
    assert_eq!(tokens.0[1].kind, TokenKind::ArgList);
    assert_eq!(tokens.0[1].text, "(lt:30, gte:40)");

    let tokens = lex("skills(range: 30..100){");
    assert_eq!(tokens.0[1].text, "(range: 30..100)");
    assert_eq!(tokens.0[2].kind, TokenKind::GroupStart);
}

#[test]
fn test_unterminated_arg_list_is_invalid() {
    let tokens = lex("user(id:4");
    assert_eq!(tokens.0[1].kind, TokenKind::Invalid);
    assert_eq!(tokens.0[1].text, "(id:4");
}

#[test]
fn test_foreign_rune_ends_input() {
    let tokens = lex("user*rest");
    assert_eq!(
        kinds(&tokens),
        vec![(TokenKind::Ident, "user"), (TokenKind::Eof, "")]
    );
}

#[test]
fn test_ident_runs_to_terminator() {
    // anything that is not whitespace, a comma, or a bracket rune joins the
    // identifier once it has started
    let tokens = lex("day_of_week,x9");
    assert_eq!(tokens.0[0].text, "day_of_week");
    assert_eq!(tokens.0[2].text, "x9");
}

#[test]
fn test_unread_then_scan_is_identity() {
    let mut scan = Scanner::new("user (id:4){name}".as_bytes());

    let mut replayed: Vec<Token> = Vec::new();
    let mut originals: Vec<Token> = Vec::new();
    loop {
        let tok = scan.scan();
        if tok.kind == TokenKind::Eof {
            break;
        }
        originals.push(tok);
        scan.unread_last_token().unwrap();
        replayed.push(scan.scan());
    }

    assert_eq!(originals, replayed);
}

#[test]
fn test_unread_pops_the_stack() {
    let mut scan = Scanner::new("photos(with:[a b]){url}".as_bytes());
    let a = scan.scan();
    let b = scan.scan();
    assert_eq!(b.kind, TokenKind::ArgList);

    assert_eq!(scan.unread_last_token().unwrap(), Some(TokenKind::ArgList));
    assert_eq!(scan.unread_last_token().unwrap(), Some(TokenKind::Ident));
    assert_eq!(scan.unread_last_token().unwrap(), None);

    assert_eq!(scan.scan(), a);
    assert_eq!(scan.scan(), b);
}

#[test]
fn test_scan_significant_skips_whitespace() {
    let mut scan = Scanner::new("  \n user".as_bytes());
    let tok = scan.scan_significant();
    assert_eq!(tok.kind, TokenKind::Ident);
    assert_eq!(tok.text, "user");
    assert_eq!(tok.line, 2);
}

#[test]
fn test_reset_rewinds_counters() {
    let mut scan = Scanner::new("user{name}".as_bytes());
    scan.scan();
    scan.scan();
    scan.reset();
    // the input itself is consumed, but the scanner is back at the origin
    let tok = scan.scan();
    assert_eq!(tok.line, 1);
    assert_eq!(tok.pos, 0);
}

#[test]
fn test_eof_sentinel_repeats() {
    let mut scan = Scanner::new("".as_bytes());
    for _ in 0..3 {
        let tok = scan.scan();
        assert_eq!(tok.kind, TokenKind::Eof);
        assert!(tok.text.is_empty());
    }
}

mod reader {
    use super::super::RuneReader;

    #[test]
    fn test_read_unread_replay() {
        let mut rd = RuneReader::new("héllo".as_bytes());
        assert_eq!(rd.read(), Some('h'));
        assert_eq!(rd.read(), Some('é'));
        rd.unread().unwrap();
        rd.unread().unwrap();
        assert_eq!(rd.read(), Some('h'));
        assert_eq!(rd.read(), Some('é'));
        assert_eq!(rd.read(), Some('l'));
    }

    #[test]
    fn test_unread_is_bounded_by_history() {
        let mut rd = RuneReader::new("ab".as_bytes());
        rd.read();
        rd.unread().unwrap();
        assert!(rd.unread().is_err());
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement() {
        let mut rd = RuneReader::new(&[b'a', 0xff, b'b'][..]);
        assert_eq!(rd.read(), Some('a'));
        assert_eq!(rd.read(), Some(char::REPLACEMENT_CHARACTER));
        assert_eq!(rd.read(), Some('b'));
        assert_eq!(rd.read(), None);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut rd = RuneReader::new("abc".as_bytes());
        rd.read();
        rd.reset();
        assert!(rd.unread().is_err());
        assert_eq!(rd.read(), Some('b'));
    }
}
