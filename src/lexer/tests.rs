//! Unit tests for the lexer module.
//!
//! Covers keywords, literals, operators, comments and the synthetic
//! indentation markers.

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.lufa".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "class extends if elif else for while scope ret from import as export".to_string();
    let tokens = tokenize(source, Some("test.lufa".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::BlockStart);
    assert_eq!(tokens[1].kind, TokenKind::Class);
    assert_eq!(tokens[2].kind, TokenKind::Extends);
    assert_eq!(tokens[3].kind, TokenKind::If);
    assert_eq!(tokens[4].kind, TokenKind::Elif);
    assert_eq!(tokens[5].kind, TokenKind::Else);
    assert_eq!(tokens[6].kind, TokenKind::For);
    assert_eq!(tokens[7].kind, TokenKind::While);
    assert_eq!(tokens[8].kind, TokenKind::Scope);
    assert_eq!(tokens[9].kind, TokenKind::Return);
    assert_eq!(tokens[10].kind, TokenKind::From);
    assert_eq!(tokens[11].kind, TokenKind::Import);
    assert_eq!(tokens[12].kind, TokenKind::As);
    assert_eq!(tokens[13].kind, TokenKind::Export);
    assert_eq!(tokens[14].kind, TokenKind::Eol);
    assert_eq!(tokens[15].kind, TokenKind::BlockEnd);
    assert_eq!(tokens[16].kind, TokenKind::End);
}

#[test]
fn test_tokenize_types_and_modifiers() {
    let source = "int float string bool void list map hash const private".to_string();
    let tokens = tokenize(source, Some("test.lufa".to_string())).unwrap();

    for token in &tokens[1..9] {
        assert_eq!(token.kind, TokenKind::Type);
    }
    assert_eq!(tokens[1].value, "int");
    assert_eq!(tokens[8].value, "hash");
    assert_eq!(tokens[9].kind, TokenKind::Modifier);
    assert_eq!(tokens[10].kind, TokenKind::Modifier);
    assert_eq!(tokens[10].value, "private");
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore CamelCase".to_string();
    let tokens = tokenize(source, Some("test.lufa".to_string())).unwrap();

    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].value, "foo");
    assert_eq!(tokens[3].value, "baz_123");
    assert_eq!(tokens[4].value, "_underscore");
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
    assert_eq!(tokens[5].value, "CamelCase");
}

#[test]
fn test_tokenize_numbers() {
    let source = "42 3.14 0xff 1e3 7".to_string();
    let tokens = tokenize(source, Some("test.lufa".to_string())).unwrap();

    assert_eq!(tokens[1].kind, TokenKind::Integer);
    assert_eq!(tokens[1].value, "42");
    assert_eq!(tokens[2].kind, TokenKind::Float);
    assert_eq!(tokens[2].value, "3.14");
    assert_eq!(tokens[3].kind, TokenKind::Integer);
    assert_eq!(tokens[3].value, "0xff");
    assert_eq!(tokens[4].kind, TokenKind::Float);
    assert_eq!(tokens[5].kind, TokenKind::Integer);
}

#[test]
fn test_tokenize_range_is_not_a_float() {
    assert_eq!(
        kinds("1...5"),
        vec![
            TokenKind::BlockStart,
            TokenKind::Integer,
            TokenKind::Ellipsis,
            TokenKind::Integer,
            TokenKind::Eol,
            TokenKind::BlockEnd,
            TokenKind::End,
        ]
    );
}

#[test]
fn test_tokenize_strings() {
    let source = r#""hello" 'world' "a\nb" 'it\'s'"#.to_string();
    let tokens = tokenize(source, Some("test.lufa".to_string())).unwrap();

    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].value, "hello");
    assert_eq!(tokens[2].value, "world");
    assert_eq!(tokens[3].value, "a\nb");
    assert_eq!(tokens[4].value, "it's");
}

#[test]
fn test_tokenize_literal_keywords() {
    let tokens = tokenize("true false null".to_string(), None).unwrap();

    assert_eq!(tokens[1].kind, TokenKind::Boolean);
    assert_eq!(tokens[1].value, "true");
    assert_eq!(tokens[2].kind, TokenKind::Boolean);
    assert_eq!(tokens[3].kind, TokenKind::Null);
}

#[test]
fn test_tokenize_operators_longest_first() {
    let source = ">>>= >>= **= //= >>> ** // ++ -- += == != <= >= && || << >> ... = ? : @".to_string();
    let tokens = tokenize(source, None).unwrap();
    let expected = [
        TokenKind::AssignUnsignedRightShift,
        TokenKind::AssignRightShift,
        TokenKind::AssignExp,
        TokenKind::AssignDivInt,
        TokenKind::UnsignedRightShift,
        TokenKind::Exp,
        TokenKind::DivInt,
        TokenKind::Increment,
        TokenKind::Decrement,
        TokenKind::AssignPlus,
        TokenKind::Equal,
        TokenKind::NotEqual,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::LeftShift,
        TokenKind::RightShift,
        TokenKind::Ellipsis,
        TokenKind::Assign,
        TokenKind::Hook,
        TokenKind::Colon,
        TokenKind::At,
    ];

    for (index, kind) in expected.iter().enumerate() {
        assert_eq!(tokens[index + 1].kind, *kind, "operator #{}", index);
    }
}

#[test]
fn test_tokenize_word_operators() {
    let tokens = tokenize("has in is new del".to_string(), None).unwrap();

    assert_eq!(tokens[1].kind, TokenKind::Has);
    assert_eq!(tokens[2].kind, TokenKind::In);
    assert_eq!(tokens[3].kind, TokenKind::Is);
    assert_eq!(tokens[4].kind, TokenKind::New);
    assert_eq!(tokens[5].kind, TokenKind::Delete);
}

#[test]
fn test_tokenize_comments_and_blank_lines() {
    assert_eq!(
        kinds("# a comment\n\nx++ # trailing\n\n"),
        vec![
            TokenKind::BlockStart,
            TokenKind::Identifier,
            TokenKind::Increment,
            TokenKind::Eol,
            TokenKind::BlockEnd,
            TokenKind::End,
        ]
    );
}

#[test]
fn test_tokenize_indentation_blocks() {
    let source = "if x:\n    foo()\nbar()\n";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::BlockStart,
            TokenKind::If,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::BlockStart,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::Eol,
            TokenKind::BlockEnd,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::Eol,
            TokenKind::BlockEnd,
            TokenKind::End,
        ]
    );
}

#[test]
fn test_tokenize_closes_open_blocks_at_end() {
    let source = "if a:\n    if b:\n        c()";
    let kinds = kinds(source);
    let ends = kinds
        .iter()
        .filter(|kind| **kind == TokenKind::BlockEnd)
        .count();
    let starts = kinds
        .iter()
        .filter(|kind| **kind == TokenKind::BlockStart)
        .count();

    assert_eq!(starts, 3);
    assert_eq!(ends, 3);
    assert_eq!(kinds.last(), Some(&TokenKind::End));
}

#[test]
fn test_tokenize_brackets_join_lines() {
    let source = "foo(1,\n        2\n)\n";

    assert_eq!(
        kinds(source),
        vec![
            TokenKind::BlockStart,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::Integer,
            TokenKind::Comma,
            TokenKind::Integer,
            TokenKind::RightParen,
            TokenKind::Eol,
            TokenKind::BlockEnd,
            TokenKind::End,
        ]
    );
}

#[test]
fn test_tokenize_line_continuation() {
    let source = "x = 1 + \\\n    2\n";
    let kinds = kinds(source);

    assert_eq!(
        kinds.iter().filter(|kind| **kind == TokenKind::Eol).count(),
        1
    );
    assert_eq!(
        kinds
            .iter()
            .filter(|kind| **kind == TokenKind::BlockStart)
            .count(),
        1
    );
}

#[test]
fn test_tokenize_positions() {
    let source = "int x = 1\n  \nfoo(x)".to_string();
    let tokens = tokenize(source, Some("test.lufa".to_string())).unwrap();

    assert_eq!(tokens[1].span.start.line, 1);
    assert_eq!(tokens[1].span.start.col, 1);
    assert_eq!(tokens[2].span.start.col, 5);
    assert_eq!(tokens[6].value, "foo");
    assert_eq!(tokens[6].span.start.line, 3);
    assert_eq!(tokens[6].span.start.col, 1);
    assert_eq!(tokens[6].span.start.file.as_str(), "test.lufa");
}

#[test]
fn test_tokenize_tabs_count_as_tab_width() {
    let source = "if x:\n\tfoo()\n        bar()\n";
    let kinds = kinds(source);

    // A tab and eight spaces differ in width, so the second line opens a block.
    assert_eq!(
        kinds
            .iter()
            .filter(|kind| **kind == TokenKind::BlockStart)
            .count(),
        3
    );
}

#[test]
fn test_tokenize_unaligned_indentation() {
    let source = "if x:\n        foo()\n    bar()\n".to_string();
    let result = tokenize(source, Some("test.lufa".to_string()));

    assert!(result.is_err());
    assert_eq!(result.err().unwrap().get_error_name(), "UnalignedIndentation");
}

#[test]
fn test_tokenize_unrecognised_token() {
    let result = tokenize("int x = $".to_string(), Some("test.lufa".to_string()));

    assert!(result.is_err());
    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().col, 9);
}
