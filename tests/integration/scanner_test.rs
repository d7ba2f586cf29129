use anyhow::Result;
use std::fs;

use dataselector::catalog::DataValue;
use dataselector::query::parser::lexer::KEYWORDS;
use dataselector::query::parser::{Lexer, ScanError, TokenType};

/// Every terminal of the language, one per line, scans to one token at the
/// start of its line
#[test]
fn test_terminals_fixture() -> Result<()> {
    let text = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/terminals.txt"))?;
    let lines = text.lines().count();

    let tokens = Lexer::tokenize(&text)?;
    assert_eq!(tokens.len(), lines + 1, "one token per line plus EOF");

    for (i, token) in tokens.iter().take(lines).enumerate() {
        assert_eq!((token.line, token.column), (i + 1, 1), "token {} is misplaced", token);
        assert_ne!(token.token_type, TokenType::EOF);
    }

    let eof = &tokens[lines];
    assert_eq!(eof.token_type, TokenType::EOF);
    assert_eq!(eof.line, lines + 1);

    Ok(())
}

#[test]
fn test_every_keyword_is_in_fixture() -> Result<()> {
    let text = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/terminals.txt"))?;
    let tokens = Lexer::tokenize(&text)?;

    for (word, token_type) in KEYWORDS.iter() {
        let token = tokens
            .iter()
            .find(|t| t.lexeme == *word)
            .unwrap_or_else(|| panic!("keyword {} missing from fixture", word));
        assert_eq!(token.token_type, *token_type);
    }

    Ok(())
}

#[test]
fn test_literals() -> Result<()> {
    let tokens = Lexer::tokenize("42 2.5 'it''s' true false null")?;

    let literals: Vec<_> = tokens.iter().map(|t| t.literal.clone()).collect();
    assert_eq!(
        literals,
        vec![
            Some(DataValue::Number(42.0)),
            Some(DataValue::Number(2.5)),
            Some(DataValue::from("it's")),
            Some(DataValue::Boolean(true)),
            Some(DataValue::Boolean(false)),
            Some(DataValue::Null),
            None,
        ]
    );

    Ok(())
}

#[test]
fn test_qualified_names_and_trailing_dot() -> Result<()> {
    let types: Vec<_> = Lexer::tokenize("a.field1 1.")?.into_iter().map(|t| t.token_type).collect();
    assert_eq!(
        types,
        vec![
            TokenType::IDENTIFIER,
            TokenType::DOT,
            TokenType::IDENTIFIER,
            TokenType::NUMBER,
            TokenType::DOT,
            TokenType::EOF,
        ]
    );
    Ok(())
}

#[test]
fn test_scan_errors() -> Result<()> {
    assert_eq!(
        Lexer::tokenize("select 'abc"),
        Err(ScanError::UnterminatedString { line: 1, column: 8 })
    );
    assert_eq!(
        Lexer::tokenize("select\n  a ! b"),
        Err(ScanError::UnexpectedCharacter { character: '!', line: 2, column: 5 })
    );
    Ok(())
}

#[test]
fn test_lexer_stops_after_error() -> Result<()> {
    let results: Vec<_> = Lexer::new("a # b c").collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    Ok(())
}
