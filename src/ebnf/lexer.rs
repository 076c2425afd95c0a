//! Token definitions for EBNF source
//!
//! Tokenization is handled by logos. Whitespace is skipped by the lexer and
//! comments come out as [`Token::Comment`] so [`tokenize`] can drop them while
//! still reporting unterminated ones.

use logos::{Lexer, Logos, Span};
use std::fmt;

/// Why a stretch of source could not be tokenized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    UnterminatedLiteral,
    UnterminatedComment,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedCharacter => f.write_str("unexpected character"),
            LexError::UnterminatedLiteral => f.write_str("unterminated literal"),
            LexError::UnterminatedComment => f.write_str("unterminated comment"),
        }
    }
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Rule operators
    #[token("::=")]
    Define,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,

    #[token("|")]
    Pipe,
    #[token(";")]
    Semicolon,

    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,

    // Postfix quantifiers
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Quoted terminal, without its quotes.
    #[token("'", |lex| literal(lex, '\''))]
    #[token("\"", |lex| literal(lex, '"'))]
    Literal(String),

    #[token("/*", |lex| block_comment(lex, "*/"))]
    #[token("(*", |lex| block_comment(lex, "*)"))]
    #[regex(r"//[^\n]*")]
    Comment,
}

impl Token {
    pub fn is_rule_operator(&self) -> bool {
        matches!(self, Token::Define | Token::Colon | Token::Equals)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment)
    }
}

fn literal(lex: &mut Lexer<Token>, quote: char) -> Result<String, LexError> {
    let rest = lex.remainder();
    match rest.find(quote) {
        Some(len) => {
            let text = rest[..len].to_string();
            lex.bump(len + quote.len_utf8());
            Ok(text)
        }
        None => Err(LexError::UnterminatedLiteral),
    }
}

fn block_comment(lex: &mut Lexer<Token>, close: &str) -> Result<(), LexError> {
    match lex.remainder().find(close) {
        Some(len) => {
            lex.bump(len + close.len());
            Ok(())
        }
        None => Err(LexError::UnterminatedComment),
    }
}

/// Tokenize `source`, dropping comments. The error carries the span of the
/// offending input.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, (LexError, Span)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) if token.is_comment() => {}
            Ok(token) => tokens.push((token, lexer.span())),
            Err(err) => return Err((err, lexer.span())),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_rule_operators() {
        assert_eq!(kinds("a ::= b"), vec![
            Token::Identifier("a".to_string()),
            Token::Define,
            Token::Identifier("b".to_string()),
        ]);
        assert_eq!(kinds(": ="), vec![Token::Colon, Token::Equals]);
        assert!(Token::Define.is_rule_operator());
        assert!(!Token::Pipe.is_rule_operator());
    }

    #[test]
    fn test_literals_keep_inner_text() {
        assert_eq!(kinds(r#"'DROP' "it's""#), vec![
            Token::Literal("DROP".to_string()),
            Token::Literal("it's".to_string()),
        ]);
    }

    #[test]
    fn test_brackets_and_quantifiers() {
        assert_eq!(kinds("( ) [ ] { } ? * + | ;"), vec![
            Token::OpenParen,
            Token::CloseParen,
            Token::OpenBracket,
            Token::CloseBracket,
            Token::OpenBrace,
            Token::CloseBrace,
            Token::Question,
            Token::Star,
            Token::Plus,
            Token::Pipe,
            Token::Semicolon,
        ]);
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(
            kinds("a /* one */ (* two *) b // three\nc"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Identifier("b".to_string()),
                Token::Identifier("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        let tokens = tokenize("name ::= IDENT").unwrap();
        let spans: Vec<Span> = tokens.into_iter().map(|(_, span)| span).collect();
        assert_eq!(spans, vec![0..4, 5..8, 9..14]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(tokenize("a 'open").unwrap_err(), (LexError::UnterminatedLiteral, 2..3));
        assert_eq!(tokenize("a /* open").unwrap_err().0, LexError::UnterminatedComment);
        assert_eq!(tokenize("a # b").unwrap_err(), (LexError::UnexpectedCharacter, 2..3));
    }
}
