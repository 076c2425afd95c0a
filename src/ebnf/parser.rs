//! EBNF source parser
//!
//! Recursive descent over the [`Token`] stream produced by the lexer. The
//! accepted notation covers both the W3C style emitted by grammar dumps
//! (`name ::= ...`) and the yacc-like style (`name : ... ;`):
//!
//! ```text
//! grammar     = { rule } ;
//! rule        = identifier , ( "::=" | ":" | "=" ) , alternation , [ ";" ] ;
//! alternation = sequence , { "|" , sequence } ;
//! sequence    = { postfix } ;
//! postfix     = primary , { "?" | "*" | "+" } ;
//! primary     = "(" , alternation , ")"
//!             | "[" , alternation , "]"
//!             | "{" , alternation , "}"
//!             | literal
//!             | identifier ;
//! ```
//!
//! A sequence stops at an identifier followed by a rule operator, which is
//! what makes the `;` terminator optional.

use super::grammar::{Expression, Grammar, Quantifier};
use super::lexer::{tokenize, LexError, Token};
use logos::Span;
use std::fmt;

/// The source does not follow the rule syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    /// Error at byte offset `pos` of `source`.
    fn at(source: &str, pos: usize, message: impl Into<String>) -> Self {
        let before = &source[..pos];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Parse EBNF source into a [`Grammar`].
pub fn parse(source: &str) -> Result<Grammar, SyntaxError> {
    let tokens = tokenize(source).map_err(|(err, span)| match err {
        LexError::UnexpectedCharacter => SyntaxError::at(
            source,
            span.start,
            format!("{} `{}`", err, &source[span.clone()]),
        ),
        _ => SyntaxError::at(source, span.start, err.to_string()),
    })?;
    EbnfParser::new(source, tokens).parse_grammar()
}

type ParseResult<T> = Result<T, SyntaxError>;

struct EbnfParser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl<'a> EbnfParser<'a> {
    fn new(source: &'a str, tokens: Vec<(Token, Span)>) -> Self {
        EbnfParser {
            source,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(token, _)| token)
    }

    // byte offset of the current token, or the end of input
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let found = match self.tokens.get(self.pos) {
            Some((_, span)) => format!("`{}`", &self.source[span.clone()]),
            None => "end of input".to_string(),
        };
        SyntaxError::at(
            self.source,
            self.offset(),
            format!("expected {}, found {}", expected, found),
        )
    }

    fn expect(&mut self, expected: Token, text: &str) -> ParseResult<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", text)))
        }
    }

    // grammar = { rule } ;
    fn parse_grammar(&mut self) -> ParseResult<Grammar> {
        let mut grammar = Grammar::new();
        while self.peek().is_some() {
            let name_pos = self.offset();
            let (name, body) = self.parse_rule()?;
            if grammar.contains(&name) {
                return Err(SyntaxError::at(
                    self.source,
                    name_pos,
                    format!("production `{}` is defined more than once", name),
                ));
            }
            grammar.insert(name, body);
        }
        Ok(grammar)
    }

    // rule = identifier , ( "::=" | ":" | "=" ) , alternation , [ ";" ] ;
    fn parse_rule(&mut self) -> ParseResult<(String, Expression)> {
        let name = match self.peek() {
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(self.unexpected("production name")),
        };
        self.pos += 1;

        match self.peek() {
            Some(token) if token.is_rule_operator() => self.pos += 1,
            _ => return Err(self.unexpected(&format!("`::=` after `{}`", name))),
        }

        let body = self.parse_alternation()?;
        self.eat(&Token::Semicolon);

        Ok((name, body))
    }

    // whether the upcoming tokens open a new rule
    fn at_rule_start(&self) -> bool {
        matches!(self.peek(), Some(Token::Identifier(_)))
            && self.peek_at(1).map_or(false, Token::is_rule_operator)
    }

    // alternation = sequence , { "|" , sequence } ;
    fn parse_alternation(&mut self) -> ParseResult<Expression> {
        let mut branches = vec![self.parse_sequence()?];
        while self.eat(&Token::Pipe) {
            branches.push(self.parse_sequence()?);
        }
        Ok(Expression::alternation(branches))
    }

    // sequence = { postfix } ;
    fn parse_sequence(&mut self) -> ParseResult<Expression> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None
                | Some(Token::Pipe)
                | Some(Token::CloseParen)
                | Some(Token::CloseBracket)
                | Some(Token::CloseBrace)
                | Some(Token::Semicolon) => break,
                Some(_) if self.at_rule_start() => break,
                Some(_) => items.push(self.parse_postfix()?),
            }
        }
        Ok(Expression::sequence(items))
    }

    // postfix = primary , { "?" | "*" | "+" } ;
    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            let quantifier = match self.peek() {
                Some(Token::Question) => Quantifier::Optional,
                Some(Token::Star) => Quantifier::ZeroOrMore,
                Some(Token::Plus) => Quantifier::OneOrMore,
                _ => return Ok(expr),
            };
            self.pos += 1;
            expr = Expression::repeated(expr, quantifier);
        }
    }

    // primary = group | optional | repetition | literal | identifier ;
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let expr = match self.peek() {
            Some(Token::OpenParen) => {
                self.pos += 1;
                let inner = self.parse_alternation()?;
                self.expect(Token::CloseParen, ")")?;
                return Ok(Expression::group(inner));
            }
            Some(Token::OpenBracket) => {
                self.pos += 1;
                let inner = self.parse_alternation()?;
                self.expect(Token::CloseBracket, "]")?;
                return Ok(Expression::repeated(inner, Quantifier::Optional));
            }
            Some(Token::OpenBrace) => {
                self.pos += 1;
                let inner = self.parse_alternation()?;
                self.expect(Token::CloseBrace, "}")?;
                return Ok(Expression::repeated(inner, Quantifier::ZeroOrMore));
            }
            Some(Token::Literal(text)) => Expression::Literal(text.clone()),
            Some(Token::Identifier(name)) => Expression::Reference(name.clone()),
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(expr)
    }
}
