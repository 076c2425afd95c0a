//! Grammar model
//!
//! A [`Grammar`] maps production names to right-hand-side [`Expression`] trees.
//! References between productions are plain names looked up in the owning
//! grammar, so recursive productions need no special representation and
//! copying a grammar is a plain deep clone.
//!
//! Serialization uses the notation accepted by the Railroad Diagram Generator:
//!
//! ```text
//! drop_stmt ::=
//! 	'DROP' 'TABLE' name
//! 	| 'DROP' 'DATABASE' name
//! ```

use indexmap::IndexMap;
use std::fmt;

/// How often a repeated expression may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// `x?` or `[ x ]`
    Optional,
    /// `x*` or `{ x }`
    ZeroOrMore,
    /// `x+`
    OneOrMore,
}

impl Quantifier {
    pub fn symbol(self) -> char {
        match self {
            Quantifier::Optional => '?',
            Quantifier::ZeroOrMore => '*',
            Quantifier::OneOrMore => '+',
        }
    }
}

/// A repeated or optional sub-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repetition {
    pub body: Box<Expression>,
    pub quantifier: Quantifier,
    /// The body opens with a separator literal, as in `( ',' name )*`.
    pub separated: bool,
}

impl Repetition {
    pub fn new(body: Expression, quantifier: Quantifier) -> Self {
        let separated = starts_with_separator(&body);
        Repetition {
            body: Box::new(body),
            quantifier,
            separated,
        }
    }
}

// a separator is a punctuation-only literal leading a sequence
fn starts_with_separator(body: &Expression) -> bool {
    match body {
        Expression::Group(inner) => starts_with_separator(inner),
        Expression::Sequence(items) => matches!(
            items.first(),
            Some(Expression::Literal(text))
                if !text.is_empty() && !text.chars().any(char::is_alphanumeric)
        ),
        _ => false,
    }
}

/// Right-hand side of a production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A quoted terminal: keyword or symbol.
    Literal(String),
    /// A bare name, resolved by lookup in the grammar. It may not resolve.
    Reference(String),
    Sequence(Vec<Expression>),
    Alternation(Vec<Expression>),
    Repetition(Repetition),
    /// Explicit parentheses.
    Group(Box<Expression>),
}

impl Expression {
    pub fn literal(text: impl Into<String>) -> Self {
        Expression::Literal(text.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Expression::Reference(name.into())
    }

    /// Build a sequence, collapsing the single-element case.
    pub fn sequence(mut items: Vec<Expression>) -> Self {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expression::Sequence(items)
        }
    }

    /// Build an alternation, collapsing the single-branch case.
    pub fn alternation(mut branches: Vec<Expression>) -> Self {
        if branches.len() == 1 {
            branches.remove(0)
        } else {
            Expression::Alternation(branches)
        }
    }

    pub fn repeated(body: Expression, quantifier: Quantifier) -> Self {
        Expression::Repetition(Repetition::new(body, quantifier))
    }

    pub fn group(inner: Expression) -> Self {
        Expression::Group(Box::new(inner))
    }

    /// Prints without needing surrounding parentheses inside a sequence or
    /// in front of a postfix quantifier.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Expression::Literal(_) | Expression::Reference(_) | Expression::Group(_)
        )
    }

    /// Wrap in a [`Expression::Group`] unless the expression already prints
    /// as a single unit. Used when substituting a body for a reference.
    pub fn grouped(self) -> Self {
        match self {
            Expression::Literal(_)
            | Expression::Reference(_)
            | Expression::Group(_)
            | Expression::Repetition(_) => self,
            other => Expression::group(other),
        }
    }

    /// The top-level alternatives of this expression; itself when it is not
    /// an alternation.
    pub fn branches(&self) -> Vec<&Expression> {
        match self {
            Expression::Alternation(branches) => branches.iter().collect(),
            other => vec![other],
        }
    }

    /// Visit this expression and every sub-expression, parents first.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Expression),
    {
        visit(self);
        match self {
            Expression::Sequence(items) | Expression::Alternation(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            Expression::Repetition(repetition) => repetition.body.walk(visit),
            Expression::Group(inner) => inner.walk(visit),
            Expression::Literal(_) | Expression::Reference(_) => {}
        }
    }

    /// Names referenced anywhere in this expression, in order of appearance,
    /// without duplicates.
    pub fn references(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        self.walk(&mut |expr| {
            if let Expression::Reference(name) = expr {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        });
        names
    }

    pub fn refers_to(&self, name: &str) -> bool {
        let mut found = false;
        self.walk(&mut |expr| {
            if matches!(expr, Expression::Reference(r) if r == name) {
                found = true;
            }
        });
        found
    }

    /// Replace every reference to `name` with a copy of `replacement`.
    /// The replacement itself is not searched again.
    pub fn substitute(&mut self, name: &str, replacement: &Expression) {
        if matches!(&*self, Expression::Reference(r) if r == name) {
            *self = replacement.clone();
            return;
        }
        match self {
            Expression::Sequence(items) | Expression::Alternation(items) => {
                for item in items {
                    item.substitute(name, replacement);
                }
            }
            Expression::Repetition(repetition) => repetition.body.substitute(name, replacement),
            Expression::Group(inner) => inner.substitute(name, replacement),
            Expression::Literal(_) | Expression::Reference(_) => {}
        }
    }

    /// An alternation with an empty branch, bare or in parentheses: the shape
    /// an inlined `opt_*` production takes.
    pub fn is_optional(&self) -> bool {
        match self {
            Expression::Group(inner) => inner.is_optional(),
            Expression::Alternation(branches) => branches
                .iter()
                .any(|branch| matches!(branch, Expression::Sequence(items) if items.is_empty())),
            _ => false,
        }
    }

    /// Remove separated list tails such as `( ',' name )*`, keeping the
    /// leading item.
    pub fn strip_separated_lists(&mut self) {
        match self {
            Expression::Sequence(items) => {
                items.retain(|item| !matches!(item, Expression::Repetition(r) if r.separated));
                for item in items {
                    item.strip_separated_lists();
                }
            }
            Expression::Alternation(items) => {
                for item in items {
                    item.strip_separated_lists();
                }
            }
            Expression::Repetition(repetition) => repetition.body.strip_separated_lists(),
            Expression::Group(inner) => inner.strip_separated_lists(),
            Expression::Literal(_) | Expression::Reference(_) => {}
        }
    }

    /// Rename every reference through `rename`.
    pub fn map_references<F>(&mut self, rename: &F)
    where
        F: Fn(&str) -> String,
    {
        match self {
            Expression::Reference(name) => *name = rename(name),
            Expression::Sequence(items) | Expression::Alternation(items) => {
                for item in items {
                    item.map_references(rename);
                }
            }
            Expression::Repetition(repetition) => repetition.body.map_references(rename),
            Expression::Group(inner) => inner.map_references(rename),
            Expression::Literal(_) => {}
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(text) if text.contains('\'') => write!(f, "\"{}\"", text),
            Expression::Literal(text) => write!(f, "'{}'", text),
            Expression::Reference(name) => f.write_str(name),
            Expression::Sequence(items) => {
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_str(" ")?;
                    }
                    first = false;
                    match item {
                        Expression::Alternation(_) => f.write_str(&parenthesized(item))?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                Ok(())
            }
            Expression::Alternation(branches) => {
                let mut first = true;
                for branch in branches {
                    if !first {
                        f.write_str(" | ")?;
                    }
                    first = false;
                    match branch {
                        Expression::Alternation(_) => f.write_str(&parenthesized(branch))?,
                        _ => write!(f, "{}", branch)?,
                    }
                }
                Ok(())
            }
            Expression::Repetition(repetition) => {
                if repetition.body.is_atomic() {
                    write!(f, "{}{}", repetition.body, repetition.quantifier.symbol())
                } else {
                    write!(f, "{}{}", parenthesized(&repetition.body), repetition.quantifier.symbol())
                }
            }
            Expression::Group(inner) => f.write_str(&parenthesized(inner)),
        }
    }
}

// an empty first or last branch leaves no padding inside the parentheses
fn parenthesized(inner: &Expression) -> String {
    format!("( {} )", inner.to_string().trim())
}

/// Write one production in railroad notation: one alternative per line.
pub fn write_production<'a, I>(out: &mut String, name: &str, alternatives: I)
where
    I: IntoIterator<Item = &'a Expression>,
{
    out.push_str(name);
    out.push_str(" ::=\n");
    for (index, alternative) in alternatives.into_iter().enumerate() {
        out.push('\t');
        if index > 0 {
            out.push_str("| ");
        }
        out.push_str(&alternative.to_string());
        out.push('\n');
    }
}

/// A set of named productions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    productions: IndexMap<String, Expression>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse EBNF source. See [`crate::ebnf::parser`] for the accepted notation.
    pub fn parse(source: &str) -> Result<Self, super::parser::SyntaxError> {
        super::parser::parse(source)
    }

    /// Add a production, returning the body it replaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, body: Expression) -> Option<Expression> {
        self.productions.insert(name.into(), body)
    }

    /// Remove a production, keeping the declaration order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Expression> {
        self.productions.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.productions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.productions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Production names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.productions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.productions.iter().map(|(name, body)| (name.as_str(), body))
    }

    pub(crate) fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Expression> {
        self.productions.values_mut()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (index, (name, body)) in self.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            write_production(&mut out, name, body.branches());
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_stmt() -> Expression {
        Expression::sequence(vec![
            Expression::literal("DROP"),
            Expression::group(Expression::alternation(vec![
                Expression::sequence(vec![Expression::literal("TABLE"), Expression::reference("name")]),
                Expression::sequence(vec![
                    Expression::literal("DATABASE"),
                    Expression::reference("name"),
                ]),
            ])),
        ])
    }

    #[test]
    fn test_display_sequence_and_group() {
        assert_eq!(drop_stmt().to_string(), "'DROP' ( 'TABLE' name | 'DATABASE' name )");
    }

    #[test]
    fn test_display_literal_with_quote() {
        assert_eq!(Expression::literal("'").to_string(), "\"'\"");
    }

    #[test]
    fn test_display_repetition_parenthesizes_sequences() {
        let list = Expression::repeated(
            Expression::sequence(vec![Expression::literal(","), Expression::reference("name")]),
            Quantifier::ZeroOrMore,
        );
        assert_eq!(list.to_string(), "( ',' name )*");

        let optional = Expression::repeated(Expression::reference("opt"), Quantifier::Optional);
        assert_eq!(optional.to_string(), "opt?");
    }

    #[test]
    fn test_separated_flag() {
        let list = Repetition::new(
            Expression::group(Expression::sequence(vec![
                Expression::literal(","),
                Expression::reference("name"),
            ])),
            Quantifier::ZeroOrMore,
        );
        assert!(list.separated);

        let keywords = Repetition::new(
            Expression::sequence(vec![Expression::literal("AND"), Expression::reference("x")]),
            Quantifier::ZeroOrMore,
        );
        assert!(!keywords.separated);
    }

    #[test]
    fn test_strip_separated_lists() {
        let mut expr = Expression::sequence(vec![
            Expression::literal("ADD"),
            Expression::reference("column_def"),
            Expression::repeated(
                Expression::sequence(vec![Expression::literal(","), Expression::reference("column_def")]),
                Quantifier::ZeroOrMore,
            ),
            Expression::repeated(
                Expression::sequence(vec![Expression::literal("AND"), Expression::reference("x")]),
                Quantifier::ZeroOrMore,
            ),
        ]);
        expr.strip_separated_lists();
        assert_eq!(expr.to_string(), "'ADD' column_def ( 'AND' x )*");
    }

    #[test]
    fn test_optional_groups() {
        let optional = Expression::group(Expression::alternation(vec![
            Expression::literal("IF"),
            Expression::sequence(vec![]),
        ]));
        assert!(optional.is_optional());
        assert_eq!(optional.to_string(), "( 'IF' | )");
        assert!(!drop_stmt().is_optional());
        assert!(!Expression::literal("IF").is_optional());
    }

    #[test]
    fn test_nested_alternation_in_sequence_is_parenthesized() {
        let expr = Expression::Sequence(vec![
            Expression::literal("A"),
            Expression::Alternation(vec![Expression::reference("b"), Expression::reference("c")]),
        ]);
        assert_eq!(expr.to_string(), "'A' ( b | c )");
    }

    #[test]
    fn test_references_in_order_without_duplicates() {
        let expr = Expression::sequence(vec![
            Expression::reference("b"),
            Expression::reference("a"),
            Expression::group(Expression::reference("b")),
        ]);
        assert_eq!(expr.references(), vec!["b", "a"]);
        assert!(expr.refers_to("a"));
        assert!(!expr.refers_to("c"));
    }

    #[test]
    fn test_substitute() {
        let mut expr = drop_stmt();
        expr.substitute("name", &Expression::reference("IDENT"));
        assert_eq!(expr.to_string(), "'DROP' ( 'TABLE' IDENT | 'DATABASE' IDENT )");
    }

    #[test]
    fn test_grammar_display_keeps_declaration_order() {
        let mut grammar = Grammar::new();
        grammar.insert(
            "stmt",
            Expression::alternation(vec![Expression::reference("a"), Expression::reference("b")]),
        );
        grammar.insert("a", Expression::literal("A"));
        assert_eq!(grammar.to_string(), "stmt ::=\n\ta\n\t| b\n\na ::=\n\t'A'\n");
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut grammar = Grammar::new();
        grammar.insert("a", Expression::literal("A"));
        grammar.insert("b", Expression::literal("B"));
        grammar.insert("c", Expression::literal("C"));
        grammar.remove("b");
        assert_eq!(grammar.names().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
