//! End-to-end inline + extract behavior against a small SQL grammar

use proptest::prelude::*;
use regex::Regex;
use rstest::rstest;
use sqldiagram::ebnf::{Extractor, Grammar, GrammarError, Presentation};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn sql_grammar() -> Grammar {
    let source = std::fs::read_to_string(fixture_path("sql.ebnf")).unwrap();
    Grammar::parse(&source).unwrap()
}

const DROP_SCENARIO: &str =
    "stmt : 'DROP' drop_target ; drop_target : 'TABLE' name | 'DATABASE' name ; name : IDENT ;";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

// Tabs become four spaces so inline snapshots stay readable.
fn spaced(text: &str) -> String {
    text.replace('\t', "    ")
}

#[test]
fn drop_table_scenario() {
    let grammar = Grammar::parse(DROP_SCENARIO).unwrap();
    let fragment = Extractor::new("stmt")
        .matching([re("'DROP' 'TABLE'")])
        .extract(&grammar.inlined(["drop_target", "name"]).unwrap())
        .unwrap()
        .to_fragment(&Presentation::default());

    insta::assert_snapshot!(spaced(&fragment.ebnf), @r"
stmt ::=
    'DROP' 'TABLE' identifier
");
    assert!(fragment.references.contains(&"identifier".to_string()));
    assert!(!fragment.ebnf.contains("IDENT"));
}

#[test]
fn drop_table_scenario_descending() {
    let grammar = Grammar::parse(DROP_SCENARIO).unwrap();
    let fragment = Extractor::new("stmt")
        .descend(true)
        .matching([re("'DROP' 'TABLE'")])
        .extract(&grammar.inlined(["drop_target"]).unwrap())
        .unwrap()
        .to_fragment(&Presentation::default());

    insta::assert_snapshot!(spaced(&fragment.ebnf), @r"
stmt ::=
    'DROP' 'TABLE' name

name ::=
    identifier
");
}

#[test]
fn fixture_parses_both_rule_styles() {
    let grammar = sql_grammar();
    assert_eq!(grammar.names().next(), Some("stmt_block"));
    assert!(grammar.contains("transaction_stmt"));
    assert_eq!(
        grammar.get("opt_transaction").map(|e| e.to_string()),
        Some("'TRANSACTION' | ".to_string())
    );
}

#[test]
fn show_statements_split_and_filter() {
    let grammar = sql_grammar().inlined(["opt_from"]).unwrap();
    let fragment = Extractor::new("show_stmt")
        .excluding([re("'TIME'")])
        .extract(&grammar)
        .unwrap()
        .to_fragment(&Presentation::default());

    insta::assert_snapshot!(spaced(&fragment.ebnf), @r"
show_stmt ::=
    'SHOW' 'DATABASES'
    | 'SHOW' 'TABLES' ( 'FROM' name | )
    | 'SHOW' 'COLUMNS' 'FROM' qualified_name
");
}

#[test]
fn optional_clauses_do_not_multiply_alternatives() {
    let grammar = sql_grammar()
        .inlined(["drop_target", "opt_if_exists", "opt_drop_behavior"])
        .unwrap();
    let extraction = Extractor::new("drop_stmt").extract(&grammar).unwrap();
    let kept: Vec<String> = extraction
        .root()
        .alternatives
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(
        kept,
        vec![
            "'DROP' 'DATABASE' name",
            "'DROP' 'INDEX' ( 'IF' 'EXISTS' | ) table_name_with_index ( ',' table_name_with_index )* ( 'CASCADE' | 'RESTRICT' | )",
            "'DROP' 'TABLE' ( 'IF' 'EXISTS' | ) qualified_name ( ',' qualified_name )* ( 'CASCADE' | 'RESTRICT' | )",
        ]
    );
}

#[test]
fn no_split_keeps_alternatives_merged() {
    let grammar = sql_grammar()
        .inlined(["opt_if_exists", "opt_drop_behavior"])
        .unwrap();
    let fragment = Extractor::new("drop_target")
        .no_split(true)
        .matching([re("'DATABASE'")])
        .extract(&grammar)
        .unwrap()
        .to_fragment(&Presentation::default());

    assert_eq!(fragment.ebnf, "drop_target ::=\n\t'DATABASE' name\n");
}

#[rstest]
#[case("'BEGIN'|'START'", &["'BEGIN' opt_transaction", "'START' 'TRANSACTION'"])]
#[case("'COMMIT'|'END'", &["'COMMIT' opt_transaction", "'END' opt_transaction"])]
#[case("'ROLLBACK'", &["'ROLLBACK' opt_transaction"])]
fn transaction_filters(#[case] pattern: &str, #[case] expected: &[&str]) {
    let extraction = Extractor::new("transaction_stmt")
        .matching([re(pattern)])
        .extract(&sql_grammar())
        .unwrap();
    let kept: Vec<String> = extraction
        .root()
        .alternatives
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(kept, expected);
}

#[test]
fn filtering_everything_is_an_error() {
    let err = Extractor::new("show_stmt")
        .matching([re("'GRANTS'")])
        .extract(&sql_grammar())
        .unwrap_err();
    assert_eq!(
        err,
        GrammarError::EmptyExtraction {
            root: "show_stmt".to_string()
        }
    );
}

#[test]
fn cycle_detection_leaves_base_untouched() {
    let base = Grammar::parse("list ::= item | list ',' item\nitem ::= IDENT\n").unwrap();
    let before = base.clone();
    assert_eq!(
        base.inlined(["item", "list"]).unwrap_err(),
        GrammarError::InlineCycle {
            name: "list".to_string()
        }
    );
    assert_eq!(base, before);
}

#[test]
fn descend_stops_at_cycles_and_unknown_names() {
    let extraction = Extractor::new("stmt_list")
        .descend(true)
        .extract(&Grammar::parse("stmt_list ::= stmt ( ';' stmt )*\nstmt ::= stmt_list | leaf\n").unwrap())
        .unwrap();
    let names: Vec<&str> = extraction.productions.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["stmt_list", "stmt"]);
}

const INLINABLE: &[&str] = &[
    "stmt_list",
    "drop_stmt",
    "drop_target",
    "opt_if_exists",
    "opt_drop_behavior",
    "show_stmt",
    "opt_from",
    "transaction_stmt",
    "opt_transaction",
    "create_index_stmt",
    "opt_unique",
    "opt_name",
    "index_params",
    "table_name_with_index",
    "qualified_name",
    "name",
];

const KEYWORDS: &[&str] = &[
    "'DROP'", "'SHOW'", "'TABLE'", "'INDEX'", "'CASCADE'", "'BEGIN'", "'FROM'", "'UNIQUE'", "'@'",
];

proptest! {
    #[test]
    fn inlined_names_never_survive_extraction(
        names in proptest::sample::subsequence(INLINABLE.to_vec(), 0..=INLINABLE.len())
    ) {
        let grammar = sql_grammar().inlined(names.iter().copied()).unwrap();
        let extraction = Extractor::new("stmt").extract(&grammar).unwrap();
        for alternative in &extraction.root().alternatives {
            for name in &names {
                prop_assert!(!alternative.refers_to(name), "{} still refers to {}", alternative, name);
            }
        }
    }

    #[test]
    fn filters_are_sound(
        inline in proptest::sample::subsequence(INLINABLE.to_vec(), 0..=INLINABLE.len()),
        keep in proptest::sample::select(KEYWORDS.to_vec()),
        reject in proptest::sample::select(KEYWORDS.to_vec()),
    ) {
        let grammar = sql_grammar().inlined(inline.iter().copied()).unwrap();
        let keep_re = Regex::new(&regex::escape(keep)).unwrap();
        let reject_re = Regex::new(&regex::escape(reject)).unwrap();
        let result = Extractor::new("stmt")
            .matching([keep_re.clone()])
            .excluding([reject_re.clone()])
            .extract(&grammar);
        match result {
            Ok(extraction) => {
                prop_assert!(!extraction.root().alternatives.is_empty());
                for alternative in &extraction.root().alternatives {
                    let text = alternative.to_string();
                    prop_assert!(keep_re.is_match(&text));
                    prop_assert!(!reject_re.is_match(&text));
                }
            }
            Err(err) => prop_assert_eq!(err, GrammarError::EmptyExtraction { root: "stmt".to_string() }),
        }
    }

    #[test]
    fn extraction_is_deterministic(
        inline in proptest::sample::subsequence(INLINABLE.to_vec(), 0..=INLINABLE.len()),
        descend in any::<bool>(),
        no_split in any::<bool>(),
    ) {
        let grammar = sql_grammar().inlined(inline.iter().copied()).unwrap();
        let extractor = Extractor::new("stmt").descend(descend).no_split(no_split);
        let first = extractor.extract(&grammar).unwrap().to_fragment(&Presentation::default());
        let second = extractor.extract(&grammar).unwrap().to_fragment(&Presentation::default());
        prop_assert_eq!(first, second);
    }
}
