use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn reduce_prints_unsplit_production() {
    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("reduce")
        .arg("--in")
        .arg(fixture_path("sql.ebnf"))
        .arg("--stmt")
        .arg("drop_stmt")
        .arg("--descend")
        .arg("false")
        .arg("--inline")
        .arg("drop_target");

    cmd.assert().success().stdout(
        predicate::str::starts_with("drop_stmt ::=\n\t'DROP' ( 'DATABASE' name | 'INDEX'")
            .and(predicate::str::contains("opt_if_exists ::=").not()),
    );
}

#[test]
fn reduce_reads_stdin_and_descends() {
    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("reduce")
        .arg("--stmt")
        .arg("stmt")
        .write_stdin("stmt : 'DROP' target ;\ntarget : 'TABLE' IDENT ;\n");

    cmd.assert().success().stdout(
        "stmt ::=\n\t'DROP' target\n\ntarget ::=\n\t'TABLE' identifier\n",
    );
}

#[test]
fn reduce_reports_unknown_production() {
    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("reduce")
        .arg("--stmt")
        .arg("missing")
        .write_stdin("stmt ::= 'A'\n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("couldn't find production `missing`"));
}

#[test]
fn bnf_normalizes_grammar() {
    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("bnf").arg("--addr").arg(fixture_path("sql.ebnf"));

    cmd.assert().success().stdout(
        predicate::str::starts_with("stmt_block ::=\n\tstmt_list\n\nstmt_list ::=\n")
            .and(predicate::str::contains("opt_transaction ::=\n\t'TRANSACTION'\n\t| \n")),
    );
}

#[test]
fn bnf_reports_syntax_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "stmt ::= 'DROP' (").unwrap();

    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("bnf").arg("--addr").arg(file.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("syntax error at line 2"));
}

#[test]
fn body_extracts_page_body() {
    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("body")
        .write_stdin("<html><head></head><body><svg/></body></html>");

    cmd.assert().success().stdout("<svg/>");
}

#[test]
fn list_statements_shows_catalog() {
    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("list-statements");

    cmd.assert().success().stdout(
        predicate::str::contains("drop_table (from drop_stmt)")
            .and(predicate::str::contains("  column_def\n")),
    );
}

#[test]
fn generate_bnf_prints_each_statement() {
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        config,
        r#"[[statements]]
name = "drop_stmt"
inline = ["drop_target"]
match = ["'DROP' 'DATABASE'"]
replace = [{{ from = "name", to = "database_name" }}]
"#
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("generate")
        .arg("--bnf")
        .arg("--config")
        .arg(config.path())
        .arg("--addr")
        .arg(fixture_path("sql.ebnf"))
        .arg("--filter")
        .arg("drop_stmt");

    cmd.assert().success().stdout(
        predicate::str::contains("drop_stmt: (PRE REPLACE)\n\ndrop_stmt ::=\n\t'DROP' 'DATABASE' name\n")
            .and(predicate::str::contains(
                "drop_stmt: (POST REPLACE)\n\ndrop_stmt ::=\n\t'DROP' 'DATABASE' database_name\n",
            ))
            .and(predicate::str::contains("stmt_block:").not()),
    );
}

#[test]
fn generate_exits_nonzero_when_a_statement_fails() {
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        config,
        "[[statements]]\nname = \"show_stmt\"\n\n[[statements]]\nname = \"grant_stmt\"\n"
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("sqldiagram");
    cmd.arg("generate")
        .arg("--bnf")
        .arg("--config")
        .arg(config.path())
        .arg("--addr")
        .arg(fixture_path("sql.ebnf"));

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("show_stmt: (POST REPLACE)"))
        .stdout(predicate::str::contains("stmt_block:\n\nstmt_block ::="))
        .stderr(predicate::str::contains(
            "grant_stmt: couldn't find production `grant_stmt`",
        ));
}
