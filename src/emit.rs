//! Writing finished diagrams to disk

use crate::batch::{Artifact, BatchReport};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `contents` to `base_dir/file`, creating `base_dir` if needed.
pub fn write_artifact(base_dir: &Path, file: &str, contents: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(base_dir)?;
    let path = base_dir.join(file);
    fs::write(&path, contents)?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

/// Write every rendered diagram of `report`. Failed statements and EBNF-only
/// results are skipped.
pub fn write_report(base_dir: &Path, report: &BatchReport) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for outcome in &report.outcomes {
        if let Ok(Artifact::Diagram { markup, .. }) = &outcome.result {
            written.push(write_artifact(base_dir, &outcome.file, markup)?);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{SpecFailure, SpecOutcome};
    use crate::ebnf::GrammarError;
    use crate::pipeline::PipelineError;

    fn diagram(name: &str, file: &str) -> SpecOutcome {
        SpecOutcome {
            name: name.to_string(),
            file: file.to_string(),
            result: Ok(Artifact::Diagram {
                markup: format!("<svg>{}</svg>", name),
                references: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_write_artifact_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("sql").join("diagrams");
        let path = write_artifact(&base, "drop.html", "<svg/>").unwrap();
        assert_eq!(path, base.join("drop.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<svg/>");
    }

    #[test]
    fn test_write_report_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let report = BatchReport {
            outcomes: vec![
                diagram("stmt_block", "grammar.html"),
                SpecOutcome {
                    name: "missing_stmt".to_string(),
                    file: "missing.html".to_string(),
                    result: Err(SpecFailure {
                        spec: "missing_stmt".to_string(),
                        error: PipelineError::Grammar(GrammarError::UnknownProduction {
                            name: "missing_stmt".to_string(),
                        }),
                    }),
                },
                diagram("drop_stmt", "drop.html"),
            ],
        };

        let written = write_report(dir.path(), &report).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("grammar.html"), dir.path().join("drop.html")]
        );
        assert!(!dir.path().join("missing.html").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("drop.html")).unwrap(),
            "<svg>drop_stmt</svg>"
        );
    }
}
