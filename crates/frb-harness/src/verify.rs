//! Checks a fixture tree the way its consumers read it: every file parses,
//! inputs line up with `expected`, and rewriting the parsed record yields
//! the same bytes.

use crate::HarnessError;
use frb_fixture::{Fixture, FixtureError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub path: PathBuf,
    pub reason_code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub checked: usize,
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns a report with failures into an error.
    pub fn into_result(self) -> Result<usize, HarnessError> {
        if self.all_passed() {
            Ok(self.checked)
        } else {
            Err(HarnessError::VerificationFailed {
                checked: self.checked,
                failed: self.failures.len(),
            })
        }
    }
}

pub fn verify_fixture_file(path: &Path) -> Result<Fixture, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fixture = Fixture::from_json_str(&raw)?;
    if fixture.to_json_string()? != raw {
        return Err(FixtureError::NotCanonical {
            path: path.to_path_buf(),
        });
    }
    Ok(fixture)
}

/// Verifies every `root/<function>/*.json` file, in sorted order.
pub fn verify_fixture_tree(root: &Path) -> Result<VerificationReport, HarnessError> {
    let mut report = VerificationReport::default();
    for dir in sorted_entries(root)? {
        if !dir.is_dir() {
            continue;
        }
        for path in sorted_entries(&dir)? {
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            report.checked += 1;
            match verify_fixture_file(&path) {
                Ok(fixture) => {
                    tracing::debug!(path = %path.display(), cases = fixture.len(), "fixture ok");
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), reason_code = err.reason_code(), "{err}");
                    report.failures.push(VerificationFailure {
                        path,
                        reason_code: err.reason_code(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }
    Ok(report)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let entries = fs::read_dir(dir).map_err(|source| HarnessError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| HarnessError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::{verify_fixture_file, verify_fixture_tree};
    use crate::generator::{fixture_suite, generate_suite};
    use frb_reference::{BinaryRef, DomainMode, UnaryRef};
    use std::fs;

    #[test]
    fn generated_tree_verifies() {
        let root = tempfile::tempdir().expect("tempdir");
        let floor = generate_suite(
            root.path(),
            &fixture_suite(UnaryRef::Floor.into()),
            DomainMode::Permissive,
        )
        .expect("floor");
        let hypot = generate_suite(
            root.path(),
            &fixture_suite(BinaryRef::Hypot.into()),
            DomainMode::Permissive,
        )
        .expect("hypot");

        let report = verify_fixture_tree(root.path()).expect("walk");
        assert_eq!(report.checked, floor.len() + hypot.len());
        assert!(report.all_passed(), "{:?}", report.failures);
        assert_eq!(report.into_result().expect("ok"), floor.len() + hypot.len());
    }

    #[test]
    fn hand_edited_files_are_reported() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("abs");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("mismatch.json"), r#"{"x":[1.0,2.0],"expected":[1.0]}"#)
            .expect("write");
        fs::write(dir.join("spaced.json"), r#"{"x": [1.0], "expected": [1.0]}"#).expect("write");
        fs::write(dir.join("good.json"), r#"{"x":[-1.0],"expected":[1.0]}"#).expect("write");
        fs::write(dir.join("notes.txt"), "ignored").expect("write");

        let report = verify_fixture_tree(root.path()).expect("walk");
        assert_eq!(report.checked, 3);
        let codes: Vec<&str> = report.failures.iter().map(|f| f.reason_code).collect();
        assert_eq!(codes, vec!["fixture_json_invalid", "fixture_not_canonical"]);

        let err = report.into_result().expect_err("failures");
        assert_eq!(err.reason_code(), "fixture_verification_failed");
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let err = verify_fixture_tree(&root.path().join("absent")).expect_err("missing");
        assert_eq!(err.reason_code(), "harness_io_failed");
        assert!(verify_fixture_file(&root.path().join("absent.json")).is_err());
    }
}
