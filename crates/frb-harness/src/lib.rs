#![forbid(unsafe_code)]

pub mod benchmark;
pub mod generator;
pub mod logging;
pub mod suites;
pub mod verify;

use frb_domain::DomainError;
use frb_fixture::FixtureError;
use frb_ndarray::ShapeError;
use frb_reference::{DomainMode, ReferenceError};
use frb_tap::TapError;
use std::io;
use std::path::PathBuf;

pub use benchmark::DEFAULT_REPEATS;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Tap(#[from] TapError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("failed serializing baseline: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("repeats must be > 0")]
    NoRepeats,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{failed} of {checked} fixture files failed verification")]
    VerificationFailed { checked: usize, failed: usize },
}

impl HarnessError {
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Tap(err) => err.reason_code(),
            Self::Domain(err) => err.reason_code(),
            Self::Reference(err) => err.reason_code(),
            Self::Fixture(err) => err.reason_code(),
            Self::Shape(err) => err.reason_code(),
            Self::Json(_) => "baseline_serialize_failed",
            Self::Io { .. } => "harness_io_failed",
            Self::NoRepeats => "benchmark_repeats_invalid",
            Self::InvalidArgument(_) => "harness_argument_invalid",
            Self::VerificationFailed { .. } => "fixture_verification_failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub fixture_root: PathBuf,
    pub artifact_root: PathBuf,
    pub namespace: String,
    pub repeats: usize,
    pub domain_mode: DomainMode,
}

impl HarnessConfig {
    #[must_use]
    pub fn default_paths() -> Self {
        let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
        Self {
            fixture_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"),
            artifact_root: repo_root.join("artifacts/baselines"),
            namespace: suites::MATH_NAMESPACE.to_string(),
            repeats: DEFAULT_REPEATS,
            domain_mode: DomainMode::default(),
        }
    }

    #[must_use]
    pub fn with_fixture_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fixture_root = root.into();
        self
    }

    #[must_use]
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = root.into();
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    #[must_use]
    pub fn with_domain_mode(mut self, mode: DomainMode) -> Self {
        self.domain_mode = mode;
        self
    }

    /// Applies `--repeats N`, `--domain-mode strict|permissive`,
    /// `--fixture-root PATH` and `--artifact-root PATH` overrides.
    pub fn with_args<I>(mut self, args: I) -> Result<Self, HarnessError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let value = args
                .next()
                .ok_or_else(|| HarnessError::InvalidArgument(format!("{arg} requires a value")))?;
            match arg.as_str() {
                "--repeats" => {
                    let repeats = value.parse::<usize>().map_err(|err| {
                        HarnessError::InvalidArgument(format!(
                            "invalid --repeats value '{value}': {err}"
                        ))
                    })?;
                    self = self.with_repeats(repeats);
                }
                "--domain-mode" => {
                    let mode = [DomainMode::Strict, DomainMode::Permissive]
                        .into_iter()
                        .find(|mode| mode.as_str() == value)
                        .ok_or_else(|| {
                            HarnessError::InvalidArgument(format!(
                                "invalid --domain-mode value '{value}'"
                            ))
                        })?;
                    self = self.with_domain_mode(mode);
                }
                "--fixture-root" => self = self.with_fixture_root(value),
                "--artifact-root" => self = self.with_artifact_root(value),
                _ => {
                    return Err(HarnessError::InvalidArgument(format!(
                        "unknown argument '{arg}'"
                    )));
                }
            }
        }
        Ok(self)
    }

    /// Where a benchmark run writes its baseline.
    #[must_use]
    pub fn baseline_path(&self) -> PathBuf {
        let slug: String = self
            .namespace
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.artifact_root.join(format!("{slug}_baseline.json"))
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::default_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_REPEATS, HarnessConfig, HarnessError};
    use frb_reference::{DomainMode, ReferenceFn};

    #[test]
    fn default_config_is_permissive_with_three_repeats() {
        let cfg = HarnessConfig::default_paths();
        assert_eq!(cfg.repeats, DEFAULT_REPEATS);
        assert_eq!(cfg.repeats, 3);
        assert_eq!(cfg.domain_mode, DomainMode::Permissive);
        assert_eq!(cfg.namespace, "rust::libm");
        assert!(cfg.fixture_root.ends_with("fixtures"));
    }

    #[test]
    fn setters_override_fields() {
        let cfg = HarnessConfig::default()
            .with_fixture_root("/tmp/fx")
            .with_artifact_root("/tmp/art")
            .with_namespace("rust::frb-ndarray")
            .with_repeats(1)
            .with_domain_mode(DomainMode::Strict);
        assert_eq!(cfg.repeats, 1);
        assert_eq!(cfg.domain_mode, DomainMode::Strict);
        assert_eq!(
            cfg.baseline_path(),
            std::path::PathBuf::from("/tmp/art/rust__frb_ndarray_baseline.json")
        );
    }

    #[test]
    fn command_line_overrides_apply_in_order() {
        let args = [
            "--repeats",
            "5",
            "--domain-mode",
            "strict",
            "--fixture-root",
            "/tmp/fx",
        ]
        .map(String::from);
        let cfg = HarnessConfig::default().with_args(args).expect("args");
        assert_eq!(cfg.repeats, 5);
        assert_eq!(cfg.domain_mode, DomainMode::Strict);
        assert_eq!(cfg.fixture_root, std::path::PathBuf::from("/tmp/fx"));

        let unchanged = HarnessConfig::default().with_args(Vec::new()).expect("empty");
        assert_eq!(unchanged.repeats, DEFAULT_REPEATS);
    }

    #[test]
    fn bad_command_line_arguments_are_rejected() {
        for args in [
            vec!["--repeats"],
            vec!["--repeats", "many"],
            vec!["--domain-mode", "lenient"],
            vec!["--verbose", "1"],
        ] {
            let err = HarnessConfig::default()
                .with_args(args.into_iter().map(String::from))
                .expect_err("invalid");
            assert_eq!(err.reason_code(), "harness_argument_invalid");
        }
    }

    #[test]
    fn reason_codes_pass_through_wrapped_errors() {
        let err: HarnessError = ReferenceFn::from_name("zeta").expect_err("unknown").into();
        assert_eq!(err.reason_code(), "reference_function_unknown");
        assert_eq!(HarnessError::NoRepeats.reason_code(), "benchmark_repeats_invalid");
    }
}
