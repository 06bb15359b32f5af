#![forbid(unsafe_code)]

mod codec;

pub use codec::{NAN_SENTINEL, NEG_INF_SENTINEL, POS_INF_SENTINEL, float_array};

use codec::{DecodedArray, EncodedArray};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const EXPECTED_KEY: &str = "expected";

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("fixture needs at least one input array")]
    NoInputs,
    #[error("input name '{0}' is reserved")]
    ReservedKey(String),
    #[error("input '{0}' appears more than once")]
    DuplicateKey(String),
    #[error("input '{key}' has {actual} elements but expected has {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid fixture json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed reading {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed writing {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("{} does not match its canonical encoding", path.display())]
    NotCanonical { path: PathBuf },
}

impl FixtureError {
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::NoInputs | Self::ReservedKey(_) | Self::DuplicateKey(_) => {
                "fixture_schema_invalid"
            }
            Self::LengthMismatch { .. } => "fixture_length_mismatch",
            Self::Json(_) => "fixture_json_invalid",
            Self::Read { .. } => "fixture_read_failed",
            Self::Write { .. } => "fixture_write_failed",
            Self::NotCanonical { .. } => "fixture_not_canonical",
        }
    }
}

/// Index-aligned reference inputs and outputs for one regime.
///
/// Inputs keep their insertion order, which is also the order keys are
/// written in; `expected` always comes last.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    inputs: Vec<(String, Vec<f64>)>,
    expected: Vec<f64>,
}

impl Fixture {
    pub fn new(
        inputs: Vec<(String, Vec<f64>)>,
        expected: Vec<f64>,
    ) -> Result<Self, FixtureError> {
        if inputs.is_empty() {
            return Err(FixtureError::NoInputs);
        }
        for (idx, (key, values)) in inputs.iter().enumerate() {
            if key == EXPECTED_KEY {
                return Err(FixtureError::ReservedKey(key.clone()));
            }
            if inputs[..idx].iter().any(|(other, _)| other == key) {
                return Err(FixtureError::DuplicateKey(key.clone()));
            }
            if values.len() != expected.len() {
                return Err(FixtureError::LengthMismatch {
                    key: key.clone(),
                    expected: expected.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(Self { inputs, expected })
    }

    #[must_use]
    pub fn inputs(&self) -> &[(String, Vec<f64>)] {
        &self.inputs
    }

    #[must_use]
    pub fn input(&self, key: &str) -> Option<&[f64]> {
        self.inputs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    #[must_use]
    pub fn expected(&self) -> &[f64] {
        &self.expected
    }

    /// Number of test cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String, FixtureError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Serialize for Fixture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.inputs.len() + 1))?;
        for (key, values) in &self.inputs {
            map.serialize_entry(key, &EncodedArray(values))?;
        }
        map.serialize_entry(EXPECTED_KEY, &EncodedArray(&self.expected))?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fixture {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FixtureVisitor;

        impl<'de> Visitor<'de> for FixtureVisitor {
            type Value = Fixture;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat object of equal-length float arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut inputs = Vec::new();
                let mut expected = None;
                while let Some(key) = map.next_key::<String>()? {
                    let DecodedArray(values) = map.next_value()?;
                    if key == EXPECTED_KEY {
                        if expected.replace(values).is_some() {
                            return Err(de::Error::duplicate_field(EXPECTED_KEY));
                        }
                    } else {
                        inputs.push((key, values));
                    }
                }
                let expected = expected.ok_or_else(|| de::Error::missing_field(EXPECTED_KEY))?;
                Fixture::new(inputs, expected).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(FixtureVisitor)
    }
}

/// Writes `fixture` to `path`, replacing any previous file. Parent
/// directories are created as needed.
pub fn write_fixture(path: &Path, fixture: &Fixture) -> Result<(), FixtureError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| FixtureError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let raw = fixture.to_json_string()?;
    fs::write(path, raw).map_err(|source| FixtureError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), cases = fixture.len(), "wrote fixture");
    Ok(())
}

pub fn read_fixture(path: &Path) -> Result<Fixture, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Fixture::from_json_str(&raw)
}
