//! Float array encoding for fixture files.
//!
//! JSON has no spelling for non-finite numbers, so they are written as the
//! string sentinels `"NaN"`, `"Infinity"` and `"-Infinity"`. Finite values
//! use serde_json's shortest round-trip formatting.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAN_SENTINEL: &str = "NaN";
pub const POS_INF_SENTINEL: &str = "Infinity";
pub const NEG_INF_SENTINEL: &str = "-Infinity";

pub(crate) struct EncodedArray<'a>(pub &'a [f64]);

impl Serialize for EncodedArray<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in self.0 {
            seq.serialize_element(&EncodedValue(*value))?;
        }
        seq.end()
    }
}

struct EncodedValue(f64);

impl Serialize for EncodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_nan() {
            serializer.serialize_str(NAN_SENTINEL)
        } else if v == f64::INFINITY {
            serializer.serialize_str(POS_INF_SENTINEL)
        } else if v == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INF_SENTINEL)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

pub(crate) struct DecodedArray(pub Vec<f64>);

impl<'de> Deserialize<'de> for DecodedArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArrayVisitor;

        impl<'de> Visitor<'de> for ArrayVisitor {
            type Value = DecodedArray;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of numbers or non-finite sentinels")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(DecodedValue(v)) = seq.next_element()? {
                    out.push(v);
                }
                Ok(DecodedArray(out))
            }
        }

        deserializer.deserialize_seq(ArrayVisitor)
    }
}

struct DecodedValue(f64);

impl<'de> Deserialize<'de> for DecodedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = DecodedValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or one of \"NaN\", \"Infinity\", \"-Infinity\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(DecodedValue(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(DecodedValue(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(DecodedValue(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v {
                    NAN_SENTINEL => Ok(DecodedValue(f64::NAN)),
                    POS_INF_SENTINEL => Ok(DecodedValue(f64::INFINITY)),
                    NEG_INF_SENTINEL => Ok(DecodedValue(f64::NEG_INFINITY)),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// `#[serde(with = "frb_fixture::float_array")]` adapter for `Vec<f64>`
/// fields that may hold non-finite values.
pub mod float_array {
    use super::{DecodedArray, EncodedArray};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        EncodedArray(values).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        DecodedArray::deserialize(deserializer).map(|DecodedArray(values)| values)
    }
}
