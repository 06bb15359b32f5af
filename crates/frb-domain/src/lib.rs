#![forbid(unsafe_code)]

//! Builders for the input arrays that fixtures and benchmarks are evaluated
//! over. Every builder is deterministic: evenly spaced grids by construction,
//! random regimes through an explicitly seeded [`DeterministicRng`].

mod rng;

pub use rng::{DEFAULT_RNG_SEED, DeterministicRng};

use serde::{Deserialize, Serialize};

/// Machine epsilon for `f64`.
pub const EPS: f64 = f64::EPSILON;
/// Smallest positive subnormal `f64`.
pub const SMALLEST_SUBNORMAL: f64 = 4.940_656_458_412_465_4e-324;
/// Smallest positive normal `f64`.
pub const SMALLEST_NORMAL: f64 = f64::MIN_POSITIVE;
/// Natural log of `f64::MAX`; `exp` overflows above it.
pub const LN_MAX: f64 = 709.782_712_893_384;
/// Largest integer `n` such that every integer in `[-n, n]` is representable.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("domain length must be > 0")]
    EmptyDomain,
    #[error("domain bound must be finite, got {0}")]
    NonFiniteBound(f64),
    #[error("uniform domain requires low < high, got [{low}, {high})")]
    InvertedBounds { low: f64, high: f64 },
    #[error("uniform domain width overflows: [{low}, {high})")]
    WidthOverflow { low: f64, high: f64 },
}

impl DomainError {
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::EmptyDomain => "domain_length_zero",
            Self::NonFiniteBound(_) => "domain_bound_non_finite",
            Self::InvertedBounds { .. } => "domain_bounds_inverted",
            Self::WidthOverflow { .. } => "domain_width_overflow",
        }
    }
}

fn check_bound(value: f64) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFiniteBound(value))
    }
}

/// Evenly spaced values over `[start, stop]`, endpoint included.
///
/// Follows `numpy.linspace`: element `i` is `start + i * step` and the last
/// element is exactly `stop`.
pub fn linspace(start: f64, stop: f64, len: usize) -> Result<Vec<f64>, DomainError> {
    check_bound(start)?;
    check_bound(stop)?;
    if len == 0 {
        return Err(DomainError::EmptyDomain);
    }
    if len == 1 {
        return Ok(vec![start]);
    }

    let div = (len - 1) as f64;
    let step = (stop - start) / div;
    let mut out: Vec<f64> = if step.is_finite() {
        (0..len).map(|i| start + i as f64 * step).collect()
    } else {
        // The span itself overflowed; interpolate without forming it.
        (0..len)
            .map(|i| {
                let t = i as f64 / div;
                start * (1.0 - t) + stop * t
            })
            .collect()
    };
    out[len - 1] = stop;
    Ok(out)
}

/// `10^x` for `x` in `linspace(start_exp, stop_exp, len)`.
pub fn logspace(start_exp: f64, stop_exp: f64, len: usize) -> Result<Vec<f64>, DomainError> {
    Ok(linspace(start_exp, stop_exp, len)?
        .into_iter()
        .map(|x| 10f64.powf(x))
        .collect())
}

/// `len` draws from `[low, high)` using a generator seeded with `seed`.
pub fn sample_uniform(len: usize, low: f64, high: f64, seed: u64) -> Result<Vec<f64>, DomainError> {
    check_bound(low)?;
    check_bound(high)?;
    if len == 0 {
        return Err(DomainError::EmptyDomain);
    }
    if low >= high {
        return Err(DomainError::InvertedBounds { low, high });
    }
    if !(high - low).is_finite() {
        return Err(DomainError::WidthOverflow { low, high });
    }

    let mut rng = DeterministicRng::new(seed);
    Ok((0..len).map(|_| rng.uniform(low, high)).collect())
}

/// Declarative description of one input array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainSpec {
    Linspace { start: f64, stop: f64, len: usize },
    Logspace { start_exp: f64, stop_exp: f64, len: usize },
    Uniform { low: f64, high: f64, len: usize, seed: u64 },
    Values {
        #[serde(with = "frb_fixture::float_array")]
        values: Vec<f64>,
    },
    Concat { parts: Vec<DomainSpec> },
}

impl DomainSpec {
    #[must_use]
    pub fn linspace(start: f64, stop: f64, len: usize) -> Self {
        Self::Linspace { start, stop, len }
    }

    #[must_use]
    pub fn logspace(start_exp: f64, stop_exp: f64, len: usize) -> Self {
        Self::Logspace {
            start_exp,
            stop_exp,
            len,
        }
    }

    #[must_use]
    pub fn uniform(low: f64, high: f64, len: usize, seed: u64) -> Self {
        Self::Uniform {
            low,
            high,
            len,
            seed,
        }
    }

    #[must_use]
    pub fn values(values: impl Into<Vec<f64>>) -> Self {
        Self::Values {
            values: values.into(),
        }
    }

    #[must_use]
    pub fn concat(parts: impl Into<Vec<DomainSpec>>) -> Self {
        Self::Concat {
            parts: parts.into(),
        }
    }

    /// Number of elements `materialize` will produce.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Linspace { len, .. } | Self::Logspace { len, .. } | Self::Uniform { len, .. } => {
                *len
            }
            Self::Values { values } => values.len(),
            Self::Concat { parts } => parts.iter().map(Self::len).sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn materialize(&self) -> Result<Vec<f64>, DomainError> {
        match self {
            Self::Linspace { start, stop, len } => linspace(*start, *stop, *len),
            Self::Logspace {
                start_exp,
                stop_exp,
                len,
            } => logspace(*start_exp, *stop_exp, *len),
            Self::Uniform {
                low,
                high,
                len,
                seed,
            } => sample_uniform(*len, *low, *high, *seed),
            Self::Values { values } => {
                if values.is_empty() {
                    Err(DomainError::EmptyDomain)
                } else {
                    Ok(values.clone())
                }
            }
            Self::Concat { parts } => {
                if parts.is_empty() {
                    return Err(DomainError::EmptyDomain);
                }
                let mut out = Vec::with_capacity(self.len());
                for part in parts {
                    out.extend(part.materialize()?);
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DomainError, DomainSpec, EPS, LN_MAX, SMALLEST_NORMAL, SMALLEST_SUBNORMAL, linspace,
        logspace, sample_uniform,
    };
    use proptest::prelude::*;

    #[test]
    fn linspace_matches_numpy_endpoints() {
        let out = linspace(0.0, 1.0, 5).expect("linspace");
        assert_eq!(out, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let single = linspace(3.0, 9.0, 1).expect("single");
        assert_eq!(single, vec![3.0]);
    }

    #[test]
    fn linspace_last_element_is_exact_stop() {
        let out = linspace(-0.1, 0.7, 1003).expect("linspace");
        assert_eq!(out.first().copied(), Some(-0.1));
        assert_eq!(out.last().copied(), Some(0.7));
    }

    #[test]
    fn linspace_handles_span_overflow() {
        let out = linspace(-f64::MAX, f64::MAX, 3).expect("wide linspace");
        assert_eq!(out[0], -f64::MAX);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], f64::MAX);
    }

    #[test]
    fn linspace_rejects_empty_and_non_finite() {
        assert_eq!(linspace(0.0, 1.0, 0), Err(DomainError::EmptyDomain));
        assert!(matches!(
            linspace(f64::NAN, 1.0, 2),
            Err(DomainError::NonFiniteBound(_))
        ));
    }

    #[test]
    fn logspace_spans_decades() {
        let out = logspace(-2.0, 2.0, 5).expect("logspace");
        let expected = [0.01, 0.1, 1.0, 10.0, 100.0];
        assert_eq!(out.len(), expected.len());
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() <= want * 4.0 * f64::EPSILON, "{got} vs {want}");
        }
    }

    #[test]
    fn uniform_sampling_is_reproducible() {
        let lhs = sample_uniform(256, -5.0, 5.0, 0xABCD).expect("lhs");
        let rhs = sample_uniform(256, -5.0, 5.0, 0xABCD).expect("rhs");
        assert_eq!(lhs, rhs);
        assert!(lhs.iter().all(|v| (-5.0..5.0).contains(v)));
    }

    #[test]
    fn uniform_sampling_validates_bounds() {
        assert!(matches!(
            sample_uniform(4, 1.0, 1.0, 0),
            Err(DomainError::InvertedBounds { .. })
        ));
        assert!(matches!(
            sample_uniform(4, -f64::MAX, f64::MAX, 0),
            Err(DomainError::WidthOverflow { .. })
        ));
        let err = sample_uniform(0, 0.0, 1.0, 0).expect_err("empty");
        assert_eq!(err.reason_code(), "domain_length_zero");
    }

    #[test]
    fn concat_preserves_part_order() {
        let spec = DomainSpec::concat(vec![
            DomainSpec::values(vec![-1.0]),
            DomainSpec::linspace(0.0, 1.0, 3),
        ]);
        assert_eq!(spec.len(), 4);
        assert_eq!(
            spec.materialize().expect("concat"),
            vec![-1.0, 0.0, 0.5, 1.0]
        );
    }

    #[test]
    fn empty_specs_are_rejected() {
        assert!(DomainSpec::values(Vec::new()).materialize().is_err());
        assert!(DomainSpec::concat(Vec::new()).materialize().is_err());
    }

    #[test]
    fn non_finite_values_survive_json() {
        let spec = DomainSpec::values(vec![-0.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN]);
        let raw = serde_json::to_string(&spec).expect("serialize");
        assert_eq!(
            raw,
            r#"{"kind":"values","values":[-0.0,"Infinity","-Infinity","NaN"]}"#
        );

        let back: DomainSpec = serde_json::from_str(&raw).expect("deserialize");
        let values = back.materialize().expect("values");
        assert_eq!(values[0].to_bits(), (-0.0f64).to_bits());
        assert_eq!(&values[1..3], &[f64::INFINITY, f64::NEG_INFINITY]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn boundary_constants_are_consistent() {
        assert_eq!(SMALLEST_SUBNORMAL, f64::from_bits(1));
        assert!(SMALLEST_NORMAL > SMALLEST_SUBNORMAL);
        assert_eq!(1.0 + EPS / 4.0, 1.0);
        assert!(LN_MAX.exp().is_finite());
        assert!((LN_MAX + 1e-3).exp().is_infinite());
    }

    proptest! {
        #[test]
        fn materialized_length_matches_declared(
            start in -1e6f64..1e6,
            width in 1e-3f64..1e6,
            len in 1usize..512,
            seed in any::<u64>(),
        ) {
            for spec in [
                DomainSpec::linspace(start, start + width, len),
                DomainSpec::uniform(start, start + width, len, seed),
            ] {
                prop_assert_eq!(spec.materialize().expect("materialize").len(), spec.len());
            }
        }
    }
}
