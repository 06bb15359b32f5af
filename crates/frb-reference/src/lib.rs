#![forbid(unsafe_code)]

//! Reference implementations that fixtures are generated from.
//!
//! Values come from the `libm` crate (a port of musl's libm) so that the
//! golden outputs do not depend on the host C library. Two domain policies
//! are supported: [`DomainMode::Permissive`] returns IEEE NaN/infinities the
//! way numpy ufuncs do, [`DomainMode::Strict`] rejects arguments outside
//! the mathematical domain and finite arguments whose result overflows.

mod binary;
mod unary;

pub use binary::BinaryRef;
pub use unary::UnaryRef;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainMode {
    Strict,
    #[default]
    Permissive,
}

impl DomainMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReferenceError {
    #[error("unknown reference function '{0}'")]
    UnknownFunction(String),
    #[error("{function} takes {expected} input array(s), got {actual}")]
    ArityMismatch {
        function: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{function}: input '{param}' has {actual} elements, expected {expected}")]
    LengthMismatch {
        function: &'static str,
        param: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{function} reads its inputs as {expected:?}, got {actual:?}")]
    ParamNameMismatch {
        function: &'static str,
        expected: Vec<&'static str>,
        actual: Vec<String>,
    },
    #[error("{function}: math domain error at {args:?}")]
    OutOfDomain {
        function: &'static str,
        args: Vec<f64>,
    },
    #[error("{function}: math range error at {args:?}")]
    OutOfRange {
        function: &'static str,
        args: Vec<f64>,
    },
}

impl ReferenceError {
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::UnknownFunction(_) => "reference_function_unknown",
            Self::ArityMismatch { .. } => "reference_arity_mismatch",
            Self::LengthMismatch { .. } => "reference_input_length_mismatch",
            Self::ParamNameMismatch { .. } => "reference_param_name_mismatch",
            Self::OutOfDomain { .. } => "reference_domain_error",
            Self::OutOfRange { .. } => "reference_range_error",
        }
    }
}

/// Single-argument admissibility rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Admissible {
    All,
    Finite,
    Above(f64),
    AtLeast(f64),
    Open(f64, f64),
    Closed(f64, f64),
    NotNonPositiveInteger,
}

impl Admissible {
    fn admits(self, x: f64) -> bool {
        if x.is_nan() {
            return true;
        }
        match self {
            Self::All => true,
            Self::Finite => x.is_finite(),
            Self::Above(low) => x > low,
            Self::AtLeast(low) => x >= low,
            Self::Open(low, high) => x > low && x < high,
            Self::Closed(low, high) => (low..=high).contains(&x),
            Self::NotNonPositiveInteger => !(x <= 0.0 && x.fract() == 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceFn {
    Unary(UnaryRef),
    Binary(BinaryRef),
}

impl From<UnaryRef> for ReferenceFn {
    fn from(value: UnaryRef) -> Self {
        Self::Unary(value)
    }
}

impl From<BinaryRef> for ReferenceFn {
    fn from(value: BinaryRef) -> Self {
        Self::Binary(value)
    }
}

impl fmt::Display for ReferenceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ReferenceFn {
    /// Every catalogued function, unary first.
    #[must_use]
    pub fn all() -> Vec<Self> {
        UnaryRef::ALL
            .into_iter()
            .map(Self::Unary)
            .chain(BinaryRef::ALL.into_iter().map(Self::Binary))
            .collect()
    }

    pub fn from_name(name: &str) -> Result<Self, ReferenceError> {
        let wanted = name.trim();
        Self::all()
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| ReferenceError::UnknownFunction(name.to_string()))
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unary(op) => op.name(),
            Self::Binary(op) => op.name(),
        }
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }

    #[must_use]
    pub fn param_names(self) -> Vec<&'static str> {
        match self {
            Self::Unary(_) => vec!["x"],
            Self::Binary(op) => op.param_names().to_vec(),
        }
    }

    /// Checks that `names` labels the inputs in the order they are read.
    pub fn check_param_names(self, names: &[&str]) -> Result<(), ReferenceError> {
        if names.len() != self.arity() {
            return Err(ReferenceError::ArityMismatch {
                function: self.name(),
                expected: self.arity(),
                actual: names.len(),
            });
        }
        let expected = self.param_names();
        if names != expected.as_slice() {
            return Err(ReferenceError::ParamNameMismatch {
                function: self.name(),
                expected,
                actual: names.iter().map(|name| (*name).to_string()).collect(),
            });
        }
        Ok(())
    }

    /// Whether `args` lies in the mathematical domain. NaN is always
    /// admitted since it propagates without raising.
    #[must_use]
    pub fn admits(self, args: &[f64]) -> bool {
        match (self, args) {
            (Self::Unary(op), [x]) => op.admissible().admits(*x),
            (Self::Binary(op), [lhs, rhs]) => op.admits(*lhs, *rhs),
            _ => false,
        }
    }

    /// Evaluates one argument tuple under `mode`.
    pub fn eval(self, args: &[f64], mode: DomainMode) -> Result<f64, ReferenceError> {
        if args.len() != self.arity() {
            return Err(ReferenceError::ArityMismatch {
                function: self.name(),
                expected: self.arity(),
                actual: args.len(),
            });
        }

        let out = match self {
            Self::Unary(op) => op.apply(args[0]),
            Self::Binary(op) => op.apply(args[0], args[1]),
        };

        if mode == DomainMode::Strict {
            if !self.admits(args) {
                return Err(ReferenceError::OutOfDomain {
                    function: self.name(),
                    args: args.to_vec(),
                });
            }
            if out.is_infinite() && args.iter().all(|a| a.is_finite()) {
                return Err(ReferenceError::OutOfRange {
                    function: self.name(),
                    args: args.to_vec(),
                });
            }
        }
        Ok(out)
    }
}

/// Element-wise evaluation over index-aligned input columns.
pub fn evaluate(
    function: ReferenceFn,
    columns: &[&[f64]],
    mode: DomainMode,
) -> Result<Vec<f64>, ReferenceError> {
    if columns.len() != function.arity() {
        return Err(ReferenceError::ArityMismatch {
            function: function.name(),
            expected: function.arity(),
            actual: columns.len(),
        });
    }

    let len = columns[0].len();
    for (param, column) in function.param_names().into_iter().zip(columns) {
        if column.len() != len {
            return Err(ReferenceError::LengthMismatch {
                function: function.name(),
                param,
                expected: len,
                actual: column.len(),
            });
        }
    }

    let mut args = vec![0.0; columns.len()];
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        for (slot, column) in args.iter_mut().zip(columns) {
            *slot = column[i];
        }
        out.push(function.eval(&args, mode)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{BinaryRef, DomainMode, ReferenceError, ReferenceFn, UnaryRef, evaluate};
    use proptest::prelude::*;

    #[test]
    fn catalogue_names_are_unique_and_resolvable() {
        let all = ReferenceFn::all();
        assert_eq!(all.len(), UnaryRef::ALL.len() + BinaryRef::ALL.len());
        for function in &all {
            assert_eq!(
                ReferenceFn::from_name(function.name()).expect("resolvable"),
                *function
            );
        }
        let mut names: Vec<&str> = all.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = ReferenceFn::from_name("zeta").expect_err("unknown");
        assert_eq!(err.reason_code(), "reference_function_unknown");
    }

    #[test]
    fn identity_evaluates_elementwise() {
        let x = [0.0, 1.0, 2.0];
        let out = evaluate(UnaryRef::Identity.into(), &[&x], DomainMode::Strict).expect("eval");
        assert_eq!(out, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn known_values() {
        let floor = ReferenceFn::from(UnaryRef::Floor);
        assert_eq!(floor.eval(&[1.5], DomainMode::Strict), Ok(1.0));
        assert_eq!(floor.eval(&[-1.5], DomainMode::Strict), Ok(-2.0));

        let gamma = ReferenceFn::from(UnaryRef::Gamma);
        let five = gamma.eval(&[5.0], DomainMode::Strict).expect("gamma(5)");
        assert!((five - 24.0).abs() < 1e-12);

        let erf = ReferenceFn::from(UnaryRef::Erf);
        assert_eq!(erf.eval(&[0.0], DomainMode::Strict), Ok(0.0));

        let hypot = ReferenceFn::from(BinaryRef::Hypot);
        assert_eq!(hypot.eval(&[3.0, 4.0], DomainMode::Strict), Ok(5.0));

        let round = ReferenceFn::from(UnaryRef::Round);
        assert_eq!(round.eval(&[2.5], DomainMode::Strict), Ok(3.0));
        assert_eq!(round.eval(&[-2.5], DomainMode::Strict), Ok(-3.0));
    }

    #[test]
    fn strict_mode_raises_on_domain_errors() {
        let ln = ReferenceFn::from(UnaryRef::Ln);
        let err = ln.eval(&[-1.0], DomainMode::Strict).expect_err("ln(-1)");
        assert!(matches!(err, ReferenceError::OutOfDomain { function: "ln", .. }));
        assert!(ln.eval(&[0.0], DomainMode::Strict).is_err());

        let gamma = ReferenceFn::from(UnaryRef::Gamma);
        assert!(gamma.eval(&[-3.0], DomainMode::Strict).is_err());
        assert!(gamma.eval(&[-2.5], DomainMode::Strict).is_ok());

        let pow = ReferenceFn::from(BinaryRef::Pow);
        assert!(pow.eval(&[-8.0, 1.0 / 3.0], DomainMode::Strict).is_err());
        assert!(pow.eval(&[0.0, -1.0], DomainMode::Strict).is_err());
        assert_eq!(pow.eval(&[-2.0, 3.0], DomainMode::Strict), Ok(-8.0));

        let fmod = ReferenceFn::from(BinaryRef::Fmod);
        assert!(fmod.eval(&[1.0, 0.0], DomainMode::Strict).is_err());
    }

    #[test]
    fn strict_mode_raises_on_overflow() {
        let exp = ReferenceFn::from(UnaryRef::Exp);
        let err = exp.eval(&[1000.0], DomainMode::Strict).expect_err("overflow");
        assert_eq!(err.reason_code(), "reference_range_error");
        assert_eq!(exp.eval(&[f64::INFINITY], DomainMode::Strict), Ok(f64::INFINITY));
    }

    #[test]
    fn permissive_mode_returns_ieee_values() {
        let ln = ReferenceFn::from(UnaryRef::Ln);
        assert!(ln.eval(&[-1.0], DomainMode::Permissive).expect("nan").is_nan());
        assert_eq!(ln.eval(&[0.0], DomainMode::Permissive), Ok(f64::NEG_INFINITY));

        let exp = ReferenceFn::from(UnaryRef::Exp);
        assert_eq!(exp.eval(&[1000.0], DomainMode::Permissive), Ok(f64::INFINITY));
    }

    #[test]
    fn admits_reports_domain_membership() {
        let acosh = ReferenceFn::from(UnaryRef::Acosh);
        assert!(acosh.admits(&[1.0]));
        assert!(!acosh.admits(&[0.5]));
        assert!(!acosh.admits(&[1.0, 2.0]));

        let atan2 = ReferenceFn::from(BinaryRef::Atan2);
        assert!(atan2.admits(&[0.0, 0.0]));
    }

    #[test]
    fn nan_passes_through_strict_mode() {
        let sqrt = ReferenceFn::from(UnaryRef::Sqrt);
        assert!(sqrt.eval(&[f64::NAN], DomainMode::Strict).expect("nan").is_nan());
    }

    #[test]
    fn arity_and_length_are_checked() {
        let atan2 = ReferenceFn::from(BinaryRef::Atan2);
        assert_eq!(atan2.param_names(), vec!["y", "x"]);
        let x = [1.0, 2.0];
        let err = evaluate(atan2, &[&x], DomainMode::Permissive).expect_err("arity");
        assert!(matches!(
            err,
            ReferenceError::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));

        let y = [1.0];
        let err = evaluate(atan2, &[&x, &y], DomainMode::Permissive).expect_err("length");
        assert!(matches!(
            err,
            ReferenceError::LengthMismatch {
                param: "x",
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn param_names_must_match_read_order() {
        let atan2 = ReferenceFn::from(BinaryRef::Atan2);
        assert_eq!(atan2.check_param_names(&["y", "x"]), Ok(()));

        let err = atan2.check_param_names(&["x", "y"]).expect_err("swapped");
        assert_eq!(err.reason_code(), "reference_param_name_mismatch");
        assert!(matches!(
            err,
            ReferenceError::ParamNameMismatch { function: "atan2", ref expected, .. }
                if expected == &["y", "x"]
        ));

        let floor = ReferenceFn::from(UnaryRef::Floor);
        assert!(floor.check_param_names(&["t"]).is_err());
        let err = floor.check_param_names(&["x", "y"]).expect_err("arity");
        assert_eq!(err.reason_code(), "reference_arity_mismatch");
    }

    proptest! {
        #[test]
        fn evaluate_output_is_index_aligned(values in proptest::collection::vec(-50.0f64..50.0, 1..64)) {
            let exp = ReferenceFn::from(UnaryRef::Exp);
            let out = evaluate(exp, &[&values], DomainMode::Permissive).expect("eval");
            prop_assert_eq!(out.len(), values.len());
            for (x, y) in values.iter().zip(&out) {
                prop_assert_eq!(*y, libm::exp(*x));
            }
        }
    }
}
