use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryRef {
    Atan2,
    Hypot,
    Pow,
    Fmod,
    Copysign,
    Fmax,
    Fmin,
}

impl BinaryRef {
    pub const ALL: [Self; 7] = [
        Self::Atan2,
        Self::Hypot,
        Self::Pow,
        Self::Fmod,
        Self::Copysign,
        Self::Fmax,
        Self::Fmin,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Atan2 => "atan2",
            Self::Hypot => "hypot",
            Self::Pow => "pow",
            Self::Fmod => "fmod",
            Self::Copysign => "copysign",
            Self::Fmax => "fmax",
            Self::Fmin => "fmin",
        }
    }

    /// Argument names as they appear in fixture files.
    #[must_use]
    pub const fn param_names(self) -> [&'static str; 2] {
        match self {
            Self::Atan2 => ["y", "x"],
            _ => ["x", "y"],
        }
    }

    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Atan2 => libm::atan2(lhs, rhs),
            Self::Hypot => libm::hypot(lhs, rhs),
            Self::Pow => libm::pow(lhs, rhs),
            Self::Fmod => libm::fmod(lhs, rhs),
            Self::Copysign => libm::copysign(lhs, rhs),
            // fmax/fmin ignore NaN (return the non-NaN value)
            Self::Fmax => libm::fmax(lhs, rhs),
            Self::Fmin => libm::fmin(lhs, rhs),
        }
    }

    /// Whether the pair lies in the function's domain.
    pub(crate) fn admits(self, lhs: f64, rhs: f64) -> bool {
        if lhs.is_nan() || rhs.is_nan() {
            return true;
        }
        match self {
            Self::Pow => {
                let negative_base_fractional =
                    lhs < 0.0 && lhs.is_finite() && rhs.is_finite() && rhs.fract() != 0.0;
                let zero_to_negative = lhs == 0.0 && rhs < 0.0;
                !(negative_base_fractional || zero_to_negative)
            }
            Self::Fmod => rhs != 0.0 && lhs.is_finite(),
            _ => true,
        }
    }
}
