//! Fixture generation: evaluate a reference function over named input
//! regimes and write one JSON file per regime.

use crate::HarnessError;
use frb_domain::{
    DEFAULT_RNG_SEED, DomainSpec, EPS, LN_MAX, MAX_SAFE_INTEGER, SMALLEST_NORMAL,
    SMALLEST_SUBNORMAL,
};
use frb_fixture::{Fixture, write_fixture};
use frb_reference::{BinaryRef, DomainMode, ReferenceFn, UnaryRef, evaluate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Named input arrays for one fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    pub file_name: String,
    pub inputs: Vec<(String, DomainSpec)>,
    /// Inputs deliberately hit overflow or domain edges, so the regime only
    /// has expected values under [`DomainMode::Permissive`].
    #[serde(default)]
    pub permissive_only: bool,
}

impl Regime {
    pub fn materialize(&self) -> Result<Vec<(String, Vec<f64>)>, HarnessError> {
        let mut columns = Vec::with_capacity(self.inputs.len());
        for (param, spec) in &self.inputs {
            columns.push((param.clone(), spec.materialize()?));
        }
        Ok(columns)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSuite {
    pub function: ReferenceFn,
    pub regimes: Vec<Regime>,
}

/// Evaluates `function` over the index-aligned `inputs` and writes
/// `dir/file_name`, replacing any previous file.
pub fn generate(
    dir: &Path,
    file_name: &str,
    function: ReferenceFn,
    inputs: Vec<(String, Vec<f64>)>,
    mode: DomainMode,
) -> Result<Fixture, HarnessError> {
    let names: Vec<&str> = inputs.iter().map(|(name, _)| name.as_str()).collect();
    function.check_param_names(&names)?;
    let columns: Vec<&[f64]> = inputs.iter().map(|(_, v)| v.as_slice()).collect();
    let expected = evaluate(function, &columns, mode)?;
    let fixture = Fixture::new(inputs, expected)?;
    write_fixture(&dir.join(file_name), &fixture)?;
    Ok(fixture)
}

/// Writes every regime of `suite` under `root/<function-name>/`. Strict runs
/// skip permissive-only regimes.
pub fn generate_suite(
    root: &Path,
    suite: &FixtureSuite,
    mode: DomainMode,
) -> Result<Vec<PathBuf>, HarnessError> {
    let dir = root.join(suite.function.name());
    let mut written = Vec::with_capacity(suite.regimes.len());
    for regime in &suite.regimes {
        if regime.permissive_only && mode == DomainMode::Strict {
            tracing::debug!(
                function = suite.function.name(),
                regime = %regime.file_name,
                "skipping permissive-only regime"
            );
            continue;
        }
        let inputs = regime.materialize()?;
        let fixture = generate(&dir, &regime.file_name, suite.function, inputs, mode)?;
        tracing::debug!(
            function = suite.function.name(),
            regime = %regime.file_name,
            cases = fixture.len(),
            "generated fixture"
        );
        written.push(dir.join(&regime.file_name));
    }
    tracing::info!(
        function = suite.function.name(),
        files = written.len(),
        dir = %dir.display(),
        "fixture suite written"
    );
    Ok(written)
}

pub fn generate_all(root: &Path, mode: DomainMode) -> Result<Vec<PathBuf>, HarnessError> {
    let mut written = Vec::new();
    for suite in fixture_suites() {
        written.extend(generate_suite(root, &suite, mode)?);
    }
    Ok(written)
}

const N: usize = 500;

/// Seed for a random regime, fixed by function and file name so reruns
/// write identical files.
#[must_use]
pub fn regime_seed(function: ReferenceFn, file_name: &str) -> u64 {
    // FNV-1a
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in function.name().bytes().chain([b'/']).chain(file_name.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash ^ DEFAULT_RNG_SEED
}

struct SuiteBuilder {
    function: ReferenceFn,
    regimes: Vec<Regime>,
}

impl SuiteBuilder {
    fn new(function: impl Into<ReferenceFn>) -> Self {
        Self {
            function: function.into(),
            regimes: Vec::new(),
        }
    }

    fn regime(mut self, file_name: &str, specs: Vec<DomainSpec>) -> Self {
        let inputs = self
            .function
            .param_names()
            .into_iter()
            .map(str::to_string)
            .zip(specs)
            .collect();
        self.regimes.push(Regime {
            file_name: file_name.to_string(),
            inputs,
            permissive_only: false,
        });
        self
    }

    /// Marks the last regime permissive-only.
    fn ieee_edge(mut self) -> Self {
        if let Some(regime) = self.regimes.last_mut() {
            regime.permissive_only = true;
        }
        self
    }

    fn x(self, file_name: &str, x: DomainSpec) -> Self {
        self.regime(file_name, vec![x])
    }

    fn xy(self, file_name: &str, x: DomainSpec, y: DomainSpec) -> Self {
        self.regime(file_name, vec![x, y])
    }

    /// Symmetric `[-high, -low]` / `[low, high]` pair.
    fn signed(self, stem: &str, low: f64, high: f64) -> Self {
        self.x(
            &format!("{stem}_negative.json"),
            DomainSpec::linspace(-high, -low, N),
        )
        .x(
            &format!("{stem}_positive.json"),
            DomainSpec::linspace(low, high, N),
        )
    }

    fn random(self, file_name: &str, low: f64, high: f64, len: usize) -> Self {
        let seed = regime_seed(self.function, file_name);
        self.x(file_name, DomainSpec::uniform(low, high, len, seed))
    }

    fn random_xy(self, file_name: &str, x: (f64, f64), y: (f64, f64), len: usize) -> Self {
        let seed = regime_seed(self.function, file_name);
        self.xy(
            file_name,
            DomainSpec::uniform(x.0, x.1, len, seed),
            DomainSpec::uniform(y.0, y.1, len, seed.rotate_left(17)),
        )
    }

    fn build(self) -> FixtureSuite {
        FixtureSuite {
            function: self.function,
            regimes: self.regimes,
        }
    }
}

fn subnormal() -> DomainSpec {
    DomainSpec::concat([
        DomainSpec::linspace(-SMALLEST_NORMAL, -SMALLEST_SUBNORMAL, N / 2),
        DomainSpec::linspace(SMALLEST_SUBNORMAL, SMALLEST_NORMAL, N / 2),
    ])
}

fn near_epsilon() -> DomainSpec {
    DomainSpec::linspace(-8.0 * EPS, 8.0 * EPS, N + 1)
}

fn specials() -> DomainSpec {
    DomainSpec::values([
        0.0,
        -0.0,
        1.0,
        -1.0,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
        MAX_SAFE_INTEGER,
    ])
}

/// Unary functions defined on the whole real line.
fn real_line(op: UnaryRef) -> FixtureSuite {
    SuiteBuilder::new(op)
        .x("subnormal.json", subnormal())
        .signed("tiny", 1e-300, 1e-200)
        .x("near_epsilon.json", near_epsilon())
        .signed("small", EPS, 1.0)
        .signed("medium", 1.0, 100.0)
        .signed("large", 100.0, 1e5)
        .signed("huge", 1e5, 1e300)
        .random("random.json", -1e3, 1e3, 1000)
        .x("special.json", specials())
        .build()
}

fn trigonometric(op: UnaryRef) -> FixtureSuite {
    SuiteBuilder::new(op)
        .signed("tiny", 1e-300, 1e-200)
        .x("near_epsilon.json", near_epsilon())
        .x("period.json", DomainSpec::linspace(-2.0 * PI, 2.0 * PI, N))
        .signed("medium", 2.0 * PI, 1e3)
        .signed("large", 1e3, 1e10)
        .random("random.json", -1e3, 1e3, 1000)
        .build()
}

/// Positive-domain functions: sqrt and the logarithms.
fn positive_domain(op: UnaryRef) -> FixtureSuite {
    SuiteBuilder::new(op)
        .x(
            "subnormal.json",
            DomainSpec::linspace(SMALLEST_SUBNORMAL, SMALLEST_NORMAL, N),
        )
        .x("tiny.json", DomainSpec::logspace(-307.0, -10.0, N))
        .x("small.json", DomainSpec::linspace(EPS, 1.0, N))
        .x("near_one.json", DomainSpec::linspace(1.0 - 1e-3, 1.0 + 1e-3, N + 1))
        .x("medium.json", DomainSpec::linspace(1.0, 100.0, N))
        .x("large.json", DomainSpec::linspace(100.0, 1e5, N))
        .x("huge.json", DomainSpec::logspace(5.0, 308.0, N))
        .random("random.json", EPS, 1e4, 1000)
        .build()
}

fn exponential(op: UnaryRef, overflow: f64) -> FixtureSuite {
    SuiteBuilder::new(op)
        .signed("tiny", 1e-300, 1e-200)
        .x("near_epsilon.json", near_epsilon())
        .signed("small", EPS, 1.0)
        .signed("medium", 1.0, 50.0)
        .x(
            "near_overflow.json",
            DomainSpec::linspace(overflow - 10.0, overflow, N),
        )
        .ieee_edge()
        // sinh and cosh overflow here too
        .x(
            "near_underflow.json",
            DomainSpec::linspace(-overflow - 40.0, -overflow + 10.0, N),
        )
        .ieee_edge()
        .random("random.json", -50.0, 50.0, 1000)
        .build()
}

fn unit_interval(op: UnaryRef) -> FixtureSuite {
    SuiteBuilder::new(op)
        .signed("tiny", 1e-300, 1e-200)
        .x("near_epsilon.json", near_epsilon())
        .x("interior.json", DomainSpec::linspace(-0.9, 0.9, N))
        .x(
            "near_negative_one.json",
            DomainSpec::linspace(-1.0, -0.9, N),
        )
        .ieee_edge()
        .x("near_positive_one.json", DomainSpec::linspace(0.9, 1.0, N))
        .ieee_edge()
        .random("random.json", -1.0, 1.0, 1000)
        .build()
}

fn log1p() -> FixtureSuite {
    SuiteBuilder::new(UnaryRef::Log1p)
        .x("near_negative_one.json", DomainSpec::linspace(-1.0, -0.9, N))
        .ieee_edge()
        .signed("tiny", 1e-300, 1e-200)
        .x("near_epsilon.json", near_epsilon())
        .x("small.json", DomainSpec::linspace(-0.9, 1.0, N))
        .x("medium.json", DomainSpec::linspace(1.0, 100.0, N))
        .x("huge.json", DomainSpec::logspace(2.0, 308.0, N))
        .build()
}

fn acosh() -> FixtureSuite {
    SuiteBuilder::new(UnaryRef::Acosh)
        .x("near_one.json", DomainSpec::linspace(1.0, 1.0 + 1e-3, N))
        .x("small.json", DomainSpec::linspace(1.0, 2.0, N))
        .x("medium.json", DomainSpec::linspace(2.0, 100.0, N))
        .x("large.json", DomainSpec::linspace(100.0, 1e5, N))
        .x("huge.json", DomainSpec::logspace(5.0, 308.0, N))
        .build()
}

fn error_function(op: UnaryRef) -> FixtureSuite {
    SuiteBuilder::new(op)
        .signed("tiny", 1e-300, 1e-200)
        .x("near_epsilon.json", near_epsilon())
        .signed("small", EPS, 1.0)
        .signed("medium", 1.0, 6.0)
        .signed("large", 6.0, 30.0)
        .random("random.json", -10.0, 10.0, 1000)
        .build()
}

fn gamma(op: UnaryRef, largest: f64) -> FixtureSuite {
    SuiteBuilder::new(op)
        .x("tiny_positive.json", DomainSpec::logspace(-300.0, -10.0, N))
        .x("small_positive.json", DomainSpec::linspace(EPS, 1.0, N))
        .x("medium_positive.json", DomainSpec::linspace(1.0, 100.0, N))
        .x(
            "large_positive.json",
            DomainSpec::linspace(100.0, largest, N),
        )
        .ieee_edge()
        .x("integers.json", DomainSpec::linspace(1.0, 170.0, 170))
        .x("half_integers.json", DomainSpec::linspace(-49.5, 49.5, 100))
        .random("negative.json", -170.0, -EPS, 1000)
        .build()
}

fn unary_suite(op: UnaryRef) -> FixtureSuite {
    match op {
        UnaryRef::Sin | UnaryRef::Cos | UnaryRef::Tan => trigonometric(op),
        UnaryRef::Sqrt | UnaryRef::Ln | UnaryRef::Log2 | UnaryRef::Log10 => positive_domain(op),
        UnaryRef::Exp | UnaryRef::Expm1 | UnaryRef::Sinh | UnaryRef::Cosh => {
            exponential(op, LN_MAX)
        }
        UnaryRef::Exp2 => exponential(op, 1024.0),
        UnaryRef::Asin | UnaryRef::Acos | UnaryRef::Atanh => unit_interval(op),
        UnaryRef::Log1p => log1p(),
        UnaryRef::Acosh => acosh(),
        UnaryRef::Erf | UnaryRef::Erfc => error_function(op),
        UnaryRef::Gamma => gamma(op, 171.7),
        UnaryRef::Lgamma => gamma(op, 1e5),
        UnaryRef::Identity
        | UnaryRef::Abs
        | UnaryRef::Floor
        | UnaryRef::Ceil
        | UnaryRef::Trunc
        | UnaryRef::Round
        | UnaryRef::Cbrt
        | UnaryRef::Atan
        | UnaryRef::Tanh
        | UnaryRef::Asinh => real_line(op),
    }
}

fn binary_suite(op: BinaryRef) -> FixtureSuite {
    let builder = SuiteBuilder::new(op);
    let builder = match op {
        BinaryRef::Atan2 => builder
            .xy(
                "positive_positive.json",
                DomainSpec::linspace(EPS, 100.0, N),
                DomainSpec::linspace(100.0, EPS, N),
            )
            .xy(
                "negative_positive.json",
                DomainSpec::linspace(-100.0, -EPS, N),
                DomainSpec::linspace(EPS, 100.0, N),
            )
            .xy(
                "positive_negative.json",
                DomainSpec::linspace(EPS, 100.0, N),
                DomainSpec::linspace(-100.0, -EPS, N),
            )
            .xy(
                "negative_negative.json",
                DomainSpec::linspace(-100.0, -EPS, N),
                DomainSpec::linspace(-EPS, -100.0, N),
            )
            .xy("special.json", specials(), specials()),
        BinaryRef::Hypot => builder
            .xy("subnormal.json", subnormal(), subnormal())
            .random_xy("medium.json", (-100.0, 100.0), (-100.0, 100.0), 1000)
            .xy(
                "large.json",
                DomainSpec::logspace(200.0, 308.0, N),
                DomainSpec::logspace(308.0, 200.0, N),
            ),
        BinaryRef::Pow => builder
            .random_xy("positive_base.json", (0.0, 10.0), (-10.0, 10.0), 1000)
            .xy(
                "negative_base_integer_exponent.json",
                DomainSpec::linspace(-5.0, -0.5, 21),
                DomainSpec::linspace(-10.0, 10.0, 21),
            )
            .xy(
                "near_one.json",
                DomainSpec::linspace(1.0 - 1e-6, 1.0 + 1e-6, N),
                DomainSpec::linspace(-1e6, 1e6, N),
            )
            .xy(
                "overflow.json",
                DomainSpec::linspace(2.0, 10.0, N),
                DomainSpec::linspace(300.0, 1100.0, N),
            )
            .ieee_edge(),
        BinaryRef::Fmod => builder
            .random_xy("small.json", (-10.0, 10.0), (0.5, 10.0), 1000)
            .random_xy("large.json", (-1e6, 1e6), (1.0, 100.0), 1000)
            .xy(
                "huge_dividend.json",
                DomainSpec::logspace(20.0, 300.0, N),
                DomainSpec::linspace(0.1, 10.0, N),
            ),
        BinaryRef::Copysign | BinaryRef::Fmax | BinaryRef::Fmin => builder
            .random_xy("random.json", (-1e3, 1e3), (-1e3, 1e3), 1000)
            .xy("special.json", specials(), specials()),
    };
    builder.build()
}

/// Regimes for `function`.
#[must_use]
pub fn fixture_suite(function: ReferenceFn) -> FixtureSuite {
    match function {
        ReferenceFn::Unary(op) => unary_suite(op),
        ReferenceFn::Binary(op) => binary_suite(op),
    }
}

#[must_use]
pub fn fixture_suites() -> Vec<FixtureSuite> {
    ReferenceFn::all().into_iter().map(fixture_suite).collect()
}
