use crate::HarnessError;
use frb_tap::{BenchmarkRecord, TapReporter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub const DEFAULT_REPEATS: usize = 3;
pub const BASELINE_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSpec {
    pub name: String,
    pub iterations: u64,
}

impl BenchmarkSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, iterations: u64) -> Self {
        Self {
            name: name.into(),
            iterations,
        }
    }
}

/// Per-round statement produced by a benchmark's setup step.
pub type Statement = Box<dyn FnMut() -> f64>;
type Setup = Box<dyn FnMut() -> Result<Statement, HarnessError>>;

/// A named benchmark whose setup runs once per round and yields the
/// statement that is timed.
pub struct Benchmark {
    spec: BenchmarkSpec,
    setup: Setup,
}

impl Benchmark {
    pub fn new<S, F>(name: impl Into<String>, iterations: u64, mut setup: S) -> Self
    where
        S: FnMut() -> Result<F, HarnessError> + 'static,
        F: FnMut() -> f64 + 'static,
    {
        Self {
            spec: BenchmarkSpec::new(name, iterations),
            setup: Box::new(move || Ok(Box::new(setup()?) as Statement)),
        }
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.spec.iterations = iterations;
        self
    }

    #[must_use]
    pub fn spec(&self) -> &BenchmarkSpec {
        &self.spec
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn run<W: Write>(
        &mut self,
        reporter: &mut TapReporter<W>,
        namespace: &str,
        repeats: usize,
    ) -> Result<Vec<BenchmarkRecord>, HarnessError> {
        let setup = &mut self.setup;
        run_benchmark(
            reporter,
            namespace,
            &self.spec,
            repeats,
            || setup(),
            |statement: &mut Statement| statement(),
        )
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark").field("spec", &self.spec).finish()
    }
}

/// Runs `repeats` rounds of `spec`. Each round builds fresh state with
/// `setup`, then times `statement` over `spec.iterations` calls.
pub fn run_benchmark<W, S, T, I, F>(
    reporter: &mut TapReporter<W>,
    namespace: &str,
    spec: &BenchmarkSpec,
    repeats: usize,
    mut setup: I,
    mut statement: F,
) -> Result<Vec<BenchmarkRecord>, HarnessError>
where
    W: Write,
    I: FnMut() -> Result<S, HarnessError>,
    F: FnMut(&mut S) -> T,
{
    let mut records = Vec::with_capacity(repeats);

    for _ in 0..repeats {
        let round = reporter.begin_round(namespace, &spec.name)?;
        let mut state = setup()?;

        let start = Instant::now();
        for _ in 0..spec.iterations {
            std::hint::black_box(statement(&mut state));
        }
        let elapsed_secs = start.elapsed().as_secs_f64();

        let record = BenchmarkRecord::new(spec.name.clone(), spec.iterations, elapsed_secs);
        let rate = reporter.print_result(&record)?;
        reporter.finish_round(round)?;
        tracing::debug!(benchmark = %spec.name, round, elapsed_secs, rate, "benchmark round finished");
        records.push(record);
    }

    Ok(records)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkWorkload {
    pub name: String,
    pub iterations: u64,
    pub rounds: Vec<BenchmarkRecord>,
    pub elapsed_ms: PercentileSummary,
    pub rate: PercentileSummary,
}

impl BenchmarkWorkload {
    fn from_records(spec: &BenchmarkSpec, rounds: Vec<BenchmarkRecord>) -> Self {
        let elapsed: Vec<f64> = rounds.iter().map(|r| r.elapsed_secs * 1000.0).collect();
        // Rates were already validated by the reporter.
        let rates: Vec<f64> = rounds.iter().filter_map(|r| r.rate().ok()).collect();
        Self {
            name: spec.name.clone(),
            iterations: spec.iterations,
            elapsed_ms: summarize_samples(&elapsed),
            rate: summarize_samples(&rates),
            rounds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkBaseline {
    pub schema_version: u8,
    pub generated_at_unix_ms: u128,
    pub git_commit: String,
    pub namespace: String,
    pub repeats: usize,
    pub workloads: Vec<BenchmarkWorkload>,
}

fn now_unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn git_commit_short(repo_root: &Path) -> String {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(repo_root)
        .output();

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        _ => "unknown".to_string(),
    }
}

fn percentile_index(len: usize, percentile_num: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    (last * percentile_num + 50) / 100
}

fn summarize_samples(samples: &[f64]) -> PercentileSummary {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let at = |p| {
        sorted
            .get(percentile_index(sorted.len(), p))
            .copied()
            .unwrap_or(0.0)
    };

    PercentileSummary {
        p50: at(50),
        p95: at(95),
        p99: at(99),
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
    }
}

/// One TAP stream: version header, any number of benchmarks sharing the
/// reporter's round counter, and a closing summary.
#[derive(Debug)]
pub struct BenchmarkSession<W: Write> {
    reporter: TapReporter<W>,
    namespace: String,
    repeats: usize,
    workloads: Vec<BenchmarkWorkload>,
}

impl<W: Write> BenchmarkSession<W> {
    pub fn new(
        mut reporter: TapReporter<W>,
        namespace: impl Into<String>,
        repeats: usize,
    ) -> Result<Self, HarnessError> {
        if repeats == 0 {
            return Err(HarnessError::NoRepeats);
        }
        reporter.print_version()?;
        Ok(Self {
            reporter,
            namespace: namespace.into(),
            repeats,
            workloads: Vec::new(),
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn rounds(&self) -> usize {
        self.reporter.count()
    }

    pub fn run(&mut self, benchmark: &mut Benchmark) -> Result<&BenchmarkWorkload, HarnessError> {
        let rounds = benchmark.run(&mut self.reporter, &self.namespace, self.repeats)?;
        let workload = BenchmarkWorkload::from_records(benchmark.spec(), rounds);
        tracing::info!(
            benchmark = %workload.name,
            p50_ms = workload.elapsed_ms.p50,
            "benchmark finished"
        );
        self.workloads.push(workload);
        Ok(&self.workloads[self.workloads.len() - 1])
    }

    pub fn run_all(&mut self, benchmarks: &mut [Benchmark]) -> Result<(), HarnessError> {
        for benchmark in benchmarks {
            self.run(benchmark)?;
        }
        Ok(())
    }

    /// Prints the summary (every numbered round counts as passing) and
    /// returns the collected baseline.
    pub fn finish(mut self) -> Result<BenchmarkBaseline, HarnessError> {
        let total = self.reporter.count();
        self.reporter.print_summary(total, total)?;
        Ok(BenchmarkBaseline {
            schema_version: BASELINE_SCHEMA_VERSION,
            generated_at_unix_ms: now_unix_ms(),
            git_commit: git_commit_short(Path::new(env!("CARGO_MANIFEST_DIR"))),
            namespace: self.namespace,
            repeats: self.repeats,
            workloads: self.workloads,
        })
    }
}

pub fn write_benchmark_baseline(
    output_path: &Path,
    baseline: &BenchmarkBaseline,
) -> Result<(), HarnessError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|source| HarnessError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let raw = serde_json::to_string_pretty(baseline)?;
    fs::write(output_path, raw).map_err(|source| HarnessError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %output_path.display(), workloads = baseline.workloads.len(), "wrote benchmark baseline");
    Ok(())
}
