#![forbid(unsafe_code)]

use frb_harness::benchmark::{BenchmarkSession, write_benchmark_baseline};
use frb_harness::logging::init_tracing;
use frb_harness::suites::{NDARRAY_NAMESPACE, ndarray_suite};
use frb_harness::{HarnessConfig, HarnessError};
use frb_tap::TapReporter;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        tracing::error!(reason_code = err.reason_code(), "run_ndarray_benchmarks failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), HarnessError> {
    let config = HarnessConfig::default_paths()
        .with_namespace(NDARRAY_NAMESPACE)
        .with_args(std::env::args().skip(1))?;
    let mut session =
        BenchmarkSession::new(TapReporter::stdout(), config.namespace.clone(), config.repeats)?;
    session.run_all(&mut ndarray_suite())?;
    let baseline = session.finish()?;

    let output_path = config.baseline_path();
    write_benchmark_baseline(&output_path, &baseline)?;
    tracing::info!(
        workloads = baseline.workloads.len(),
        path = %output_path.display(),
        "wrote benchmark baseline"
    );
    Ok(())
}
