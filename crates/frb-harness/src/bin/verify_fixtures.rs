#![forbid(unsafe_code)]

use frb_harness::logging::init_tracing;
use frb_harness::verify::verify_fixture_tree;
use frb_harness::{HarnessConfig, HarnessError};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        tracing::error!(reason_code = err.reason_code(), "verify_fixtures failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), HarnessError> {
    let config = HarnessConfig::default_paths().with_args(std::env::args().skip(1))?;
    let report = verify_fixture_tree(&config.fixture_root)?;
    for failure in &report.failures {
        tracing::error!(
            path = %failure.path.display(),
            reason_code = failure.reason_code,
            "{}",
            failure.message
        );
    }
    let checked = report.into_result()?;
    tracing::info!(checked, "all fixtures verified");
    Ok(())
}
