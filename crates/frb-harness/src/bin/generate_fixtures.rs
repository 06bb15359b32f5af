#![forbid(unsafe_code)]

use frb_harness::generator::generate_all;
use frb_harness::logging::init_tracing;
use frb_harness::{HarnessConfig, HarnessError};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        tracing::error!(reason_code = err.reason_code(), "generate_fixtures failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), HarnessError> {
    let config = HarnessConfig::default_paths().with_args(std::env::args().skip(1))?;
    let written = generate_all(&config.fixture_root, config.domain_mode)?;
    tracing::info!(
        files = written.len(),
        root = %config.fixture_root.display(),
        mode = config.domain_mode.as_str(),
        "generated fixtures"
    );
    Ok(())
}
