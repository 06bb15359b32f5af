#![forbid(unsafe_code)]

//! TAP version 13 output for benchmark rounds.
//!
//! A run prints the version line once, then for every round a `#` header, a
//! YAML-ish result block and an `ok <n> benchmark finished` line, and closes
//! with a plan/summary block. Round numbers come from a counter owned by the
//! [`TapReporter`], so every benchmark driven through one reporter shares a
//! single monotonically increasing sequence.

mod float;

pub use float::format_float;

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

pub const TAP_VERSION_LINE: &str = "TAP version 13";

#[derive(Debug, thiserror::Error)]
pub enum TapError {
    #[error("elapsed time is zero; rate is undefined")]
    ZeroElapsed,
    #[error("elapsed time must be positive and finite, got {0}")]
    InvalidElapsed(f64),
    #[error("passing count {passing} exceeds total {total}")]
    PassingExceedsTotal { total: usize, passing: usize },
    #[error("round {round} was never started (counter at {count})")]
    UnknownRound { round: usize, count: usize },
    #[error("failed writing TAP stream: {0}")]
    Io(#[from] io::Error),
}

impl TapError {
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::ZeroElapsed => "tap_rate_division_by_zero",
            Self::InvalidElapsed(_) => "tap_elapsed_invalid",
            Self::PassingExceedsTotal { .. } => "tap_summary_inconsistent",
            Self::UnknownRound { .. } => "tap_round_unknown",
            Self::Io(_) => "tap_stream_io_failed",
        }
    }
}

/// Timing of one benchmark round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub name: String,
    pub iterations: u64,
    pub elapsed_secs: f64,
}

impl BenchmarkRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, iterations: u64, elapsed_secs: f64) -> Self {
        Self {
            name: name.into(),
            iterations,
            elapsed_secs,
        }
    }

    /// Iterations per second. A zero elapsed time is an error, not infinity.
    pub fn rate(&self) -> Result<f64, TapError> {
        if self.elapsed_secs == 0.0 {
            return Err(TapError::ZeroElapsed);
        }
        if !self.elapsed_secs.is_finite() || self.elapsed_secs < 0.0 {
            return Err(TapError::InvalidElapsed(self.elapsed_secs));
        }
        Ok(self.iterations as f64 / self.elapsed_secs)
    }
}

/// Renders the six-line result block for a record.
pub fn render_result_block(record: &BenchmarkRecord) -> Result<String, TapError> {
    let rate = record.rate()?;
    Ok(format!(
        "  ---\n  iterations: {}\n  elapsed: {}\n  rate: {}\n  ...\n",
        record.iterations,
        format_float(record.elapsed_secs),
        format_float(rate)
    ))
}

/// Renders the closing plan and counters.
pub fn render_summary(total: usize, passing: usize) -> Result<String, TapError> {
    if passing > total {
        return Err(TapError::PassingExceedsTotal { total, passing });
    }
    Ok(format!(
        "#\n1..{total}\n# total {total}\n# pass  {passing}\n#\n# ok\n"
    ))
}

#[derive(Debug)]
pub struct TapReporter<W: Write> {
    out: W,
    count: usize,
}

impl TapReporter<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TapReporter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }

    /// Number of rounds started so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_version(&mut self) -> Result<(), TapError> {
        writeln!(self.out, "{TAP_VERSION_LINE}")?;
        Ok(())
    }

    /// Prints the round header and claims the next round number.
    pub fn begin_round(&mut self, namespace: &str, name: &str) -> Result<usize, TapError> {
        writeln!(self.out, "# {namespace}::{name}")?;
        self.count += 1;
        Ok(self.count)
    }

    /// Prints the result block and returns the computed rate.
    pub fn print_result(&mut self, record: &BenchmarkRecord) -> Result<f64, TapError> {
        let block = render_result_block(record)?;
        self.out.write_all(block.as_bytes())?;
        record.rate()
    }

    pub fn finish_round(&mut self, round: usize) -> Result<(), TapError> {
        if round == 0 || round > self.count {
            return Err(TapError::UnknownRound {
                round,
                count: self.count,
            });
        }
        writeln!(self.out, "ok {round} benchmark finished")?;
        Ok(())
    }

    pub fn print_summary(&mut self, total: usize, passing: usize) -> Result<(), TapError> {
        let summary = render_summary(total, passing)?;
        self.out.write_all(summary.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
