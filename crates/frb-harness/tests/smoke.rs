use std::fs;

use frb_domain::DomainSpec;
use frb_fixture::read_fixture;
use frb_harness::HarnessConfig;
use frb_harness::benchmark::{Benchmark, BenchmarkSession, write_benchmark_baseline};
use frb_harness::generator::{FixtureSuite, Regime, generate, generate_suite};
use frb_harness::verify::verify_fixture_tree;
use frb_reference::{DomainMode, ReferenceFn, UnaryRef};
use frb_tap::{TapReporter, format_float};

fn floor_benchmark(iterations: u64) -> Benchmark {
    Benchmark::new("floor", iterations, || {
        let floor = ReferenceFn::from(UnaryRef::Floor);
        Ok(move || floor.eval(&[1.5], DomainMode::Permissive).unwrap_or(f64::NAN))
    })
}

#[test]
fn single_round_floor_benchmark() {
    let mut out = Vec::new();
    let mut session =
        BenchmarkSession::new(TapReporter::new(&mut out), "rust::libm", 1).expect("session");
    let workload = session
        .run(&mut floor_benchmark(10))
        .expect("benchmark")
        .clone();
    session.finish().expect("finish");

    let raw = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(
        &lines[..4],
        &["TAP version 13", "# rust::libm::floor", "  ---", "  iterations: 10"]
    );
    assert_eq!(raw.matches("ok 1 benchmark finished").count(), 1);
    assert!(!raw.contains("ok 2 "));

    let record = &workload.rounds[0];
    let rate_line = lines
        .iter()
        .find(|line| line.starts_with("  rate: "))
        .expect("rate line");
    assert_eq!(
        *rate_line,
        format!("  rate: {}", format_float(10.0 / record.elapsed_secs))
    );
    assert!(raw.ends_with("#\n1..1\n# total 1\n# pass  1\n#\n# ok\n"));
}

#[test]
fn three_repeats_number_rounds_in_order() {
    let mut out = Vec::new();
    let mut session =
        BenchmarkSession::new(TapReporter::new(&mut out), "rust::libm", 3).expect("session");
    session.run(&mut floor_benchmark(100)).expect("benchmark");
    session.finish().expect("finish");

    let raw = String::from_utf8(out).expect("utf8");
    let rounds: Vec<usize> = raw
        .lines()
        .filter_map(|line| line.strip_prefix("ok "))
        .filter_map(|rest| rest.strip_suffix(" benchmark finished"))
        .map(|n| n.parse().expect("round number"))
        .collect();
    assert_eq!(rounds, vec![1, 2, 3]);
    assert_eq!(raw.matches("# rust::libm::floor\n").count(), 3);
}

#[test]
fn identity_generator_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    generate(
        dir.path(),
        "t.json",
        UnaryRef::Identity.into(),
        vec![("x".to_string(), vec![0.0, 1.0, 2.0])],
        DomainMode::Permissive,
    )
    .expect("generate");

    let fixture = read_fixture(&dir.path().join("t.json")).expect("read");
    assert_eq!(fixture.input("x"), Some(&[0.0, 1.0, 2.0][..]));
    assert_eq!(fixture.expected(), &[0.0, 1.0, 2.0]);
}

#[test]
fn custom_suite_generates_and_verifies() {
    let root = tempfile::tempdir().expect("tempdir");
    let suite = FixtureSuite {
        function: UnaryRef::Exp.into(),
        regimes: vec![
            Regime {
                file_name: "medium.json".into(),
                inputs: vec![("x".into(), DomainSpec::linspace(-10.0, 10.0, 21))],
                permissive_only: false,
            },
            Regime {
                file_name: "overflow.json".into(),
                inputs: vec![("x".into(), DomainSpec::values([709.0, 710.0, 1000.0]))],
                permissive_only: false,
            },
            Regime {
                file_name: "random.json".into(),
                inputs: vec![("x".into(), DomainSpec::uniform(-5.0, 5.0, 64, 42))],
                permissive_only: false,
            },
        ],
    };

    let written = generate_suite(root.path(), &suite, DomainMode::Permissive).expect("suite");
    assert!(written[0].ends_with("exp/medium.json"));

    let raw = fs::read_to_string(&written[1]).expect("overflow file");
    assert!(raw.ends_with(r#","Infinity","Infinity"]}"#), "{raw}");

    let report = verify_fixture_tree(root.path()).expect("verify");
    assert_eq!(report.checked, 3);
    assert!(report.all_passed());

    // Strict mode refuses the overflowing regime.
    let strict = generate_suite(root.path(), &suite, DomainMode::Strict).expect_err("overflow");
    assert_eq!(strict.reason_code(), "reference_range_error");
}

#[test]
fn seeded_random_regime_is_byte_reproducible() {
    let suite = FixtureSuite {
        function: UnaryRef::Sin.into(),
        regimes: vec![Regime {
            file_name: "random.json".into(),
            inputs: vec![("x".into(), DomainSpec::uniform(-1e3, 1e3, 256, 7))],
            permissive_only: false,
        }],
    };
    let a = tempfile::tempdir().expect("tempdir");
    let b = tempfile::tempdir().expect("tempdir");
    let first = generate_suite(a.path(), &suite, DomainMode::Permissive).expect("first");
    let second = generate_suite(b.path(), &suite, DomainMode::Permissive).expect("second");
    assert_eq!(
        fs::read(&first[0]).expect("first file"),
        fs::read(&second[0]).expect("second file")
    );
}

#[test]
fn benchmark_run_writes_baseline_under_artifact_root() {
    let artifacts = tempfile::tempdir().expect("tempdir");
    let args = ["--repeats", "2", "--artifact-root"]
        .into_iter()
        .map(String::from)
        .chain([artifacts.path().display().to_string()]);
    let config = HarnessConfig::default_paths().with_args(args).expect("args");

    let mut session =
        BenchmarkSession::new(TapReporter::new(Vec::new()), config.namespace.clone(), config.repeats)
            .expect("session");
    session.run(&mut floor_benchmark(50)).expect("benchmark");
    let baseline = session.finish().expect("finish");
    write_benchmark_baseline(&config.baseline_path(), &baseline).expect("write");

    let path = artifacts.path().join("rust__libm_baseline.json");
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).expect("baseline")).expect("json");
    assert_eq!(raw["namespace"], "rust::libm");
    assert_eq!(raw["repeats"], 2);
    assert_eq!(raw["workloads"][0]["name"], "floor");
}
