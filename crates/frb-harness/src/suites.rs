//! Benchmark catalogs driven by the `run_*_benchmarks` binaries.

use crate::benchmark::Benchmark;
use frb_domain::{DEFAULT_RNG_SEED, DeterministicRng};
use frb_ndarray::{MemoryOrder, StridedArray};
use frb_reference::{BinaryRef, ReferenceFn, UnaryRef};

pub const MATH_NAMESPACE: &str = "rust::libm";
pub const NDARRAY_NAMESPACE: &str = "rust::frb-ndarray";

pub const MATH_ITERATIONS: u64 = 1_000_000;
pub const INSTANTIATION_ITERATIONS: u64 = 100_000;
pub const ACCESSOR_ITERATIONS: u64 = 1_000_000;

/// Input range each argument is drawn from when benchmarking `function`.
#[must_use]
pub fn benchmark_range(function: ReferenceFn) -> Vec<(f64, f64)> {
    match function {
        ReferenceFn::Unary(op) => vec![unary_range(op)],
        ReferenceFn::Binary(op) => binary_range(op).to_vec(),
    }
}

fn unary_range(op: UnaryRef) -> (f64, f64) {
    match op {
        UnaryRef::Sqrt | UnaryRef::Ln | UnaryRef::Log2 | UnaryRef::Log10 => (0.0, 10_000.0),
        UnaryRef::Log1p => (-1.0, 1_000.0),
        UnaryRef::Asin | UnaryRef::Acos | UnaryRef::Atanh => (-1.0, 1.0),
        UnaryRef::Acosh => (1.0, 1_001.0),
        UnaryRef::Exp
        | UnaryRef::Exp2
        | UnaryRef::Expm1
        | UnaryRef::Sinh
        | UnaryRef::Cosh => (-50.0, 50.0),
        UnaryRef::Erf | UnaryRef::Erfc | UnaryRef::Tanh => (-10.0, 10.0),
        UnaryRef::Gamma => (0.0, 170.0),
        UnaryRef::Lgamma => (0.0, 1_000.0),
        _ => (-1_000.0, 1_000.0),
    }
}

fn binary_range(op: BinaryRef) -> [(f64, f64); 2] {
    match op {
        BinaryRef::Pow => [(0.0, 10.0), (-10.0, 10.0)],
        BinaryRef::Atan2 => [(-100.0, 100.0), (-100.0, 100.0)],
        BinaryRef::Fmod => [(-1_000.0, 1_000.0), (1.0, 100.0)],
        _ => [(-1_000.0, 1_000.0), (-1_000.0, 1_000.0)],
    }
}

/// One benchmark per reference function. Each round reseeds the generator,
/// so every round times the same input sequence.
#[must_use]
pub fn math_suite() -> Vec<Benchmark> {
    math_suite_with(MATH_ITERATIONS, DEFAULT_RNG_SEED)
}

#[must_use]
pub fn math_suite_with(iterations: u64, seed: u64) -> Vec<Benchmark> {
    ReferenceFn::all()
        .into_iter()
        .map(|function| math_benchmark(function, iterations, seed))
        .collect()
}

#[must_use]
pub fn math_benchmark(function: ReferenceFn, iterations: u64, seed: u64) -> Benchmark {
    let ranges = benchmark_range(function);
    Benchmark::new(function.name(), iterations, move || {
        let mut rng = DeterministicRng::new(seed);
        let mut args = vec![0.0; ranges.len()];
        let ranges = ranges.clone();
        Ok(move || {
            for (arg, &(low, high)) in args.iter_mut().zip(&ranges) {
                *arg = rng.uniform(low, high);
            }
            match function {
                ReferenceFn::Unary(op) => op.apply(args[0]),
                ReferenceFn::Binary(op) => op.apply(args[0], args[1]),
            }
        })
    })
}

const BUFFER: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

/// `[1, .., 1, 3, 2]` with `ndims` axes; the 1-d case is `[6]`.
fn subject_shape(ndims: usize) -> Vec<usize> {
    if ndims == 1 {
        return vec![6];
    }
    let mut shape = vec![1; ndims - 2];
    shape.extend([3, 2]);
    shape
}

fn subject(ndims: usize) -> Result<StridedArray, frb_ndarray::ShapeError> {
    StridedArray::contiguous(BUFFER.to_vec(), subject_shape(ndims), MemoryOrder::C)
}

fn attribute(name: &str, read: fn(&StridedArray) -> f64) -> Benchmark {
    Benchmark::new(format!("get:{name}"), ACCESSOR_ITERATIONS, move || {
        let arr = subject(2)?;
        Ok(move || read(&arr))
    })
}

/// Subscripts `[0, .., 0, row, 1]` (or `[i]` for 1-d) for a random draw.
fn subscripts(ndims: usize, rng: &mut DeterministicRng, out: &mut [usize]) {
    if ndims == 1 {
        out[0] = (rng.next_f64() * 6.0).floor() as usize;
        return;
    }
    out[ndims - 2] = (rng.next_f64() * 3.0).floor() as usize;
    out[ndims - 1] = 1;
}

fn element_benchmarks(ndims: usize) -> [Benchmark; 4] {
    let get = Benchmark::new(format!("{ndims}d:get"), ACCESSOR_ITERATIONS, move || {
        let arr = subject(ndims)?;
        let mut rng = DeterministicRng::default();
        let mut idx = vec![0; ndims];
        Ok(move || {
            subscripts(ndims, &mut rng, &mut idx);
            arr.get(&idx).unwrap_or(f64::NAN)
        })
    });
    let set = Benchmark::new(format!("{ndims}d:set"), ACCESSOR_ITERATIONS, move || {
        let mut arr = subject(ndims)?;
        let mut rng = DeterministicRng::default();
        let mut idx = vec![0; ndims];
        Ok(move || {
            subscripts(ndims, &mut rng, &mut idx);
            let value = rng.next_f64();
            match arr.set(&idx, value) {
                Ok(()) => value,
                Err(_) => f64::NAN,
            }
        })
    });
    let iget = Benchmark::new(format!("{ndims}d:iget"), ACCESSOR_ITERATIONS, move || {
        let arr = subject(ndims)?;
        let mut rng = DeterministicRng::default();
        Ok(move || {
            let i = (rng.next_f64() * 6.0).floor() as usize;
            arr.iget(i).unwrap_or(f64::NAN)
        })
    });
    let iset = Benchmark::new(format!("{ndims}d:iset"), ACCESSOR_ITERATIONS, move || {
        let mut arr = subject(ndims)?;
        let mut rng = DeterministicRng::default();
        Ok(move || {
            let i = (rng.next_f64() * 6.0).floor() as usize;
            let value = rng.next_f64();
            match arr.iset(i, value) {
                Ok(()) => value,
                Err(_) => f64::NAN,
            }
        })
    });
    [get, set, iget, iset]
}

/// Construction, attribute reads and element access on a six-element
/// float64 array, in the order the benchmarks are reported.
#[must_use]
pub fn ndarray_suite() -> Vec<Benchmark> {
    let mut suite = vec![Benchmark::new(
        "instantiation",
        INSTANTIATION_ITERATIONS,
        || {
            let buffer = BUFFER.to_vec();
            Ok(move || {
                StridedArray::new(buffer.clone(), vec![3, 2], vec![2, 1], 0, MemoryOrder::C)
                    .map_or(f64::NAN, |arr| arr.len() as f64)
            })
        },
    )];

    suite.extend([
        attribute("data", |arr| arr.data()[0]),
        attribute("dtype", |arr| arr.dtype().len() as f64),
        attribute("flags", |arr| f64::from(u8::from(arr.flags().c_contiguous))),
        attribute("length", |arr| arr.len() as f64),
        attribute("BYTES_PER_ELEMENT", |arr| arr.bytes_per_element() as f64),
        attribute("byteLength", |arr| arr.byte_length() as f64),
        attribute("ndims", |arr| arr.ndims() as f64),
        attribute("shape", |arr| arr.shape()[0] as f64),
        attribute("strides", |arr| arr.strides()[0] as f64),
    ]);

    // Grouped by operation, then by rank: 1d:get..5d:get, 1d:set..5d:set, ...
    let mut columns: [Vec<Benchmark>; 4] = Default::default();
    for group in (1..=5).map(element_benchmarks) {
        for (column, bench) in columns.iter_mut().zip(group) {
            column.push(bench);
        }
    }
    suite.extend(columns.into_iter().flatten());
    suite
}
