//! Benchmark harness crate for kindred. The benchmarks live in `benches/`.
