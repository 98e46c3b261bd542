//! Benchmark harness crate; see `benches/`.
