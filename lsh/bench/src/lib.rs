//! Benchmarks for the lsh crate; see `benches/`.
