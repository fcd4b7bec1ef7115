//! Engine-level benchmarks: the renderer with real voice loads.

mod voices;

pub use voices::bench_voices;
