pub mod tracer;

pub use tracer::{TracerEngine, TracerOptions};

/// Scalar type of every signal sample, timestamp and derived feature.
pub type Real = f64;

/// Position of a sample within a materialised signal.
pub type SampleIndex = usize;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";
