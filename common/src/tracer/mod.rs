mod tracer_engine;

pub use tracer_engine::{TracerEngine, TracerOptions};

/// Should be called at the start of each binary.
/// Initialises the stdout tracer and logs the binary and module the tracer was created from.
#[macro_export]
macro_rules! init_tracer {
    ($options:expr) => {{
        let tracer = $crate::TracerEngine::new($options);
        tracing::info!(
            binary = env!("CARGO_BIN_NAME"),
            module = module_path!(),
            "Tracer initialised"
        );
        tracer
    }};
}
