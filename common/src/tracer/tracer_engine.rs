use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

use crate::DEFAULT_LOG_DIRECTIVE;

pub struct TracerOptions<'a> {
    /// Emit ANSI colour codes on stdout.
    pub ansi: bool,
    /// Filter directive applied when `RUST_LOG` is absent or invalid.
    pub default_directive: Option<&'a str>,
}

impl Default for TracerOptions<'_> {
    fn default() -> Self {
        Self {
            ansi: true,
            default_directive: None,
        }
    }
}

/// This object initialises the stdout tracer, given a TracerOptions struct.
pub struct TracerEngine {
    directive: String,
}

impl TracerEngine {
    /// Initialises the stdout tracer for the binary.
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(options: TracerOptions) -> Self {
        let directive = options
            .default_directive
            .unwrap_or(DEFAULT_LOG_DIRECTIVE)
            .to_owned();

        let stdout_tracer = tracing_subscriber::fmt::layer()
            .with_ansi(options.ansi)
            .with_writer(std::io::stdout);

        // This filter is applied to the stdout tracer
        let log_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directive.as_str()));

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

        //  This is only called once, so will never panic
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing::subscriber::set_global_default failed: {e}");
        }

        Self { directive }
    }

    /// The filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> &str {
        &self.directive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_falls_back_to_default() {
        let tracer = TracerEngine::new(TracerOptions {
            ansi: false,
            default_directive: Some("debug"),
        });
        assert_eq!(tracer.default_directive(), "debug");

        // A second engine cannot replace the global subscriber but still records its directive.
        let tracer = TracerEngine::new(TracerOptions::default());
        assert_eq!(tracer.default_directive(), DEFAULT_LOG_DIRECTIVE);
    }
}
