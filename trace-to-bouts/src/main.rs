mod curate;
mod loader;
mod parameters;
mod processing;

use anyhow::Result;
use clam_common::{TracerOptions, init_tracer};
use clap::Parser;
use parameters::Mode;
use tracing::{debug, error, info_span};

// cargo run --bin trace-to-bouts -- analyse --data-path ./Data/ --output-path ./Bouts/ --param-file ./Data/params.txt --sample-period 0.01
// cargo run --bin trace-to-bouts -- curate --data-path ./ClosedLoopRaw/ --reference ./ClosedLoopRaw/BCParams.txt --experiment BoutClamp --output-path ./ClosedLoopRaw/

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Disable ANSI colour codes in the log output
    #[clap(long, env = "CLAM_NO_ANSI")]
    no_ansi: bool,

    /// Log filter directive used when `RUST_LOG` is not set, e.g. `debug` or `trace_to_bouts=trace`
    #[clap(long, env = "CLAM_LOG_FILTER")]
    log_filter: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let tracer = init_tracer!(TracerOptions {
        ansi: !args.no_ansi,
        default_directive: args.log_filter.as_deref(),
    });
    debug!(directive = tracer.default_directive(), "Log filter applied");

    let result = match &args.mode {
        Mode::Analyse(params) => info_span!("Analyse").in_scope(|| processing::analyse(params)),
        Mode::Curate(params) => info_span!("Curate").in_scope(|| curate::curate(params)),
    };
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}
