use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod command;
mod util;

/// Initialize the tracing subscriber; logs go to stderr so reports on stdout stay clean.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    command::run()
}
