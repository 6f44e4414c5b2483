use clap::Parser;
use tracing_subscriber::EnvFilter;

use ternc_drv::{Config, Session};

fn main() {
    let config = Config::parse();

    let default_filter = if config.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = Session::new(config).compile() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
