#![warn(missing_docs)]

//! `sam-mountcfg`: plan and apply SAM-QFS mount option changes.

use anyhow::Result;
use clap::Parser;
use samqfs_mgmt::cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    tracing::debug!("sam-mountcfg starting");

    Cli::parse().run()
}
