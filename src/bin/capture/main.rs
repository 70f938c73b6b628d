use eyre::Result;
use structopt::StructOpt as _;
use tokio::net::TcpStream;

use util::build;

pub use crate::options::Options;

mod options;
mod trace;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    util::bootstrap!(
        "starting {} {} ({}, built at {} with rustc {})",
        build::PACKAGE,
        build::VERSION,
        build::COMMIT_HASH,
        build::BUILD_TIMESTAMP,
        build::RUSTC_COMMIT_HASH,
    );

    let options = Options::from_args();

    trace::init(options.log_format(), options.log_filter.as_deref())?;

    tracing::info!(
        application = build::PACKAGE,
        version = build::VERSION,
        build_commit = build::COMMIT_HASH,
        built_at = build::BUILD_TIMESTAMP,
        using_rustc = build::RUSTC_COMMIT_HASH,
        "tracing subsystem initialized"
    );

    let config = options.into_config()?;
    tracing::info!(?config, "capture configured");

    let shutdown = cl31capture::signals::terminated()?;

    let summary = cl31capture::capture::<TcpStream, _>(&config, chrono::Utc, shutdown).await?;
    tracing::info!(outcome = ?summary.outcome, packets = summary.stats.packets_written, "exiting");

    Ok(())
}
