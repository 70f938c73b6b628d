use std::{
    path::PathBuf,
    time::Duration,
};

use cl31capture::{
    codec::{
        MissingStartPolicy,
        TrailingPolicy,
    },
    CaptureConfig,
    ReconnectPolicy,
    Site,
};

use crate::trace::LogFormat;

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
#[structopt(about = "capture a CL31 ceilometer's telemetry stream into six-hour UTC files")]
pub struct Options {
    /// Instrument `host:port`.
    #[structopt(long, default_value = "192.168.127.254:4001")]
    pub address: String,

    #[structopt(long, default_value = "./raw", parse(from_os_str))]
    pub base_folder: PathBuf,

    #[structopt(long, allow_hyphen_values = true)]
    pub lat: String,

    #[structopt(long, allow_hyphen_values = true)]
    pub lon: String,

    #[structopt(long, default_value = "4096")]
    pub chunk_size: usize,

    /// Treat this many seconds without data as a connection failure.
    #[structopt(long)]
    pub read_timeout_secs: Option<u64>,

    /// Reconnect with backoff instead of exiting when the connection fails or closes.
    #[structopt(long)]
    pub reconnect: bool,

    #[structopt(long, default_value = "10")]
    pub reconnect_attempts: usize,

    /// Discard packets whose end marker has no start marker instead of storing them verbatim.
    #[structopt(long)]
    pub strict_framing: bool,

    /// Store bytes left without an end marker when a connection ends instead of dropping them.
    #[structopt(long)]
    pub flush_trailing: bool,

    /// `pretty`, `compact` or `json`. Defaults to pretty in debug builds and json in release.
    #[structopt(long)]
    pub log_format: Option<LogFormat>,

    /// Tracing filter directive, overriding `RUST_LOG`.
    #[structopt(long)]
    pub log_filter: Option<String>,
}

impl Options {
    #[inline]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_default()
    }

    pub fn into_config(self) -> cl31capture::Result<CaptureConfig> {
        let site = Site::new(self.lat, self.lon)?;

        let mut config = CaptureConfig::new(self.address, self.base_folder, site);

        config.chunk_size = self.chunk_size;
        config.read_timeout = self.read_timeout_secs.map(Duration::from_secs);
        config.reconnect = self.reconnect.then_some(ReconnectPolicy {
            attempts: self.reconnect_attempts,
        });

        if self.strict_framing {
            config.missing_start = MissingStartPolicy::Discard;
        }

        if self.flush_trailing {
            config.trailing = TrailingPolicy::Flush;
        }

        Ok(config)
    }
}
