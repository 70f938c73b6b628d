use std::{
    fmt,
    str::FromStr,
};

use tracing_subscriber::{
    fmt::format::FmtSpan,
    prelude::*,
    EnvFilter,
};

use util::bootstrap;

/// Release builds log json, debug builds log pretty output unless told otherwise.
const DEFAULT_FORMAT: LogFormat = {
    cfg_if::cfg_if! {
        if #[cfg(debug_assertions)] {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
};

const DEFAULT_FILTER: &str = {
    cfg_if::cfg_if! {
        if #[cfg(debug_assertions)] {
            "info,cl31capture=debug,capture=debug"
        } else {
            "warn,cl31capture=info,capture=info"
        }
    }
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogFormat {
    Pretty,
    Compact,
    /// One object per line, for collection by the host's log shipper.
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected pretty, compact or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

/// Install the global subscriber, writing to stderr so stdout stays free.
///
/// `directive` takes precedence over `RUST_LOG`, which takes precedence over the build default.
pub fn init(format: LogFormat, directive: Option<&str>) -> eyre::Result<()> {
    let level_filter = mk_level_filter(directive)?;
    bootstrap!("enabling {} tracing with filter directive: {}", format, level_filter);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);

    let registry = tracing_subscriber::registry().with(level_filter);

    match format {
        LogFormat::Pretty => registry.with(stderr_layer.pretty()).try_init()?,
        LogFormat::Compact => registry.with(stderr_layer.compact()).try_init()?,
        LogFormat::Json => registry.with(stderr_layer.json()).try_init()?,
    }

    Ok(())
}

fn mk_level_filter(directive: Option<&str>) -> eyre::Result<EnvFilter> {
    if let Some(directive) = directive {
        return Ok(EnvFilter::try_new(directive)?);
    }

    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("syslog".parse::<LogFormat>().is_err());

        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>(), Ok(format));
        }
    }

    #[test]
    fn explicit_directive_wins() -> eyre::Result<()> {
        assert_eq!(mk_level_filter(Some("cl31capture=trace"))?.to_string(), "cl31capture=trace");
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());

        Ok(())
    }
}
