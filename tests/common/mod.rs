#![allow(dead_code)]

use std::{
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
    time::Duration,
};

use chrono::{
    DateTime,
    TimeZone,
    Utc,
};
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpListener,
        TcpStream,
    },
};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    EnvFilter,
};

use cl31capture::{
    CaptureConfig,
    Site,
};

pub fn trace_init() {
    let level_filter = EnvFilter::from_str("debug").unwrap();

    // several tests in one binary each try to install a subscriber
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(level_filter)
        .with_test_writer()
        .try_init();
}

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
}

pub fn site() -> Site {
    Site::new("45.4945", "-119.0206").unwrap()
}

pub fn config(address: impl Into<String>, base: &Path) -> CaptureConfig {
    CaptureConfig::new(address, base, site())
}

pub fn window_file(base: &Path, hours: &str) -> PathBuf {
    base.join("CL31_45.4945_-119.0206_20240309")
        .join(format!("CL31_45.4945_-119.0206_{hours}Z.dat"))
}

pub async fn listener() -> eyre::Result<(TcpListener, String)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();

    Ok((listener, address))
}

/// Write each chunk as a separate segment, pausing between them so reads see the split.
pub async fn send_chunks(stream: &mut TcpStream, chunks: &[&[u8]]) -> eyre::Result<()> {
    for chunk in chunks {
        stream.write_all(chunk).await?;
        stream.flush().await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    Ok(())
}

/// Poll `path` until it contains `needle` or five seconds pass.
pub async fn wait_for_content(path: &Path, needle: &[u8]) -> eyre::Result<()> {
    for _ in 0..500 {
        if let Ok(content) = tokio::fs::read(path).await {
            if content.windows(needle.len()).any(|w| w == needle) {
                return Ok(());
            }
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    Err(eyre::eyre!("timed out waiting for {:?} in {}", String::from_utf8_lossy(needle), path.display()))
}
