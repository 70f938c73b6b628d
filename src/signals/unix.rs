use std::{
    future::Future,
    io,
};

use tokio::signal::unix::{
    signal,
    SignalKind,
};

/// Registers SIGINT and SIGTERM handlers and returns a future resolving on the first of either.
///
/// Registration happens eagerly so a signal delivered before the future is polled is not lost.
pub fn terminated() -> io::Result<impl Future<Output = ()>> {
    let mut ints = signal(SignalKind::interrupt())?;
    let mut terms = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = ints.recv() => tracing::info!("received SIGINT"),
            _ = terms.recv() => tracing::info!("received SIGTERM"),
        }
    })
}
