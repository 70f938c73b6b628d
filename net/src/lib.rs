use std::{
    io,
    time::Duration,
};

use tokio_retry::{
    strategy::{
        jitter,
        ExponentialBackoff,
    },
    Retry,
};

pub use stream::StreamOps;

mod stream;

/// Reconnect schedule: 100ms doubling up to 30s, jittered, for at most `attempts` retries.
pub fn default_backoff(attempts: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(Duration::from_secs(30))
        .map(jitter)
        .take(attempts)
}

/// Connect, retrying on failure according to `backoff`. Returns the last error once the
/// schedule is exhausted.
#[tracing::instrument(skip_all, fields(address = S::display_addr(address).as_str()))]
pub async fn connect_with_backoff<S>(
    address: &S::Address,
    backoff: impl IntoIterator<Item = Duration>,
) -> io::Result<S>
where
    S: StreamOps,
    S::Address: Sync,
{
    let mut attempt = 0usize;

    Retry::spawn(backoff, || {
        attempt += 1;
        let attempt = attempt;

        async move {
            S::connect(address).await.map_err(|e| {
                tracing::warn!(error = %e, attempt, "connecting to instrument");
                e
            })
        }
    })
    .await
}

#[cfg(test)]
mod test {
    use tokio::net::{
        TcpListener,
        TcpStream,
    };

    use super::*;

    #[test]
    fn backoff_is_bounded() {
        let delays = default_backoff(20).collect::<Vec<_>>();

        assert_eq!(delays.len(), 20);
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn connects_to_listener() -> io::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();

        let stream = connect_with_backoff::<TcpStream>(&address, default_backoff(3)).await?;
        assert_eq!(stream.peer_addr()?, listener.local_addr()?);

        Ok(())
    }

    #[tokio::test]
    async fn gives_up_after_schedule() -> io::Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();
        drop(listener);

        let result = connect_with_backoff::<TcpStream>(&address, vec![Duration::from_millis(1); 2]).await;
        assert!(result.is_err());

        Ok(())
    }
}
