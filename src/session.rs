use std::future::Future;

use codec::{
    Framer,
    Framing,
    Packet,
};
use net::StreamOps;
use tokio::io::{
    AsyncRead,
    AsyncReadExt,
};

use crate::{
    rotation::RotationManager,
    CaptureConfig,
    Clock,
    Error,
    Result,
    TimeWindow,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connected,
    Receiving,
    /// Entered from `Receiving` while the output file is being swapped.
    Rotating,
    Terminated,
    Failed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The instrument closed the connection and reconnecting is disabled.
    RemoteClosed,

    /// Stopped by the shutdown signal.
    Shutdown,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_received:          u64,
    pub packets_written:         u64,
    pub missing_start:           u64,
    /// Packets dropped under [`MissingStartPolicy::Discard`](codec::MissingStartPolicy::Discard).
    pub missing_start_discarded: u64,
    pub partial_flushed:         u64,
    pub bytes_discarded:         u64,
    pub connections:             u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub outcome:   Outcome,
    pub stats:     SessionStats,
    pub rotations: u64,
}

/// Owns the receive buffer and the output file for one capture run.
///
/// Reads, framing, rotation and writes all happen on the caller's task, in order.
pub struct CaptureSession<C> {
    framer:   Framer,
    rotation: RotationManager,
    clock:    C,

    chunk_size:   usize,
    read_timeout: Option<std::time::Duration>,

    state: SessionState,
    stats: SessionStats,
}

impl<C> CaptureSession<C>
where
    C: Clock,
{
    pub fn new(config: &CaptureConfig, clock: C) -> Self {
        Self {
            framer: Framer::new(config.missing_start, config.trailing),
            rotation: RotationManager::new(config.base_folder.clone(), config.site.clone()),
            clock,
            chunk_size: config.chunk_size.max(1),
            read_timeout: config.read_timeout,
            state: SessionState::Disconnected,
            stats: SessionStats::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[inline]
    pub fn rotation(&self) -> &RotationManager {
        &self.rotation
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "session state");
            self.state = next;
        }
    }

    /// Frame `chunk` and persist every packet it completes. Returns the number written.
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<usize> {
        self.stats.bytes_received += chunk.len() as u64;

        let packets = self.framer.feed(chunk);
        let count = packets.len();

        let discarded = self.framer.take_discarded();
        self.stats.missing_start_discarded += discarded.packets;
        self.stats.bytes_discarded += discarded.bytes;

        for packet in packets {
            self.persist(&packet)?;
        }

        Ok(count)
    }

    /// The stream ended: resolve the pending bytes according to the trailing policy.
    pub fn end_of_stream(&mut self) -> Result<()> {
        let pending = self.framer.pending().len() as u64;

        match self.framer.finish() {
            Some(packet) => self.persist(&packet),
            None => {
                self.stats.bytes_discarded += pending;
                Ok(())
            },
        }
    }

    /// Read until the remote end closes. Any read failure is returned as a connection error.
    pub async fn run<R>(&mut self, reader: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        self.transition(SessionState::Receiving);

        let mut buf = vec![0u8; self.chunk_size];

        loop {
            let read = reader.read(&mut buf);

            let count = match self.read_timeout {
                Some(limit) => tokio::time::timeout(limit, read).await.map_err(|_| Error::ReadTimeout(limit))?,
                None => read.await,
            }
            .map_err(Error::Read)?;

            if count == 0 {
                tracing::info!("connection closed by instrument");
                return Ok(());
            }

            tracing::trace!(count, "received chunk");
            self.ingest(&buf[..count])?;
        }
    }

    /// Resolve pending bytes, then sync and close the output file.
    pub fn close(&mut self) -> Result<()> {
        let ended = self.end_of_stream();
        let closed = self.rotation.close();

        ended.and(closed)
    }

    fn persist(&mut self, packet: &Packet) -> Result<()> {
        let now = self.clock.now();

        let rotating = self
            .rotation
            .active()
            .map_or(true, |active| active.window() < TimeWindow::resolve(now));

        if rotating {
            self.transition(SessionState::Rotating);
        }

        let path = self.rotation.persist(packet.bytes(), now)?;

        tracing::debug!(len = packet.len(), framing = ?packet.framing(), path = %path.display(), "packet written");
        tracing::trace!(packet = %hex::encode(packet.bytes()), "packet contents");

        if rotating {
            self.transition(SessionState::Receiving);
        }

        self.stats.packets_written += 1;
        match packet.framing() {
            Framing::Delimited => {},
            Framing::MissingStart => self.stats.missing_start += 1,
            Framing::Partial => self.stats.partial_flushed += 1,
        }

        Ok(())
    }
}

/// Connect to the instrument and capture until it closes, a fatal error occurs, or `shutdown`
/// resolves.
#[tracing::instrument(skip_all, fields(address = config.address.as_str(), site = %config.site))]
pub async fn capture<S, C>(config: &CaptureConfig, clock: C, shutdown: impl Future<Output = ()>) -> Result<Summary>
where
    S: StreamOps<Address = String>,
    C: Clock,
{
    let mut session = CaptureSession::new(config, clock);
    tokio::pin!(shutdown);

    // one schedule for consecutive connections that deliver nothing
    let mut backoff = config.reconnect.map(|policy| net::default_backoff(policy.attempts));

    let result = loop {
        let mut stream = tokio::select! {
            biased;

            _ = &mut shutdown => break Ok(Outcome::Shutdown),
            stream = connect::<S>(config) => match stream {
                Ok(stream) => stream,
                Err(e) => break Err(e),
            },
        };

        session.stats.connections += 1;
        session.transition(SessionState::Connected);
        tracing::info!("connected to instrument");

        let received_before = session.stats.bytes_received;
        let received = tokio::select! {
            biased;

            _ = &mut shutdown => break Ok(Outcome::Shutdown),
            received = session.run(&mut stream) => received,
        };

        let lost = match received {
            Ok(()) if config.reconnect.is_none() => break Ok(Outcome::RemoteClosed),
            Ok(()) => {
                tracing::warn!("instrument closed connection");
                None
            },
            Err(e) if e.is_connection() && config.reconnect.is_some() => {
                tracing::warn!(error = %e, "connection lost");
                Some(e)
            },
            Err(e) => break Err(e),
        };

        // bytes of a packet cut off by the disconnect cannot be completed by the next connection
        if let Err(e) = session.end_of_stream() {
            break Err(e);
        }

        session.transition(SessionState::Disconnected);

        if session.stats.bytes_received > received_before {
            backoff = config.reconnect.map(|policy| net::default_backoff(policy.attempts));
        }

        let delay = match backoff.as_mut().and_then(Iterator::next) {
            Some(delay) => delay,
            None => {
                tracing::warn!(connections = session.stats.connections, "reconnect attempts exhausted");

                break match lost {
                    Some(e) => Err(e),
                    None => Ok(Outcome::RemoteClosed),
                };
            },
        };

        tracing::info!(?delay, "reconnecting after delay");

        tokio::select! {
            biased;

            _ = &mut shutdown => break Ok(Outcome::Shutdown),
            _ = tokio::time::sleep(delay) => {},
        }
    };

    let closed = session.close();

    let result = match result {
        Ok(outcome) => closed.map(|()| outcome),
        Err(e) => {
            util::ok_or_trace!(error, closed, "closing output after capture failure");
            Err(e)
        },
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            session.transition(SessionState::Failed);
            tracing::error!(error = %e, stats = ?session.stats, "capture session failed");
            return Err(e);
        },
    };

    session.transition(SessionState::Terminated);

    let summary = Summary {
        outcome,
        stats: session.stats,
        rotations: session.rotation.rotations(),
    };

    tracing::info!(outcome = ?summary.outcome, stats = ?summary.stats, rotations = summary.rotations, "capture session ended");

    Ok(summary)
}

async fn connect<S>(config: &CaptureConfig) -> Result<S>
where
    S: StreamOps<Address = String>,
{
    let result = match config.reconnect {
        Some(policy) => net::connect_with_backoff::<S>(&config.address, net::default_backoff(policy.attempts)).await,
        None => S::connect(&config.address).await,
    };

    result.map_err(|source| Error::Connect {
        address: config.address.clone(),
        source,
    })
}
