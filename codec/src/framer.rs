use bytes::BytesMut;

use crate::{
    Discarded,
    MarkerCodec,
    MissingStartPolicy,
    Packet,
    TrailingPolicy,
};

/// Synchronous packet framer over a private receive buffer.
///
/// The sequence of packets produced is independent of how input is split across `feed` calls.
#[derive(Debug, Clone, Default)]
pub struct Framer {
    codec:  MarkerCodec,
    buffer: BytesMut,
}

impl Framer {
    pub fn new(missing_start: MissingStartPolicy, trailing: TrailingPolicy) -> Self {
        Self {
            codec:  MarkerCodec::new(missing_start, trailing),
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Append `chunk` and drain every packet it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Packet> {
        self.buffer.extend_from_slice(chunk);

        std::iter::from_fn(|| self.codec.next_packet(&mut self.buffer)).collect()
    }

    /// Bytes received but not yet resolved into a packet.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Candidates dropped for lacking a start marker since the last call.
    #[inline]
    pub fn take_discarded(&mut self) -> Discarded {
        self.codec.take_discarded()
    }

    /// End of input: apply the trailing policy to the pending bytes and reset.
    pub fn finish(&mut self) -> Option<Packet> {
        self.codec.finish(&mut self.buffer)
    }

    #[inline]
    pub fn codec(&self) -> &MarkerCodec {
        &self.codec
    }
}
