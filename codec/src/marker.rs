use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::{
    Framing,
    Packet,
    END_MARKER,
    START_MARKER,
};

/// What to do with a candidate packet whose end marker has no start marker before it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MissingStartPolicy {
    /// Emit the bytes up to and including the end marker unchanged.
    #[default]
    Verbatim,

    /// Drop the bytes up to and including the end marker.
    Discard,
}

/// What to do with bytes still buffered when the stream ends.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrailingPolicy {
    /// Drop them.
    #[default]
    Discard,

    /// Emit them as a [`Framing::Partial`] packet.
    Flush,
}

/// Running totals of candidates dropped by [`MissingStartPolicy::Discard`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Discarded {
    pub packets: u64,
    pub bytes:   u64,
}

impl Discarded {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packets == 0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Splits a byte stream into packets terminated by [`END_MARKER`].
///
/// Each candidate runs from the beginning of the buffer through the first end marker. If it
/// contains a [`START_MARKER`], everything before the first start marker is dropped.
#[derive(Debug, Clone, Default)]
pub struct MarkerCodec {
    missing_start: MissingStartPolicy,
    trailing:      TrailingPolicy,

    search_from: usize,
    discarded:   Discarded,
}

impl MarkerCodec {
    pub fn new(missing_start: MissingStartPolicy, trailing: TrailingPolicy) -> Self {
        Self {
            missing_start,
            trailing,
            search_from: 0,
            discarded: Discarded::default(),
        }
    }

    #[inline]
    pub fn missing_start(&self) -> MissingStartPolicy {
        self.missing_start
    }

    #[inline]
    pub fn trailing(&self) -> TrailingPolicy {
        self.trailing
    }

    /// Return the discard totals accumulated since the last call and reset them.
    #[inline]
    pub fn take_discarded(&mut self) -> Discarded {
        std::mem::take(&mut self.discarded)
    }

    /// Consume the next packet from the front of `src`, if a complete one is buffered.
    pub fn next_packet(&mut self, src: &mut BytesMut) -> Option<Packet> {
        loop {
            self.search_from = self.search_from.min(src.len());

            let end = match src[self.search_from..].iter().position(|&b| b == END_MARKER) {
                Some(offset) => self.search_from + offset,
                None => {
                    self.search_from = src.len();
                    return None;
                },
            };

            let mut candidate = src.split_to(end + 1);
            self.search_from = 0;

            if let Some(start) = candidate.iter().position(|&b| b == START_MARKER) {
                if start > 0 {
                    tracing::debug!(skipped = start, "dropping bytes before start marker");
                }

                let packet = candidate.split_off(start);
                return Some(Packet::new(packet.freeze(), Framing::Delimited));
            }

            match self.missing_start {
                MissingStartPolicy::Verbatim => {
                    tracing::warn!(len = candidate.len(), "end marker without start marker, emitting verbatim");
                    return Some(Packet::new(candidate.freeze(), Framing::MissingStart));
                },
                MissingStartPolicy::Discard => {
                    tracing::warn!(
                        len = candidate.len(),
                        bytes = %hex::encode(&candidate),
                        "end marker without start marker, discarding"
                    );

                    self.discarded.packets += 1;
                    self.discarded.bytes += candidate.len() as u64;
                    continue;
                },
            }
        }
    }

    /// Resolve whatever is left in `src` once no more input will arrive.
    pub fn finish(&mut self, src: &mut BytesMut) -> Option<Packet> {
        self.search_from = 0;

        if src.is_empty() {
            return None;
        }

        let rest = src.split();

        match self.trailing {
            TrailingPolicy::Discard => {
                tracing::warn!(len = rest.len(), "discarding trailing bytes with no end marker");
                None
            },
            TrailingPolicy::Flush => {
                tracing::warn!(len = rest.len(), "flushing trailing bytes as partial packet");
                Some(Packet::new(rest.freeze(), Framing::Partial))
            },
        }
    }
}

impl Decoder for MarkerCodec {
    type Error = Error;
    type Item = Packet;

    #[inline]
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.next_packet(src))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        Ok(self.finish(buf))
    }
}

#[cfg(test)]
mod test {
    use futures::prelude::*;
    use tokio_util::codec::FramedRead;

    use super::*;

    async fn decode_all(codec: MarkerCodec, src: impl AsRef<[u8]>) -> eyre::Result<Vec<Packet>> {
        let src = src.as_ref().to_vec();

        FramedRead::new(&src[..], codec)
            .map(|x| x.map_err(eyre::Report::from))
            .try_collect::<Vec<_>>()
            .await
    }

    fn bodies(packets: &[Packet]) -> Vec<&[u8]> {
        packets.iter().map(|p| p.bytes().as_ref()).collect()
    }

    #[tokio::test]
    async fn test_two_packets_one_chunk() -> eyre::Result<()> {
        let packets = decode_all(MarkerCodec::default(), b"\x01AB\x04\x01CD\x04").await?;

        assert_eq!(bodies(&packets), vec![&b"\x01AB\x04"[..], &b"\x01CD\x04"[..]]);
        assert!(packets.iter().all(Packet::is_well_formed));

        Ok(())
    }

    #[tokio::test]
    async fn test_leading_noise_trimmed() -> eyre::Result<()> {
        let packets = decode_all(MarkerCodec::default(), b"\r\nnoise\x01AB\x04").await?;

        assert_eq!(bodies(&packets), vec![&b"\x01AB\x04"[..]]);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_start_verbatim() -> eyre::Result<()> {
        let packets = decode_all(MarkerCodec::default(), b"XY\x04").await?;

        assert_eq!(bodies(&packets), vec![&b"XY\x04"[..]]);
        assert_eq!(packets[0].framing(), Framing::MissingStart);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_start_discard() -> eyre::Result<()> {
        let codec = MarkerCodec::new(MissingStartPolicy::Discard, TrailingPolicy::Discard);
        let packets = decode_all(codec, b"XY\x04\x01AB\x04").await?;

        assert_eq!(bodies(&packets), vec![&b"\x01AB\x04"[..]]);

        Ok(())
    }

    #[test]
    fn test_discards_counted_and_taken() {
        let mut codec = MarkerCodec::new(MissingStartPolicy::Discard, TrailingPolicy::Discard);
        let mut buf = BytesMut::from(&b"XY\x04\x04\x01AB\x04"[..]);

        assert_eq!(codec.next_packet(&mut buf).unwrap().bytes().as_ref(), b"\x01AB\x04");
        assert_eq!(codec.take_discarded(), Discarded {
            packets: 2,
            bytes:   4,
        });
        assert!(codec.take_discarded().is_empty());

        let mut verbatim = MarkerCodec::default();
        let mut buf = BytesMut::from(&b"XY\x04"[..]);
        assert!(verbatim.next_packet(&mut buf).is_some());
        assert!(verbatim.take_discarded().is_empty());
    }

    #[tokio::test]
    async fn test_trailing_discarded_at_eof() -> eyre::Result<()> {
        let packets = decode_all(MarkerCodec::default(), b"\x01AB\x04\x01CD").await?;

        assert_eq!(bodies(&packets), vec![&b"\x01AB\x04"[..]]);

        Ok(())
    }

    #[tokio::test]
    async fn test_trailing_flushed_at_eof() -> eyre::Result<()> {
        let codec = MarkerCodec::new(MissingStartPolicy::Verbatim, TrailingPolicy::Flush);
        let packets = decode_all(codec, b"\x01AB\x04\x01CD").await?;

        assert_eq!(bodies(&packets), vec![&b"\x01AB\x04"[..], &b"\x01CD"[..]]);
        assert_eq!(packets[1].framing(), Framing::Partial);

        Ok(())
    }

    #[test]
    fn test_incremental_search() {
        let mut codec = MarkerCodec::default();
        let mut buf = BytesMut::from(&b"\x01AB"[..]);

        assert_eq!(codec.next_packet(&mut buf), None);
        assert_eq!(codec.search_from, 3);

        buf.extend_from_slice(b"C\x04tail");

        let pkt = codec.next_packet(&mut buf).expect("packet");
        assert_eq!(pkt.bytes().as_ref(), b"\x01ABC\x04");
        assert_eq!(&buf[..], b"tail");
        assert_eq!(codec.next_packet(&mut buf), None);
    }

    #[test]
    fn test_start_marker_after_end_is_next_packet() {
        let mut codec = MarkerCodec::default();
        let mut buf = BytesMut::from(&b"\x01A\x04\x04"[..]);

        assert_eq!(codec.next_packet(&mut buf).unwrap().framing(), Framing::Delimited);

        let lone = codec.next_packet(&mut buf).unwrap();
        assert_eq!(lone.bytes().as_ref(), b"\x04");
        assert_eq!(lone.framing(), Framing::MissingStart);
        assert!(buf.is_empty());
    }
}
