use std::fmt;

use bytes::Bytes;

use crate::{
    END_MARKER,
    START_MARKER,
};

/// How a packet's boundaries were established.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Framing {
    /// Start marker followed by end marker.
    Delimited,

    /// End marker seen with no start marker before it. Emitted verbatim.
    MissingStart,

    /// Buffered bytes with no end marker, flushed at end of stream.
    Partial,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Packet {
    bytes:   Bytes,
    framing: Framing,
}

impl Packet {
    #[inline]
    pub fn new(bytes: Bytes, framing: Framing) -> Self {
        Self {
            bytes,
            framing,
        }
    }

    /// Raw packet bytes as they appear on the wire, markers included.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[inline]
    pub fn framing(&self) -> Framing {
        self.framing
    }

    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.framing == Framing::Delimited
    }

    /// The bytes between the markers, with whichever markers are present stripped.
    pub fn body(&self) -> &[u8] {
        let mut body = &self.bytes[..];

        if let [START_MARKER, rest @ ..] = body {
            body = rest;
        }

        if let [rest @ .., END_MARKER] = body {
            body = rest;
        }

        body
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl AsRef<[u8]> for Packet {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]", self.framing, hex::encode(&self.bytes))
    }
}
