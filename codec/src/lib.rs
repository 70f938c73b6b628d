pub use ::tokio_util::codec as tokio_codec;

mod framer;
mod marker;
mod packet;

pub use self::{
    framer::*,
    marker::*,
    packet::*,
};

/// Start-of-packet sentinel.
pub const START_MARKER: u8 = 0x01;

/// End-of-packet sentinel. Included in the emitted packet.
pub const END_MARKER: u8 = 0x04;
