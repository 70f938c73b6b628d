//! Capture of a ceilometer's raw telemetry stream into six-hour UTC window files.
//!
//! Bytes read from the instrument are framed into packets (see [`codec`]), each packet is
//! timestamped with the wall-clock instant it was completed, and appended to the file for the
//! window containing that instant.

pub use codec;

mod clock;
mod config;
mod error;
pub mod index;
pub mod rotation;
pub mod session;
pub mod signals;
mod window;
pub mod writer;

pub use self::{
    clock::*,
    config::*,
    error::*,
    index::CaptureIndex,
    session::{
        capture,
        CaptureSession,
        Outcome,
        SessionState,
        Summary,
    },
    window::*,
};
