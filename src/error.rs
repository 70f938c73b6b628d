use std::{
    io,
    path::PathBuf,
    time::Duration,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connecting to instrument at {address}")]
    Connect {
        address: String,
        #[source]
        source:  io::Error,
    },

    #[error("reading from instrument")]
    Read(#[source] io::Error),

    #[error("no data from instrument for {0:?}")]
    ReadTimeout(Duration),

    #[error("opening capture file {}", .path.display())]
    Rotation {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing capture file {}", .path.display())]
    Write {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid site coordinate {0:?}: must be non-empty and contain no '_' or path separators")]
    InvalidSite(String),
}

impl Error {
    /// Connect, read, and read-deadline failures. These end the connection but may be retried.
    #[inline]
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connect { .. } | Error::Read(_) | Error::ReadTimeout(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
