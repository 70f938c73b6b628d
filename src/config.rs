use std::{
    path::PathBuf,
    time::Duration,
};

use codec::{
    MissingStartPolicy,
    TrailingPolicy,
};

use crate::Site;

pub const DEFAULT_ADDRESS: &str = "192.168.127.254:4001";

/// Maximum bytes requested per socket read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

pub const DEFAULT_RECONNECT_ATTEMPTS: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Connect retries per (re)connection before giving up.
    pub attempts: usize,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RECONNECT_ATTEMPTS,
        }
    }
}

/// Everything a capture session needs to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    pub address:     String,
    pub base_folder: PathBuf,
    pub site:        Site,

    pub chunk_size:   usize,
    pub read_timeout: Option<Duration>,

    /// `None` ends the session on the first connection failure or close.
    pub reconnect: Option<ReconnectPolicy>,

    pub missing_start: MissingStartPolicy,
    pub trailing:      TrailingPolicy,
}

impl CaptureConfig {
    pub fn new(address: impl Into<String>, base_folder: impl Into<PathBuf>, site: Site) -> Self {
        Self {
            address: address.into(),
            base_folder: base_folder.into(),
            site,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_timeout: None,
            reconnect: None,
            missing_start: MissingStartPolicy::default(),
            trailing: TrailingPolicy::default(),
        }
    }
}
