use std::{
    fs::{
        self,
        File,
        OpenOptions,
    },
    io,
    path::{
        Path,
        PathBuf,
    },
};

use chrono::{
    DateTime,
    Utc,
};

use crate::{
    writer::{
        self,
        CaptureTimestamp,
        Durable,
    },
    Error,
    Result,
    Site,
    TimeWindow,
};

/// The single capture file currently open for writing.
#[derive(Debug)]
pub struct ActiveFile {
    window: TimeWindow,
    path:   PathBuf,
    file:   File,
}

impl ActiveFile {
    #[inline]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Opens the file for a window. The default creates missing directories and opens in append mode.
pub type Opener = Box<dyn FnMut(&Path) -> io::Result<File> + Send>;

/// Keeps exactly one output file open, switching whenever the current window changes.
pub struct RotationManager {
    base:   PathBuf,
    site:   Site,
    opener: Opener,

    active:    Option<ActiveFile>,
    rotations: u64,
}

impl RotationManager {
    pub fn new(base: impl Into<PathBuf>, site: Site) -> Self {
        Self::with_opener(base, site, open_append)
    }

    pub fn with_opener(
        base: impl Into<PathBuf>,
        site: Site,
        opener: impl FnMut(&Path) -> io::Result<File> + Send + 'static,
    ) -> Self {
        Self {
            base: base.into(),
            site,
            opener: Box::new(opener),
            active: None,
            rotations: 0,
        }
    }

    #[inline]
    pub fn active(&self) -> Option<&ActiveFile> {
        self.active.as_ref()
    }

    /// Number of times an open file was replaced by one for a later window.
    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    #[inline]
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Return the open file for `window`, closing the current one and opening (in append mode)
    /// the right one if they differ.
    ///
    /// A window earlier than the open one (the wall clock stepped backwards) keeps the newer file
    /// so that a file is never reopened once a later window has begun.
    pub fn ensure_file(&mut self, window: TimeWindow) -> Result<&mut ActiveFile> {
        let needs_rotation = match self.active {
            Some(ref active) if active.window == window => false,
            Some(ref active) if active.window > window => {
                tracing::warn!(
                    active = %active.window,
                    requested = %window,
                    "clock is behind the open capture window, keeping current file"
                );
                false
            },
            _ => true,
        };

        if needs_rotation {
            self.rotate(window)?;
        }

        self.active.as_mut().ok_or_else(|| Error::Rotation {
            path:   self.site.output_path(&self.base, &window),
            source: io::Error::new(io::ErrorKind::NotFound, "no capture file open after rotation"),
        })
    }

    /// Append one timestamped record to the file for the window containing `now`.
    pub fn persist(&mut self, packet: &[u8], now: DateTime<Utc>) -> Result<&Path> {
        let active = self.ensure_file(TimeWindow::resolve(now))?;

        writer::write_record(&mut active.file, CaptureTimestamp(now), packet).map_err(|source| Error::Write {
            path: active.path.clone(),
            source,
        })?;

        Ok(&active.path)
    }

    /// Sync and release the open file, if any.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        tracing::info!(path = %active.path.display(), window = %active.window, "closing capture file");

        active.file.sync().map_err(|source| Error::Write {
            path: active.path,
            source,
        })
    }

    fn rotate(&mut self, window: TimeWindow) -> Result<()> {
        let rotating = self.active.is_some();

        // every record was already synced when written
        util::ok_or_trace!(warn, self.close(), "syncing previous capture file");

        let path = self.site.output_path(&self.base, &window);

        let first = (self.opener)(&path);
        let file = match util::ok_or_trace!(warn, first, path = %path.display(), "opening capture file, retrying once") {
            Some(file) => file,
            None => (self.opener)(&path).map_err(|source| Error::Rotation {
                path: path.clone(),
                source,
            })?,
        };

        if rotating {
            self.rotations += 1;
        }

        tracing::info!(path = %path.display(), %window, rotating, "opened capture file");

        self.active = Some(ActiveFile {
            window,
            path,
            file,
        });

        Ok(())
    }
}

impl std::fmt::Debug for RotationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationManager")
            .field("base", &self.base)
            .field("site", &self.site)
            .field("active", &self.active)
            .field("rotations", &self.rotations)
            .finish_non_exhaustive()
    }
}

impl Drop for RotationManager {
    fn drop(&mut self) {
        util::ok_or_trace!(error, self.close(), "closing capture file on drop");
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new().create(true).append(true).open(path)
}
