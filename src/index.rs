use std::{
    fs,
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
    Site,
    TimeWindow,
};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureFile {
    pub window: TimeWindow,
    pub site:   Site,
    pub path:   PathBuf,
}

impl CaptureFile {
    /// The window has ended, so the capture process will not write to this file again.
    #[inline]
    pub fn is_complete(&self, now: DateTime<Utc>) -> bool {
        self.window.end() <= now
    }
}

/// Capture files under a base folder, ordered by window then site.
///
/// Keys come from parsing directory and file names, never from comparing them as strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureIndex {
    files: Vec<CaptureFile>,
}

impl CaptureIndex {
    /// Walk `base/CL31_{lat}_{lon}_{date}/` directories. Names that do not parse are skipped.
    #[tracing::instrument(err, skip_all, level = "debug", fields(base = %base.as_ref().display()))]
    pub fn scan(base: impl AsRef<Path>) -> io::Result<Self> {
        let mut files = vec![];

        for dir in fs::read_dir(base.as_ref())? {
            let dir = dir?;

            if !dir.file_type()?.is_dir() {
                continue;
            }

            let Some((site, date)) = dir.file_name().to_str().and_then(Site::parse_dir_name) else {
                tracing::trace!(path = %dir.path().display(), "skipping unrecognized directory");
                continue;
            };

            for file in fs::read_dir(dir.path())? {
                let file = file?;
                let name = file.file_name();

                match name.to_str().and_then(|name| site.parse_file_name(name, date)) {
                    Some(window) => files.push(CaptureFile {
                        window,
                        site: site.clone(),
                        path: file.path(),
                    }),
                    None => tracing::trace!(path = %file.path().display(), "skipping unrecognized file"),
                }
            }
        }

        files.sort();

        Ok(Self {
            files,
        })
    }

    #[inline]
    pub fn files(&self) -> &[CaptureFile] {
        &self.files
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The file for the most recent window.
    pub fn latest(&self) -> Option<&CaptureFile> {
        self.files.last()
    }

    /// Files whose window ended at or before `now`.
    pub fn completed(&self, now: DateTime<Utc>) -> impl Iterator<Item = &CaptureFile> + '_ {
        self.files.iter().filter(move |f| f.is_complete(now))
    }

    pub fn for_site<'a>(&'a self, site: &'a Site) -> impl Iterator<Item = &'a CaptureFile> + 'a {
        self.files.iter().filter(move |f| &f.site == site)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn touch(base: &Path, site: &Site, instant: DateTime<Utc>) -> io::Result<PathBuf> {
        let path = site.output_path(base, &TimeWindow::resolve(instant));
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, b"")?;

        Ok(path)
    }

    #[test]
    fn orders_by_parsed_window() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let site = Site::new("45.4945", "-119.0206")?;

        // string order of these names differs from chronological order
        let late = touch(dir.path(), &site, Utc.with_ymd_and_hms(2024, 3, 10, 0, 30, 0).unwrap())?;
        let mid = touch(dir.path(), &site, Utc.with_ymd_and_hms(2024, 3, 9, 18, 0, 0).unwrap())?;
        let early = touch(dir.path(), &site, Utc.with_ymd_and_hms(2024, 3, 9, 6, 0, 0).unwrap())?;

        fs::write(dir.path().join("README"), b"")?;
        fs::create_dir_all(dir.path().join("CL31_45.4945_-119.0206_20240309").join("scratch"))?;
        fs::write(dir.path().join("CL31_45.4945_-119.0206_20240309").join("notes.dat"), b"")?;

        let index = CaptureIndex::scan(dir.path())?;
        let paths = index.files().iter().map(|f| f.path.clone()).collect::<Vec<_>>();

        assert_eq!(paths, vec![early, mid, late.clone()]);
        assert_eq!(index.latest().map(|f| &f.path), Some(&late));
        assert_eq!(index.for_site(&site).count(), 3);

        Ok(())
    }

    #[test]
    fn completed_excludes_open_window() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let site = Site::new("1.0", "2.0")?;

        touch(dir.path(), &site, Utc.with_ymd_and_hms(2024, 3, 9, 5, 0, 0).unwrap())?;
        touch(dir.path(), &site, Utc.with_ymd_and_hms(2024, 3, 9, 7, 0, 0).unwrap())?;

        let index = CaptureIndex::scan(dir.path())?;
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();

        let done = index.completed(now).map(|f| f.window.start_hour()).collect::<Vec<_>>();
        assert_eq!(done, vec![0]);

        let at_boundary = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(index.completed(at_boundary).count(), 2);

        Ok(())
    }
}
