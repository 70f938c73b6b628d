use std::{
    fmt,
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
};

use chrono::{
    DateTime,
    Duration,
    NaiveDate,
    TimeZone,
    Timelike,
    Utc,
};

use crate::Error;

/// Hours covered by one capture file.
pub const WINDOW_HOURS: u32 = 6;

const PREFIX: &str = "CL31";
const EXTENSION: &str = "dat";

/// A fixed six-hour UTC bucket: `[start_hour, start_hour + 6)` on `date`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow {
    date:       NaiveDate,
    start_hour: u32,
}

impl TimeWindow {
    /// Returns `None` unless `start_hour` is a bucket boundary.
    pub fn new(date: NaiveDate, start_hour: u32) -> Option<Self> {
        (start_hour < 24 && start_hour % WINDOW_HOURS == 0).then_some(Self {
            date,
            start_hour,
        })
    }

    /// The window containing `instant`.
    pub fn resolve(instant: DateTime<Utc>) -> Self {
        Self {
            date:       instant.date_naive(),
            start_hour: instant.hour() / WINDOW_HOURS * WINDOW_HOURS,
        }
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[inline]
    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    /// Exclusive; the last window of a day ends at 24.
    #[inline]
    pub fn end_hour(&self) -> u32 {
        self.start_hour + WINDOW_HOURS
    }

    pub fn start(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_hms_opt(self.start_hour, 0, 0).unwrap_or_default())
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start() + Duration::hours(WINDOW_HOURS as i64)
    }

    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        Self::resolve(instant) == *self
    }

    pub fn next(&self) -> Self {
        Self::resolve(self.end())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}-{:02}Z", self.date.format("%Y%m%d"), self.start_hour, self.end_hour())
    }
}

/// Instrument location, kept as the literal strings used in file names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Site {
    lat: String,
    lon: String,
}

impl Site {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Result<Self, Error> {
        let lat = validate_coordinate(lat.into())?;
        let lon = validate_coordinate(lon.into())?;

        Ok(Self {
            lat,
            lon,
        })
    }

    #[inline]
    pub fn lat(&self) -> &str {
        &self.lat
    }

    #[inline]
    pub fn lon(&self) -> &str {
        &self.lon
    }

    /// `CL31_{lat}_{lon}_{YYYYMMDD}`
    pub fn dir_name(&self, date: NaiveDate) -> String {
        format!("{PREFIX}_{}_{}_{}", self.lat, self.lon, date.format("%Y%m%d"))
    }

    /// `CL31_{lat}_{lon}_{HH}-{HH}Z.dat`
    pub fn file_name(&self, window: &TimeWindow) -> String {
        format!(
            "{PREFIX}_{}_{}_{:02}-{:02}Z.{EXTENSION}",
            self.lat,
            self.lon,
            window.start_hour(),
            window.end_hour()
        )
    }

    /// `base/CL31_{lat}_{lon}_{date}/CL31_{lat}_{lon}_{HH}-{HH}Z.dat`
    pub fn output_path(&self, base: impl AsRef<Path>, window: &TimeWindow) -> PathBuf {
        base.as_ref().join(self.dir_name(window.date())).join(self.file_name(window))
    }

    /// Inverse of [`Site::dir_name`].
    pub fn parse_dir_name(name: &str) -> Option<(Self, NaiveDate)> {
        let rest = name.strip_prefix(PREFIX)?.strip_prefix('_')?;
        let (site, date) = rest.rsplit_once('_')?;
        let (lat, lon) = site.split_once('_')?;

        let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;

        Some((Self::new(lat, lon).ok()?, date))
    }

    /// Inverse of [`Site::file_name`] for this site; the date comes from the directory.
    pub fn parse_file_name(&self, name: &str, date: NaiveDate) -> Option<TimeWindow> {
        let hours = name
            .strip_prefix(&format!("{PREFIX}_{}_{}_", self.lat, self.lon))?
            .strip_suffix(&format!("Z.{EXTENSION}"))?;

        let (start, end) = hours.split_once('-')?;
        let start = u32::from_str(start).ok()?;
        let end = u32::from_str(end).ok()?;

        let window = TimeWindow::new(date, start)?;
        (window.end_hour() == end).then_some(window)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

fn validate_coordinate(s: String) -> Result<String, Error> {
    let invalid = s.is_empty()
        || s == "."
        || s == ".."
        || s.chars().any(|c| c == '_' || std::path::is_separator(c) || c.is_control());

    if invalid {
        return Err(Error::InvalidSite(s));
    }

    Ok(s)
}
