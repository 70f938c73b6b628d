use std::{
    fmt,
    fs::File,
    io::{
        self,
        Write,
    },
};

use chrono::{
    DateTime,
    Utc,
};

/// The instant a packet was framed, rendered as `-YYYY-MM-DD HH:MM:SS`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureTimestamp(pub DateTime<Utc>);

impl CaptureTimestamp {
    pub const FORMAT: &'static str = "-%Y-%m-%d %H:%M:%S";

    #[inline]
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl From<DateTime<Utc>> for CaptureTimestamp {
    #[inline]
    fn from(val: DateTime<Utc>) -> Self {
        Self(val)
    }
}

/// Storage a record can be made durable on.
pub trait Durable: Write {
    fn sync(&mut self) -> io::Result<()>;
}

impl Durable for File {
    #[inline]
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl Durable for Vec<u8> {
    #[inline]
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Append `\n{timestamp}\n{packet}\n` to `out` as a single write, then flush and sync.
pub fn write_record<W>(out: &mut W, timestamp: CaptureTimestamp, packet: &[u8]) -> io::Result<()>
where
    W: Durable + ?Sized,
{
    let mut record = Vec::with_capacity(packet.len() + 24);

    record.push(b'\n');
    write!(&mut record, "{timestamp}")?;
    record.push(b'\n');
    record.extend_from_slice(packet);
    record.push(b'\n');

    out.write_all(&record)?;
    out.flush()?;
    out.sync()
}
