use crate::error::{PalfixError, Result};
use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;
use std::time::Duration;

/// `HH:MM:SS.mmm`, with room for wide hours and sub-millisecond digits.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2})\.(\d{3})(\d*)").expect("Invalid regex")
});

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Fewest fractional digits a timestamp carries.
pub const MIN_PRECISION: usize = 3;

/// Offset from the start of a track, in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Render as `HH:MM:SS.mmm`.
    pub fn format(&self) -> String {
        self.format_with_precision(MIN_PRECISION)
    }

    /// Render with `digits` fractional digits, never fewer than three.
    ///
    /// Digits past the third are always zero. The hours field grows past two
    /// digits rather than wrapping.
    pub fn format_with_precision(&self, digits: usize) -> String {
        let digits = digits.max(MIN_PRECISION);
        let hours = self.0 / MS_PER_HOUR;
        let minutes = (self.0 % MS_PER_HOUR) / MS_PER_MINUTE;
        let seconds = (self.0 % MS_PER_MINUTE) / MS_PER_SECOND;
        let millis = self.0 % MS_PER_SECOND;

        format!(
            "{:02}:{:02}:{:02}.{:03}{}",
            hours,
            minutes,
            seconds,
            millis,
            "0".repeat(digits - MIN_PRECISION)
        )
    }
}

impl From<Duration> for Timestamp {
    /// Truncates to whole milliseconds.
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// The first timestamp-shaped span found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampMatch<'a> {
    /// Byte range of the whole match within the searched text.
    pub range: Range<usize>,
    pub hours: &'a str,
    pub minutes: &'a str,
    pub seconds: &'a str,
    pub millis: &'a str,
    /// Digits after the milliseconds (nanosecond-precision chapter files).
    pub sub_millis: &'a str,
}

impl TimestampMatch<'_> {
    /// Number of fractional digits in the original text.
    pub fn precision(&self) -> usize {
        self.millis.len() + self.sub_millis.len()
    }

    /// Validate field ranges and convert to milliseconds.
    ///
    /// Sub-millisecond digits are dropped.
    pub fn timestamp(&self) -> Result<Timestamp> {
        let malformed = |reason: &str| {
            PalfixError::MalformedTimestamp(format!(
                "{}:{}:{}.{}{}: {reason}",
                self.hours, self.minutes, self.seconds, self.millis, self.sub_millis
            ))
        };

        let field = |text: &str, name: &str| {
            text.parse::<u64>()
                .map_err(|_| malformed(&format!("{name} out of range")))
        };

        let hours = field(self.hours, "hours")?;
        let minutes = field(self.minutes, "minutes")?;
        let seconds = field(self.seconds, "seconds")?;
        let millis = field(self.millis, "milliseconds")?;

        if minutes > 59 {
            return Err(malformed("minutes exceed 59"));
        }
        if seconds > 59 {
            return Err(malformed("seconds exceed 59"));
        }

        hours
            .checked_mul(MS_PER_HOUR)
            .and_then(|ms| ms.checked_add(minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis))
            .map(Timestamp)
            .ok_or_else(|| malformed("hours out of range"))
    }
}

/// Locate the first timestamp in `text`.
pub fn find(text: &str) -> Option<TimestampMatch<'_>> {
    let caps = TIMESTAMP_RE.captures(text)?;
    let whole = caps.get(0)?;

    Some(TimestampMatch {
        range: whole.range(),
        hours: caps.get(1)?.as_str(),
        minutes: caps.get(2)?.as_str(),
        seconds: caps.get(3)?.as_str(),
        millis: caps.get(4)?.as_str(),
        sub_millis: caps.get(5).map_or("", |m| m.as_str()),
    })
}

/// Parse the first timestamp in `text`.
///
/// Returns `None` if there is no match or the first match has out-of-range
/// fields.
pub fn parse(text: &str) -> Option<Timestamp> {
    find(text).and_then(|m| m.timestamp().ok())
}

/// Render `ts` as `HH:MM:SS.mmm`.
pub fn format(ts: Timestamp) -> String {
    ts.format()
}
