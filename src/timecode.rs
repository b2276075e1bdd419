use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subtitle timestamp, stored as milliseconds since the start of the media.
///
/// All internal arithmetic happens on the millisecond value; the
/// `HH:MM:SS,mmm` text form only exists at the boundaries (parsing SRT
/// documents, writing SRT documents, building ffmpeg seek arguments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timecode(u64);

impl Timecode {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Parse an SRT-style timestamp (`HH:MM:SS,mmm`). The ffmpeg dot form
    /// (`HH:MM:SS.mmm`) is accepted too.
    pub fn parse(text: &str) -> Result<Self> {
        let (hms, millis_part) = text
            .trim()
            .split_once([',', '.'])
            .ok_or_else(|| anyhow!("Invalid timestamp format: {}", text))?;

        let parts: Vec<&str> = hms.split(':').collect();
        if parts.len() != 3 {
            return Err(anyhow!("Invalid time format: {}", text));
        }

        let hours: u64 = parts[0].parse()?;
        let minutes: u64 = parts[1].parse()?;
        let seconds: u64 = parts[2].parse()?;
        let millis: u64 = millis_part.parse()?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", text));
        }

        Ok(Self(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis))
    }

    /// Format as an SRT timestamp (`HH:MM:SS,mmm`).
    pub fn to_srt(self) -> String {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let seconds = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;
        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Format for ffmpeg seek arguments (`HH:MM:SS.mmm`, decimal point).
    pub fn to_ffmpeg(self) -> String {
        self.to_srt().replace(',', ".")
    }

    /// Shift by a signed number of seconds, clamping at zero on underflow.
    pub fn offset_by_secs(self, secs: i64) -> Self {
        let delta_ms = secs.unsigned_abs() * 1_000;
        if secs < 0 {
            Self(self.0.saturating_sub(delta_ms))
        } else {
            Self(self.0.saturating_add(delta_ms))
        }
    }

    /// Shift forward by an unsigned number of milliseconds.
    pub fn shifted_by_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_srt())
    }
}

/// A (start, end) pair of timecodes describing one clip to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timecode,
    pub end: Timecode,
}

impl TimeRange {
    pub fn new(start: Timecode, end: Timecode) -> Self {
        Self { start, end }
    }

    pub fn duration_millis(&self) -> u64 {
        self.end.as_millis().saturating_sub(self.start.as_millis())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let tc = Timecode::parse("01:02:03,456").unwrap();
        assert_eq!(tc.as_millis(), 3_723_456);
        assert_eq!(tc.to_srt(), "01:02:03,456");
    }

    #[test]
    fn test_parse_accepts_decimal_point() {
        let tc = Timecode::parse("00:00:01.500").unwrap();
        assert_eq!(tc.as_millis(), 1_500);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timecode::parse("not a timestamp").is_err());
        assert!(Timecode::parse("00:00,000").is_err());
        assert!(Timecode::parse("00:99:00,000").is_err());
    }

    #[test]
    fn test_offset_clamps_at_zero() {
        let tc = Timecode::parse("00:00:01,000").unwrap();
        assert_eq!(tc.offset_by_secs(-5).to_srt(), "00:00:00,000");
    }

    #[test]
    fn test_offset_forward() {
        let tc = Timecode::parse("00:59:58,250").unwrap();
        assert_eq!(tc.offset_by_secs(3).to_srt(), "01:00:01,250");
    }

    #[test]
    fn test_ffmpeg_form_round_trips() {
        let original = "00:12:34,567";
        let ffmpeg_form = Timecode::parse(original).unwrap().to_ffmpeg();
        assert_eq!(ffmpeg_form, "00:12:34.567");
        let back = Timecode::parse(&ffmpeg_form).unwrap().to_srt();
        assert_eq!(back, original);
    }

    #[test]
    fn test_range_duration() {
        let range = TimeRange::new(Timecode::from_millis(2_000), Timecode::from_millis(5_500));
        assert_eq!(range.duration_millis(), 3_500);
        assert_eq!(range.to_string(), "00:00:02,000 --> 00:00:05,500");
    }
}
