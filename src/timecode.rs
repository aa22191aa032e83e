use crate::error::CaptionError;

use std::fmt;
use std::str::FromStr;

/// Frames per second as an exact ratio, e.g. `24/1` or `24000/1001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    numerator: u32,
    denominator: u32,
}

impl FrameRate {
    pub const FILM: FrameRate = FrameRate {
        numerator: 24,
        denominator: 1,
    };

    pub fn new(numerator: u32, denominator: u32) -> Result<Self, CaptionError> {
        if numerator == 0 || denominator == 0 {
            return Err(CaptionError::InvalidInput(format!(
                "frame rate {}/{} is not a positive number",
                numerator, denominator
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Whole frames per second used for `HH:MM:SS:FF` counting, so 23.976 counts as 24.
    pub fn nominal_fps(&self) -> u64 {
        let num = u64::from(self.numerator);
        let den = u64::from(self.denominator);
        ((num + den / 2) / den).max(1)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::FILM
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.denominator == 1 {
            write!(fmt, "{}", self.numerator)
        } else {
            write!(fmt, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl FromStr for FrameRate {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || CaptionError::InvalidInput(format!("unrecognised frame rate '{}'", s));

        // NTSC rates are usually written as rounded decimals.
        match s {
            "23.976" | "23.98" => return FrameRate::new(24000, 1001),
            "29.97" => return FrameRate::new(30000, 1001),
            "59.94" => return FrameRate::new(60000, 1001),
            _ => (),
        }

        match s.split_once('/') {
            Some((num, den)) => {
                let num = num.trim().parse().map_err(|_| invalid())?;
                let den = den.trim().parse().map_err(|_| invalid())?;
                FrameRate::new(num, den)
            }
            None => FrameRate::new(s.parse().map_err(|_| invalid())?, 1),
        }
    }
}

/// Whole milliseconds elapsed after `frames` frames, rounded down.
pub fn frames_to_millis(frames: u64, rate: FrameRate) -> u128 {
    u128::from(frames) * 1000 * u128::from(rate.denominator) / u128::from(rate.numerator)
}

/// Formats a frame offset as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Hours are not wrapped and simply grow past two digits.
pub fn frames_to_timecode(frames: u64, rate: FrameRate) -> String {
    let total_millis = frames_to_millis(frames, rate);
    let total_secs = total_millis / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Converts an editor frame timecode (`HH:MM:SS:FF`) to a frame count.
///
/// Counting is non-drop-frame at the nominal rate.
pub fn hmsf_to_frames(
    hours: u64,
    minutes: u64,
    seconds: u64,
    frames: u64,
    rate: FrameRate,
) -> Result<u64, CaptionError> {
    let fps = rate.nominal_fps();
    let invalid = || {
        CaptionError::InvalidInput(format!(
            "{:02}:{:02}:{:02}:{:02} is not a valid timecode at {} fps",
            hours, minutes, seconds, frames, rate
        ))
    };
    if minutes >= 60 || seconds >= 60 || frames >= fps {
        return Err(invalid());
    }
    hours
        .checked_mul(fps * 3600)
        .and_then(|total| total.checked_add(frames + seconds * fps + minutes * fps * 60))
        .ok_or_else(invalid)
}
