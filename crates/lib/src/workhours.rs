//! Working-hours clock: elapsed time restricted to a daily recurring work window.
//!
//! Instants are timezone-naive local wall-clock values. Every calendar day is a
//! work day; weekends and holidays are not treated specially.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Invalid work window bounds.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("work window start {start} must be before end {end}")]
    Empty { start: NaiveTime, end: NaiveTime },
    #[error("invalid time of day {0:?}, expected HH:MM or HH:MM:SS")]
    TimeOfDay(String),
}

/// A daily interval `[start, end]` during which response time is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl Default for WorkWindow {
    /// 08:00-20:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).expect("08:00 is a valid time"),
            end: NaiveTime::from_hms_opt(20, 0, 0).expect("20:00 is a valid time"),
        }
    }
}

impl WorkWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build from "HH:MM" / "HH:MM:SS" strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    fn opens(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.start)
    }

    fn closes(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.end)
    }

    /// Move `t` forward to the nearest instant inside a window.
    /// `None` when that window lies past the last representable day.
    fn clip_forward(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        let day = t.date();
        if t.time() < self.start {
            Some(self.opens(day))
        } else if t.time() > self.end {
            day.succ_opt().map(|next| self.opens(next))
        } else {
            Some(t)
        }
    }

    /// Move `t` backward to the nearest instant inside a window.
    /// `None` when that window lies before the first representable day.
    fn clip_backward(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        let day = t.date();
        if t.time() > self.end {
            Some(self.closes(day))
        } else if t.time() < self.start {
            day.pred_opt().map(|prev| self.closes(prev))
        } else {
            Some(t)
        }
    }
}

fn parse_time_of_day(s: &str) -> Result<NaiveTime, WindowError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| WindowError::TimeOfDay(s.to_string()))
}

/// Seconds between `start` and `end` that fall inside `window`.
///
/// Returns 0 when `end <= start`. Both ends are first clipped into the nearest
/// window (start forward, end backward), then the remaining span is walked one
/// day at a time, summing each day's overlap with the window.
pub fn elapsed_work_seconds(start: NaiveDateTime, end: NaiveDateTime, window: &WorkWindow) -> f64 {
    if end <= start {
        return 0.0;
    }
    let (Some(start), Some(end)) = (window.clip_forward(start), window.clip_backward(end)) else {
        return 0.0;
    };
    if end <= start {
        return 0.0;
    }

    let mut total = Duration::zero();
    let mut day = start.date();
    while day <= end.date() {
        let from = window.opens(day).max(start);
        let to = window.closes(day).min(end);
        if to > from {
            total = total + (to - from);
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    seconds(total)
}

/// Wall-clock seconds from `start` to `end` (negative when `end` precedes `start`).
pub fn elapsed_raw_seconds(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    seconds(end - start)
}

fn seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}
