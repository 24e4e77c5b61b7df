/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Daily session window.
//!
//! A window is a pair of UTC times of day. When `start` is after `end` the
//! window wraps midnight; when they are equal the session never closes and
//! only the daily period boundary at `start` matters.

use chrono::{DateTime, Days, NaiveTime, Utc};

/// Daily session window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSchedule {
    /// Time of day the session opens.
    pub start: NaiveTime,
    /// Time of day the session closes.
    pub end: NaiveTime,
}

impl SessionSchedule {
    /// Creates a schedule from opening and closing times.
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Returns true if `now` falls inside the window.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let t = now.time();
        match self.start.cmp(&self.end) {
            std::cmp::Ordering::Less => t >= self.start && t < self.end,
            std::cmp::Ordering::Greater => t >= self.start || t < self.end,
            std::cmp::Ordering::Equal => true,
        }
    }

    /// Returns the opening instant of the period containing `now`.
    ///
    /// For a time outside the window this is the most recent opening.
    #[must_use]
    pub fn period_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.start).and_utc();
        if now >= today {
            today
        } else {
            today.checked_sub_days(Days::new(1)).unwrap_or(today)
        }
    }

    /// Returns true if both instants belong to the same session period.
    #[must_use]
    pub fn is_same_period(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.contains(a) && self.contains(b) && self.period_start(a) == self.period_start(b)
    }
}
