// Copyright 2025 Salescope (https://github.com/salescope)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Inclusive date ranges for statistics queries.
//!
//! Ranges are validated at construction and discretized to epoch days for
//! cache keying, so two callers asking for the same calendar window always
//! produce the same key.

use crate::error::{Result, SalescopeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range covering `start..=end`.
    ///
    /// Fails if `start` lies after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(SalescopeError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering the `days` calendar days ending at `end` (inclusive).
    pub fn trailing_days(end: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(SalescopeError::InvalidRange(
                "trailing window must cover at least one day".into(),
            ));
        }
        let start = end - chrono::Duration::days(i64::from(days) - 1);
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, always >= 1.
    pub fn day_count(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Days since the Unix epoch for the range start.
    pub fn start_epoch_day(&self) -> i64 {
        epoch_day(self.start)
    }

    /// Days since the Unix epoch for the range end.
    pub fn end_epoch_day(&self) -> i64 {
        epoch_day(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

fn epoch_day(date: NaiveDate) -> i64 {
    // NaiveDate::default() is 1970-01-01.
    (date - NaiveDate::default()).num_days()
}
