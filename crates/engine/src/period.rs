//! Half-open date ranges and their partitioning at breakpoints.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Bound;

use time::Date;

use crate::error::PeriodError;

/// A half-open date range `[start, end)`.
///
/// `end == None` means the period is open-ended ("ongoing"). A bounded
/// period always has `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegelPeriode {
    start: Date,
    end: Option<Date>,
}

impl RegelPeriode {
    pub fn new(start: Date, end: Option<Date>) -> Result<Self, PeriodError> {
        match end {
            Some(end) if end <= start => Err(PeriodError::Empty { from: start, to: end }),
            _ => Ok(RegelPeriode { start, end }),
        }
    }

    pub fn bounded(start: Date, end: Date) -> Result<Self, PeriodError> {
        Self::new(start, Some(end))
    }

    pub fn open(start: Date) -> Self {
        RegelPeriode { start, end: None }
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Option<Date> {
        self.end
    }

    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains(&self, date: Date) -> bool {
        date >= self.start && self.end.map_or(true, |end| date < end)
    }

    /// Split this period at every breakpoint strictly inside it.
    ///
    /// The returned periods are contiguous, chronological and their union
    /// is exactly `self`. Breakpoints on or before `start`, or on or after
    /// `end`, are ignored.
    pub fn partition(&self, breakpoints: &BTreeSet<Date>) -> Vec<RegelPeriode> {
        let starts: Vec<Date> = std::iter::once(self.start)
            .chain(
                breakpoints
                    .range((Bound::Excluded(self.start), Bound::Unbounded))
                    .copied()
                    .take_while(|date| self.end.map_or(true, |end| *date < end)),
            )
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(i, start)| RegelPeriode {
                start: *start,
                end: starts.get(i + 1).copied().or(self.end),
            })
            .collect()
    }
}

impl fmt::Display for RegelPeriode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, ...)", self.start),
        }
    }
}
