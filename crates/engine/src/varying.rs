//! Values whose content depends on a date.

use std::collections::{BTreeMap, BTreeSet};

use time::Date;

/// A value that changes at known dates.
///
/// `breakpoints` returns every date at which `at` may start returning
/// something different. Between two consecutive breakpoints `at` is
/// constant; the engine relies on this to evaluate each sub-period once.
pub trait PeriodVarying<T> {
    fn breakpoints(&self) -> BTreeSet<Date>;

    fn at(&self, date: Date) -> T;
}

/// A step function over dates: an initial value plus dated changes.
///
/// `at(d)` is the value of the latest change on or before `d`, or the
/// initial value when no change precedes `d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule<T> {
    initial: T,
    changes: BTreeMap<Date, T>,
}

impl<T: Clone> Schedule<T> {
    pub fn new(initial: T) -> Self {
        Schedule {
            initial,
            changes: BTreeMap::new(),
        }
    }

    /// Add a change taking effect on `from`. A second change on the same
    /// date replaces the first.
    pub fn with_change(mut self, from: Date, value: T) -> Self {
        self.changes.insert(from, value);
        self
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    pub fn changes(&self) -> impl Iterator<Item = (Date, &T)> {
        self.changes.iter().map(|(date, value)| (*date, value))
    }
}

impl<T: Clone> PeriodVarying<T> for Schedule<T> {
    fn breakpoints(&self) -> BTreeSet<Date> {
        self.changes.keys().copied().collect()
    }

    fn at(&self, date: Date) -> T {
        self.changes
            .range(..=date)
            .next_back()
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| self.initial.clone())
    }
}

impl<A, B, PA, PB> PeriodVarying<(A, B)> for (PA, PB)
where
    PA: PeriodVarying<A>,
    PB: PeriodVarying<B>,
{
    fn breakpoints(&self) -> BTreeSet<Date> {
        let mut points = self.0.breakpoints();
        points.extend(self.1.breakpoints());
        points
    }

    fn at(&self, date: Date) -> (A, B) {
        (self.0.at(date), self.1.at(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn rates() -> Schedule<u32> {
        Schedule::new(100)
            .with_change(date!(2024 - 05 - 01), 110)
            .with_change(date!(2025 - 05 - 01), 120)
    }

    #[test]
    fn at_before_first_change_is_initial() {
        assert_eq!(rates().at(date!(2020 - 01 - 01)), 100);
    }

    #[test]
    fn at_on_change_date_is_new_value() {
        assert_eq!(rates().at(date!(2024 - 05 - 01)), 110);
        assert_eq!(rates().at(date!(2024 - 04 - 30)), 100);
        assert_eq!(rates().at(date!(2030 - 01 - 01)), 120);
    }

    #[test]
    fn breakpoints_are_change_dates() {
        let bps: Vec<_> = rates().breakpoints().into_iter().collect();
        assert_eq!(bps, vec![date!(2024 - 05 - 01), date!(2025 - 05 - 01)]);
    }

    #[test]
    fn same_date_change_replaces() {
        let s = Schedule::new(0).with_change(date!(2024 - 01 - 01), 1).with_change(date!(2024 - 01 - 01), 2);
        assert_eq!(s.changes().count(), 1);
        assert_eq!(s.at(date!(2024 - 01 - 01)), 2);
    }

    #[test]
    fn pair_unions_breakpoints_and_projects_both() {
        let other = Schedule::new("a").with_change(date!(2024 - 09 - 01), "b");
        let pair = (rates(), other);
        assert_eq!(pair.breakpoints().len(), 3);
        assert_eq!(pair.at(date!(2024 - 10 - 01)), (110, "b"));
    }
}
