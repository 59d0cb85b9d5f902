//! Month/date aggregation.
//!
//! Folds every segment through the matcher into a [`VisitIndex`], then turns
//! the index into a [`VisitReport`] with months most recent first and dates
//! earliest first. Each call starts from an empty index; nothing is carried
//! between runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Local, NaiveDate, TimeZone};

use crate::matching::match_segment;
use crate::timeline::TimelineSegment;
use crate::{MonthKey, MonthVisits, VisitConfig, VisitDay, VisitReport};

/// Distinct visit dates keyed by month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitIndex {
    months: BTreeMap<MonthKey, BTreeSet<NaiveDate>>,
}

impl VisitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit day. Returns `false` if the date was already present.
    pub fn insert(&mut self, day: VisitDay) -> bool {
        self.months.entry(day.month).or_default().insert(day.date)
    }

    /// Absorb another index, keeping dates distinct.
    pub fn merge(&mut self, other: VisitIndex) {
        for (month, dates) in other.months {
            self.months.entry(month).or_default().extend(dates);
        }
    }

    /// Number of distinct visit dates.
    pub fn len(&self) -> usize {
        self.months.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Order for presentation: months descending, dates ascending.
    ///
    /// An empty index becomes [`VisitReport::NoVisits`].
    pub fn into_report(self) -> VisitReport {
        if self.is_empty() {
            return VisitReport::NoVisits;
        }
        let months = self
            .months
            .into_iter()
            .rev()
            .map(|(month, dates)| MonthVisits {
                month,
                dates: dates.into_iter().collect(),
            })
            .collect();
        VisitReport::Found { months }
    }
}

/// Find visit days, attributing dates in the system's local time zone.
pub fn find_visits(segments: &[TimelineSegment], config: &VisitConfig) -> VisitReport {
    find_visits_in(segments, config, &Local)
}

/// Find visit days, attributing dates in `tz`.
pub fn find_visits_in<Tz: TimeZone>(
    segments: &[TimelineSegment],
    config: &VisitConfig,
    tz: &Tz,
) -> VisitReport {
    let mut index = VisitIndex::new();
    let mut matched = 0usize;

    for segment in segments {
        if let Some(day) = match_segment(segment, config, tz) {
            matched += 1;
            index.insert(day);
        }
    }

    log::debug!(
        "Matched {} of {} segments on {} distinct days",
        matched,
        segments.len(),
        index.len()
    );

    index.into_report()
}

/// Find visit days using parallel processing.
///
/// This is the same as `find_visits` but uses rayon to fold segments across
/// threads. The result is identical to the sequential version.
#[cfg(feature = "parallel")]
pub fn find_visits_parallel(segments: &[TimelineSegment], config: &VisitConfig) -> VisitReport {
    find_visits_parallel_in(segments, config, &Local)
}

/// Parallel counterpart of `find_visits_in`.
#[cfg(feature = "parallel")]
pub fn find_visits_parallel_in<Tz: TimeZone + Sync>(
    segments: &[TimelineSegment],
    config: &VisitConfig,
    tz: &Tz,
) -> VisitReport {
    use rayon::prelude::*;

    let index = segments
        .par_iter()
        .fold(VisitIndex::new, |mut index, segment| {
            if let Some(day) = match_segment(segment, config, tz) {
                index.insert(day);
            }
            index
        })
        .reduce(VisitIndex::new, |mut a, b| {
            a.merge(b);
            a
        });

    log::debug!(
        "Parallel fold over {} segments found {} distinct days",
        segments.len(),
        index.len()
    );

    index.into_report()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> VisitDay {
        VisitDay::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut index = VisitIndex::new();
        assert!(index.insert(day(2025, 1, 14)));
        assert!(!index.insert(day(2025, 1, 14)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_report_ordering() {
        let mut index = VisitIndex::new();
        for d in [
            day(2024, 12, 31),
            day(2025, 1, 20),
            day(2024, 2, 1),
            day(2025, 1, 3),
            day(2024, 12, 1),
        ] {
            index.insert(d);
        }

        let report = index.into_report();
        let months: Vec<MonthKey> = report.months().iter().map(|m| m.month).collect();
        assert_eq!(
            months,
            vec![
                MonthKey::new(2025, 1),
                MonthKey::new(2024, 12),
                MonthKey::new(2024, 2)
            ]
        );
        assert_eq!(
            report.months()[0].dates,
            vec![day(2025, 1, 3).date, day(2025, 1, 20).date]
        );
    }

    #[test]
    fn test_merge() {
        let mut a = VisitIndex::new();
        a.insert(day(2025, 1, 14));
        let mut b = VisitIndex::new();
        b.insert(day(2025, 1, 14));
        b.insert(day(2025, 3, 1));
        a.merge(b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_empty_index_is_no_visits() {
        assert_eq!(VisitIndex::new().into_report(), VisitReport::NoVisits);
        assert_eq!(
            find_visits(&[], &VisitConfig::default()),
            VisitReport::NoVisits
        );
    }
}
