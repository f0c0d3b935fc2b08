//! Allocation arithmetic for planned slots and actual assignments.
//!
//! Everything here works on plain date ranges so the rules can be checked
//! without a database. Ranges are inclusive on both ends.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::money::round2;

/// A percentage allocation held over an inclusive date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub allocation_pct: i32,
}

impl Span {
    pub fn new(start: NaiveDate, end: NaiveDate, allocation_pct: i32) -> Self {
        Self { start, end, allocation_pct }
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }
}

impl From<&models::actual_assignment::Model> for Span {
    fn from(a: &models::actual_assignment::Model) -> Self {
        Span::new(a.start_date, a.end_date, a.allocation_pct)
    }
}

/// Highest total allocation on any single day of `window` across `spans`.
///
/// A span that ends the day before another starts does not overlap it.
pub fn peak_allocation(spans: &[Span], window: (NaiveDate, NaiveDate)) -> i32 {
    let (from, to) = window;
    // (day, delta); removals sort before additions on the same day
    let mut events: Vec<(NaiveDate, i32)> = Vec::new();
    for s in spans.iter().filter(|s| s.overlaps(from, to)) {
        let start = s.start.max(from);
        let end = s.end.min(to);
        events.push((start, s.allocation_pct));
        if let Some(after) = end.succ_opt() {
            events.push((after, -s.allocation_pct));
        }
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut current = 0;
    let mut peak = 0;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak
}

/// Why a candidate allocation was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapacityError {
    /// Peak existing allocation plus the candidate exceeds the ceiling.
    Exceeded { peak: i32, requested: i32, ceiling: i32 },
}

impl std::fmt::Display for CapacityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityError::Exceeded { peak, requested, ceiling } => write!(
                f,
                "already allocated {peak}% in the requested period; adding {requested}% would exceed {ceiling}%"
            ),
        }
    }
}

/// Check that `candidate` fits next to `existing` without the daily total
/// passing `ceiling`.
pub fn check_capacity(existing: &[Span], candidate: Span, ceiling: i32) -> Result<(), CapacityError> {
    let peak = peak_allocation(existing, (candidate.start, candidate.end));
    if peak + candidate.allocation_pct > ceiling {
        return Err(CapacityError::Exceeded { peak, requested: candidate.allocation_pct, ceiling });
    }
    Ok(())
}

/// Allocation still free on a slot over its whole date range.
pub fn remaining_slot_allocation(planned_pct: i32, slot_window: (NaiveDate, NaiveDate), assigned: &[Span]) -> i32 {
    (planned_pct - peak_allocation(assigned, slot_window)).max(0)
}

/// Total allocation of the spans covering `day`.
pub fn allocation_on(spans: &[Span], day: NaiveDate) -> i32 {
    spans.iter().filter(|s| s.overlaps(day, day)).map(|s| s.allocation_pct).sum()
}

/// Calendar-month length of the inclusive range `start..=end`.
///
/// Whole months are counted by stepping the start date forward one month at a
/// time; the leftover days are prorated by the length of the month they fall in.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Decimal {
    if end < start {
        return Decimal::ZERO;
    }
    let Some(end_exclusive) = end.succ_opt() else { return Decimal::ZERO };

    let mut whole: u32 = 0;
    let mut cursor = start;
    while let Some(next) = start.checked_add_months(Months::new(whole + 1)) {
        if next > end_exclusive {
            break;
        }
        whole += 1;
        cursor = next;
    }

    let leftover_days = (end_exclusive - cursor).num_days();
    if leftover_days == 0 {
        return Decimal::from(whole);
    }
    let month_len = days_in_month(cursor.year(), cursor.month());
    Decimal::from(whole) + Decimal::from(leftover_days) / Decimal::from(month_len)
}

fn days_in_month(year: i32, month: u32) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|f| f.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days(),
        _ => 30,
    }
}

/// Budgeted cost of a role: monthly cost × months × allocation, rounded to cents.
pub fn budget_cost(monthly_cost: Decimal, months: Decimal, allocation_pct: i32) -> Decimal {
    round2(monthly_cost * months * Decimal::from(allocation_pct) / Decimal::ONE_HUNDRED)
}

/// Budgeted cost of a planned slot over its own date range.
pub fn slot_budget_cost(slot: &models::planned_team_slot::Model) -> Decimal {
    budget_cost(slot.monthly_cost(), months_between(slot.start_date, slot.end_date), slot.planned_allocation_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[test]
    fn peak_of_disjoint_spans_is_largest_single() {
        let spans = [Span::new(d(2025, 1, 1), d(2025, 1, 31), 60), Span::new(d(2025, 2, 1), d(2025, 2, 28), 80)];
        assert_eq!(peak_allocation(&spans, (d(2025, 1, 1), d(2025, 12, 31))), 80);
    }

    #[test]
    fn peak_sums_only_true_overlap() {
        let spans = [
            Span::new(d(2025, 1, 1), d(2025, 3, 31), 50),
            Span::new(d(2025, 3, 1), d(2025, 6, 30), 30),
            Span::new(d(2025, 5, 1), d(2025, 6, 30), 40),
        ];
        // March: 50 + 30; May-June: 30 + 40
        assert_eq!(peak_allocation(&spans, (d(2025, 1, 1), d(2025, 6, 30))), 80);
        assert_eq!(peak_allocation(&spans, (d(2025, 4, 1), d(2025, 6, 30))), 70);
        assert_eq!(peak_allocation(&spans, (d(2025, 4, 1), d(2025, 4, 30))), 30);
    }

    #[test]
    fn window_clips_spans() {
        let spans = [Span::new(d(2025, 1, 1), d(2025, 1, 10), 100)];
        assert_eq!(peak_allocation(&spans, (d(2025, 1, 11), d(2025, 2, 1))), 0);
        assert_eq!(peak_allocation(&spans, (d(2025, 1, 10), d(2025, 2, 1))), 100);
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let existing = [Span::new(d(2025, 1, 1), d(2025, 1, 31), 100)];
        let next = Span::new(d(2025, 2, 1), d(2025, 2, 28), 100);
        assert!(check_capacity(&existing, next, 100).is_ok());
    }

    #[test]
    fn overlapping_allocation_never_exceeds_ceiling() {
        let existing = [Span::new(d(2025, 1, 1), d(2025, 6, 30), 60)];
        assert!(check_capacity(&existing, Span::new(d(2025, 6, 1), d(2025, 8, 31), 40), 100).is_ok());
        let err = check_capacity(&existing, Span::new(d(2025, 6, 30), d(2025, 8, 31), 50), 100).unwrap_err();
        assert_eq!(err, CapacityError::Exceeded { peak: 60, requested: 50, ceiling: 100 });
    }

    #[test]
    fn lower_ceiling_is_respected() {
        let existing = [Span::new(d(2025, 1, 1), d(2025, 1, 31), 50)];
        assert!(check_capacity(&existing, Span::new(d(2025, 1, 1), d(2025, 1, 31), 40), 80).is_err());
    }

    #[test]
    fn remaining_slot_allocation_subtracts_peak() {
        let window = (d(2025, 1, 1), d(2025, 12, 31));
        let assigned = [Span::new(d(2025, 1, 1), d(2025, 6, 30), 50), Span::new(d(2025, 7, 1), d(2025, 12, 31), 25)];
        assert_eq!(remaining_slot_allocation(100, window, &assigned), 50);
        assert_eq!(remaining_slot_allocation(40, window, &assigned), 0);
        assert_eq!(remaining_slot_allocation(100, window, &[]), 100);
    }

    #[test]
    fn allocation_on_a_day() {
        let spans = [Span::new(d(2025, 1, 1), d(2025, 1, 31), 50), Span::new(d(2025, 1, 15), d(2025, 2, 15), 20)];
        assert_eq!(allocation_on(&spans, d(2025, 1, 20)), 70);
        assert_eq!(allocation_on(&spans, d(2025, 2, 1)), 20);
        assert_eq!(allocation_on(&spans, d(2025, 3, 1)), 0);
    }

    #[test]
    fn months_whole_and_partial() {
        assert_eq!(months_between(d(2025, 1, 1), d(2025, 12, 31)), dec!(12));
        assert_eq!(months_between(d(2025, 1, 1), d(2025, 1, 31)), dec!(1));
        assert_eq!(months_between(d(2025, 1, 15), d(2025, 2, 14)), dec!(1));
        assert_eq!(months_between(d(2025, 1, 1), d(2025, 1, 15)), dec!(15) / dec!(31));
        assert_eq!(months_between(d(2025, 1, 1), d(2025, 2, 14)), dec!(1) + dec!(14) / dec!(28));
        assert_eq!(months_between(d(2025, 2, 1), d(2025, 1, 1)), dec!(0));
    }

    #[test]
    fn budget_cost_formula() {
        // (salary + incentive + commission) × months × allocation
        let monthly = dec!(5000) + dec!(500) + dec!(250);
        assert_eq!(budget_cost(monthly, dec!(6), 50), dec!(17250.00));
        assert_eq!(budget_cost(monthly, dec!(12), 100), dec!(69000.00));
        assert_eq!(budget_cost(dec!(1000), dec!(15) / dec!(31), 100), dec!(483.87));
    }
}
