//! Planned-versus-actual arithmetic.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::round2;

/// Planned and actual amounts with their difference.
///
/// `variance` is positive while the actual stays under plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Variance {
    pub planned: Decimal,
    pub actual: Decimal,
    pub variance: Decimal,
    /// `None` when nothing was planned.
    pub variance_pct: Option<Decimal>,
}

impl Variance {
    pub fn new(planned: Decimal, actual: Decimal) -> Self {
        let planned = round2(planned);
        let actual = round2(actual);
        let variance = planned - actual;
        let variance_pct = if planned.is_zero() {
            None
        } else {
            Some(round2(variance / planned * Decimal::ONE_HUNDRED))
        };
        Self { planned, actual, variance, variance_pct }
    }

    pub fn over_budget(&self) -> bool { self.variance < Decimal::ZERO }
}

/// Cost of booked hours: Σ hours × hourly cost.
pub fn labor_cost<I>(bookings: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    round2(bookings.into_iter().map(|(hours, hourly)| hours * hourly).sum())
}
