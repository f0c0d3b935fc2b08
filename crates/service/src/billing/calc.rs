//! Invoice line and tax arithmetic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::money::{percent_of, round2};

/// Approved hours of one employee waiting to be billed.
#[derive(Clone, Debug)]
pub struct BillableTime {
    pub employee_id: Uuid,
    pub hours: Decimal,
}

/// An employee as printed on the invoice.
#[derive(Clone, Debug)]
pub struct Biller {
    pub name: String,
    pub billing_rate: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DraftLine {
    pub employee_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// One line per employee: total hours at the employee's billing rate.
///
/// Lines come out ordered by employee name. Time of an employee missing from
/// `billers` is an error naming the employee.
pub fn lines_per_employee(time: &[BillableTime], billers: &BTreeMap<Uuid, Biller>) -> Result<Vec<DraftLine>, Uuid> {
    let mut hours: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for t in time {
        *hours.entry(t.employee_id).or_default() += t.hours;
    }
    let mut lines = Vec::with_capacity(hours.len());
    for (employee_id, qty) in hours {
        let biller = billers.get(&employee_id).ok_or(employee_id)?;
        lines.push(DraftLine {
            employee_id,
            description: format!("{} ({} h)", biller.name, qty.normalize()),
            quantity: qty,
            unit_price: biller.billing_rate,
            amount: round2(qty * biller.billing_rate),
        });
    }
    lines.sort_by(|a, b| a.description.cmp(&b.description));
    Ok(lines)
}

pub fn totals(lines: &[DraftLine], tax_rate_pct: Decimal) -> Totals {
    let subtotal: Decimal = lines.iter().map(|l| l.amount).sum();
    let tax_amount = round2(percent_of(subtotal, tax_rate_pct));
    Totals { subtotal, tax_amount, total: subtotal + tax_amount }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn groups_hours_by_employee() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let billers = BTreeMap::from([
            (a, Biller { name: "Ada".into(), billing_rate: dec!(120) }),
            (b, Biller { name: "Bob".into(), billing_rate: dec!(95.5) }),
        ]);
        let time = vec![
            BillableTime { employee_id: b, hours: dec!(3) },
            BillableTime { employee_id: a, hours: dec!(8) },
            BillableTime { employee_id: a, hours: dec!(1.5) },
        ];
        let lines = lines_per_employee(&time, &billers).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].employee_id, a);
        assert_eq!(lines[0].quantity, dec!(9.5));
        assert_eq!(lines[0].amount, dec!(1140));
        assert_eq!(lines[1].amount, dec!(286.5));

        let t = totals(&lines, dec!(7.5));
        assert_eq!(t.subtotal, dec!(1426.5));
        assert_eq!(t.tax_amount, dec!(106.99));
        assert_eq!(t.total, dec!(1533.49));
    }

    #[test]
    fn unknown_employee_is_reported() {
        let ghost = Uuid::new_v4();
        let err = lines_per_employee(&[BillableTime { employee_id: ghost, hours: dec!(1) }], &BTreeMap::new()).unwrap_err();
        assert_eq!(err, ghost);
    }
}
