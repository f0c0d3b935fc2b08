//! Three-way match of a vendor invoice against its purchase order and the
//! goods received.
//!
//! Pure: callers load the order lines, received totals, what earlier invoices
//! already billed and the invoice lines.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::percent_of;

#[derive(Clone, Copy, Debug)]
pub struct OrderedLine {
    pub id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Clone, Copy, Debug)]
pub struct BilledLine {
    pub purchase_order_line_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Allowed deviation, in percent, before a line is flagged.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Tolerances {
    pub quantity_pct: Decimal,
    pub price_pct: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// The invoice bills a line that is not on the order.
    UnknownLine { line_id: Uuid },
    /// The same order line appears more than once on the invoice.
    DuplicateLine { line_id: Uuid },
    /// More billed than received, beyond the quantity tolerance.
    QuantityNotReceived { line_id: Uuid, billed: Decimal, received: Decimal },
    /// Received goods were already billed on another accepted invoice.
    AlreadyBilled { line_id: Uuid, billed: Decimal, previously_billed: Decimal, received: Decimal },
    /// More received than ordered.
    OverReceived { line_id: Uuid, received: Decimal, ordered: Decimal },
    PriceMismatch { line_id: Uuid, billed: Decimal, ordered: Decimal },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Exception,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub status: MatchStatus,
    pub discrepancies: Vec<Discrepancy>,
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool { self.status == MatchStatus::Matched }
}

/// Compare each billed line with what was ordered and what arrived.
///
/// `received` holds the cumulative received quantity per order line and
/// `previously_billed` the quantity other matched or approved invoices already
/// claim for it; lines with nothing recorded may be absent.
pub fn three_way_match(
    ordered: &[OrderedLine],
    received: &HashMap<Uuid, Decimal>,
    previously_billed: &HashMap<Uuid, Decimal>,
    billed: &[BilledLine],
    tolerances: Tolerances,
) -> MatchOutcome {
    let by_id: HashMap<Uuid, &OrderedLine> = ordered.iter().map(|l| (l.id, l)).collect();
    let mut seen = HashSet::new();
    let mut discrepancies = Vec::new();

    for line in billed {
        let line_id = line.purchase_order_line_id;
        let Some(order) = by_id.get(&line_id) else {
            discrepancies.push(Discrepancy::UnknownLine { line_id });
            continue;
        };
        if !seen.insert(line_id) {
            discrepancies.push(Discrepancy::DuplicateLine { line_id });
            continue;
        }

        let got = received.get(&line_id).copied().unwrap_or_default();
        if got > order.quantity {
            discrepancies.push(Discrepancy::OverReceived { line_id, received: got, ordered: order.quantity });
        }
        let allowed = got + percent_of(got, tolerances.quantity_pct);
        let prior = previously_billed.get(&line_id).copied().unwrap_or_default();
        if line.quantity > allowed {
            discrepancies.push(Discrepancy::QuantityNotReceived { line_id, billed: line.quantity, received: got });
        } else if prior + line.quantity > allowed {
            discrepancies.push(Discrepancy::AlreadyBilled { line_id, billed: line.quantity, previously_billed: prior, received: got });
        }
        let price_slack = percent_of(order.unit_price, tolerances.price_pct).abs();
        if (line.unit_price - order.unit_price).abs() > price_slack {
            discrepancies.push(Discrepancy::PriceMismatch { line_id, billed: line.unit_price, ordered: order.unit_price });
        }
    }

    let status = if discrepancies.is_empty() { MatchStatus::Matched } else { MatchStatus::Exception };
    MatchOutcome { status, discrepancies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> (OrderedLine, OrderedLine) {
        (
            OrderedLine { id: Uuid::new_v4(), quantity: dec!(10), unit_price: dec!(50) },
            OrderedLine { id: Uuid::new_v4(), quantity: dec!(4), unit_price: dec!(200) },
        )
    }

    fn none() -> HashMap<Uuid, Decimal> { HashMap::new() }

    fn bill(line: &OrderedLine, quantity: Decimal, unit_price: Decimal) -> BilledLine {
        BilledLine { purchase_order_line_id: line.id, quantity, unit_price }
    }

    #[test]
    fn exact_invoice_matches() {
        let (a, b) = order();
        let received = HashMap::from([(a.id, dec!(10)), (b.id, dec!(4))]);
        let outcome = three_way_match(&[a, b], &received, &none(), &[bill(&a, dec!(10), dec!(50)), bill(&b, dec!(4), dec!(200))], Tolerances::default());
        assert!(outcome.is_matched());
        assert!(outcome.discrepancies.is_empty());
    }

    #[test]
    fn partial_billing_of_received_goods_matches() {
        let (a, b) = order();
        let received = HashMap::from([(a.id, dec!(6))]);
        let outcome = three_way_match(&[a, b], &received, &none(), &[bill(&a, dec!(6), dec!(50))], Tolerances::default());
        assert_eq!(outcome.status, MatchStatus::Matched);
    }

    #[test]
    fn billing_unreceived_goods_is_flagged() {
        let (a, b) = order();
        let received = HashMap::from([(a.id, dec!(6))]);
        let outcome = three_way_match(&[a, b], &received, &none(), &[bill(&a, dec!(8), dec!(50)), bill(&b, dec!(1), dec!(200))], Tolerances::default());
        assert_eq!(outcome.status, MatchStatus::Exception);
        assert_eq!(
            outcome.discrepancies,
            vec![
                Discrepancy::QuantityNotReceived { line_id: a.id, billed: dec!(8), received: dec!(6) },
                Discrepancy::QuantityNotReceived { line_id: b.id, billed: dec!(1), received: dec!(0) },
            ]
        );
    }

    #[test]
    fn tolerances_absorb_small_differences() {
        let (a, _) = order();
        let received = HashMap::from([(a.id, dec!(10))]);
        let tol = Tolerances { quantity_pct: dec!(5), price_pct: dec!(2) };
        let ok = three_way_match(&[a], &received, &none(), &[bill(&a, dec!(10.5), dec!(51))], tol);
        assert!(ok.is_matched());
        let off = three_way_match(&[a], &received, &none(), &[bill(&a, dec!(10.5), dec!(51.01))], tol);
        assert_eq!(off.discrepancies, vec![Discrepancy::PriceMismatch { line_id: a.id, billed: dec!(51.01), ordered: dec!(50) }]);
    }

    #[test]
    fn unknown_and_duplicate_lines_are_flagged() {
        let (a, _) = order();
        let stranger = Uuid::new_v4();
        let received = HashMap::from([(a.id, dec!(10))]);
        let billed = [
            bill(&a, dec!(5), dec!(50)),
            bill(&a, dec!(5), dec!(50)),
            BilledLine { purchase_order_line_id: stranger, quantity: dec!(1), unit_price: dec!(1) },
        ];
        let outcome = three_way_match(&[a], &received, &none(), &billed, Tolerances::default());
        assert_eq!(
            outcome.discrepancies,
            vec![Discrepancy::DuplicateLine { line_id: a.id }, Discrepancy::UnknownLine { line_id: stranger }]
        );
    }

    #[test]
    fn goods_billed_on_an_earlier_invoice_are_flagged() {
        let (a, b) = order();
        let received = HashMap::from([(a.id, dec!(10)), (b.id, dec!(4))]);
        let earlier = HashMap::from([(a.id, dec!(10)), (b.id, dec!(2))]);
        let outcome = three_way_match(&[a, b], &received, &earlier, &[bill(&a, dec!(10), dec!(50)), bill(&b, dec!(2), dec!(200))], Tolerances::default());
        assert_eq!(outcome.status, MatchStatus::Exception);
        assert_eq!(
            outcome.discrepancies,
            vec![Discrepancy::AlreadyBilled { line_id: a.id, billed: dec!(10), previously_billed: dec!(10), received: dec!(10) }]
        );
    }
}
