//! Sequential document numbers of the form `{prefix}-{year}-{seq:05}`.
//!
//! Used for customer invoices and purchase orders. Sequences restart at 1
//! every year and per prefix.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use models::{invoice, purchase_order};

use crate::errors::ServiceError;

pub fn format_number(prefix: &str, year: i32, seq: u32) -> String {
    format!("{prefix}-{year}-{seq:05}")
}

/// The sequence part of `number` when it belongs to `prefix` and `year`.
pub fn parse_sequence(prefix: &str, year: i32, number: &str) -> Option<u32> {
    let rest = number.strip_prefix(prefix)?.strip_prefix('-')?;
    let rest = rest.strip_prefix(&year.to_string())?.strip_prefix('-')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// One above the highest sequence in `existing` for this prefix and year.
///
/// Numbers from other years or prefixes, and malformed ones, are ignored.
pub fn next_number<'a, I>(prefix: &str, year: i32, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing.into_iter().filter_map(|n| parse_sequence(prefix, year, n)).max().unwrap_or(0);
    format_number(prefix, year, highest + 1)
}

pub async fn next_invoice_number<C: ConnectionTrait>(db: &C, prefix: &str, year: i32) -> Result<String, ServiceError> {
    let stem = format!("{prefix}-{year}-");
    let used: Vec<String> = invoice::Entity::find()
        .select_only()
        .column(invoice::Column::InvoiceNumber)
        .filter(invoice::Column::InvoiceNumber.starts_with(&stem))
        .into_tuple()
        .all(db)
        .await?;
    Ok(next_number(prefix, year, used.iter().map(String::as_str)))
}

pub async fn next_purchase_order_number<C: ConnectionTrait>(db: &C, prefix: &str, year: i32) -> Result<String, ServiceError> {
    let stem = format!("{prefix}-{year}-");
    let used: Vec<String> = purchase_order::Entity::find()
        .select_only()
        .column(purchase_order::Column::PoNumber)
        .filter(purchase_order::Column::PoNumber.starts_with(&stem))
        .into_tuple()
        .all(db)
        .await?;
    Ok(next_number(prefix, year, used.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_of_the_year() {
        assert_eq!(next_number("INV", 2025, []), "INV-2025-00001");
    }

    #[test]
    fn continues_from_highest_not_latest() {
        let used = ["INV-2025-00002", "INV-2025-00010", "INV-2025-00003"];
        assert_eq!(next_number("INV", 2025, used), "INV-2025-00011");
    }

    #[test]
    fn restarts_each_year_and_ignores_noise() {
        let used = ["INV-2024-00099", "PO-2025-00007", "INV-2025-abc", "INV-2025-", "INVX-2025-00050"];
        assert_eq!(next_number("INV", 2025, used), "INV-2025-00001");
    }

    #[test]
    fn sequence_grows_past_five_digits() {
        assert_eq!(next_number("PO", 2026, ["PO-2026-99999"]), "PO-2026-100000");
        assert_eq!(parse_sequence("PO", 2026, "PO-2026-100000"), Some(100000));
    }
}
