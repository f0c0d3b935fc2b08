//! Field-level checks reused by several entities.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::{invalid, ModelError};

/// Required text field: trimmed, non-empty, at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, ModelError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(invalid(format!("{field} required")));
    }
    if v.chars().count() > max {
        return Err(invalid(format!("{field} longer than {max} characters")));
    }
    Ok(v.to_string())
}

pub fn email(value: &str) -> Result<String, ModelError> {
    let v = value.trim();
    match v.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(v.to_string()),
        _ => Err(invalid("invalid email")),
    }
}

pub fn optional_email(value: Option<&str>) -> Result<Option<String>, ModelError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => email(v).map(Some),
    }
}

pub fn non_negative(field: &str, value: Decimal) -> Result<(), ModelError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid(format!("{field} must be >= 0")));
    }
    Ok(())
}

pub fn positive(field: &str, value: Decimal) -> Result<(), ModelError> {
    if value <= Decimal::ZERO {
        return Err(invalid(format!("{field} must be > 0")));
    }
    Ok(())
}

pub fn allocation_pct(value: i32) -> Result<(), ModelError> {
    if !(1..=100).contains(&value) {
        return Err(invalid("allocation must be between 1 and 100 percent"));
    }
    Ok(())
}

pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ModelError> {
    if end < start {
        return Err(invalid("end date must not be before start date"));
    }
    Ok(())
}

/// `inner` must lie completely inside `outer` (both inclusive).
pub fn within(what: &str, inner: (NaiveDate, NaiveDate), outer: (NaiveDate, NaiveDate)) -> Result<(), ModelError> {
    if inner.0 < outer.0 || inner.1 > outer.1 {
        return Err(invalid(format!(
            "{what} dates {}..{} fall outside {}..{}",
            inner.0, inner.1, outer.0, outer.1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[test]
    fn required_text_trims_and_bounds() {
        assert_eq!(required_text("name", "  Acme ", 10).unwrap(), "Acme");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn email_needs_both_sides() {
        assert!(email("a@b.io").is_ok());
        assert!(email("@b.io").is_err());
        assert!(email("ab.io").is_err());
        assert_eq!(optional_email(Some("")).unwrap(), None);
    }

    #[test]
    fn amounts() {
        assert!(non_negative("x", dec!(0)).is_ok());
        assert!(non_negative("x", dec!(-0.01)).is_err());
        assert!(positive("x", dec!(0)).is_err());
        assert!(positive("x", dec!(0.5)).is_ok());
    }

    #[test]
    fn allocation_bounds() {
        assert!(allocation_pct(0).is_err());
        assert!(allocation_pct(1).is_ok());
        assert!(allocation_pct(100).is_ok());
        assert!(allocation_pct(101).is_err());
    }

    #[test]
    fn ranges() {
        assert!(date_range(d(2025, 1, 1), d(2025, 1, 1)).is_ok());
        assert!(date_range(d(2025, 1, 2), d(2025, 1, 1)).is_err());
        let outer = (d(2025, 1, 1), d(2025, 6, 30));
        assert!(within("slot", (d(2025, 1, 1), d(2025, 6, 30)), outer).is_ok());
        assert!(within("slot", (d(2024, 12, 31), d(2025, 2, 1)), outer).is_err());
        assert!(within("slot", (d(2025, 2, 1), d(2025, 7, 1)), outer).is_err());
    }
}
