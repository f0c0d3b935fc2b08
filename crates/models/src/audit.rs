//! Audit-field helpers shared by every entity.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Actor recorded in `created_by` when the caller does not name one.
pub const SYSTEM_ACTOR: &str = "system";

/// First value of every `row_version` column.
pub const INITIAL_VERSION: i32 = 1;

pub fn now() -> DateTimeWithTimeZone { Utc::now().into() }

/// Normalise a caller-supplied actor name.
pub fn actor_or_system(actor: Option<&str>) -> String {
    match actor.map(str::trim) {
        Some(a) if !a.is_empty() => a.chars().take(100).collect(),
        _ => SYSTEM_ACTOR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_actor_falls_back_to_system() {
        assert_eq!(actor_or_system(None), "system");
        assert_eq!(actor_or_system(Some("   ")), "system");
        assert_eq!(actor_or_system(Some(" alice ")), "alice");
    }
}
