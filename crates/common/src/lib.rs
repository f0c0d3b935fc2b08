//! Shared building blocks used by every ProjeX crate: tracing setup,
//! pagination parameters and a couple of wire types.

pub mod types;
pub mod utils;
pub mod pagination;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn page_serializes_with_meta() {
        let p = types::Page { items: vec![1, 2], page: 1, per_page: 20 };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["items"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(v["per_page"], 20);
    }
}
