//! Paging parameters shared by every listing endpoint.
//!
//! Pages are 1-based on the wire and converted to SeaORM's 0-based page
//! index by [`Pagination::normalize`].

use serde::Deserialize;

const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters, usually taken from the query string.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { 20 }

impl Pagination {
    /// Clamp to sane bounds and return `(page_index, per_page)` as `u64`.
    pub fn normalize(self) -> (u64, u64) {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        ((page - 1) as u64, per_page as u64)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: default_page(), per_page: default_per_page() } }
}
