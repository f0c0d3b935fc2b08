//! Application configuration.
//!
//! Loaded from a TOML file (`CONFIG_PATH`, default `config.toml`); every
//! section has defaults so a partial or missing file still yields a usable
//! configuration. `DATABASE_URL` fills an empty `database.url`.

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub business: BusinessConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Create missing tables from the entity definitions at start-up.
    #[serde(default = "default_true")]
    pub sync_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            sync_schema: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Tunables for the business rules enforced by the service layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    pub invoice_prefix: String,
    pub purchase_order_prefix: String,
    pub default_tax_rate_pct: Decimal,
    /// Working hours in a month, used to turn a monthly cost into an hourly one.
    pub standard_hours_per_month: Decimal,
    /// Ceiling for an employee's concurrent allocation across assignments.
    pub max_allocation_pct: i32,
    pub price_tolerance_pct: Decimal,
    pub quantity_tolerance_pct: Decimal,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            invoice_prefix: "INV".into(),
            purchase_order_prefix: "PO".into(),
            default_tax_rate_pct: Decimal::ZERO,
            standard_hours_per_month: Decimal::from(160),
            max_allocation_pct: 100,
            price_tolerance_pct: Decimal::ZERO,
            quantity_tolerance_pct: Decimal::ZERO,
        }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load the configured file (or defaults when it is absent), then normalise and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.business.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive"));
        }
        Ok(())
    }
}

impl BusinessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.invoice_prefix.trim().is_empty() || self.purchase_order_prefix.trim().is_empty() {
            return Err(anyhow!("business document prefixes must not be empty"));
        }
        if self.invoice_prefix.contains('-') || self.purchase_order_prefix.contains('-') {
            return Err(anyhow!("business document prefixes must not contain '-'"));
        }
        if self.standard_hours_per_month <= Decimal::ZERO {
            return Err(anyhow!("business.standard_hours_per_month must be > 0"));
        }
        if !(1..=100).contains(&self.max_allocation_pct) {
            return Err(anyhow!("business.max_allocation_pct must be in 1..=100"));
        }
        if self.default_tax_rate_pct < Decimal::ZERO
            || self.price_tolerance_pct < Decimal::ZERO
            || self.quantity_tolerance_pct < Decimal::ZERO
        {
            return Err(anyhow!("business rates and tolerances must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.business.invoice_prefix, "INV");
        assert_eq!(cfg.business.standard_hours_per_month, dec!(160));
        assert_eq!(cfg.business.max_allocation_pct, 100);
    }

    #[test]
    fn business_section_overrides_selected_fields() {
        let cfg = load_from_str(
            r#"
            [business]
            invoice_prefix = "LMC"
            default_tax_rate_pct = 7.5
            price_tolerance_pct = "2"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.business.invoice_prefix, "LMC");
        assert_eq!(cfg.business.default_tax_rate_pct, dec!(7.5));
        assert_eq!(cfg.business.price_tolerance_pct, dec!(2));
        assert_eq!(cfg.business.purchase_order_prefix, "PO");
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://localhost/x".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let db = DatabaseConfig {
            url: "postgres://localhost/projex".into(),
            min_connections: 5,
            max_connections: 2,
            ..Default::default()
        };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_allocation_ceiling() {
        let b = BusinessConfig { max_allocation_pct: 150, ..Default::default() };
        assert!(b.validate().is_err());
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut s = ServerConfig { host: " ".into(), port: 9000, worker_threads: Some(0) };
        s.normalize().unwrap();
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.worker_threads, Some(4));
    }
}
