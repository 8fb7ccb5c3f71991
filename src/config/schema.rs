//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transfers::Amount;

/// Root configuration for the transfer service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,

    /// Withdrawal processing settings.
    pub withdrawals: WithdrawalConfig,

    /// Accounts created at startup.
    pub accounts: Vec<SeedAccount>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
            withdrawals: WithdrawalConfig::default(),
            accounts: vec![
                SeedAccount {
                    id: Uuid::from_u128(0x12345678_abcd_abcd_1234_000000000001),
                    name: "User 1".to_string(),
                    balance: Amount::from_minor_units(1000_00),
                },
                SeedAccount {
                    id: Uuid::from_u128(0x12345678_abcd_abcd_1234_000000000002),
                    name: "User 2".to_string(),
                    balance: Amount::from_minor_units(500_00),
                },
            ],
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one request/response in seconds.
    pub request_secs: u64,

    /// How long shutdown waits for in-flight connections in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Level filter (`RUST_LOG` syntax). `RUST_LOG` itself takes precedence.
    pub log_level: String,

    /// Output format for log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "transfer_service=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9000".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `X-Content-Type-Options` and `X-Frame-Options` to every response.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

/// Withdrawal processing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WithdrawalConfig {
    /// How often pending withdrawals are checked, in milliseconds.
    pub poll_interval_ms: u64,

    /// Lower bound of the simulated settlement delay, in milliseconds.
    pub min_settle_ms: u64,

    /// Upper bound of the simulated settlement delay, in milliseconds.
    pub max_settle_ms: u64,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            min_settle_ms: 1000,
            max_settle_ms: 10_000,
        }
    }
}

/// An account created at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeedAccount {
    pub id: Uuid,
    pub name: String,
    pub balance: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(
            config.accounts[0].id.to_string(),
            "12345678-abcd-abcd-1234-000000000001"
        );
        assert_eq!(config.accounts[1].balance.to_string(), "500.00");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9999"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.accounts.len(), 2);
    }

    #[test]
    fn test_accounts_section_replaces_seeds() {
        let config: AppConfig = toml::from_str(
            r#"
            [[accounts]]
            id = "00000000-0000-0000-0000-00000000000a"
            name = "Treasury"
            balance = "250.75"
            "#,
        )
        .unwrap();

        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].name, "Treasury");
        assert_eq!(config.accounts[0].balance, Amount::from_minor_units(250_75));
    }
}
