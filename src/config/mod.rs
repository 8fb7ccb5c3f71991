//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize, apply CLI overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to startup, which wires each subsystem
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, resolve_config, ConfigError};
pub use schema::{
    AppConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, SecurityConfig,
    SeedAccount, TimeoutConfig, WithdrawalConfig,
};
pub use validation::{validate_config, ValidationError};
