//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON), or defaults when absent
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → shared via Arc to listener loop, relays and shutdown coordinator
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once built; no process-wide mutable defaults
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{load_config, load_config_or_default, ConfigError};
pub use schema::{ProxyConfig, Strategy};
pub use settings::Settings;
pub use validation::{validate_config, ValidationError};
