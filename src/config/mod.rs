//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ComposerConfig (validated, immutable)
//!     → composition timeout, message source, observability setup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from_str, ConfigError};
pub use schema::ComposerConfig;
pub use schema::CompositionConfig;
pub use schema::MessageConfig;
pub use schema::ObservabilityConfig;
pub use validation::{validate_config, ValidationError};
