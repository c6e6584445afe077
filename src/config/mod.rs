//! Configuration management subsystem.
//!
//! The binary runs on `RelayConfig::default()`: port 8080 and a 30 second
//! outbound timeout. Embedders and tests construct or adjust the struct
//! directly.

pub mod schema;

pub use schema::RelayConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::TimeoutConfig;
