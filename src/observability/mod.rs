//! Observability subsystem.
//!
//! Console logging only: `tracing` events from the server and relay are
//! formatted by `tracing-subscriber` on stdout.

pub mod logging;

pub use logging::init_logging;
