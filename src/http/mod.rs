//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, /post and /put routes)
//!     → request.rs (request ID assigned and propagated)
//!     → relay (translate, forward)
//!     → 200 response carrying target body or error text
//! ```

pub mod request;
pub mod server;

pub use request::{request_id_header, MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
