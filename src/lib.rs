//! GET-to-POST/PUT method-translation relay library.

pub mod config;
pub mod http;
pub mod observability;
pub mod relay;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use relay::{translate, Forwarder, RelayError, RequestDescriptor};
