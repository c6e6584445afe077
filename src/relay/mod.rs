//! Method-translation relay.
//!
//! # Data Flow
//! ```text
//! GET /post?protocol=..&host=..&_X-Key=..
//!     → query.rs (decode into an ordered multi-map)
//!     → descriptor.rs (take reserved keys and header directives)
//!     → target.rs (protocol://host[:port]path[?remaining])
//!     → forward.rs (build client + request, execute, read body)
//!     → bytes (or error text) written into a 200 response
//! ```

pub mod descriptor;
pub mod forward;
pub mod query;
pub mod target;

pub use descriptor::{translate, RequestDescriptor};
pub use forward::{Forwarder, RelayError};
pub use query::QuerySet;
pub use target::build_target_url;
