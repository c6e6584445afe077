//! Translation of an inbound query string into an outbound request.
//!
//! # Reserved parameters
//! `debug`, `ignoreSslErrors`, `protocol`, `host`, `port`, `path` and `body`
//! are consumed here. Keys starting with `_` become outbound headers.
//! Everything else stays in [`RequestDescriptor::query`] and is forwarded.

use std::collections::BTreeMap;
use std::io::Write as _;

use base64::{engine::general_purpose, Engine as _};
use percent_encoding::{percent_encode, CONTROLS};
use reqwest::Method;

use crate::relay::query::QuerySet;

/// Prefix marking a query key as a header directive.
pub const HEADER_PREFIX: &str = "_";

/// Header directive whose value is Basic-auth encoded.
pub const BASIC_AUTH_KEY: &str = "_Authorization_Basic";

/// Everything needed to issue one outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub debug: bool,
    pub ignore_tls_errors: bool,
    pub protocol: String,
    pub host: String,
    /// Empty when not supplied.
    pub port: String,
    pub path: String,
    /// Raw bytes; empty means no outbound body.
    pub body: Vec<u8>,
    /// Inbound parameters left after reserved keys and header directives are taken.
    pub query: QuerySet,
    pub headers: BTreeMap<String, Vec<u8>>,
}

/// Build a descriptor for `method` from the raw inbound query string.
pub fn translate(method: Method, raw_query: &str) -> RequestDescriptor {
    let mut query = QuerySet::parse(raw_query);

    let debug = query.take_flag("debug");
    let ignore_tls_errors = query.take_flag("ignoreSslErrors");
    let protocol = url_text(query.take_first("protocol"));
    let host = url_text(query.take_first("host"));
    let port = url_text(query.take_first("port"));
    let path = url_text(query.take_first("path"));
    let body = query.take_first("body");
    let headers = take_headers(&mut query);

    RequestDescriptor {
        method,
        debug,
        ignore_tls_errors,
        protocol,
        host,
        port,
        path,
        body,
        query,
        headers,
    }
}

/// URL components go into a string; bytes that are not UTF-8 stay escaped.
fn url_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| percent_encode(e.as_bytes(), CONTROLS).to_string())
}

/// Consume the header directives. Basic auth is resolved first; remaining
/// directives are applied in key order and a later one overwrites an
/// earlier one that names the same header. Every leading `_` is stripped
/// from the header name.
fn take_headers(query: &mut QuerySet) -> BTreeMap<String, Vec<u8>> {
    let mut headers = BTreeMap::new();

    if let Some(values) = query.take_all(BASIC_AUTH_KEY) {
        let credentials = values.into_iter().next().unwrap_or_default();
        headers.insert(
            "Authorization".to_string(),
            format!("Basic {}", general_purpose::STANDARD.encode(credentials)).into_bytes(),
        );
    }

    for (key, values) in query.take_prefixed(HEADER_PREFIX) {
        // An invalid name is rejected when the outbound request is built.
        let key = String::from_utf8_lossy(&key);
        let name = key.trim_start_matches(HEADER_PREFIX);
        headers.insert(name.to_string(), values.join(&b','));
    }

    headers
}

impl RequestDescriptor {
    /// Human-readable dump of every field, one line each. Body and header
    /// values are written as received.
    pub fn debug_dump(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let _ = writeln!(out, "ignoreSslErrors: {}", self.ignore_tls_errors);
        let _ = writeln!(out, "method: {}", self.method);
        let _ = writeln!(out, "protocol: {}", self.protocol);
        let _ = writeln!(out, "host: {}", self.host);
        let _ = writeln!(out, "port: {}", self.port);
        let _ = writeln!(out, "path: {}", self.path);
        let _ = writeln!(out, "query: {}", self.query.encode());
        out.extend_from_slice(b"body: ");
        out.extend_from_slice(&self.body);
        out.push(b'\n');
        for (name, value) in &self.headers {
            let _ = write!(out, "headers: {}: ", name);
            out.extend_from_slice(value);
            out.push(b'\n');
        }
        out
    }

    /// Whether certificate validation is skipped for the outbound call.
    pub fn skips_tls_verification(&self) -> bool {
        self.protocol == "https" && self.ignore_tls_errors
    }
}
