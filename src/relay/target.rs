//! Target URL assembly.

use crate::relay::descriptor::RequestDescriptor;

/// Concatenate `protocol://host[:port]path[?query]`.
///
/// Nothing is validated here; a malformed result is reported when the
/// outbound request is constructed.
pub fn build_target_url(descriptor: &RequestDescriptor) -> String {
    let mut url = format!("{}://{}", descriptor.protocol, descriptor.host);
    if !descriptor.port.is_empty() {
        url.push(':');
        url.push_str(&descriptor.port);
    }
    url.push_str(&descriptor.path);

    let query = descriptor.query.encode();
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }
    url
}
