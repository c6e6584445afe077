//! Ordered multi-map over decoded query parameters.
//!
//! Keys and values are kept as raw bytes: a `%FF` in the inbound query is
//! forwarded as `%FF`, never replaced by a UTF-8 substitute.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode, percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left unescaped when serializing: alphanumerics and `-_.~`.
/// Space is written as `+` separately.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Decoded query parameters, keyed and serialized in sorted byte order.
///
/// Every `take_*` operation removes all occurrences of the key, so whatever
/// remains can be forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySet {
    params: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl QuerySet {
    /// Decode an `application/x-www-form-urlencoded` query string.
    ///
    /// Pairs containing `;` or a malformed `%` escape are dropped, as are
    /// empty segments. A segment without `=` has the empty value.
    pub fn parse(raw: &str) -> Self {
        let mut params: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();

        for segment in raw.as_bytes().split(|b| *b == b'&') {
            if segment.is_empty() || segment.contains(&b';') {
                continue;
            }
            let (key, value) = match segment.iter().position(|b| *b == b'=') {
                Some(eq) => (&segment[..eq], &segment[eq + 1..]),
                None => (segment, &b""[..]),
            };
            let (Some(key), Some(value)) = (unescape(key), unescape(value)) else {
                continue;
            };
            params.entry(key).or_default().push(value);
        }

        Self { params }
    }

    /// Remove `key`, reporting whether it was present with any value.
    pub fn take_flag(&mut self, key: &str) -> bool {
        self.params.remove(key.as_bytes()).is_some()
    }

    /// Remove `key`, returning its first value or an empty value.
    pub fn take_first(&mut self, key: &str) -> Vec<u8> {
        self.params
            .remove(key.as_bytes())
            .and_then(|values| values.into_iter().next())
            .unwrap_or_default()
    }

    /// Remove `key`, returning all of its values in arrival order.
    pub fn take_all(&mut self, key: &str) -> Option<Vec<Vec<u8>>> {
        self.params.remove(key.as_bytes())
    }

    /// Remove every key starting with `prefix`, in key order.
    pub fn take_prefixed(&mut self, prefix: &str) -> Vec<(Vec<u8>, Vec<Vec<u8>>)> {
        let keys: Vec<Vec<u8>> = self
            .params
            .keys()
            .filter(|key| key.starts_with(prefix.as_bytes()))
            .cloned()
            .collect();

        keys.into_iter()
            .filter_map(|key| self.params.remove_entry(&key))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Serialize as `k=v&k=v`, percent-encoded and sorted by key.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.params {
            for value in values {
                if !out.is_empty() {
                    out.push('&');
                }
                out.push_str(&escape(key));
                out.push('=');
                out.push_str(&escape(value));
            }
        }
        out
    }
}

/// Decode `+` and `%XX`. Returns `None` when a `%` is not followed by two
/// hex digits.
fn unescape(part: &[u8]) -> Option<Vec<u8>> {
    let mut i = 0;
    while i < part.len() {
        if part[i] == b'%' {
            let well_formed = part
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced: Vec<u8> = part
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();
    Some(percent_decode(&spaced).collect())
}

/// Escape one key or value; space becomes `+`.
fn escape(bytes: &[u8]) -> String {
    bytes
        .split(|b| *b == b' ')
        .map(|chunk| percent_encode(chunk, QUERY_ESCAPE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
