// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! DNS label mangling
//!
//! Task and step names have to be RFC 1035 labels: they must match
//! `[a-z]([-a-z0-9]*[a-z0-9])?` and be at most 63 characters long.

/// Maximum length of a DNS label
pub const MAX_LABEL_LENGTH: usize = 63;

/// Turn `body` into a DNS label ending in `-<suffix>`.
///
/// `body` must contain at least one ASCII letter and `suffix` must be
/// non-empty and alphanumeric; the validator guarantees both for stage
/// names. The body is truncated, never the suffix.
pub fn mangle(body: &str, suffix: &str) -> String {
    let max_body = MAX_LABEL_LENGTH.saturating_sub(suffix.len() + 1);

    let mut out = String::with_capacity(MAX_LABEL_LENGTH);
    let mut pending_hyphen = false;

    for c in body.chars() {
        let keep = match c {
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            'a'..='z' => Some(c),
            '0'..='9' if !out.is_empty() => Some(c),
            ' ' | '-' | '.' if !out.is_empty() => {
                pending_hyphen = true;
                None
            }
            _ => None,
        };

        let Some(c) = keep else {
            continue;
        };

        let needed = if pending_hyphen { 2 } else { 1 };
        if out.len() + needed > max_body {
            break;
        }
        if pending_hyphen {
            out.push('-');
            pending_hyphen = false;
        }
        out.push(c);
    }

    out.push('-');
    out.push_str(suffix);
    out
}
