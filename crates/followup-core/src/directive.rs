//! Wait directive parsing — finds `[WAIT:<n><unit>]` in free-form message text.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::types::{WaitSpec, WaitUnit};

/// Longest wait a directive may request (24h).
pub const MAX_WAIT_MS: u64 = 24 * 60 * 60 * 1000;

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[WAIT:(\d+)(s|m|h)\]").expect("valid directive regex"))
}

/// Parse the first wait directive in `text`.
///
/// Returns `None` when there is no directive, and also when the first one is
/// zero, overflows, or asks for more than [`MAX_WAIT_MS`]. Later directives in
/// the same text are never considered.
pub fn parse(text: &str) -> Option<WaitSpec> {
    let caps = directive_re().captures(text)?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = WaitUnit::from_suffix(caps.get(2)?.as_str());

    let spec = WaitSpec::new(value, unit)?;
    if spec.duration_ms() > MAX_WAIT_MS {
        return None;
    }
    Some(spec)
}
