//! Human-readable rendering of raw keys.

use serde::{Deserialize, Serialize};

/// A key rendered for people: always hex, plus a readable form when the
/// bytes allow one.
///
/// Keys shaped `<namespace>:<id>` are split at the first `:` and each half
/// is shown verbatim if printable, otherwise as `0x<hex>`. Other keys get a
/// readable form only when fully printable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDisplay {
    pub hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<String>,
}

impl KeyDisplay {
    pub fn new(key: &[u8]) -> Self {
        Self {
            hex: hex::encode(key),
            pretty: pretty_key(key),
        }
    }
}

/// Readable form of `key`, if any.
pub fn pretty_key(key: &[u8]) -> Option<String> {
    match key.iter().position(|&b| b == b':') {
        Some(cut) => Some(format!(
            "{}:{}",
            render_part(&key[..cut]),
            render_part(&key[cut + 1..])
        )),
        None => printable(key).map(str::to_string),
    }
}

fn render_part(bytes: &[u8]) -> String {
    match printable(bytes) {
        Some(text) => text.to_string(),
        None => format!("0x{}", hex::encode(bytes)),
    }
}

fn printable(bytes: &[u8]) -> Option<&str> {
    if bytes.iter().all(|b| (0x20..0x80).contains(b)) {
        std::str::from_utf8(bytes).ok()
    } else {
        None
    }
}
