//! Key layout of a tree inside its namespace.
//!
//! ```text
//! v | version (u64 BE)                                -> bincode VersionRecord
//! d | escaped key | 0x00 0x00 | version (u64 BE)      -> bincode Option<value>
//! ```
//!
//! A `d` record holds the state of one key as of one version: `Some(value)`
//! for a write, `None` for a removal. Inside the escaped key every `0x00`
//! byte is written as `0x00 0xff`, so the `0x00 0x00` terminator never
//! appears in key material. As a result `d` records sort by key in plain
//! byte order first and by version second, and all records of one key are
//! contiguous.

use serde::{Deserialize, Serialize};
use statediff_types::{RootHash, Version};

use crate::error::{TreeError, TreeResult};

pub(crate) const VERSION_TAG: u8 = b'v';
pub(crate) const DATA_TAG: u8 = b'd';

/// Metadata committed alongside every version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Root hash of the version.
    pub root_hash: RootHash,
    /// Number of live keys at the version.
    pub size: u64,
}

impl VersionRecord {
    pub(crate) fn encode(&self) -> TreeResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| TreeError::Serialization(e.to_string()))
    }

    pub(crate) fn decode(bytes: &[u8]) -> TreeResult<Self> {
        bincode::deserialize(bytes).map_err(|e| TreeError::Serialization(e.to_string()))
    }
}

pub(crate) fn version_key(version: Version) -> Vec<u8> {
    let mut raw = Vec::with_capacity(9);
    raw.push(VERSION_TAG);
    raw.extend_from_slice(&version.to_be_bytes());
    raw
}

pub(crate) fn parse_version_key(raw: &[u8]) -> Option<Version> {
    match raw {
        [VERSION_TAG, rest @ ..] => Some(Version::from_be_bytes(rest.try_into().ok()?)),
        _ => None,
    }
}

const KEY_TERMINATOR: [u8; 2] = [0x00, 0x00];
const ESCAPED_ZERO: u8 = 0xff;

pub(crate) fn data_key(key: &[u8], version: Version) -> Vec<u8> {
    let mut raw = Vec::with_capacity(1 + key.len() + 2 + 8);
    raw.push(DATA_TAG);
    for &byte in key {
        raw.push(byte);
        if byte == 0x00 {
            raw.push(ESCAPED_ZERO);
        }
    }
    raw.extend_from_slice(&KEY_TERMINATOR);
    raw.extend_from_slice(&version.to_be_bytes());
    raw
}

/// Half-open range holding every record of `key` with version `<= through`.
pub(crate) fn data_key_range(key: &[u8], through: Version) -> (Vec<u8>, Vec<u8>) {
    let start = data_key(key, 0);
    let end = match through.checked_add(1) {
        Some(next) => data_key(key, next),
        None => {
            let mut end = data_key(key, Version::MAX);
            end.push(0x00);
            end
        }
    };
    (start, end)
}

pub(crate) fn parse_data_key(raw: &[u8]) -> Option<(Vec<u8>, Version)> {
    let rest = raw.strip_prefix(&[DATA_TAG])?;
    let (body, version) = rest.split_last_chunk::<8>()?;
    let body = body.strip_suffix(&KEY_TERMINATOR)?;

    let mut key = Vec::with_capacity(body.len());
    let mut bytes = body.iter();
    while let Some(&byte) = bytes.next() {
        if byte == 0x00 && bytes.next() != Some(&ESCAPED_ZERO) {
            return None;
        }
        key.push(byte);
    }
    Some((key, Version::from_be_bytes(*version)))
}

pub(crate) fn encode_value(value: Option<&[u8]>) -> TreeResult<Vec<u8>> {
    bincode::serialize(&value).map_err(|e| TreeError::Serialization(e.to_string()))
}

pub(crate) fn decode_value(bytes: &[u8]) -> TreeResult<Option<Vec<u8>>> {
    bincode::deserialize(bytes).map_err(|e| TreeError::Serialization(e.to_string()))
}
