use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Leading bytes shared by every module namespace in a store.
pub const MODULE_KEY_PREFIX: &[u8] = b"s/k:";

/// Byte-string namespace of one module, of the form `s/k:{module}/`.
///
/// The prefix is never empty and always ends with the `/` separator, so a
/// module's keys cannot collide with another module whose name extends it
/// (`s/k:bank/` vs `s/k:bankx/`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModulePrefix {
    module: String,
    bytes: Vec<u8>,
}

impl ModulePrefix {
    /// Build the namespace for `module`.
    pub fn new(module: &str) -> Result<Self, TypeError> {
        if module.is_empty() {
            return Err(TypeError::EmptyModuleName);
        }
        if module.contains('/') {
            return Err(TypeError::InvalidModuleName(module.to_string()));
        }
        let mut bytes = Vec::with_capacity(MODULE_KEY_PREFIX.len() + module.len() + 1);
        bytes.extend_from_slice(MODULE_KEY_PREFIX);
        bytes.extend_from_slice(module.as_bytes());
        bytes.push(b'/');
        Ok(Self {
            module: module.to_string(),
            bytes,
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for ModulePrefix {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ModulePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModulePrefix({})", String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Display for ModulePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}
