//! Store location configuration.
//!
//! Locations come from three layers, later ones winning: a TOML file, the
//! `STATEDIFF_LEFT`/`STATEDIFF_RIGHT` environment variables, and explicit
//! values (typically command-line flags).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, CompareResult, Side};
use crate::location::StoreLocation;

/// Environment variable naming the left store.
pub const LEFT_ENV: &str = "STATEDIFF_LEFT";
/// Environment variable naming the right store.
pub const RIGHT_ENV: &str = "STATEDIFF_RIGHT";

/// Raw, unvalidated store locations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub left: Option<String>,
    pub right: Option<String>,
}

impl CompareConfig {
    pub fn new(left: Option<String>, right: Option<String>) -> Self {
        Self { left, right }
    }

    /// Parse the top-level `left`/`right` keys of a TOML document. Other
    /// tables are ignored.
    pub fn from_toml_str(source: &str) -> CompareResult<Self> {
        toml::from_str(source).map_err(|e| CompareError::Config(format!("invalid config: {e}")))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> CompareResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompareError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Locations from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Locations from an arbitrary variable lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            left: read(LEFT_ENV),
            right: read(RIGHT_ENV),
        }
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            left: other.left.or(self.left),
            right: other.right.or(self.right),
        }
    }

    /// Validate both locations. Missing or malformed values are
    /// configuration errors.
    pub fn locations(&self) -> CompareResult<(StoreLocation, StoreLocation)> {
        let left = resolve(Side::Left, self.left.as_deref())?;
        let right = resolve(Side::Right, self.right.as_deref())?;
        Ok((left, right))
    }
}

fn resolve(side: Side, raw: Option<&str>) -> CompareResult<StoreLocation> {
    let env = match side {
        Side::Left => LEFT_ENV,
        Side::Right => RIGHT_ENV,
    };
    let raw = raw.ok_or_else(|| {
        CompareError::Config(format!("{side} store location is not set (use --{side} or {env})"))
    })?;
    StoreLocation::parse(raw)
}
