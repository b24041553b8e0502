//! Validated store locations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, CompareResult};

/// Required suffix of a store directory name.
pub const STORE_SUFFIX: &str = ".db";

/// Absolute path to a store directory whose name ends in `.db`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreLocation {
    path: PathBuf,
}

impl StoreLocation {
    /// Validate `raw` and resolve it to an absolute path.
    ///
    /// A single trailing `/` is accepted. The final component must be
    /// `<name>.db` with a non-empty name.
    pub fn parse(raw: &str) -> CompareResult<Self> {
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);
        let stem = Path::new(trimmed)
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(STORE_SUFFIX));
        match stem {
            Some(name) if !name.is_empty() => {}
            _ => {
                return Err(CompareError::Config(format!(
                    "store path must end with {STORE_SUFFIX} or {STORE_SUFFIX}/, got {raw:?}"
                )))
            }
        }

        let path = std::path::absolute(trimmed)
            .map_err(|e| CompareError::Config(format!("cannot resolve {raw:?}: {e}")))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name without the `.db` suffix.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(STORE_SUFFIX))
            .unwrap_or_default()
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl FromStr for StoreLocation {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoreLocation {
    type Error = CompareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreLocation> for String {
    fn from(location: StoreLocation) -> Self {
        location.path.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_db_suffix() {
        let location = StoreLocation::parse("/data/application.db").unwrap();
        assert_eq!(location.path(), Path::new("/data/application.db"));
        assert_eq!(location.name(), "application");
    }

    #[test]
    fn accepts_trailing_slash() {
        let location = StoreLocation::parse("/data/application.db/").unwrap();
        assert_eq!(location.path(), Path::new("/data/application.db"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let location = StoreLocation::parse("left.db").unwrap();
        assert!(location.path().is_absolute());
        assert!(location.path().ends_with("left.db"));
    }

    #[test]
    fn rejects_other_suffixes() {
        for raw in ["/data/application", "/data/app.dbx", "/data/.db", "", ".db/"] {
            assert!(
                matches!(StoreLocation::parse(raw), Err(CompareError::Config(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_from_str_and_serde() {
        let location: StoreLocation = "/tmp/x.db".parse().unwrap();
        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(json, r#""/tmp/x.db""#);
        let back: StoreLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, location);
        assert!(serde_json::from_str::<StoreLocation>(r#""/tmp/x""#).is_err());
    }
}
