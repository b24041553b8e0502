use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 8080));

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
        }
    }
}

#[derive(Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
}

impl ServerConfig {
    /// Read the `[server]` table of a TOML document. A missing table yields
    /// the defaults.
    pub fn from_toml_str(source: &str) -> ServerResult<Self> {
        let file: ConfigFile = toml::from_str(source)
            .map_err(|e| ServerError::Config(format!("invalid config: {e}")))?;
        Ok(file.server)
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }
}
