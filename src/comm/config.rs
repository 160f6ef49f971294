use serde::Deserialize;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;

/// Comm module configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommConfig {
    /// Listen address (default: 127.0.0.1)
    pub listen_addr: String,
    /// Listen port (default: 8765)
    pub listen_port: u16,
    /// Directory holding `index.html` (default: templates)
    pub templates_dir: PathBuf,
    /// Resource catalog served on `/api/resources` (default: resources.json)
    pub resources_file: PathBuf,
    /// Open the UI in the default browser after binding (default: true)
    pub open_browser: bool,
}

impl Default for CommConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1".to_string(),
            listen_port: 8765,
            templates_dir: PathBuf::from("templates"),
            resources_file: PathBuf::from("resources.json"),
            open_browser: true,
        }
    }
}

impl CommConfig {
    /// Returns the socket address to bind to
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.listen_addr.parse()?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }

    /// Path of the page served on `/`
    pub fn index_file(&self) -> PathBuf {
        self.templates_dir.join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = CommConfig::default();
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:8765".parse().unwrap());

        let config = CommConfig {
            listen_addr: "::1".to_string(),
            listen_port: 0,
            ..Default::default()
        };
        assert!(config.bind_addr().unwrap().ip().is_loopback());

        let config = CommConfig {
            listen_addr: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
