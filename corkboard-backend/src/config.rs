//! Server configuration from environment variables.

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Read CORKBOARD_PORT / CORKBOARD_BIND, keeping defaults on anything
/// missing or unparsable.
pub fn from_env() -> ServerConfig {
    let mut config = ServerConfig::default();
    if let Ok(value) = std::env::var("CORKBOARD_PORT") {
        match value.parse() {
            Ok(port) => config.port = port,
            Err(e) => log::warn!("Ignoring invalid CORKBOARD_PORT {:?}: {}", value, e),
        }
    }
    if let Ok(value) = std::env::var("CORKBOARD_BIND") {
        config.bind_address = value;
    }
    config
}
