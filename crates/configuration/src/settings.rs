use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: Server,
    pub upload: Upload,
}

/// Bind address for the HTTP API.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

/// Limits applied to spreadsheet uploads.
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}
