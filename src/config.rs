use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub bind: SocketAddr,
    /// Durable subscription store; in-memory when unset.
    pub store_path: Option<PathBuf>,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "SmartAid".to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store_path: None,
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
        }
    }
}
