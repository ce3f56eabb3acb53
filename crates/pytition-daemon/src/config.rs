//! Configuration file management.
//!
//! `config.toml` lives in the data directory. Every field has a default, so
//! a missing file or a partial one is fine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use pytition_types::{PetitionContent, DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PYTITION_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Mail defaults applied to new petitions and templates.
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Database file name inside the data directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

/// RPC server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket file name inside the data directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// Default SMTP settings for content created through the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Sender of confirmation emails. Empty = left to the mail transport.
    #[serde(default)]
    pub confirmation_sender: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_database_file() -> String {
    "pytition.db".to_string()
}

fn default_socket_name() -> String {
    "pytitiond.sock".to_string()
}

fn default_event_buffer() -> usize {
    1000
}

fn default_smtp_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            database_file: default_database_file(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_name: default_socket_name(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            confirmation_sender: String::new(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl EmailConfig {
    /// Content preset carrying the configured mail defaults.
    pub fn seed_content(&self) -> PetitionContent {
        let mut content = PetitionContent::default();
        for smtp in [
            &mut content.newsletter.smtp,
            &mut content.confirmation_email.smtp,
        ] {
            smtp.host = self.smtp_host.clone();
            smtp.port = self.smtp_port;
        }
        content.confirmation_email.sender = self.confirmation_sender.clone();
        content
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.database_file)
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir().join(&self.server.socket_name)
    }

    /// `tracing` filter directive for this configuration.
    pub fn log_directive(&self) -> String {
        format!("pytition={}", self.advanced.log_level)
    }

    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Pytition")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".pytition")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/pytition"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.storage.database_file, "pytition.db");
        assert_eq!(config.server.socket_name, "pytitiond.sock");
        assert_eq!(config.server.event_buffer, 1000);
        assert_eq!(config.email.smtp_host, "localhost");
        assert_eq!(config.email.smtp_port, 25);
        assert_eq!(config.log_directive(), "pytition=info");
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
    }

    #[test]
    fn test_partial_file() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/srv/pytition"

            [email]
            smtp_port = 587
            "#,
        )
        .expect("parse");
        assert_eq!(config.data_dir(), PathBuf::from("/srv/pytition"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/pytition/pytition.db")
        );
        assert_eq!(config.email.smtp_host, "localhost");
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn test_seed_content() {
        let email = EmailConfig {
            smtp_host: "mail.example.org".into(),
            smtp_port: 465,
            confirmation_sender: "noreply@example.org".into(),
        };
        let content = email.seed_content();
        assert_eq!(content.newsletter.smtp.host, "mail.example.org");
        assert_eq!(content.confirmation_email.smtp.port, 465);
        assert_eq!(content.confirmation_email.sender, "noreply@example.org");
        assert!(content.validate().is_ok());
    }
}
