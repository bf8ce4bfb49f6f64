//! Service configuration

use clap::Parser;
use inboxxorcist_classifiers::{BackendKind, ClassifierConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command-line interface
#[derive(Parser, Debug, Default)]
#[command(name = "inboxxorcist-server")]
#[command(about = "InboxXorcist spam classification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PORT")]
    pub port: Option<u16>,

    /// Model file for the naive Bayes backend
    #[arg(short, long, env = "INBOXXORCIST_MODEL")]
    pub model: Option<PathBuf>,

    /// Classifier backend (naive_bayes or lexicon)
    #[arg(short, long)]
    pub backend: Option<BackendKind>,

    /// Deployed frontend origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub mailbox: MailboxConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServiceConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        Ok(config)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(model) = &cli.model {
            self.classifier.model_path = model.clone();
        }
        if let Some(backend) = cli.backend {
            self.classifier.backend = backend;
        }
        if let Some(url) = cli.frontend_url.as_deref().filter(|u| !u.is_empty()) {
            self.cors.frontend_url = Some(url.to_string());
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, including mbox uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Mailbox upload handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Accepted filename suffixes, matched case-insensitively
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Characters of extracted body kept in each record's preview
    #[serde(default = "default_body_preview_chars")]
    pub body_preview_chars: usize,

    /// Directory for transient upload files; system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            body_preview_chars: default_body_preview_chars(),
            temp_dir: None,
        }
    }
}

/// Cross-origin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Production frontend; allowed with and without a trailing slash
    #[serde(default)]
    pub frontend_url: Option<String>,
}

impl CorsConfig {
    /// Every origin the CORS layer should accept
    pub fn origins(&self) -> Vec<String> {
        let mut origins = self.allowed_origins.clone();
        if let Some(url) = self.frontend_url.as_deref().filter(|u| !u.is_empty()) {
            let trimmed = url.trim_end_matches('/');
            origins.push(trimmed.to_string());
            origins.push(format!("{}/", trimmed));
        }
        origins.dedup();
        origins
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            frontend_url: None,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".mbox".to_string(), ".txt".to_string()]
}

fn default_body_preview_chars() -> usize {
    200
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:3001",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:3001",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
