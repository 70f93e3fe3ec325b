use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_MAX_FILE_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_IMAGE_HOST_ENDPOINT: &str = "https://upload.imagekit.io/api/v1/files/upload";

#[derive(Parser, Debug, Default)]
#[command(name = "panache", about = "Backend for composing multimedia posts")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long, env = "PANACHE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory where uploaded files are staged
    #[arg(long, env = "PANACHE_UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Image host upload endpoint
    #[arg(long, env = "IMAGEKIT_ENDPOINT")]
    pub image_host_endpoint: Option<String>,

    /// Image host public key
    #[arg(long, env = "IMAGEKIT_PUBLIC_KEY", hide_env_values = true)]
    pub image_host_public_key: Option<String>,

    /// Image host private key
    #[arg(long, env = "IMAGEKIT_PRIVATE_KEY", hide_env_values = true)]
    pub image_host_private_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadsConfig,
    pub image_host: ImageHostConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UploadsConfig {
    pub path: PathBuf,
    pub max_file_bytes: usize,
    pub max_request_bytes: usize,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ImageHostConfig {
    pub endpoint: String,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

/// Opt-in password checking. Off by default: login is a lookup by pseudo.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub hash_passwords: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("uploads"),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_request_bytes: 4 * DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_IMAGE_HOST_ENDPOINT.to_string(),
            public_key: None,
            private_key: None,
        }
    }
}

// Keys stay out of logs and panics.
impl std::fmt::Debug for ImageHostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHostConfig")
            .field("endpoint", &self.endpoint)
            .field("public_key", &self.public_key.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ImageHostConfig {
    /// Forwarding is enabled only when both keys are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.public_key.as_deref(), self.private_key.as_deref()) {
            (Some(public), Some(private)) if !public.is_empty() && !private.is_empty() => {
                Some((public, private))
            }
            _ => None,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI and environment overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref dir) = cli.uploads_dir {
            config.uploads.path = dir.clone();
        }
        if let Some(ref endpoint) = cli.image_host_endpoint {
            config.image_host.endpoint = endpoint.clone();
        }
        if let Some(ref key) = cli.image_host_public_key {
            config.image_host.public_key = Some(key.clone());
        }
        if let Some(ref key) = cli.image_host_private_key {
            config.image_host.private_key = Some(key.clone());
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("panache.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir.clone() {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".panache"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    pub fn db_path(&self) -> Option<&PathBuf> {
        self.database.path.as_ref()
    }

    pub fn uploads_path(&self) -> &PathBuf {
        &self.uploads.path
    }
}
