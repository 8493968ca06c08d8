use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory used when `server.home_dir` is left empty, relative to the working directory.
const DEFAULT_HOME_DIR: &str = ".eventsync";

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Database configuration (optional).
    pub database: Option<DatabaseConfig>,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: String, // will be normalized to absolute path
    pub host: String,
    pub port: u16,
    /// Request timeout in seconds; 0 disables it.
    #[serde(default)]
    pub timeout_sec: u64,
    /// Serve the generated OpenAPI document at `/openapi.json`.
    #[serde(default = "default_true")]
    pub enable_docs: bool,
    /// Attach a permissive CORS layer.
    #[serde(default)]
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database connection URL (e.g., "sqlite://database/eventsync.db", "sqlite::memory:").
    pub url: String,
    /// Maximum number of connections in the pool (optional, defaults to 10).
    pub max_conns: Option<u32>,
    /// SQLite busy timeout in milliseconds (optional, defaults to 5000).
    pub busy_timeout_ms: Option<u32>,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/eventsync.log"; empty disables file output
    #[serde(default)]
    pub file_level: String,
    /// How many rotated files to keep
    #[serde(default)]
    pub max_backups: Option<usize>,
    /// Max size of the file in MB before rotating
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => ./.eventsync under the working directory
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8090,
            timeout_sec: 0,
            enable_docs: true,
            cors_enabled: false,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/eventsync.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: "sqlite://database/eventsync.db".to_string(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let config_path = config_path.as_ref();
        if !config_path.is_file() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }

        // Optional sections stay None unless explicitly provided by YAML/ENV.
        let base = AppConfig {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules: HashMap::new(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path))
            // Example: APP__SERVER__PORT=8090 maps to server.port
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;

        Ok(config)
    }

    /// Load configuration from file or create with default values.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)
                    .context("Failed to resolve server.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed configuration of one module; `T::default()` when the module has no entry.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid configuration for module '{}'", name)),
            None => Ok(T::default()),
        }
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if args.mock {
            let db = self.database.get_or_insert(DatabaseConfig {
                url: String::new(),
                max_conns: None,
                busy_timeout_ms: None,
            });
            db.url = "sqlite::memory:".to_string();
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            match args.verbose {
                0 => {}
                1 => default_section.console_level = "debug".to_string(),
                _ => default_section.console_level = "trace".to_string(),
            }
        }
    }
}

/// Command line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub verbose: u8,
    pub mock: bool,
}

/// Normalize `server.home_dir` to an absolute path and create the directory.
fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let resolved = resolve_home_dir(&server.home_dir)?;
    std::fs::create_dir_all(&resolved)
        .with_context(|| format!("Failed to create home_dir {}", resolved.display()))?;
    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

/// `~` expands to the user's home directory; relative paths are taken from the working directory.
fn resolve_home_dir(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    let path = if raw.is_empty() {
        PathBuf::from(DEFAULT_HOME_DIR)
    } else if let Some(rest) = raw.strip_prefix('~') {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .context("Cannot expand '~': no HOME or USERPROFILE set")?;
        PathBuf::from(home).join(rest.trim_start_matches(['/', '\\']))
    } else {
        PathBuf::from(raw)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()
            .context("Cannot read working directory")?
            .join(path))
    }
}
