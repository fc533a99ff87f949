//! Configuration file handling for `~/.gatorconfig.json`.
//!
//! The file holds the database connection string and the name of the
//! current user. It is read once before a command runs and rewritten as a
//! whole (never merged) whenever the current user changes. A missing file
//! yields `Config::default()`.
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// File name of the per-user config, relative to `$HOME`.
pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

/// Database file used when the config has no `db_url`, relative to `$HOME`.
pub const DEFAULT_DB_FILE: &str = ".gator.db";

/// `sqlite://<home>/.gator.db`, created on first use.
pub fn default_db_url(home: &Path) -> String {
    format!("sqlite://{}?mode=rwc", home.join(DEFAULT_DB_FILE).display())
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("HOME environment variable not set")]
    NoHome,
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Persisted gator settings.
///
/// Custom Debug impl masks `db_url`, which may embed credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection string for the relational store.
    pub db_url: String,

    /// Name of the logged-in user. `None` (or an empty string on disk)
    /// means nobody has logged in yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "db_url",
                &if self.db_url.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .field("current_user_name", &self.current_user_name)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// The current user's name, treating an empty string as unset.
    pub fn current_user(&self) -> Option<&str> {
        self.current_user_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// The configured `db_url`, or [`default_db_url`] under `$HOME` when it
    /// is empty.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        if !self.db_url.is_empty() {
            return Ok(self.db_url.clone());
        }
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
        Ok(default_db_url(Path::new(&home)))
    }

    /// Load configuration from a JSON file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid JSON → `Err(ConfigError::Parse)` with line/column info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), user = ?config.current_user(), "Loaded configuration");
        Ok(config)
    }

    /// Rewrite the whole file with this configuration.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_vec(self)?;
        write_atomic(path, &json)?;
        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

/// Write `content` to `dst` through a temp file and rename, so a crash never
/// leaves a truncated config behind.
fn write_atomic(dst: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};
    // Timestamp suffix keeps concurrent writers off each other's temp file
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", suffix));

    let mut temp_file = create_temp_file(&temp_path)?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all());
    drop(temp_file);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    // Windows refuses to rename over an existing file
    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst)?;
    }

    std::fs::rename(&temp_path, dst).inspect_err(|_| {
        let _ = std::fs::remove_file(&temp_path);
    })
}

/// Create `path` as a new owner-only file.
///
/// `create_new` makes the open fail with `AlreadyExists` if anything,
/// including a symlink, is already at `path`; an existing file is never
/// opened or truncated.
fn create_temp_file(path: &Path) -> std::io::Result<std::fs::File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

// ============================================================================
// Config Stores
// ============================================================================

/// Persistent backing store for [`Config`].
pub trait ConfigStore {
    /// Read the full configuration.
    fn read(&self) -> Result<Config, ConfigError>;

    /// Replace the stored configuration with `config`.
    fn write(&self, config: &Config) -> Result<(), ConfigError>;
}

/// JSON file on disk, `~/.gatorconfig.json` by default.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.gatorconfig.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
        Ok(PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn read(&self) -> Result<Config, ConfigError> {
        Config::load(&self.path)
    }

    fn write(&self, config: &Config) -> Result<(), ConfigError> {
        config.save(&self.path)
    }
}

/// In-process store. Clones share the same configuration, so a test can
/// keep one handle and inspect what the session persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<Config>>,
}

impl MemoryConfigStore {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// Snapshot of the stored configuration.
    pub fn snapshot(&self) -> Config {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn read(&self) -> Result<Config, ConfigError> {
        Ok(self.snapshot())
    }

    fn write(&self, config: &Config) -> Result<(), ConfigError> {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config.clone();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
