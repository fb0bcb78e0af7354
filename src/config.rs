use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::walker::{WalkErrorPolicy, WalkOptions};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// Where the library lives and what to import by default
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Roots imported when none are given on the command line
    #[serde(default)]
    pub directories: Vec<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            directories: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

/// Directory walking and watching
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub follow_links: bool,
    #[serde(default)]
    pub on_walk_error: WalkErrorPolicy,
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            follow_links: false,
            on_walk_error: WalkErrorPolicy::default(),
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl ImportConfig {
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            follow_links: self.follow_links,
            on_error: self.on_walk_error,
        }
    }
}

/// `<XDG data dir>/bookworm/db.sqlite`, or `./bookworm.sqlite` without a home directory
fn default_db_path() -> PathBuf {
    ProjectDirs::from("", "", "bookworm")
        .map(|dirs| dirs.data_dir().join("db.sqlite"))
        .unwrap_or_else(|| PathBuf::from("bookworm.sqlite"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_watch_debounce_ms() -> u64 {
    500
}

impl Config {
    /// Load configuration.
    ///
    /// Loads environment variables from a .env file (if present) first, then reads
    /// the file named by `BOOKWORM_CONFIG`. Without that variable `./config.toml`
    /// is used if it exists, and built-in defaults otherwise.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        match std::env::var("BOOKWORM_CONFIG") {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => {
                let default_path = Path::new("config.toml");
                if default_path.exists() {
                    Self::load_from(default_path)
                } else {
                    log::debug!("No config.toml found, using defaults");
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.library.db_path.is_dir() {
            anyhow::bail!(
                "library.db_path must be a file, not a directory: {}",
                self.library.db_path.display()
            );
        }

        if self.import.watch_debounce_ms == 0 {
            anyhow::bail!("import.watch_debounce_ms must be greater than 0");
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.library.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[library]
db_path = "/tmp/bookworm-test/db.sqlite"
directories = ["/srv/books", "/home/me/Books"]
log_level = "debug"

[import]
follow_links = true
on_walk_error = "skip"
watch_debounce_ms = 250
"#,
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.db_path(), Path::new("/tmp/bookworm-test/db.sqlite"));
        assert_eq!(config.library.directories.len(), 2);
        assert_eq!(config.library.log_level, "debug");
        assert!(config.import.follow_links);
        assert_eq!(config.import.on_walk_error, WalkErrorPolicy::Skip);
        assert_eq!(config.import.watch_debounce_ms, 250);

        let options = config.import.walk_options();
        assert!(options.follow_links);
        assert_eq!(options.on_error, WalkErrorPolicy::Skip);
    }

    #[test]
    fn test_config_defaults_for_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert!(config.library.directories.is_empty());
        assert_eq!(config.library.log_level, "info");
        assert!(config.db_path().ends_with("db.sqlite") || config.db_path().ends_with("bookworm.sqlite"));
        assert!(!config.import.follow_links);
        assert_eq!(config.import.on_walk_error, WalkErrorPolicy::Abort);
        assert_eq!(config.import.watch_debounce_ms, 500);
    }

    #[test]
    fn test_config_rejects_directory_db_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_dir = temp_dir.path().to_str().unwrap().replace('\\', "\\\\");
        fs::write(&config_path, format!("[library]\ndb_path = \"{}\"\n", db_dir)).unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("db_path"));
    }

    #[test]
    fn test_config_rejects_zero_debounce() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[import]\nwatch_debounce_ms = 0\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_config_invalid_walk_policy() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[import]\non_walk_error = \"retry\"\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_config_env_var_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        fs::write(&config_path, "[library]\nlog_level = \"warn\"\n").unwrap();

        let original = std::env::var("BOOKWORM_CONFIG").ok();
        std::env::set_var("BOOKWORM_CONFIG", &config_path);
        let config = Config::load();
        std::env::remove_var("BOOKWORM_CONFIG");
        if let Some(v) = original {
            std::env::set_var("BOOKWORM_CONFIG", v);
        }

        assert_eq!(config.unwrap().library.log_level, "warn");
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("BOOKWORM_CONFIG").ok();
        std::env::set_var("BOOKWORM_CONFIG", "nonexistent.toml");
        let config = Config::load();
        std::env::remove_var("BOOKWORM_CONFIG");
        if let Some(v) = original {
            std::env::set_var("BOOKWORM_CONFIG", v);
        }
        assert!(config.is_err());
    }
}
