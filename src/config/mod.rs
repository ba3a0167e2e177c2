use crate::core::window::AbsencePolicy;
use crate::errors::{AppError, AppResult};
use crate::models::cause::SanctionCause;
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate; // use submodule at src/config/migrate.rs

pub const DEFAULT_LOCK_NAME: &str = "calculate-sanctions";
/// Upper bound for `lock_lease_secs`: one day.
pub const MAX_LOCK_LEASE_SECS: i64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_lock_name")]
    pub lock_name: String,
    #[serde(default = "default_lock_lease_secs")]
    pub lock_lease_secs: i64,
    #[serde(default = "default_schedule_interval_secs")]
    pub schedule_interval_secs: u64,
    #[serde(default)]
    pub absence_policy: AbsencePolicy,
    /// Cause label → decimal amount ("100.00").
    #[serde(default = "default_tariffs")]
    pub tariffs: BTreeMap<String, String>,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_lock_name() -> String {
    DEFAULT_LOCK_NAME.to_string()
}
fn default_lock_lease_secs() -> i64 {
    600
}
fn default_schedule_interval_secs() -> u64 {
    300
}
pub fn default_tariffs() -> BTreeMap<String, String> {
    BTreeMap::from([
        (SanctionCause::Absent.label().to_string(), "100.00".to_string()),
        (SanctionCause::NoTimeIn.label().to_string(), "25.00".to_string()),
        (SanctionCause::NoTimeOut.label().to_string(), "25.00".to_string()),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            lock_name: default_lock_name(),
            lock_lease_secs: default_lock_lease_secs(),
            schedule_interval_secs: default_schedule_interval_secs(),
            absence_policy: AbsencePolicy::default(),
            tariffs: default_tariffs(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rsanctions")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rsanctions")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rsanctions.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rsanctions.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load an explicit configuration file; it must exist.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let mut cfg: Config =
            serde_yaml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Structural checks only. Individual tariffs are validated lazily so a
    /// single bad amount disables one cause, not the whole job.
    pub fn validate(&self) -> AppResult<()> {
        if self.lock_name.trim().is_empty() {
            return Err(AppError::Config("lock_name must not be empty".into()));
        }
        if self.lock_lease_secs <= 0 {
            return Err(AppError::Config(format!(
                "lock_lease_secs must be positive (got {})",
                self.lock_lease_secs
            )));
        }
        if self.lock_lease_secs > MAX_LOCK_LEASE_SECS {
            return Err(AppError::Config(format!(
                "lock_lease_secs must not exceed {} (got {})",
                MAX_LOCK_LEASE_SECS, self.lock_lease_secs
            )));
        }
        if self.schedule_interval_secs == 0 {
            return Err(AppError::Config(
                "schedule_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Lease length, clamped to the range `validate` accepts.
    pub fn lock_lease(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lock_lease_secs.clamp(1, MAX_LOCK_LEASE_SECS))
    }

    pub fn save(&self) -> AppResult<()> {
        fs::create_dir_all(Self::config_dir())?;
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Config> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_db {
            let p = expand_tilde(&name);
            if p.is_absolute() { p } else { dir.join(p) }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            config.save()?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(config)
    }
}
