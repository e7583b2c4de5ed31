//! Configuration file handling for the savings admin tool.
//!
//! The configuration file is stored at `$SAVINGS_HOME/config.json` and holds the backup settings
//! and whether an empty ledger is filled with demo users on first read.

use crate::backup::Backup;
use crate::db::Db;
use crate::ledger::LedgerStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "savings";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
pub(crate) const SAVINGS_SQLITE: &str = "savings.sqlite";

/// An opened data directory: its settings, its database and the paths of the files it holds.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Sets up a new data directory at `dir`: the directory itself, `.backups`, `config.json`
    /// and a freshly migrated SQLite database. `seed_demo_users` is written to the config file.
    ///
    /// Fails if `dir` already holds a config file or a database.
    pub async fn create(dir: impl Into<PathBuf>, seed_demo_users: bool) -> Result<Self> {
        let dir = dir.into();
        utils::make_dir(&dir)
            .await
            .context("Unable to create the savings home directory")?;
        let root = utils::canonicalize(&dir).await?;
        utils::make_dir(root.join(BACKUPS)).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }
        let config_file = ConfigFile {
            seed_demo_users,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let db = Db::init(root.join(SAVINGS_SQLITE))
            .await
            .context("Unable to create SQLite DB")?;
        Ok(Self::assemble(root, config_file, db))
    }

    /// Opens an existing data directory. The config file and `.backups` must be present, and the
    /// database is migrated if its schema is older than this program's.
    pub async fn load(savings_home: impl Into<PathBuf>) -> Result<Self> {
        let home: PathBuf = savings_home.into();
        let root = utils::canonicalize(&home)
            .await
            .context("The savings home directory is missing. Have you run 'savings init'?")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let backups = root.join(BACKUPS);
        if !backups.is_dir() {
            bail!("The backups directory is missing '{}'", backups.display())
        }

        let db = Db::load(root.join(SAVINGS_SQLITE))
            .await
            .context("Unable to load SQLite DB")?;
        Ok(Self::assemble(root, config_file, db))
    }

    fn assemble(root: PathBuf, config_file: ConfigFile, db: Db) -> Self {
        Self {
            backups: root.join(BACKUPS),
            config_path: root.join(CONFIG_JSON),
            sqlite_path: root.join(SAVINGS_SQLITE),
            root,
            config_file,
            db,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn seed_demo_users(&self) -> bool {
        self.config_file.seed_demo_users
    }

    /// The ledger stored in this home's database.
    pub(crate) fn ledger(&self) -> LedgerStore<Db> {
        LedgerStore::new(self.db.clone(), self.seed_demo_users())
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "savings",
///   "config_version": 1,
///   "backup_copies": 5,
///   "seed_demo_users": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Always "savings".
    app_name: String,
    config_version: u8,
    /// How many files of each backup series to keep.
    backup_copies: u32,
    /// Whether the first read of an empty ledger writes the demo users.
    #[serde(default = "seed_by_default")]
    seed_demo_users: bool,
}

fn seed_by_default() -> bool {
    true
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            seed_demo_users: true,
        }
    }
}

impl ConfigFile {
    /// Reads and checks a config file. It must name this app, be of a version this program
    /// understands and keep at least one backup copy.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{APP_NAME}', got '{}'",
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file is version {}, newer than this program supports ({CONFIG_VERSION})",
            config.config_version
        );
        anyhow::ensure!(
            config.backup_copies > 0,
            "Invalid backup_copies in config file: must be at least 1"
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}
