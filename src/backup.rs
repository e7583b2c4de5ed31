//! Backup files kept in `$SAVINGS_HOME/.backups`.
//!
//! Every backup belongs to a [`Series`] and is named `{prefix}.YYYY-MM-DD-NNN[.ext]`, where `NNN`
//! counts up from 001 within a day. After each write the oldest files of the series are removed
//! so that at most `backup_copies` remain.

use crate::config::SAVINGS_SQLITE;
use crate::model::User;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use tracing::debug;

/// Snapshots taken with `savings backup`.
pub const SNAPSHOT: Series = Series::json("snapshot");

/// The snapshot taken before an import replaces the ledger.
pub const PRE_IMPORT: Series = Series::json("pre-import");

/// Copies of the SQLite database file.
pub const SQLITE: Series = Series {
    prefix: SAVINGS_SQLITE,
    extension: None,
};

/// A family of backup files that are numbered and rotated together.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Series {
    prefix: &'static str,
    extension: Option<&'static str>,
}

impl Series {
    const fn json(prefix: &'static str) -> Self {
        Self {
            prefix,
            extension: Some("json"),
        }
    }

    fn file_name(&self, date: NaiveDate, seq: u32) -> String {
        let stem = format!("{}.{}-{seq:03}", self.prefix, date.format("%Y-%m-%d"));
        match self.extension {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        }
    }

    /// The date and sequence number of a file in this series, or `None` for any other file.
    fn parse(&self, file_name: &str) -> Option<(NaiveDate, u32)> {
        let rest = file_name.strip_prefix(self.prefix)?.strip_prefix('.')?;
        let rest = match self.extension {
            Some(ext) => rest.strip_suffix(ext)?.strip_suffix('.')?,
            None => rest,
        };
        let (date, seq) = rest.rsplit_once('-')?;
        if seq.len() < 3 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        Some((date, seq.parse().ok()?))
    }
}

/// Writes backup files and rotates old ones.
///
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
    sqlite_path: PathBuf,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
            sqlite_path: config.sqlite_path().to_path_buf(),
        }
    }

    /// Saves the users as a pretty-printed JSON array in the stored format, so that the file can
    /// be given back to `savings import`. Returns the path of the new file.
    pub async fn save_json(&self, series: Series, users: &[User]) -> Result<PathBuf> {
        let path = self.next_path(series).await?;
        let json = serde_json::to_string_pretty(users).context("Failed to serialize users")?;
        utils::write(&path, json).await?;
        self.rotate(series).await?;
        Ok(path)
    }

    /// Copies the SQLite database file. The caller checkpoints the write-ahead log first.
    pub async fn copy_sqlite(&self) -> Result<PathBuf> {
        let path = self.next_path(SQLITE).await?;
        utils::copy(&self.sqlite_path, &path).await?;
        self.rotate(SQLITE).await?;
        Ok(path)
    }

    async fn next_path(&self, series: Series) -> Result<PathBuf> {
        let today = Local::now().date_naive();
        let seq = self
            .existing(series)
            .await?
            .into_iter()
            .filter(|f| f.date == today)
            .map(|f| f.seq)
            .max()
            .unwrap_or(0)
            + 1;
        Ok(self.backups_dir.join(series.file_name(today, seq)))
    }

    async fn rotate(&self, series: Series) -> Result<()> {
        let files = self.existing(series).await?;
        let excess = files.len().saturating_sub(self.backup_copies as usize);
        for file in files.into_iter().take(excess) {
            debug!("Removing old backup {}", file.path.display());
            utils::remove(&file.path).await?;
        }
        Ok(())
    }

    /// The files of a series, oldest first.
    async fn existing(&self, series: Series) -> Result<Vec<BackupFile>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name();
            if let Some((date, seq)) = series.parse(&name.to_string_lossy()) {
                files.push(BackupFile {
                    date,
                    seq,
                    path: entry.path(),
                });
            }
        }
        files.sort_by_key(|f| (f.date, f.seq));
        Ok(files)
    }
}

struct BackupFile {
    date: NaiveDate,
    seq: u32,
    path: PathBuf,
}
