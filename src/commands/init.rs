use crate::args::InitArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Creates the data directory with:
/// - an initial `config.json` with default settings
/// - an empty `.backups` directory
/// - the SQLite database with the latest schema
///
/// # Arguments
/// - `savings_home` - The directory that will be the root of data directory, e.g. `$HOME/savings`
/// - `args` - Whether the ledger starts with demo users.
///
/// # Errors
/// - Returns an error if any file operations fail or the directory is already initialized.
pub async fn init(savings_home: &Path, args: &InitArgs) -> Result<Out<PathBuf>> {
    let config = Config::create(savings_home, args.seed_demo_users())
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(Out::new(
        format!(
            "Successfully created the savings directory at {}",
            config.root().display()
        ),
        config.root().to_path_buf(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("savings");
        let out = init(&home, &InitArgs::new(true)).await.unwrap();
        assert!(out.message().contains("Successfully created"));

        let config = Config::load(&home).await.unwrap();
        assert!(!config.seed_demo_users());
        assert!(config.ledger().users().await.unwrap().is_empty());

        let e = init(&home, &InitArgs::new(true)).await.unwrap_err();
        assert!(format!("{e:#}").starts_with("config error"));
    }
}
