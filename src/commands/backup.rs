use crate::args::{BackupArgs, ImportArgs};
use crate::backup::{PRE_IMPORT, SNAPSHOT};
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::User;
use crate::{utils, Config, Result};
use std::path::PathBuf;
use tracing::debug;

/// Writes a JSON snapshot of the ledger to the backups directory, and a copy of the database file
/// if asked to.
pub async fn backup(config: Config, args: &BackupArgs) -> Result<Out<Vec<PathBuf>>> {
    let users = config
        .ledger()
        .users()
        .await
        .pub_result(ErrorType::Database)?;
    let backup = config.backup();
    let mut paths = vec![backup
        .save_json(SNAPSHOT, &users)
        .await
        .pub_result(ErrorType::Filesystem)?];
    if args.sqlite() {
        config
            .db()
            .checkpoint()
            .await
            .pub_result(ErrorType::Database)?;
        paths.push(
            backup
                .copy_sqlite()
                .await
                .pub_result(ErrorType::Filesystem)?,
        );
    }
    for path in &paths {
        debug!("Wrote backup {}", path.display());
    }
    Ok(Out::new(
        format!(
            "Saved {} to {}",
            plural(paths.len(), "backup", "backups"),
            config.backups().display()
        ),
        paths,
    ))
}

/// Replaces every user with the users in a JSON file, after saving a snapshot of the current
/// ledger.
pub async fn import(config: Config, args: &ImportArgs) -> Result<Out<PathBuf>> {
    let users: Vec<User> = utils::deserialize(args.file())
        .await
        .pub_result(ErrorType::Filesystem)?;

    let ledger = config.ledger();
    let current = ledger.users().await.pub_result(ErrorType::Database)?;
    let snapshot = config
        .backup()
        .save_json(PRE_IMPORT, &current)
        .await
        .pub_result(ErrorType::Filesystem)?;

    ledger
        .replace_all(&users)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Imported {} from {}. The previous ledger was saved to {}",
            plural(users.len(), "user", "users"),
            args.file().display(),
            snapshot.display()
        ),
        snapshot,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use crate::test::TestEnv;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_backup() {
        let env = TestEnv::new().await;
        let out = backup(env.config(), &BackupArgs::new(true)).await.unwrap();
        let paths = out.structure().unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_file()));
        assert!(out.message().starts_with("Saved 2 backups"));
    }

    #[tokio::test]
    async fn test_backup_then_import_restores() {
        let env = TestEnv::new().await;
        let config = env.config();
        let original = config.ledger().users().await.unwrap();
        let snapshot = backup(config.clone(), &BackupArgs::new(false))
            .await
            .unwrap()
            .structure()
            .unwrap()[0]
            .clone();

        config.ledger().replace_all(&[]).await.unwrap();
        assert!(config.ledger().users().await.unwrap().is_empty());

        let out = import(config.clone(), &ImportArgs::new(&snapshot))
            .await
            .unwrap();
        assert!(out.message().starts_with("Imported 4 users"));
        assert!(out.structure().unwrap().is_file());
        assert_eq!(config.ledger().users().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_import_browser_export() {
        let env = TestEnv::new().await;
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("users.json");
        let json = r#"[{
            "id": "1",
            "name": "Ada",
            "email": "ada@example.com",
            "balance": 120.5,
            "accountNumber": "ACC001",
            "status": "active",
            "savingAmount": 10,
            "savingFrequency": "daily",
            "registrationDate": "2025-10-01T08:30:00.000Z",
            "transactions": [
                {"id": "1", "type": "deposit", "amount": 20.5, "date": "2025-10-02", "description": "Cash"}
            ]
        }]"#;
        utils::write(&file, json).await.unwrap();

        import(env.config(), &ImportArgs::new(&file)).await.unwrap();
        let users = env.config().ledger().users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Ada");
        assert_eq!(users[0].transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_import_rejects_duplicates_and_bad_files() {
        let env = TestEnv::new().await;
        let dir = TempDir::new().unwrap();

        let users = env.config().ledger().users().await.unwrap();
        let dup = vec![users[0].clone(), users[0].clone()];
        let file = dir.path().join("dup.json");
        utils::write(&file, serde_json::to_string(&dup).unwrap())
            .await
            .unwrap();
        let e = import(env.config(), &ImportArgs::new(&file))
            .await
            .unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::DuplicateUserId("1".into()))
        );

        let mut twice = users.clone();
        twice[0].transactions[1].id = twice[0].transactions[0].id.clone();
        let file = dir.path().join("twice.json");
        utils::write(&file, serde_json::to_string(&twice).unwrap())
            .await
            .unwrap();
        let e = import(env.config(), &ImportArgs::new(&file))
            .await
            .unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::DuplicateTransactionId("1".into(), "1".into()))
        );

        let bad = dir.path().join("bad.json");
        utils::write(&bad, "{}").await.unwrap();
        assert!(import(env.config(), &ImportArgs::new(&bad)).await.is_err());

        assert_eq!(env.config().ledger().users().await.unwrap(), users);
    }
}
