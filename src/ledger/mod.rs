//! The ledger store: users, their transactions, and the display flags recorded against deposits.
//!
//! The whole collection of users is kept as one JSON document under `USERS_KEY`. Every mutating
//! operation reads the document, changes it, and writes it back before returning.

mod seed;
mod storage;

#[cfg(test)]
pub(crate) use storage::MemoryStorage;
pub use storage::Storage;

use crate::model::{Amount, NewTransaction, NewUser, Transaction, User, UserStatus, UserUpdate};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter};
use tracing::{debug, info, warn};

/// The storage key holding the JSON array of users.
pub const USERS_KEY: &str = "savings_app_users";

/// The storage key holding the JSON array of reversed deposit references.
pub const REVERSED_DEPOSITS_KEY: &str = "savings_app_reversed_deposits";

/// Errors that a caller of the ledger may want to tell apart.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum LedgerError {
    #[error("user '{0}' does not exist")]
    UserNotFound(String),
    #[error("user '{0}' has no transaction '{1}'")]
    TransactionNotFound(String, String),
    #[error("transaction '{1}' of user '{0}' is not a deposit")]
    NotADeposit(String, String),
    #[error("deposit {0} has already been reversed")]
    AlreadyReversed(DepositRef),
    #[error("user id '{0}' appears more than once")]
    DuplicateUserId(String),
    #[error("user '{0}' has more than one transaction '{1}'")]
    DuplicateTransactionId(String, String),
    #[error(
        "transaction '{1}' of user '{0}' has amount {2}; it must be above 0 and at most {max}",
        max = Amount::LIMIT
    )]
    InvalidTransactionAmount(String, String, Amount),
    #[error(
        "user '{0}' has saving amount {1}; it must be above 0 and at most {max}",
        max = Amount::LIMIT
    )]
    InvalidSavingAmount(String, Amount),
    #[error("the balance of user '{0}' is too large to record this transaction")]
    BalanceOutOfRange(String),
}

/// Identifies one deposit. Transaction ids are only unique within a user.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRef {
    pub user_id: String,
    pub transaction_id: String,
}

impl DepositRef {
    pub fn new(user_id: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id: transaction_id.into(),
        }
    }
}

impl Display for DepositRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.transaction_id)
    }
}

/// Create, read and update operations over the users held in a `Storage`.
#[derive(Debug, Clone)]
pub struct LedgerStore<S> {
    storage: S,
    seed_demo_users: bool,
}

impl<S: Storage> LedgerStore<S> {
    /// When `seed_demo_users` is true, the first read of an empty store writes and returns the
    /// demo users.
    pub fn new(storage: S, seed_demo_users: bool) -> Self {
        Self {
            storage,
            seed_demo_users,
        }
    }

    /// Returns all users in insertion order.
    pub async fn users(&self) -> Result<Vec<User>> {
        match self.storage.get_item(USERS_KEY).await? {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("The stored value under '{USERS_KEY}' is not valid")),
            None if self.seed_demo_users => {
                let users = seed::demo_users();
                self.save_users(&users).await?;
                info!("Seeded the ledger with {} demo users", users.len());
                Ok(users)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the stored users with `users`.
    pub async fn save_users(&self, users: &[User]) -> Result<()> {
        let json = serde_json::to_string(users).context("Unable to serialize users")?;
        self.storage.set_item(USERS_KEY, &json).await?;
        debug!("Saved {} users", users.len());
        Ok(())
    }

    pub async fn user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users().await?.into_iter().find(|u| u.id == id))
    }

    /// Like `user`, but a missing user is a `LedgerError::UserNotFound`.
    pub async fn require_user(&self, id: &str) -> Result<User> {
        self.user(id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(id.to_string()).into())
    }

    /// Creates a user with the next sequential id and the synthetic email and account number that
    /// go with it. New users are always active and have no transactions.
    pub async fn add_user(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users().await?;
        let n = users.len() + 1;
        if users.iter().any(|u| u.id == n.to_string()) {
            warn!("A user with id {n} already exists; the new user will share that id");
        }
        let user = User {
            id: n.to_string(),
            name: new_user.name,
            email: format!("user{n}@example.com"),
            balance: new_user.initial_balance,
            account_number: format!("ACC{n:03}"),
            status: UserStatus::Active,
            plan: new_user.plan,
            registration_date: new_user.registration_date,
            transactions: Vec::new(),
        };
        users.push(user.clone());
        self.save_users(&users).await?;
        info!("Created user {} ({})", user.id, user.account_number);
        Ok(user)
    }

    /// Merges `update` into the user with `id` and returns the updated user.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User> {
        let mut users = self.users().await?;
        let user = find_mut(&mut users, id)?;
        update.apply(user);
        let updated = user.clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// Records a transaction at the front of the user's history and moves the cached balance by
    /// its amount. Returns the updated user.
    pub async fn add_transaction(&self, user_id: &str, new: NewTransaction) -> Result<User> {
        let mut users = self.users().await?;
        let user = find_mut(&mut users, user_id)?;
        let id = (user.transactions.len() + 1).to_string();
        let transaction: Transaction = new.into_transaction(id);
        let balance = user
            .balance
            .checked_add(transaction.signed_amount())
            .ok_or_else(|| LedgerError::BalanceOutOfRange(user.id.clone()))?;
        user.balance = balance;
        debug!(
            "Recording {} {} of {} for user {}",
            transaction.kind, transaction.id, transaction.amount, user.id
        );
        user.transactions.insert(0, transaction);
        let updated = user.clone();
        self.save_users(&users).await?;
        Ok(updated)
    }

    /// Returns the deposits that have been flagged as reversed.
    pub async fn reversed_deposits(&self) -> Result<BTreeSet<DepositRef>> {
        match self.storage.get_item(REVERSED_DEPOSITS_KEY).await? {
            Some(json) => serde_json::from_str(&json).with_context(|| {
                format!("The stored value under '{REVERSED_DEPOSITS_KEY}' is not valid")
            }),
            None => Ok(BTreeSet::new()),
        }
    }

    /// Flags a deposit as reversed.
    ///
    /// Only the flag changes. The user's balance and the deposit itself are left as they are.
    pub async fn reverse_deposit(&self, user_id: &str, transaction_id: &str) -> Result<DepositRef> {
        let user = self.require_user(user_id).await?;
        let transaction = user.transaction(transaction_id).ok_or_else(|| {
            LedgerError::TransactionNotFound(user_id.to_string(), transaction_id.to_string())
        })?;
        if !transaction.is_deposit() {
            return Err(
                LedgerError::NotADeposit(user_id.to_string(), transaction_id.to_string()).into(),
            );
        }

        let deposit = DepositRef::new(user_id, transaction_id);
        let mut reversed = self.reversed_deposits().await?;
        if !reversed.insert(deposit.clone()) {
            return Err(LedgerError::AlreadyReversed(deposit).into());
        }
        self.save_reversed(&reversed).await?;
        info!("Flagged deposit {deposit} as reversed");
        Ok(deposit)
    }

    /// Replaces every user, e.g. with data imported from elsewhere. Reversal flags refer to the
    /// old data and are cleared.
    ///
    /// Nothing is written unless user ids and each user's transaction ids are unique, and every
    /// saving amount and transaction amount is positive and within `Amount::LIMIT`.
    pub async fn replace_all(&self, users: &[User]) -> Result<()> {
        let mut seen = HashSet::new();
        for user in users {
            if !seen.insert(user.id.as_str()) {
                return Err(LedgerError::DuplicateUserId(user.id.clone()).into());
            }
            check_imported(user)?;
        }
        self.save_users(users).await?;
        self.storage.remove_item(REVERSED_DEPOSITS_KEY).await?;
        Ok(())
    }

    async fn save_reversed(&self, reversed: &BTreeSet<DepositRef>) -> Result<()> {
        let json = serde_json::to_string(reversed).context("Unable to serialize reversals")?;
        self.storage.set_item(REVERSED_DEPOSITS_KEY, &json).await
    }
}

fn check_imported(user: &User) -> std::result::Result<(), LedgerError> {
    let plan = user.plan.amount;
    if !plan.is_positive() || !plan.within_limit() {
        return Err(LedgerError::InvalidSavingAmount(user.id.clone(), plan));
    }
    let mut ids = HashSet::new();
    for t in &user.transactions {
        if !ids.insert(t.id.as_str()) {
            return Err(LedgerError::DuplicateTransactionId(
                user.id.clone(),
                t.id.clone(),
            ));
        }
        if !t.amount.is_positive() || !t.amount.within_limit() {
            return Err(LedgerError::InvalidTransactionAmount(
                user.id.clone(),
                t.id.clone(),
                t.amount,
            ));
        }
    }
    Ok(())
}

fn find_mut<'a>(users: &'a mut [User], id: &str) -> Result<&'a mut User> {
    users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| LedgerError::UserNotFound(id.to_string()).into())
}
