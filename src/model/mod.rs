//! Types that represent the core data model: `User`, `Transaction` and `Amount`.
mod amount;
mod transaction;
mod user;

pub use amount::{Amount, AmountError};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
pub use user::{NewUser, SavingFrequency, SavingsPlan, User, UserStatus, UserUpdate};
