use crate::model::{Amount, Transaction};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
}

serde_plain::derive_display_from_serialize!(UserStatus);
serde_plain::derive_fromstr_from_deserialize!(UserStatus);

/// How often a user intends to deposit their saving amount.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingFrequency {
    Daily,
    Weekly,
    Monthly,
}

serde_plain::derive_display_from_serialize!(SavingFrequency);
serde_plain::derive_fromstr_from_deserialize!(SavingFrequency);

impl SavingFrequency {
    /// The number of days in one period. A month is always 30 days.
    pub fn days(&self) -> i64 {
        match self {
            SavingFrequency::Daily => 1,
            SavingFrequency::Weekly => 7,
            SavingFrequency::Monthly => 30,
        }
    }
}

/// A user's target recurring deposit.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    #[serde(rename = "savingAmount")]
    pub amount: Amount,
    #[serde(rename = "savingFrequency")]
    pub frequency: SavingFrequency,
}

/// A user account and the transactions recorded against it.
///
/// `balance` is a running total: it starts at the opening balance given when the user was created
/// and is adjusted each time a transaction is recorded. It is never recomputed from
/// `transactions`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub balance: Amount,
    pub account_number: String,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(flatten)]
    pub plan: SavingsPlan,
    #[serde(deserialize_with = "deserialize_date")]
    pub registration_date: NaiveDate,
    /// Most recent first.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn deposits(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_deposit())
    }

    pub fn withdrawals(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_withdrawal())
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// The balance before any recorded transaction, derived from the running total.
    pub fn opening_balance(&self) -> Amount {
        self.balance - self.transactions.iter().map(|t| t.signed_amount()).sum::<Amount>()
    }
}

/// A validated new user that has not yet been assigned an id, email or account number.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub initial_balance: Amount,
    pub plan: SavingsPlan,
    pub registration_date: NaiveDate,
}

/// Fields to merge into an existing user. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
    pub saving_amount: Option<Amount>,
    pub saving_frequency: Option<SavingFrequency>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self == &UserUpdate::default()
    }

    pub(crate) fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        if let Some(amount) = self.saving_amount {
            user.plan.amount = amount;
        }
        if let Some(frequency) = self.saving_frequency {
            user.plan.frequency = frequency;
        }
    }
}

/// Accepts `2025-10-01` as well as the timestamp a browser writes for a `Date`,
/// e.g. `2025-10-01T00:00:00.000Z`.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'")))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
}
