//! Validation of the raw values entered for a new user or a new transaction.
//!
//! Fields arrive as the strings a person typed. A field that is absent or only whitespace is
//! missing. Nothing is written to the ledger unless the whole form validates.

use crate::model::{
    Amount, NewTransaction, NewUser, SavingFrequency, SavingsPlan, TransactionKind, UserStatus,
    UserUpdate,
};
use chrono::NaiveDate;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("please fill in all fields: {0} is required")]
    MissingField(&'static str),
    #[error("{field} must be a number, got '{value}'")]
    InvalidAmount { field: &'static str, value: String },
    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("{0} cannot be more than {max}", max = Amount::LIMIT)]
    TooLarge(&'static str),
    #[error("{field} is not valid: '{value}'")]
    InvalidChoice { field: &'static str, value: String },
    #[error("nothing to update")]
    EmptyUpdate,
}

/// The add-user form.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UserForm {
    pub name: Option<String>,
    pub initial_balance: Option<String>,
    pub saving_amount: Option<String>,
    pub saving_frequency: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

impl UserForm {
    /// Validates the form. `today` is used when no registration date was given.
    pub fn validate(self, today: NaiveDate) -> Result<NewUser, ValidationError> {
        let name = required("name", self.name)?;
        let initial_balance = parse_amount(
            "initial balance",
            required("initial balance", self.initial_balance)?,
        )?;
        let saving_amount =
            parse_amount("saving amount", required("saving amount", self.saving_amount)?)?;
        let frequency = required("saving frequency", self.saving_frequency)?;

        if initial_balance.is_negative() {
            return Err(ValidationError::Negative("initial balance"));
        }
        if !saving_amount.is_positive() {
            return Err(ValidationError::NotPositive("saving amount"));
        }
        let frequency = parse_choice::<SavingFrequency>("saving frequency", frequency)?;

        Ok(NewUser {
            name,
            initial_balance,
            plan: SavingsPlan {
                amount: saving_amount,
                frequency,
            },
            registration_date: self.registration_date.unwrap_or(today),
        })
    }
}

/// The edit-user form. Every field is optional but at least one must be given.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UserUpdateForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub saving_amount: Option<String>,
    pub saving_frequency: Option<String>,
}

impl UserUpdateForm {
    pub fn validate(self) -> Result<UserUpdate, ValidationError> {
        // A field that is given must not be blank.
        let name = self.name.map(|v| required("name", Some(v))).transpose()?;
        let email = self.email.map(|v| required("email", Some(v))).transpose()?;
        let status = self
            .status
            .map(|v| parse_choice::<UserStatus>("status", required("status", Some(v))?))
            .transpose()?;
        let saving_amount = self
            .saving_amount
            .map(|v| {
                let amount = parse_amount("saving amount", required("saving amount", Some(v))?)?;
                if amount.is_positive() {
                    Ok(amount)
                } else {
                    Err(ValidationError::NotPositive("saving amount"))
                }
            })
            .transpose()?;
        let saving_frequency = self
            .saving_frequency
            .map(|v| {
                parse_choice::<SavingFrequency>(
                    "saving frequency",
                    required("saving frequency", Some(v))?,
                )
            })
            .transpose()?;

        let update = UserUpdate {
            name,
            email,
            status,
            saving_amount,
            saving_frequency,
        };
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(update)
    }
}

/// The deposit and withdrawal dialogs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    pub amount: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TransactionForm {
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            amount: None,
            description: None,
            date: None,
        }
    }

    /// Validates the form. `today` is used when no date was given.
    pub fn validate(self, today: NaiveDate) -> Result<NewTransaction, ValidationError> {
        let amount = required("amount", self.amount)?;
        let description = required("description", self.description)?;
        let amount = parse_amount("amount", amount)?;
        if !amount.is_positive() {
            return Err(ValidationError::NotPositive("amount"));
        }
        Ok(NewTransaction {
            kind: self.kind,
            amount,
            date: self.date.unwrap_or(today),
            description,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn parse_amount(field: &'static str, value: String) -> Result<Amount, ValidationError> {
    let amount = Amount::from_str(&value)
        .map_err(|_| ValidationError::InvalidAmount { field, value })?;
    if !amount.within_limit() {
        return Err(ValidationError::TooLarge(field));
    }
    Ok(amount)
}

fn parse_choice<T: FromStr>(field: &'static str, value: String) -> Result<T, ValidationError> {
    T::from_str(&value.to_lowercase())
        .map_err(|_| ValidationError::InvalidChoice { field, value })
}
