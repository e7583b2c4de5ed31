//! The demo users written to storage the first time the ledger is read.

use crate::model::{
    Amount, SavingFrequency, SavingsPlan, Transaction, TransactionKind, User, UserStatus,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub(crate) fn demo_users() -> Vec<User> {
    vec![
        user(
            1,
            "John Doe",
            "john@example.com",
            cents(542050),
            (cents(10000), SavingFrequency::Daily),
            date(2025, 10, 1),
            vec![
                deposit("1", cents(100000), date(2025, 10, 7), "Salary deposit"),
                withdrawal("2", cents(25000), date(2025, 10, 6), "ATM withdrawal"),
                deposit("3", cents(50000), date(2025, 10, 5), "Transfer received"),
                withdrawal("4", cents(12050), date(2025, 10, 4), "Online purchase"),
            ],
        ),
        user(
            2,
            "Jane Smith",
            "jane@example.com",
            cents(1234075),
            (cents(20000), SavingFrequency::Weekly),
            date(2025, 9, 15),
            Vec::new(),
        ),
        user(
            3,
            "Robert Johnson",
            "robert@example.com",
            cents(89025),
            (cents(5000), SavingFrequency::Daily),
            date(2025, 9, 20),
            Vec::new(),
        ),
        user(
            4,
            "Emily Davis",
            "emily@example.com",
            cents(2345000),
            (cents(50000), SavingFrequency::Monthly),
            date(2025, 8, 1),
            Vec::new(),
        ),
    ]
}

fn user(
    n: u32,
    name: &str,
    email: &str,
    balance: Amount,
    (amount, frequency): (Amount, SavingFrequency),
    registration_date: NaiveDate,
    transactions: Vec<Transaction>,
) -> User {
    User {
        id: n.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        balance,
        account_number: format!("ACC{n:03}"),
        status: UserStatus::Active,
        plan: SavingsPlan { amount, frequency },
        registration_date,
        transactions,
    }
}

fn deposit(id: &str, amount: Amount, date: NaiveDate, description: &str) -> Transaction {
    tx(id, TransactionKind::Deposit, amount, date, description)
}

fn withdrawal(id: &str, amount: Amount, date: NaiveDate, description: &str) -> Transaction {
    tx(id, TransactionKind::Withdrawal, amount, date, description)
}

fn tx(
    id: &str,
    kind: TransactionKind,
    amount: Amount,
    date: NaiveDate,
    description: &str,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        kind,
        amount,
        date,
        description: description.to_string(),
    }
}

/// An amount given in whole cents.
fn cents(cents: i64) -> Amount {
    Amount::new(Decimal::new(cents, 2))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    // The seed dates are literals and always valid.
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
