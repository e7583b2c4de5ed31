//! Figures derived from a user's transactions and savings plan.
//!
//! The expected-savings figure is a linear accrual: the number of whole days since registration
//! divided by the length of one saving period, times the saving amount. Months are always 30 days
//! long, there is no compounding, and the division is not rounded.

use crate::model::{Amount, SavingsPlan, Transaction, User};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Sums of a transaction history by kind.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Totals {
    pub deposits: Amount,
    pub withdrawals: Amount,
}

pub fn totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    transactions
        .into_iter()
        .fold(Totals::default(), |mut acc, t| {
            if t.is_deposit() {
                acc.deposits += t.amount;
            } else {
                acc.withdrawals += t.amount;
            }
            acc
        })
}

/// How a user's recorded deposits compare with what their savings plan calls for.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SavingsProgress {
    /// Whole days between registration and today. Negative if registration is in the future.
    pub days: i64,
    pub expected: Amount,
    pub total_deposits: Amount,
    /// `expected - total_deposits`. Positive means the user is behind plan.
    pub remaining: Amount,
}

impl SavingsProgress {
    /// Computes progress from the number of days since registration.
    pub fn new(days: i64, plan: &SavingsPlan, total_deposits: Amount) -> Self {
        let periods = Decimal::from(days) / Decimal::from(plan.frequency.days());
        let expected = Amount::new(periods.saturating_mul(plan.amount.value()));
        Self {
            days,
            expected,
            total_deposits,
            remaining: expected - total_deposits,
        }
    }

    pub fn standing(&self) -> Standing {
        match self.remaining.value().cmp(&Decimal::ZERO) {
            Ordering::Greater => Standing::Behind,
            Ordering::Less => Standing::Ahead,
            Ordering::Equal => Standing::OnPlan,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Behind,
    OnPlan,
    Ahead,
}

serde_plain::derive_display_from_serialize!(Standing);

/// Everything the user detail view shows besides identity and history.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserMetrics {
    pub balance: Amount,
    pub opening_balance: Amount,
    pub totals: Totals,
    pub progress: SavingsProgress,
}

pub fn savings_progress(
    registration_date: NaiveDate,
    plan: &SavingsPlan,
    total_deposits: Amount,
    today: NaiveDate,
) -> SavingsProgress {
    let days = (today - registration_date).num_days();
    SavingsProgress::new(days, plan, total_deposits)
}

pub fn user_metrics(user: &User, today: NaiveDate) -> UserMetrics {
    let totals = totals(&user.transactions);
    UserMetrics {
        balance: user.balance,
        opening_balance: user.opening_balance(),
        totals,
        progress: savings_progress(user.registration_date, &user.plan, totals.deposits, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SavingFrequency, TransactionKind};
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn plan(a: &str, frequency: SavingFrequency) -> SavingsPlan {
        SavingsPlan {
            amount: amount(a),
            frequency,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(kind: TransactionKind, a: &str) -> Transaction {
        Transaction {
            id: "1".into(),
            kind,
            amount: amount(a),
            date: date(2025, 10, 1),
            description: String::new(),
        }
    }

    #[test]
    fn test_totals_empty() {
        let t = totals(&Vec::<Transaction>::new());
        assert_eq!(t.deposits, Amount::ZERO);
        assert_eq!(t.withdrawals, Amount::ZERO);
    }

    #[test]
    fn test_totals_by_kind() {
        let txs = vec![
            tx(TransactionKind::Deposit, "1000"),
            tx(TransactionKind::Withdrawal, "250"),
            tx(TransactionKind::Deposit, "500"),
            tx(TransactionKind::Withdrawal, "120.50"),
        ];
        let t = totals(&txs);
        assert_eq!(t.deposits, amount("1500"));
        assert_eq!(t.withdrawals, amount("370.50"));
    }

    #[test]
    fn test_daily_plan_behind() {
        let p = SavingsProgress::new(30, &plan("100", SavingFrequency::Daily), amount("2500"));
        assert_eq!(p.expected, amount("3000"));
        assert_eq!(p.remaining, amount("500"));
        assert_eq!(p.standing(), Standing::Behind);
    }

    #[test]
    fn test_huge_plan_saturates() {
        let mut huge = plan("1", SavingFrequency::Daily);
        huge.amount = Amount::new(Decimal::MAX);
        let p = SavingsProgress::new(30, &huge, Amount::ZERO);
        assert_eq!(p.expected, Amount::new(Decimal::MAX));
        assert_eq!(p.standing(), Standing::Behind);
    }

    #[test]
    fn test_weekly_plan_is_not_floored() {
        // 10 days of a weekly 70 plan accrue 100, not 70.
        let p = SavingsProgress::new(10, &plan("70", SavingFrequency::Weekly), Amount::ZERO);
        assert_eq!(p.expected.round_cents(), amount("100"));
    }

    #[test]
    fn test_monthly_plan_ahead() {
        let p = SavingsProgress::new(45, &plan("600", SavingFrequency::Monthly), amount("1000"));
        assert_eq!(p.expected, amount("900"));
        assert_eq!(p.remaining, amount("-100"));
        assert_eq!(p.standing(), Standing::Ahead);
    }

    #[test]
    fn test_on_plan() {
        let p = SavingsProgress::new(0, &plan("5", SavingFrequency::Daily), Amount::ZERO);
        assert_eq!(p.standing(), Standing::OnPlan);
        assert_eq!(p.standing().to_string(), "on_plan");
    }

    #[test]
    fn test_savings_progress_counts_whole_days() {
        let p = savings_progress(
            date(2025, 10, 1),
            &plan("100", SavingFrequency::Daily),
            amount("2500"),
            date(2025, 10, 31),
        );
        assert_eq!(p.days, 30);
        assert_eq!(p.remaining, amount("500"));
    }

    #[test]
    fn test_user_metrics() {
        let user = User {
            id: "1".into(),
            name: "A".into(),
            email: "a@example.com".into(),
            balance: amount("1250"),
            account_number: "ACC001".into(),
            status: Default::default(),
            plan: plan("100", SavingFrequency::Daily),
            registration_date: date(2025, 10, 1),
            transactions: vec![
                tx(TransactionKind::Withdrawal, "250"),
                tx(TransactionKind::Deposit, "1000"),
            ],
        };
        let m = user_metrics(&user, date(2025, 10, 11));
        assert_eq!(m.opening_balance, amount("500"));
        assert_eq!(m.totals.deposits, amount("1000"));
        assert_eq!(m.progress.expected, amount("1000"));
        assert_eq!(m.progress.remaining, Amount::ZERO);
    }
}
