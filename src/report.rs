//! Read-only views over the ledger: the user list, the deposit and withdrawal lists, the user
//! detail view, the dashboard figures and the transaction chart.
//!
//! Everything here is a pure function of the users (and, for deposits, the reversal flags) plus
//! the date that counts as today.

use crate::ledger::DepositRef;
use crate::metrics::{totals, user_metrics, Standing, UserMetrics};
use crate::model::{Amount, SavingsPlan, Transaction, TransactionKind, User, UserStatus};
use crate::view::Tabular;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// How many transactions the dashboard lists as recent activity.
pub const RECENT_ACTIVITY: usize = 5;

/// The length in days of each window compared by the dashboard.
const CHANGE_WINDOW_DAYS: i64 = 30;

// =============================================================================
// Users
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    /// In order of creation.
    #[default]
    Id,
    Name,
    /// Highest balance first.
    Balance,
    /// Earliest registration first.
    Registered,
}

serde_plain::derive_display_from_serialize!(UserSort);

/// Filters for the user list.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Case-insensitive substring of the name, email or account number.
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub sort: UserSort,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub account_number: String,
    pub status: UserStatus,
    pub balance: Amount,
    pub plan: SavingsPlan,
    pub registration_date: NaiveDate,
}

impl Tabular for UserRow {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Name",
        "Email",
        "Account",
        "Status",
        "Balance",
        "Plan",
        "Registered",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.email.clone(),
            self.account_number.clone(),
            self.status.to_string(),
            self.balance.to_string(),
            format!("{} {}", self.plan.amount, self.plan.frequency),
            self.registration_date.to_string(),
        ]
    }
}

pub fn user_rows(users: &[User], query: &UserQuery) -> Vec<UserRow> {
    let needle = needle(query.search.as_deref());
    let mut matched: Vec<&User> = users
        .iter()
        .filter(|u| query.status.map_or(true, |s| u.status == s))
        .filter(|u| matches(&needle, [&u.name, &u.email, &u.account_number]))
        .collect();

    match query.sort {
        UserSort::Id => matched.sort_by(|a, b| compare_ids(&a.id, &b.id)),
        UserSort::Name => matched.sort_by_key(|u| u.name.to_lowercase()),
        UserSort::Balance => matched.sort_by(|a, b| b.balance.cmp(&a.balance)),
        UserSort::Registered => matched.sort_by_key(|u| u.registration_date),
    }

    matched
        .into_iter()
        .map(|u| UserRow {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            account_number: u.account_number.clone(),
            status: u.status,
            balance: u.balance,
            plan: u.plan,
            registration_date: u.registration_date,
        })
        .collect()
}

/// Ids are numeric strings; anything else sorts after them as text.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// The user detail view.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct UserDetail {
    pub id: String,
    pub name: String,
    pub email: String,
    pub account_number: String,
    pub status: UserStatus,
    pub plan: SavingsPlan,
    pub registration_date: NaiveDate,
    pub metrics: UserMetrics,
    pub standing: Standing,
    /// Most recent first.
    pub transactions: Vec<Transaction>,
}

impl UserDetail {
    pub fn new(user: &User, today: NaiveDate) -> Self {
        let metrics = user_metrics(user, today);
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            account_number: user.account_number.clone(),
            status: user.status,
            plan: user.plan,
            registration_date: user.registration_date,
            metrics,
            standing: metrics.progress.standing(),
            transactions: user.transactions.clone(),
        }
    }
}

impl Tabular for Transaction {
    const HEADERS: &'static [&'static str] = &["ID", "Date", "Type", "Description", "Amount"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.date.to_string(),
            self.kind.to_string(),
            self.description.clone(),
            self.amount.to_string(),
        ]
    }
}

// =============================================================================
// Deposits and withdrawals
// =============================================================================

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DepositRow {
    pub user_id: String,
    pub user_name: String,
    pub account_number: String,
    pub transaction_id: String,
    pub description: String,
    pub amount: Amount,
    pub date: NaiveDate,
    pub reversed: bool,
}

impl Tabular for DepositRow {
    const HEADERS: &'static [&'static str] = &[
        "Date",
        "User",
        "Account",
        "Transaction",
        "Description",
        "Amount",
        "Reversed",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            self.user_name.clone(),
            self.account_number.clone(),
            format!("{}/{}", self.user_id, self.transaction_id),
            self.description.clone(),
            self.amount.to_string(),
            if self.reversed { "yes" } else { "" }.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct WithdrawalRow {
    pub user_id: String,
    pub user_name: String,
    pub account_number: String,
    pub transaction_id: String,
    pub description: String,
    pub amount: Amount,
    pub date: NaiveDate,
}

impl Tabular for WithdrawalRow {
    const HEADERS: &'static [&'static str] = &[
        "Date",
        "User",
        "Account",
        "Transaction",
        "Description",
        "Amount",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            self.user_name.clone(),
            self.account_number.clone(),
            format!("{}/{}", self.user_id, self.transaction_id),
            self.description.clone(),
            self.amount.to_string(),
        ]
    }
}

/// Every deposit across all users whose user name, account number or description contains
/// `search`, newest first.
pub fn deposit_rows(
    users: &[User],
    reversed: &BTreeSet<DepositRef>,
    search: Option<&str>,
) -> Vec<DepositRow> {
    transactions_of(users, TransactionKind::Deposit, search)
        .into_iter()
        .map(|(u, t)| DepositRow {
            user_id: u.id.clone(),
            user_name: u.name.clone(),
            account_number: u.account_number.clone(),
            transaction_id: t.id.clone(),
            description: t.description.clone(),
            amount: t.amount,
            date: t.date,
            reversed: reversed.contains(&DepositRef::new(u.id.as_str(), t.id.as_str())),
        })
        .collect()
}

/// Every withdrawal across all users, filtered and ordered like `deposit_rows`.
pub fn withdrawal_rows(users: &[User], search: Option<&str>) -> Vec<WithdrawalRow> {
    transactions_of(users, TransactionKind::Withdrawal, search)
        .into_iter()
        .map(|(u, t)| WithdrawalRow {
            user_id: u.id.clone(),
            user_name: u.name.clone(),
            account_number: u.account_number.clone(),
            transaction_id: t.id.clone(),
            description: t.description.clone(),
            amount: t.amount,
            date: t.date,
        })
        .collect()
}

fn transactions_of<'a>(
    users: &'a [User],
    kind: TransactionKind,
    search: Option<&str>,
) -> Vec<(&'a User, &'a Transaction)> {
    let needle = needle(search);
    let mut found: Vec<(&User, &Transaction)> = all_transactions(users)
        .filter(|(_, t)| t.kind == kind)
        .filter(|(u, t)| matches(&needle, [&u.name, &u.account_number, &t.description]))
        .collect();
    // Stable, so same-day entries keep user order and history order.
    found.sort_by(|a, b| b.1.date.cmp(&a.1.date));
    found
}

fn all_transactions(users: &[User]) -> impl Iterator<Item = (&User, &Transaction)> {
    users
        .iter()
        .flat_map(|u| u.transactions.iter().map(move |t| (u, t)))
}

fn needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn matches<const N: usize>(needle: &Option<String>, haystacks: [&String; N]) -> bool {
    match needle {
        None => true,
        Some(n) => haystacks.iter().any(|h| h.to_lowercase().contains(n)),
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_users: usize,
    pub active_users: usize,
    pub total_deposits: Amount,
    pub total_withdrawals: Amount,
    /// The sum of all user balances.
    pub net_balance: Amount,
    /// Percent change in deposits over the last 30 days versus the 30 days before. `None` when
    /// nothing was deposited in the earlier window.
    pub deposit_change: Option<Decimal>,
    pub withdrawal_change: Option<Decimal>,
    pub recent: Vec<Activity>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Activity {
    pub user_id: String,
    pub user_name: String,
    pub account_number: String,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub date: NaiveDate,
    pub description: String,
}

impl Tabular for Activity {
    const HEADERS: &'static [&'static str] =
        &["Date", "User", "Account", "Type", "Amount", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            self.user_name.clone(),
            self.account_number.clone(),
            self.kind.to_string(),
            self.amount.to_string(),
            self.description.clone(),
        ]
    }
}

pub fn dashboard(users: &[User], today: NaiveDate) -> Dashboard {
    let all = totals(users.iter().flat_map(|u| u.transactions.iter()));

    let window = Duration::days(CHANGE_WINDOW_DAYS);
    let current_start = today - window + Duration::days(1);
    let prior_start = current_start - window;
    let in_range = |from: NaiveDate, to: NaiveDate| {
        totals(
            all_transactions(users)
                .map(|(_, t)| t)
                .filter(move |t| t.date >= from && t.date <= to),
        )
    };
    let current = in_range(current_start, today);
    let prior = in_range(prior_start, current_start - Duration::days(1));

    let mut recent: Vec<(&User, &Transaction)> = all_transactions(users).collect();
    recent.sort_by(|a, b| b.1.date.cmp(&a.1.date));
    let recent = recent
        .into_iter()
        .take(RECENT_ACTIVITY)
        .map(|(u, t)| Activity {
            user_id: u.id.clone(),
            user_name: u.name.clone(),
            account_number: u.account_number.clone(),
            kind: t.kind,
            amount: t.amount,
            date: t.date,
            description: t.description.clone(),
        })
        .collect();

    Dashboard {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.is_active()).count(),
        total_deposits: all.deposits,
        total_withdrawals: all.withdrawals,
        net_balance: users.iter().map(|u| u.balance).sum(),
        deposit_change: percent_change(prior.deposits, current.deposits),
        withdrawal_change: percent_change(prior.withdrawals, current.withdrawals),
        recent,
    }
}

/// Percent change from `before` to `after`, to one decimal place. `None` when `before` is zero or
/// the change is too large to represent.
pub fn percent_change(before: Amount, after: Amount) -> Option<Decimal> {
    if before.is_zero() {
        return None;
    }
    let change = after
        .value()
        .checked_sub(before.value())?
        .checked_div(before.value())?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(change.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

// =============================================================================
// Chart
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChartPeriod {
    /// The last seven days, one bar per day.
    Weekly,
    /// The last four weeks, one bar per week.
    Monthly,
    /// One bar per calendar month since the first transaction.
    AllTime,
}

serde_plain::derive_display_from_serialize!(ChartPeriod);
serde_plain::derive_fromstr_from_deserialize!(ChartPeriod);

/// Deposit and withdrawal sums over one span of days.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ChartBucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub deposits: Amount,
    pub withdrawals: Amount,
}

impl Tabular for ChartBucket {
    const HEADERS: &'static [&'static str] = &["Period", "Deposits", "Withdrawals"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.deposits.to_string(),
            self.withdrawals.to_string(),
        ]
    }
}

pub fn chart(users: &[User], period: ChartPeriod, today: NaiveDate) -> Vec<ChartBucket> {
    let spans = match period {
        ChartPeriod::Weekly => (0..7)
            .rev()
            .map(|back| {
                let day = today - Duration::days(back);
                (day.format("%a").to_string(), day, day)
            })
            .collect(),
        ChartPeriod::Monthly => (1..=4)
            .map(|week: i64| {
                let end = today - Duration::days(7 * (4 - week));
                (format!("Week {week}"), end - Duration::days(6), end)
            })
            .collect(),
        ChartPeriod::AllTime => month_spans(users, today),
    };

    spans
        .into_iter()
        .map(|(label, start, end)| {
            let t = totals(
                all_transactions(users)
                    .map(|(_, t)| t)
                    .filter(|t| t.date >= start && t.date <= end),
            );
            ChartBucket {
                label,
                start,
                end,
                deposits: t.deposits,
                withdrawals: t.withdrawals,
            }
        })
        .collect()
}

/// Calendar months from the month of the earliest transaction through the month of `today`.
fn month_spans(users: &[User], today: NaiveDate) -> Vec<(String, NaiveDate, NaiveDate)> {
    let Some(earliest) = all_transactions(users).map(|(_, t)| t.date).min() else {
        return Vec::new();
    };
    let last = first_of_month(today);
    let mut month = first_of_month(earliest.min(today));
    let mut spans = Vec::new();
    while month <= last {
        let next = next_month(month);
        spans.push((
            month.format("%b %Y").to_string(),
            month,
            next - Duration::days(1),
        ));
        month = next;
    }
    spans
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month(first: NaiveDate) -> NaiveDate {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(first + Duration::days(31))
}
