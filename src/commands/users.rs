//! The `users` subcommands.

use crate::args::{UsersAddArgs, UsersListArgs, UsersShowArgs, UsersUpdateArgs};
use crate::commands::{plural, today, Out};
use crate::error::{ErrorType, IntoResult};
use crate::forms::{UserForm, UserUpdateForm};
use crate::metrics::Standing;
use crate::model::User;
use crate::report::{user_rows, UserDetail, UserQuery};
use crate::view::{markdown_table, Field, Format, Rows};
use crate::{Config, Result};
use anyhow::Context;

/// Lists users matching the search and status filters.
pub async fn users_list(config: Config, args: &UsersListArgs) -> Result<Out<Rows>> {
    let users = config
        .ledger()
        .users()
        .await
        .pub_result(ErrorType::Database)?;
    let query = UserQuery {
        search: args.search().map(str::to_string),
        status: args.status(),
        sort: args.sort(),
    };
    let rows = user_rows(&users, &query);
    let message = format!("Found {}", plural(rows.len(), "user", "users"));
    Ok(Out::new(message, Rows::render(&rows, args.format())?))
}

/// Shows one user with their derived figures and transaction history.
pub async fn users_show(config: Config, args: &UsersShowArgs) -> Result<Out<Rows>> {
    let user = config
        .ledger()
        .require_user(args.id())
        .await
        .pub_result(ErrorType::Request)?;
    let detail = UserDetail::new(&user, today(args.today()));
    let rows = match args.format() {
        Format::Json => {
            Rows::Json(serde_json::to_value(&detail).context("Unable to serialize user")?)
        }
        Format::Table | Format::Csv => Rows::Table(detail_text(&detail)),
    };
    Ok(Out::new(
        format!("User {} ({})", detail.id, detail.account_number),
        rows,
    ))
}

/// Validates the add-user form and creates the user.
pub async fn users_add(config: Config, args: &UsersAddArgs) -> Result<Out<User>> {
    let form = UserForm {
        name: args.name().map(str::to_string),
        initial_balance: args.initial_balance().map(str::to_string),
        saving_amount: args.saving_amount().map(str::to_string),
        saving_frequency: args.saving_frequency().map(str::to_string),
        registration_date: args.registration_date(),
    };
    let new_user = form
        .validate(today(None))
        .map_err(anyhow::Error::from)
        .pub_result(ErrorType::Request)?;
    let user = config
        .ledger()
        .add_user(new_user)
        .await
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(
        format!(
            "Created user {} '{}' with account {}",
            user.id, user.name, user.account_number
        ),
        user,
    ))
}

/// Validates the edit-user form and merges it into the user.
pub async fn users_update(config: Config, args: &UsersUpdateArgs) -> Result<Out<User>> {
    let form = UserUpdateForm {
        name: args.name().map(str::to_string),
        email: args.email().map(str::to_string),
        status: args.status().map(str::to_string),
        saving_amount: args.saving_amount().map(str::to_string),
        saving_frequency: args.saving_frequency().map(str::to_string),
    };
    let update = form
        .validate()
        .map_err(anyhow::Error::from)
        .pub_result(ErrorType::Request)?;
    let user = config
        .ledger()
        .update_user(args.id(), update)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(format!("Updated user {}", user.id), user))
}

fn detail_text(detail: &UserDetail) -> String {
    let m = &detail.metrics;
    let remaining = match detail.standing {
        Standing::Behind => format!("{} behind plan", m.progress.remaining),
        Standing::Ahead => format!("{} ahead of plan", m.progress.remaining.abs()),
        Standing::OnPlan => "on plan".to_string(),
    };
    let fields = [
        Field::new("Email", &detail.email),
        Field::new("Account", &detail.account_number),
        Field::new("Status", detail.status),
        Field::new("Balance", m.balance),
        Field::new("Opening balance", m.opening_balance),
        Field::new(
            "Savings plan",
            format!("{} {}", detail.plan.amount, detail.plan.frequency),
        ),
        Field::new("Registered", detail.registration_date),
        Field::new("Total deposits", m.totals.deposits),
        Field::new("Total withdrawals", m.totals.withdrawals),
        Field::new("Days registered", m.progress.days),
        Field::new("Expected savings", m.progress.expected),
        Field::new("Remaining payment", remaining),
    ];

    let mut out = format!("# {}\n\n", detail.name);
    out.push_str(&markdown_table(&fields));
    out.push_str("\n## Transactions\n\n");
    if detail.transactions.is_empty() {
        out.push_str("No transactions yet.\n");
    } else {
        out.push_str(&markdown_table(&detail.transactions));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::ValidationError;
    use crate::ledger::LedgerError;
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    fn add_args(name: &str, balance: &str, amount: &str, frequency: &str) -> UsersAddArgs {
        UsersAddArgs::new(
            Some(name.into()),
            Some(balance.into()),
            Some(amount.into()),
            Some(frequency.into()),
            NaiveDate::from_ymd_opt(2025, 10, 1),
        )
    }

    #[tokio::test]
    async fn test_users_list_seeded() {
        let env = TestEnv::new().await;
        let out = users_list(env.config(), &UsersListArgs::default())
            .await
            .unwrap();
        assert_eq!(out.message(), "Found 4 users");
        let table = out.structure().unwrap().to_string();
        assert!(table.contains("John Doe"));
        assert!(table.contains("$5,420.50"));
    }

    #[tokio::test]
    async fn test_users_add_then_show() {
        let env = TestEnv::new().await;
        let out = users_add(env.config(), &add_args("Ann Lee", "$1,000", "50", "weekly"))
            .await
            .unwrap();
        let user = out.structure().unwrap();
        assert_eq!(user.id, "5");
        assert_eq!(user.account_number, "ACC005");

        let show = UsersShowArgs::new("5", NaiveDate::from_ymd_opt(2025, 10, 15), Format::Table);
        let text = users_show(env.config(), &show)
            .await
            .unwrap()
            .structure()
            .unwrap()
            .to_string();
        assert!(text.starts_with("# Ann Lee"));
        assert!(text.contains("| Days registered   | 14"));
        assert!(text.contains("$100.00 behind plan"));
        assert!(text.contains("No transactions yet."));
    }

    #[tokio::test]
    async fn test_users_show_json() {
        let env = TestEnv::new().await;
        let show = UsersShowArgs::new("1", NaiveDate::from_ymd_opt(2025, 10, 31), Format::Json);
        let out = users_show(env.config(), &show).await.unwrap();
        let Some(Rows::Json(value)) = out.structure() else {
            panic!("expected json");
        };
        assert_eq!(value["metrics"]["progress"]["days"], 30);
        assert_eq!(value["standing"], "behind");
        assert_eq!(value["transactions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_users_show_missing() {
        let env = TestEnv::new().await;
        let show = UsersShowArgs::new("99", None, Format::Table);
        let e = users_show(env.config(), &show).await.unwrap_err();
        assert_eq!(
            e.downcast_ref::<LedgerError>(),
            Some(&LedgerError::UserNotFound("99".into()))
        );
    }

    #[tokio::test]
    async fn test_users_add_rejected_leaves_ledger_unchanged() {
        let env = TestEnv::new().await;
        let before = env.config().ledger().users().await.unwrap();

        let e = users_add(env.config(), &add_args("", "10", "5", "daily"))
            .await
            .unwrap_err();
        assert_eq!(
            e.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MissingField("name"))
        );
        assert!(format!("{e:#}").starts_with("request error"));

        assert!(users_add(env.config(), &add_args("A", "10", "0", "daily"))
            .await
            .is_err());

        assert_eq!(env.config().ledger().users().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_users_update() {
        let env = TestEnv::new().await;
        let args = UsersUpdateArgs::new("2", None, None, Some("suspended".into()), None, None);
        let out = users_update(env.config(), &args).await.unwrap();
        assert_eq!(out.structure().unwrap().status.to_string(), "suspended");

        let missing = UsersUpdateArgs::new("9", Some("X".into()), None, None, None, None);
        assert!(users_update(env.config(), &missing).await.is_err());
    }
}
