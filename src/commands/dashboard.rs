use crate::args::{ChartArgs, DashboardArgs};
use crate::commands::{today, Out};
use crate::error::{ErrorType, IntoResult};
use crate::report::{self, Dashboard};
use crate::view::{markdown_table, Field, Format, Rows};
use crate::{Config, Result};
use anyhow::Context;
use rust_decimal::Decimal;

/// Summary figures across all users.
pub async fn dashboard(config: Config, args: &DashboardArgs) -> Result<Out<Rows>> {
    let users = config
        .ledger()
        .users()
        .await
        .pub_result(ErrorType::Database)?;
    let today = today(args.today());
    let dashboard = report::dashboard(&users, today);
    let rows = match args.format() {
        Format::Json => Rows::Json(
            serde_json::to_value(&dashboard).context("Unable to serialize the dashboard")?,
        ),
        Format::Table | Format::Csv => Rows::Table(dashboard_text(&dashboard)),
    };
    Ok(Out::new(format!("Dashboard as of {today}"), rows))
}

/// Deposit and withdrawal sums per day, week or month.
pub async fn chart(config: Config, args: &ChartArgs) -> Result<Out<Rows>> {
    let users = config
        .ledger()
        .users()
        .await
        .pub_result(ErrorType::Database)?;
    let buckets = report::chart(&users, args.period(), today(args.today()));
    Ok(Out::new(
        format!("{} transactions", title(args.period().to_string())),
        Rows::render(&buckets, args.format())?,
    ))
}

fn dashboard_text(d: &Dashboard) -> String {
    let fields = [
        Field::new("Total users", d.total_users),
        Field::new("Active users", d.active_users),
        Field::new("Total deposits", d.total_deposits),
        Field::new("Total withdrawals", d.total_withdrawals),
        Field::new("Net balance", d.net_balance),
        Field::new("Deposits, last 30 days", change_text(d.deposit_change)),
        Field::new("Withdrawals, last 30 days", change_text(d.withdrawal_change)),
    ];
    let mut out = markdown_table(&fields);
    out.push_str("\n## Recent activity\n\n");
    if d.recent.is_empty() {
        out.push_str("No transactions yet.\n");
    } else {
        out.push_str(&markdown_table(&d.recent));
    }
    out
}

fn change_text(change: Option<Decimal>) -> String {
    match change {
        None => "no earlier activity".to_string(),
        Some(c) if c.is_sign_negative() => format!("{c}% from the previous 30 days"),
        Some(c) => format!("+{c}% from the previous 30 days"),
    }
}

fn title(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ChartPeriod;
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn oct(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 10, day)
    }

    #[tokio::test]
    async fn test_dashboard_text() {
        let env = TestEnv::new().await;
        let out = dashboard(env.config(), &DashboardArgs::new(oct(10), Format::Table))
            .await
            .unwrap();
        assert_eq!(out.message(), "Dashboard as of 2025-10-10");
        let text = out.structure().unwrap().to_string();
        assert!(text.contains("| Total users "));
        assert!(text.contains("$42,101.50"));
        assert!(text.contains("no earlier activity"));
        assert!(text.contains("## Recent activity"));
        assert!(text.contains("Salary deposit"));
    }

    #[tokio::test]
    async fn test_dashboard_json() {
        let env = TestEnv::new().await;
        let out = dashboard(env.config(), &DashboardArgs::new(oct(10), Format::Json))
            .await
            .unwrap();
        let Some(Rows::Json(value)) = out.structure() else {
            panic!("expected json");
        };
        assert_eq!(value["total_users"], 4);
        assert_eq!(value["active_users"], 4);
        assert_eq!(value["total_deposits"], "1500.00");
        assert!(value["deposit_change"].is_null());
        assert_eq!(value["recent"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_chart() {
        let env = TestEnv::new().await;
        let args = ChartArgs::new(ChartPeriod::Weekly, oct(10), Format::Csv);
        let out = chart(env.config(), &args).await.unwrap();
        assert_eq!(out.message(), "Weekly transactions");
        let csv = out.structure().unwrap().to_string();
        assert!(csv.starts_with("Period,Deposits,Withdrawals\n"));
        assert!(csv.contains("Tue,\"$1,000.00\",$0.00\n"));
    }

    #[test]
    fn test_change_text() {
        assert_eq!(
            change_text(Some(Decimal::from_str("12.5").unwrap())),
            "+12.5% from the previous 30 days"
        );
        assert_eq!(
            change_text(Some(Decimal::from(-3))),
            "-3% from the previous 30 days"
        );
    }

    #[test]
    fn test_title() {
        assert_eq!(title("all-time".into()), "All-time");
        assert_eq!(title(String::new()), "");
    }
}
