use clap::Parser;
use savings_admin::args::{
    Args, Command, DepositsCommand, UsersCommand, WithdrawalsCommand,
};
use savings_admin::model::TransactionKind;
use savings_admin::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().savings_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Users(users_args) => {
            let config = Config::load(home).await?;
            match users_args.command() {
                UsersCommand::List(args) => commands::users_list(config, args).await?.print_rows(),
                UsersCommand::Show(args) => commands::users_show(config, args).await?.print_rows(),
                UsersCommand::Add(args) => commands::users_add(config, args).await?.print(),
                UsersCommand::Update(args) => commands::users_update(config, args).await?.print(),
            }
        }

        Command::Deposit(tx_args) => {
            commands::record(Config::load(home).await?, TransactionKind::Deposit, tx_args)
                .await?
                .print()
        }

        Command::Withdraw(tx_args) => {
            commands::record(Config::load(home).await?, TransactionKind::Withdrawal, tx_args)
                .await?
                .print()
        }

        Command::Deposits(deposits_args) => {
            let config = Config::load(home).await?;
            match deposits_args.command() {
                DepositsCommand::List(args) => {
                    commands::deposits_list(config, args).await?.print_rows()
                }
                DepositsCommand::Reverse(args) => {
                    commands::deposits_reverse(config, args).await?.print()
                }
            }
        }

        Command::Withdrawals(withdrawals_args) => {
            let config = Config::load(home).await?;
            match withdrawals_args.command() {
                WithdrawalsCommand::List(args) => {
                    commands::withdrawals_list(config, args).await?.print_rows()
                }
            }
        }

        Command::Dashboard(dashboard_args) => {
            commands::dashboard(Config::load(home).await?, dashboard_args)
                .await?
                .print_rows()
        }

        Command::Chart(chart_args) => commands::chart(Config::load(home).await?, chart_args)
            .await?
            .print_rows(),

        Command::Backup(backup_args) => commands::backup(Config::load(home).await?, backup_args)
            .await?
            .print(),

        Command::Import(import_args) => commands::import(Config::load(home).await?, import_args)
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this binary and its library only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
