//! These structs provide the CLI interface for the savings admin tool.

use crate::model::UserStatus;
use crate::report::{ChartPeriod, UserSort};
use crate::view::Format;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// savings: administer savings accounts from the command line.
///
/// Keeps a ledger of users, their savings plans, and the deposits and withdrawals recorded
/// against them in a local SQLite database. Run `savings init` once to create the data directory,
/// then use the other subcommands to view and change the ledger.
#[derive(Debug, Parser, Clone)]
#[command(name = "savings", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, its configuration file and the database.
    ///
    /// This is the first command you should run. By default the data directory is $HOME/savings;
    /// pass --savings-home or set SAVINGS_HOME to put it somewhere else.
    Init(InitArgs),
    /// List, show, add and edit users.
    Users(UsersArgs),
    /// Record a deposit for a user.
    Deposit(TransactionArgs),
    /// Record a withdrawal for a user.
    Withdraw(TransactionArgs),
    /// List deposits across all users, or flag one as reversed.
    Deposits(DepositsArgs),
    /// List withdrawals across all users.
    Withdrawals(WithdrawalsArgs),
    /// Show totals, recent changes and recent activity.
    Dashboard(DashboardArgs),
    /// Show deposit and withdrawal sums over time.
    Chart(ChartArgs),
    /// Save a JSON snapshot of the ledger (and optionally the database file) to .backups.
    Backup(BackupArgs),
    /// Replace the whole ledger with users read from a JSON file.
    ///
    /// The file holds a JSON array of users in the stored format, such as a snapshot written by
    /// `savings backup`. A snapshot of the current ledger is saved first.
    Import(ImportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the savings data and configuration is held. Defaults to ~/savings
    #[arg(long, env = "SAVINGS_HOME", default_value_t = default_savings_home())]
    savings_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, savings_home: PathBuf) -> Self {
        Self {
            log_level,
            savings_home: savings_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn savings_home(&self) -> &DisplayPath {
        &self.savings_home
    }
}

/// Args for the `savings init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Start with an empty ledger instead of the four demo users.
    #[arg(long)]
    no_seed: bool,
}

impl InitArgs {
    pub fn new(no_seed: bool) -> Self {
        Self { no_seed }
    }

    pub fn seed_demo_users(&self) -> bool {
        !self.no_seed
    }
}

/// Args for the `savings users` command.
#[derive(Debug, Parser, Clone)]
pub struct UsersArgs {
    #[command(subcommand)]
    command: UsersCommand,
}

impl UsersArgs {
    pub fn new(command: UsersCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &UsersCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersCommand {
    /// List users.
    List(UsersListArgs),
    /// Show one user with their balance, savings progress and transaction history.
    Show(UsersShowArgs),
    /// Add a user.
    Add(UsersAddArgs),
    /// Change a user's details. Only the given fields change.
    Update(UsersUpdateArgs),
}

/// Args for the `savings users list` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct UsersListArgs {
    /// Only show users whose name, email or account number contains this text.
    #[arg(long)]
    search: Option<String>,

    /// Only show users with this status: active or suspended.
    #[arg(long)]
    status: Option<UserStatus>,

    /// The order of the list.
    #[arg(long, value_enum, default_value_t = UserSort::Id)]
    sort: UserSort,

    /// The output format.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

impl UsersListArgs {
    pub fn new(
        search: Option<String>,
        status: Option<UserStatus>,
        sort: UserSort,
        format: Format,
    ) -> Self {
        Self {
            search,
            status,
            sort,
            format,
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn status(&self) -> Option<UserStatus> {
        self.status
    }

    pub fn sort(&self) -> UserSort {
        self.sort
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Args for the `savings users show` command.
#[derive(Debug, Parser, Clone)]
pub struct UsersShowArgs {
    /// The user's id.
    id: String,

    /// The date to compute savings progress at, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    today: Option<NaiveDate>,

    /// The output format. Csv is shown as a table.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

impl UsersShowArgs {
    pub fn new(id: impl Into<String>, today: Option<NaiveDate>, format: Format) -> Self {
        Self {
            id: id.into(),
            today,
            format,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn today(&self) -> Option<NaiveDate> {
        self.today
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Args for the `savings users add` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct UsersAddArgs {
    /// The user's full name.
    #[arg(long)]
    name: Option<String>,

    /// The opening balance, e.g. 1000 or $1,000.00. Must not be negative.
    #[arg(long, allow_hyphen_values = true)]
    initial_balance: Option<String>,

    /// The amount the user plans to save each period. Must be greater than zero.
    #[arg(long, allow_hyphen_values = true)]
    saving_amount: Option<String>,

    /// How often the user plans to save: daily, weekly or monthly.
    #[arg(long)]
    saving_frequency: Option<String>,

    /// The registration date, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    registration_date: Option<NaiveDate>,
}

impl UsersAddArgs {
    pub fn new(
        name: Option<String>,
        initial_balance: Option<String>,
        saving_amount: Option<String>,
        saving_frequency: Option<String>,
        registration_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            name,
            initial_balance,
            saving_amount,
            saving_frequency,
            registration_date,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn initial_balance(&self) -> Option<&str> {
        self.initial_balance.as_deref()
    }

    pub fn saving_amount(&self) -> Option<&str> {
        self.saving_amount.as_deref()
    }

    pub fn saving_frequency(&self) -> Option<&str> {
        self.saving_frequency.as_deref()
    }

    pub fn registration_date(&self) -> Option<NaiveDate> {
        self.registration_date
    }
}

/// Args for the `savings users update` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct UsersUpdateArgs {
    /// The user's id.
    id: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// active or suspended.
    #[arg(long)]
    status: Option<String>,

    /// Must be greater than zero.
    #[arg(long, allow_hyphen_values = true)]
    saving_amount: Option<String>,

    /// daily, weekly or monthly.
    #[arg(long)]
    saving_frequency: Option<String>,
}

impl UsersUpdateArgs {
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        email: Option<String>,
        status: Option<String>,
        saving_amount: Option<String>,
        saving_frequency: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name,
            email,
            status,
            saving_amount,
            saving_frequency,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn saving_amount(&self) -> Option<&str> {
        self.saving_amount.as_deref()
    }

    pub fn saving_frequency(&self) -> Option<&str> {
        self.saving_frequency.as_deref()
    }
}

/// Args for the `savings deposit` and `savings withdraw` commands.
#[derive(Debug, Parser, Clone, Default)]
pub struct TransactionArgs {
    /// The id of the user the transaction belongs to.
    user_id: String,

    /// The amount, e.g. 250 or $1,250.00. Must be greater than zero.
    #[arg(long, allow_hyphen_values = true)]
    amount: Option<String>,

    /// What the transaction was for.
    #[arg(long)]
    description: Option<String>,

    /// The transaction date, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl TransactionArgs {
    pub fn new(
        user_id: impl Into<String>,
        amount: Option<String>,
        description: Option<String>,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            description,
            date,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Args for the `savings deposits` command.
#[derive(Debug, Parser, Clone)]
pub struct DepositsArgs {
    #[command(subcommand)]
    command: DepositsCommand,
}

impl DepositsArgs {
    pub fn new(command: DepositsCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &DepositsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DepositsCommand {
    /// List deposits across all users, newest first.
    List(ListArgs),
    /// Flag a deposit as reversed. The balance is not changed.
    Reverse(ReverseArgs),
}

/// Args for the `savings withdrawals` command.
#[derive(Debug, Parser, Clone)]
pub struct WithdrawalsArgs {
    #[command(subcommand)]
    command: WithdrawalsCommand,
}

impl WithdrawalsArgs {
    pub fn new(command: WithdrawalsCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &WithdrawalsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum WithdrawalsCommand {
    /// List withdrawals across all users, newest first.
    List(ListArgs),
}

/// Args for the `deposits list` and `withdrawals list` commands.
#[derive(Debug, Parser, Clone, Default)]
pub struct ListArgs {
    /// Only show transactions whose user name, account number or description contains this text.
    #[arg(long)]
    search: Option<String>,

    /// The output format.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

impl ListArgs {
    pub fn new(search: Option<String>, format: Format) -> Self {
        Self { search, format }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Args for the `savings deposits reverse` command.
#[derive(Debug, Parser, Clone)]
pub struct ReverseArgs {
    /// The id of the user the deposit belongs to.
    #[arg(long)]
    user: String,

    /// The id of the deposit within the user's history.
    #[arg(long)]
    transaction: String,
}

impl ReverseArgs {
    pub fn new(user: impl Into<String>, transaction: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            transaction: transaction.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn transaction(&self) -> &str {
        &self.transaction
    }
}

/// Args for the `savings dashboard` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct DashboardArgs {
    /// The date that counts as today, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    today: Option<NaiveDate>,

    /// The output format. Csv is shown as a table.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

impl DashboardArgs {
    pub fn new(today: Option<NaiveDate>, format: Format) -> Self {
        Self { today, format }
    }

    pub fn today(&self) -> Option<NaiveDate> {
        self.today
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Args for the `savings chart` command.
#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// weekly: the last seven days. monthly: the last four weeks. all-time: every month since the
    /// first transaction.
    #[arg(value_enum)]
    period: ChartPeriod,

    /// The date that counts as today, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    today: Option<NaiveDate>,

    /// The output format.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

impl ChartArgs {
    pub fn new(period: ChartPeriod, today: Option<NaiveDate>, format: Format) -> Self {
        Self {
            period,
            today,
            format,
        }
    }

    pub fn period(&self) -> ChartPeriod {
        self.period
    }

    pub fn today(&self) -> Option<NaiveDate> {
        self.today
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

/// Args for the `savings backup` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct BackupArgs {
    /// Also copy the SQLite database file.
    #[arg(long)]
    sqlite: bool,
}

impl BackupArgs {
    pub fn new(sqlite: bool) -> Self {
        Self { sqlite }
    }

    pub fn sqlite(&self) -> bool {
        self.sqlite
    }
}

/// Args for the `savings import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The JSON file to read.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

fn default_savings_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("savings"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --savings-home or SAVINGS_HOME instead of relying on the \
                default savings home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("savings")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_users_list() {
        let args = Args::try_parse_from([
            "savings",
            "--savings-home",
            "/tmp/s",
            "users",
            "list",
            "--search",
            "doe",
            "--status",
            "suspended",
            "--sort",
            "balance",
            "--format",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.common().savings_home().path(), Path::new("/tmp/s"));
        let Command::Users(users) = args.command() else {
            panic!("expected users");
        };
        let UsersCommand::List(list) = users.command() else {
            panic!("expected list");
        };
        assert_eq!(list.search(), Some("doe"));
        assert_eq!(list.status(), Some(UserStatus::Suspended));
        assert_eq!(list.sort(), UserSort::Balance);
        assert_eq!(list.format(), Format::Csv);
    }

    #[test]
    fn test_parse_deposit() {
        let args = Args::try_parse_from([
            "savings",
            "deposit",
            "3",
            "--amount",
            "$1,000",
            "--description",
            "Salary",
            "--date",
            "2025-10-07",
        ])
        .unwrap();
        let Command::Deposit(deposit) = args.command() else {
            panic!("expected deposit");
        };
        assert_eq!(deposit.user_id(), "3");
        assert_eq!(deposit.amount(), Some("$1,000"));
        assert_eq!(deposit.date(), NaiveDate::from_ymd_opt(2025, 10, 7));
    }

    #[test]
    fn test_parse_chart() {
        let args = Args::try_parse_from(["savings", "chart", "all-time"]).unwrap();
        let Command::Chart(chart) = args.command() else {
            panic!("expected chart");
        };
        assert_eq!(chart.period(), ChartPeriod::AllTime);
        assert_eq!(chart.format(), Format::Table);
    }

    #[test]
    fn test_parse_bad_date() {
        assert!(Args::try_parse_from(["savings", "dashboard", "--today", "10/07/2025"]).is_err());
    }
}
