//! Recording deposits and withdrawals, and the cross-user deposit and withdrawal lists.

use crate::args::{ListArgs, ReverseArgs, TransactionArgs};
use crate::commands::{plural, today, Out};
use crate::error::{ErrorType, IntoResult};
use crate::forms::TransactionForm;
use crate::ledger::DepositRef;
use crate::model::{TransactionKind, User};
use crate::report::{deposit_rows, withdrawal_rows};
use crate::view::Rows;
use crate::{Config, Result};

/// Validates the deposit or withdrawal form and records the transaction against the user.
pub async fn record(
    config: Config,
    kind: TransactionKind,
    args: &TransactionArgs,
) -> Result<Out<User>> {
    let form = TransactionForm {
        amount: args.amount().map(str::to_string),
        description: args.description().map(str::to_string),
        date: args.date(),
        ..TransactionForm::new(kind)
    };
    let new = form
        .validate(today(None))
        .map_err(anyhow::Error::from)
        .pub_result(ErrorType::Request)?;
    let amount = new.amount;
    let user = config
        .ledger()
        .add_transaction(args.user_id(), new)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Recorded {kind} of {amount} for {}. New balance: {}",
            user.name, user.balance
        ),
        user,
    ))
}

/// Lists deposits across all users with their reversal flags.
pub async fn deposits_list(config: Config, args: &ListArgs) -> Result<Out<Rows>> {
    let ledger = config.ledger();
    let users = ledger.users().await.pub_result(ErrorType::Database)?;
    let reversed = ledger
        .reversed_deposits()
        .await
        .pub_result(ErrorType::Database)?;
    let rows = deposit_rows(&users, &reversed, args.search());
    let message = format!("Found {}", plural(rows.len(), "deposit", "deposits"));
    Ok(Out::new(message, Rows::render(&rows, args.format())?))
}

/// Flags a deposit as reversed.
pub async fn deposits_reverse(config: Config, args: &ReverseArgs) -> Result<Out<DepositRef>> {
    let deposit = config
        .ledger()
        .reverse_deposit(args.user(), args.transaction())
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!("Deposit {deposit} has been reversed"),
        deposit,
    ))
}

/// Lists withdrawals across all users.
pub async fn withdrawals_list(config: Config, args: &ListArgs) -> Result<Out<Rows>> {
    let users = config
        .ledger()
        .users()
        .await
        .pub_result(ErrorType::Database)?;
    let rows = withdrawal_rows(&users, args.search());
    let message = format!("Found {}", plural(rows.len(), "withdrawal", "withdrawals"));
    Ok(Out::new(message, Rows::render(&rows, args.format())?))
}
