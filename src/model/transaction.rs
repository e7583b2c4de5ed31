use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a transaction adds money to, or removes money from, a user's balance.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

impl TransactionKind {
    /// The effect of an amount of this kind on a balance.
    pub fn signed(&self, amount: Amount) -> Amount {
        match self {
            TransactionKind::Deposit => amount,
            TransactionKind::Withdrawal => -amount,
        }
    }
}

/// A single deposit or withdrawal recorded against one user. Transactions are owned by their user
/// and are never edited or deleted once recorded.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Sequential within the owning user, starting at "1".
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Always positive; the direction is carried by `kind`.
    pub amount: Amount,
    pub date: NaiveDate,
    pub description: String,
}

impl Transaction {
    pub fn is_deposit(&self) -> bool {
        self.kind == TransactionKind::Deposit
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == TransactionKind::Withdrawal
    }

    /// The amount with a sign reflecting its effect on the balance.
    pub fn signed_amount(&self) -> Amount {
        self.kind.signed(self.amount)
    }
}

/// A validated transaction that has not yet been assigned an id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub date: NaiveDate,
    pub description: String,
}

impl NewTransaction {
    pub(crate) fn into_transaction(self, id: impl Into<String>) -> Transaction {
        Transaction {
            id: id.into(),
            kind: self.kind,
            amount: self.amount,
            date: self.date,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deserialize_stored_shape() {
        let json = r#"{ "id": "4", "type": "withdrawal", "amount": 120.50,
                        "date": "2025-10-04", "description": "Online purchase" }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "4");
        assert!(t.is_withdrawal());
        assert_eq!(t.amount, Amount::from_str("120.50").unwrap());
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2025, 10, 4).unwrap());
        assert_eq!(t.signed_amount(), Amount::from_str("-120.50").unwrap());
    }

    #[test]
    fn test_serialize_uses_type_field() {
        let t = NewTransaction {
            kind: TransactionKind::Deposit,
            amount: Amount::from_str("10").unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            description: "x".into(),
        }
        .into_transaction("1");
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["type"], "deposit");
        assert_eq!(v["date"], "2025-01-02");
    }

    #[test]
    fn test_kind_plain_strings() {
        assert_eq!(TransactionKind::Withdrawal.to_string(), "withdrawal");
        assert_eq!(
            TransactionKind::from_str("deposit").unwrap(),
            TransactionKind::Deposit
        );
        assert!(TransactionKind::from_str("refund").is_err());
    }
}
