//! Core data models for the ledger

use serde::{Deserialize, Serialize};

use super::types::TransactionType;

/// Transaction identifier: creation time in milliseconds since the epoch
pub type TransactionId = u64;

/// A single recorded income or expense entry.
///
/// Transactions are never edited once stored, only removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: TransactionId,
    /// What the money was for
    pub description: String,
    /// Positive amount
    pub amount: f64,
    /// Income or expense
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Contribution of this transaction to the balance
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }
}

/// Validated input that has not been given an id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl TransactionDraft {
    /// Turn the draft into a transaction with the given id
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            kind: self.kind,
        }
    }
}

/// Income, expense and balance totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
}

impl Totals {
    /// Sum the amounts of a transaction sequence in order
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = Totals::default();
        for tx in transactions {
            totals.apply(tx);
        }
        totals
    }

    /// Add a transaction's contribution
    pub fn apply(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionType::Income => {
                self.total_income += tx.amount;
                self.balance += tx.amount;
            }
            TransactionType::Expense => {
                self.total_expense += tx.amount;
                self.balance -= tx.amount;
            }
        }
    }

    /// Take a transaction's contribution back out
    pub fn revert(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionType::Income => {
                self.total_income -= tx.amount;
                self.balance -= tx.amount;
            }
            TransactionType::Expense => {
                self.total_expense -= tx.amount;
                self.balance += tx.amount;
            }
        }
    }

    /// True when every field is within `tolerance` of `other`
    pub fn approx_eq(&self, other: &Totals, tolerance: f64) -> bool {
        (self.balance - other.balance).abs() <= tolerance
            && (self.total_income - other.total_income).abs() <= tolerance
            && (self.total_expense - other.total_expense).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: TransactionId, amount: f64, kind: TransactionType) -> Transaction {
        Transaction { id, description: format!("tx {}", id), amount, kind }
    }

    #[test]
    fn test_transaction_json_layout() {
        let t = tx(1700000000000, 12.5, TransactionType::Expense);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1700000000000u64,
                "description": "tx 1700000000000",
                "amount": 12.5,
                "type": "expense"
            })
        );
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(tx(1, 10.0, TransactionType::Income).signed_amount(), 10.0);
        assert_eq!(tx(2, 10.0, TransactionType::Expense).signed_amount(), -10.0);
    }

    #[test]
    fn test_totals_apply_and_revert() {
        let salary = tx(1, 1000.0, TransactionType::Income);
        let rent = tx(2, 400.0, TransactionType::Expense);

        let mut totals = Totals::from_transactions([&salary, &rent]);
        assert_eq!(totals.balance, 600.0);
        assert_eq!(totals.total_income, 1000.0);
        assert_eq!(totals.total_expense, 400.0);

        totals.revert(&salary);
        assert_eq!(totals.balance, -400.0);
        assert_eq!(totals.total_income, 0.0);
        assert_eq!(totals.total_expense, 400.0);
    }

    #[test]
    fn test_draft_into_transaction() {
        let draft = TransactionDraft {
            description: "Coffee".to_string(),
            amount: 3.5,
            kind: TransactionType::Expense,
        };
        let t = draft.into_transaction(42);
        assert_eq!(t.id, 42);
        assert!(t.is_expense());
        assert!(!t.is_income());
    }
}
