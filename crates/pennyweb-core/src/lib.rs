//! Core ledger state and persistence
//!
//! The [`Ledger`] owns the transaction list together with the running
//! totals, and writes the whole state to a [`KeyValueStore`] after every
//! mutation. `add_transaction` and `remove_transaction` are the only ways
//! to change it.

pub mod error;
pub mod models;
pub mod store;
pub mod types;
pub mod validation;

use pennyweb_config::Config;
use pennyweb_utils::IdGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger, ErrorSeverity};
pub use models::{Totals, Transaction, TransactionDraft, TransactionId};
pub use store::{open_store, FileStore, KeyValueStore, MemoryStore, StoreError, StoreRef};
pub use types::TransactionType;
pub use validation::{parse_form_input, validate_input, ValidationError};

use store::{KEY_BALANCE, KEY_TOTAL_EXPENSE, KEY_TOTAL_INCOME, KEY_TRANSACTIONS};

/// Stored totals further than this from the recomputed ones are replaced
const RECONCILE_TOLERANCE: f64 = 0.005;

/// In-memory ledger data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub transactions: Vec<Transaction>,
}

impl LedgerState {
    fn totals(&self) -> Totals {
        Totals {
            balance: self.balance,
            total_income: self.total_income,
            total_expense: self.total_expense,
        }
    }

    fn set_totals(&mut self, totals: Totals) {
        self.balance = totals.balance;
        self.total_income = totals.total_income;
        self.total_expense = totals.total_expense;
    }
}

/// Main ledger structure
pub struct Ledger {
    state: LedgerState,
    store: StoreRef,
    ids: IdGenerator,
    max_amount: f64,
    logger: Box<dyn ErrorLogger>,
    persistence_warning: Option<String>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("state", &self.state)
            .field("max_amount", &self.max_amount)
            .field("persistence_warning", &self.persistence_warning)
            .finish()
    }
}

impl Ledger {
    /// Create an empty ledger backed by `store`. Call
    /// [`load_from_storage`](Self::load_from_storage) to restore saved state.
    pub fn new(config: &Config, store: StoreRef) -> Self {
        Self {
            state: LedgerState::default(),
            store,
            ids: IdGenerator::new(),
            max_amount: config.ledger.max_amount,
            logger: Box::new(DefaultErrorLogger),
            persistence_warning: None,
        }
    }

    /// Replace the logger used for storage failures
    pub fn with_logger(mut self, logger: Box<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    // ==================== Read Access ====================

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    pub fn total_income(&self) -> f64 {
        self.state.total_income
    }

    pub fn total_expense(&self) -> f64 {
        self.state.total_expense
    }

    /// Transactions in insertion order
    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn totals(&self) -> Totals {
        self.state.totals()
    }

    pub fn max_amount(&self) -> f64 {
        self.max_amount
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.state.transactions.iter().find(|t| t.id == id)
    }

    /// Totals recomputed from the transaction list
    pub fn derived_totals(&self) -> Totals {
        Totals::from_transactions(&self.state.transactions)
    }

    /// Message of the last failed save, cleared by the next successful one
    pub fn persistence_warning(&self) -> Option<&str> {
        self.persistence_warning.as_deref()
    }

    // ==================== Mutations ====================

    /// Allocate an id no stored or previously issued transaction uses.
    ///
    /// When the clock-based ids run out the smallest id not in the list is
    /// used instead.
    pub fn next_id(&mut self) -> TransactionId {
        if let Some(id) = self.ids.next_id() {
            if self.transaction(id).is_none() {
                return id;
            }
        }

        let used: HashSet<TransactionId> = self.state.transactions.iter().map(|t| t.id).collect();
        // at most len() ids are taken, so one of 0..=len() is free
        let id = (0..=TransactionId::MAX)
            .find(|id| !used.contains(id))
            .unwrap_or_default();
        self.logger.log_warning(
            "Transaction ids exhausted, reusing the lowest free id",
            &ErrorContext::new("next_id").with_data("id", serde_json::json!(id)),
        );
        id
    }

    /// Give a validated draft a fresh id and add it
    pub fn record(&mut self, draft: TransactionDraft) -> &Transaction {
        let id = self.next_id();
        self.add_transaction(draft.into_transaction(id))
    }

    /// Append a transaction, update the totals and persist.
    ///
    /// The caller validates `tx` first. A transaction whose id is already
    /// taken is stored under a fresh id. Storage failures do not undo the
    /// change; see [`persistence_warning`](Self::persistence_warning).
    pub fn add_transaction(&mut self, mut tx: Transaction) -> &Transaction {
        if self.transaction(tx.id).is_some() {
            let new_id = self.next_id();
            self.logger.log_warning(
                "Transaction id already in use, assigning a new one",
                &ErrorContext::new("add_transaction")
                    .with_data("id", serde_json::json!(tx.id))
                    .with_data("new_id", serde_json::json!(new_id)),
            );
            tx.id = new_id;
        }
        self.ids.observe(tx.id);

        let mut totals = self.state.totals();
        totals.apply(&tx);
        self.state.set_totals(totals);
        log::debug!("Added {} {} ({})", tx.kind, tx.amount, tx.id);
        self.state.transactions.push(tx);

        self.save_to_storage();
        let index = self.state.transactions.len() - 1;
        &self.state.transactions[index]
    }

    /// Remove the first transaction with `id`, reverse its contribution and
    /// persist. Returns `false` and changes nothing when no such transaction
    /// exists.
    pub fn remove_transaction(&mut self, id: TransactionId) -> bool {
        let Some(index) = self.state.transactions.iter().position(|t| t.id == id) else {
            return false;
        };

        let tx = self.state.transactions.remove(index);
        let mut totals = self.state.totals();
        totals.revert(&tx);
        self.state.set_totals(totals);
        log::debug!("Removed {} {} ({})", tx.kind, tx.amount, tx.id);

        self.save_to_storage();
        true
    }

    /// Set every field back to empty/zero. Does not persist.
    pub fn reset(&mut self) {
        self.state = LedgerState::default();
    }

    // ==================== Persistence ====================

    /// Write the four state entries to the store.
    ///
    /// Failures are logged and remembered as a warning; they never reach the
    /// caller, and the in-memory state stays authoritative.
    pub fn save_to_storage(&mut self) {
        let result = self.encode_state().and_then(|items| {
            self.store.set_items(&items).map_err(CoreError::from)
        });

        match result {
            Ok(()) => {
                self.persistence_warning = None;
            }
            Err(e) => {
                self.logger.log_error(
                    &e,
                    &ErrorContext::new("save_to_storage")
                        .with_data("transactions", serde_json::json!(self.state.transactions.len())),
                );
                self.persistence_warning = Some(format!("Changes are not saved yet: {}", e));
            }
        }
    }

    /// Restore state from the store.
    ///
    /// Missing or unparseable numbers read as 0 and a missing list as empty.
    /// Any other failure (unreadable store, malformed or invalid list) resets
    /// the whole ledger instead of applying part of the read.
    pub fn load_from_storage(&mut self) {
        match self.read_state() {
            Ok(state) => {
                for tx in &state.transactions {
                    self.ids.observe(tx.id);
                }
                log::info!(
                    "Restored {} transactions, balance {}",
                    state.transactions.len(),
                    state.balance
                );
                self.state = state;
            }
            Err(e) => {
                self.logger.log_error(&e, &ErrorContext::new("load_from_storage"));
                self.reset();
            }
        }
    }

    fn encode_state(&self) -> CoreResult<Vec<(&'static str, String)>> {
        let transactions = serde_json::to_string(&self.state.transactions).map_err(|e| {
            CoreError::StorageError { message: e.to_string() }
        })?;
        Ok(vec![
            (KEY_BALANCE, self.state.balance.to_string()),
            (KEY_TOTAL_INCOME, self.state.total_income.to_string()),
            (KEY_TOTAL_EXPENSE, self.state.total_expense.to_string()),
            (KEY_TRANSACTIONS, transactions),
        ])
    }

    fn read_state(&self) -> CoreResult<LedgerState> {
        let balance = parse_number(self.store.get_item(KEY_BALANCE)?);
        let total_income = parse_number(self.store.get_item(KEY_TOTAL_INCOME)?);
        let total_expense = parse_number(self.store.get_item(KEY_TOTAL_EXPENSE)?);

        let transactions = match self.store.get_item(KEY_TRANSACTIONS)? {
            None => Vec::new(),
            // "null" decodes to None and is treated like a missing entry
            Some(raw) => serde_json::from_str::<Option<Vec<Transaction>>>(&raw)
                .map_err(|e| CoreError::CorruptData {
                    key: KEY_TRANSACTIONS.to_string(),
                    message: e.to_string(),
                })?
                .unwrap_or_default(),
        };
        self.check_restored(&transactions)?;

        let mut state = LedgerState {
            balance,
            total_income,
            total_expense,
            transactions,
        };

        let stored = state.totals();
        let derived = Totals::from_transactions(&state.transactions);
        let consistent = (stored.total_income - stored.total_expense - stored.balance).abs()
            <= RECONCILE_TOLERANCE;
        if !consistent || !stored.approx_eq(&derived, RECONCILE_TOLERANCE) {
            self.logger.log_warning(
                "Stored totals do not match the transaction list, recomputing",
                &ErrorContext::new("load_from_storage")
                    .with_data("stored", serde_json::json!(stored))
                    .with_data("derived", serde_json::json!(derived)),
            );
            state.set_totals(derived);
        }

        Ok(state)
    }

    fn check_restored(&self, transactions: &[Transaction]) -> CoreResult<()> {
        let corrupt = |message: String| CoreError::CorruptData {
            key: KEY_TRANSACTIONS.to_string(),
            message,
        };

        let mut seen = HashSet::new();
        for tx in transactions {
            if !seen.insert(tx.id) {
                return Err(corrupt(format!("duplicate transaction id {}", tx.id)));
            }
            if !(tx.amount.is_finite() && tx.amount > 0.0) {
                return Err(corrupt(format!("transaction {} has amount {}", tx.id, tx.amount)));
            }
            // the limit applies to new input only; older rows stay
            if tx.amount > self.max_amount {
                self.logger.log_warning(
                    "Stored transaction exceeds the configured maximum amount",
                    &ErrorContext::new("load_from_storage")
                        .with_data("id", serde_json::json!(tx.id))
                        .with_data("amount", serde_json::json!(tx.amount)),
                );
            }
            if tx.description.trim().is_empty() {
                return Err(corrupt(format!("transaction {} has no description", tx.id)));
            }
        }
        Ok(())
    }
}

/// Decimal text to f64; absent, unparseable or non-finite values read as 0
fn parse_number(raw: Option<String>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Trait for ledger operations
pub trait LedgerOperations {
    /// Get ledger summary
    fn summary(&self) -> LedgerSummary;

    /// Get transactions of one type, in insertion order
    fn transactions_by_type(&self, kind: TransactionType) -> Vec<Transaction>;
}

/// Ledger summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub balance: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub total_transactions: usize,
    pub income_count: usize,
    pub expense_count: usize,
}

impl LedgerOperations for Ledger {
    fn summary(&self) -> LedgerSummary {
        let income_count = self.state.transactions.iter().filter(|t| t.is_income()).count();
        LedgerSummary {
            balance: self.state.balance,
            total_income: self.state.total_income,
            total_expense: self.state.total_expense,
            total_transactions: self.state.transactions.len(),
            income_count,
            expense_count: self.state.transactions.len() - income_count,
        }
    }

    fn transactions_by_type(&self, kind: TransactionType) -> Vec<Transaction> {
        self.state
            .transactions
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect()
    }
}

// ==================== Tests ====================
