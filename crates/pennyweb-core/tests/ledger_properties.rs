//! Property-based tests for ledger invariants
//!
//! - Balance: balance == income - expense after every mutation
//! - Totals: each total equals the sum of its transactions
//! - No drift: removals leave the same totals a fresh sum would give
//! - Persistence: save then load on a fresh ledger reproduces the state

use pennyweb_config::Config;
use pennyweb_core::{
    parse_form_input, KeyValueStore, Ledger, LedgerState, MemoryStore, Totals, TransactionDraft,
    TransactionType,
};
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-4;

/// Strategy for generating valid amounts (whole cents)
fn amount_strategy() -> impl Strategy<Value = f64> {
    (1u64..1_000_000_00u64).prop_map(|cents| cents as f64 / 100.0)
}

fn kind_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Income), Just(TransactionType::Expense)]
}

fn draft_strategy() -> impl Strategy<Value = TransactionDraft> {
    ("[A-Za-z][A-Za-z ]{0,15}", amount_strategy(), kind_strategy()).prop_map(
        |(description, amount, kind)| TransactionDraft {
            description,
            amount,
            kind,
        },
    )
}

fn new_ledger(store: &MemoryStore) -> Ledger {
    Ledger::new(&Config::default(), Box::new(store.clone()))
}

fn sums(ledger: &Ledger) -> (f64, f64) {
    let income: f64 = ledger
        .transactions()
        .iter()
        .filter(|t| t.kind == TransactionType::Income)
        .map(|t| t.amount)
        .sum();
    let expense: f64 = ledger
        .transactions()
        .iter()
        .filter(|t| t.kind == TransactionType::Expense)
        .map(|t| t.amount)
        .sum();
    (income, expense)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: totals match the transaction list after every add
    #[test]
    fn prop_totals_follow_adds(drafts in prop::collection::vec(draft_strategy(), 1..40)) {
        let store = MemoryStore::new();
        let mut ledger = new_ledger(&store);

        for draft in drafts {
            ledger.record(draft);

            let (income, expense) = sums(&ledger);
            prop_assert!((ledger.balance() - (ledger.total_income() - ledger.total_expense())).abs() < TOLERANCE);
            prop_assert!((ledger.total_income() - income).abs() < TOLERANCE);
            prop_assert!((ledger.total_expense() - expense).abs() < TOLERANCE);
        }
    }

    /// Property: removing transactions does not drift from a fresh sum
    #[test]
    fn prop_removal_has_no_drift(
        drafts in prop::collection::vec(draft_strategy(), 1..30),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..30),
    ) {
        let store = MemoryStore::new();
        let mut ledger = new_ledger(&store);
        for draft in drafts {
            ledger.record(draft);
        }

        for pick in picks {
            if ledger.transactions().is_empty() {
                break;
            }
            let id = ledger.transactions()[pick.index(ledger.transactions().len())].id;
            prop_assert!(ledger.remove_transaction(id));
            prop_assert!(ledger.transaction(id).is_none());

            let derived = Totals::from_transactions(ledger.transactions());
            prop_assert!(ledger.totals().approx_eq(&derived, TOLERANCE));
        }
    }

    /// Property: an unknown id is never removed and changes nothing
    #[test]
    fn prop_remove_unknown_id_is_noop(
        drafts in prop::collection::vec(draft_strategy(), 0..20),
        id in any::<u64>(),
    ) {
        let store = MemoryStore::new();
        let mut ledger = new_ledger(&store);
        for draft in drafts {
            ledger.record(draft);
        }
        prop_assume!(ledger.transaction(id).is_none());

        let before: LedgerState = ledger.state().clone();
        prop_assert!(!ledger.remove_transaction(id));
        prop_assert_eq!(ledger.state(), &before);
    }

    /// Property: save followed by load on a fresh ledger reproduces the state
    #[test]
    fn prop_persistence_round_trip(
        drafts in prop::collection::vec(draft_strategy(), 0..25),
        removals in 0usize..5,
    ) {
        let store = MemoryStore::new();
        let mut ledger = new_ledger(&store);
        for draft in drafts {
            ledger.record(draft);
        }
        for _ in 0..removals {
            if let Some(id) = ledger.transactions().first().map(|t| t.id) {
                ledger.remove_transaction(id);
            }
        }
        ledger.save_to_storage();

        let mut fresh = new_ledger(&store);
        fresh.load_from_storage();
        prop_assert_eq!(fresh.state(), ledger.state());
    }

    /// Property: garbage in the transaction entry loads as the empty state
    #[test]
    fn prop_corrupt_transactions_load_empty(garbage in "\\{[a-z:,]{0,12}", balance in any::<f64>()) {
        let mut store = MemoryStore::new();
        store.set_item("balance", &balance.to_string()).unwrap();
        store.set_item("transactions", &garbage).unwrap();

        let mut ledger = new_ledger(&store);
        ledger.load_from_storage();
        prop_assert_eq!(ledger.state(), &LedgerState::default());
    }

    /// Property: amounts over the limit never get past validation
    #[test]
    fn prop_over_limit_rejected(extra in 0.01f64..1e12) {
        let max = Config::default().ledger.max_amount;
        let amount = format!("{}", max + extra);
        prop_assert!(parse_form_input("Too much", &amount, "income", max).is_err());
    }
}
