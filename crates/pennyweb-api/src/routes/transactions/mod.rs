//! Transactions routes - Ledger page, entry form and transaction list

pub mod api;
pub mod page;

pub use api::{
    api_transaction_create, api_transaction_delete, api_transaction_detail, api_transactions,
    htmx_ledger, htmx_transaction_delete, htmx_transaction_store,
};
pub use page::{page_ledger, render_ledger};
