//! Route modules for the API server
//!
//! - transactions: Ledger page, entry form, transaction list
//! - settings: Settings page
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints
//! - page.rs: HTMX page rendering

pub mod settings;
pub mod transactions;
