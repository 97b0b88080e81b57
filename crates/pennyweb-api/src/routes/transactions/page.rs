//! Ledger page rendering
//!
//! - page_ledger: Main page with summary, entry form and list
//! - render_ledger: Summary and list fragment swapped in by HTMX

use crate::{page_response, AppState};
use pennyweb_core::{Ledger, Transaction};
use pennyweb_utils::{escape_html, format_currency, format_timestamp, CurrencyFormat};

/// Ledger page
pub async fn page_ledger(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let ledger = state.ledger.read().await;
    let format = state.config.currency.format();

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Ledger</h2></div>
        {}
        <div id='ledger'>{}</div>"#,
        render_form(ledger.max_amount()),
        render_ledger(&ledger, &format, None)
    );

    page_response(&headers, "Ledger", "/", &inner_content)
}

/// Entry form. Posts to `/transactions` and swaps the response into `#ledger`;
/// it clears itself only when the store succeeded.
fn render_form(max_amount: f64) -> String {
    format!(
        r#"<form hx-post='/transactions' hx-target='#ledger' hx-swap='innerHTML'
            hx-on:transaction-saved='this.reset()'
            class='bg-white rounded-xl shadow-sm p-6 mb-6 grid grid-cols-1 md:grid-cols-4 gap-3'>
            <input type='text' name='description' placeholder='Description'
                class='px-3 py-2 border rounded-lg'>
            <input type='number' name='amount' placeholder='Amount' step='0.01' min='0.01' max='{}'
                class='px-3 py-2 border rounded-lg'>
            <select name='type' class='px-3 py-2 border rounded-lg bg-white'>
                <option value='none'>Select type</option>
                <option value='income'>Income</option>
                <option value='expense'>Expense</option>
            </select>
            <button type='submit' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>
                Add Transaction
            </button>
        </form>"#,
        max_amount
    )
}

/// Summary cards and transaction list.
///
/// `error` is a rejected-input message shown above the summary. A pending
/// storage failure on the ledger is shown as a warning banner.
pub fn render_ledger(ledger: &Ledger, format: &CurrencyFormat, error: Option<&str>) -> String {
    let mut html = String::new();

    if let Some(message) = error {
        html.push_str(&format!(
            r#"<div role='alert' class='mb-4 p-3 rounded-lg bg-red-50 border border-red-200 text-red-700'>{}</div>"#,
            escape_html(message)
        ));
    }
    if let Some(warning) = ledger.persistence_warning() {
        html.push_str(&format!(
            r#"<div role='status' class='mb-4 p-3 rounded-lg bg-yellow-50 border border-yellow-200 text-yellow-800'>{}</div>"#,
            escape_html(warning)
        ));
    }

    html.push_str(&format!(
        r#"<div class='grid grid-cols-1 md:grid-cols-3 gap-4 mb-6'>
            <div class='bg-white p-4 rounded-xl shadow-sm'><p class='text-sm text-gray-500'>Balance</p><p id='balance' class='text-2xl font-bold'>{}</p></div>
            <div class='bg-white p-4 rounded-xl shadow-sm'><p class='text-sm text-gray-500'>Income</p><p id='total-income' class='text-2xl font-bold income'>{}</p></div>
            <div class='bg-white p-4 rounded-xl shadow-sm'><p class='text-sm text-gray-500'>Expense</p><p id='total-expense' class='text-2xl font-bold expense'>{}</p></div>
        </div>"#,
        format_currency(ledger.balance(), format),
        format_currency(ledger.total_income(), format),
        format_currency(ledger.total_expense(), format),
    ));

    html.push_str(&render_list(ledger.transactions(), format));
    html
}

fn render_list(transactions: &[Transaction], format: &CurrencyFormat) -> String {
    if transactions.is_empty() {
        return "<div class='bg-white rounded-xl shadow-sm p-6 text-center text-gray-500'>No transactions yet</div>".to_string();
    }

    let mut html = String::from("<ul id='transaction-list' class='bg-white rounded-xl shadow-sm divide-y'>");
    for tx in transactions {
        html.push_str(&format!(
            r#"<li class='{kind} flex items-center justify-between px-4 py-3'>
                <div><p class='font-medium text-gray-900'>{description}</p><p class='text-xs text-gray-400'>{date}</p></div>
                <div class='flex items-center gap-4'>
                    <span class='font-mono'>{amount}</span>
                    <button hx-delete='/transactions/{id}' hx-target='#ledger' hx-swap='innerHTML'
                        class='px-2 py-1 text-sm text-gray-500 border rounded hover:bg-gray-50'>Delete</button>
                </div>
            </li>"#,
            kind = tx.kind,
            description = escape_html(&tx.description),
            date = format_timestamp(tx.id),
            amount = format_currency(tx.signed_amount(), format),
            id = tx.id,
        ));
    }
    html.push_str("</ul>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use pennyweb_config::Config;
    use pennyweb_core::{MemoryStore, TransactionDraft, TransactionType};

    fn ledger() -> Ledger {
        Ledger::new(&Config::default(), Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_render_empty_ledger() {
        let html = render_ledger(&ledger(), &CurrencyFormat::default(), None);
        assert!(html.contains("No transactions yet"));
        assert!(html.contains("<p id='balance' class='text-2xl font-bold'>$0.00</p>"));
    }

    #[test]
    fn test_render_transactions_and_totals() {
        let mut ledger = ledger();
        for (description, amount, kind) in [
            ("Salary", 1000.0, TransactionType::Income),
            ("Rent", 400.0, TransactionType::Expense),
        ] {
            ledger.record(TransactionDraft {
                description: description.to_string(),
                amount,
                kind,
            });
        }

        let html = render_ledger(&ledger, &CurrencyFormat::default(), None);
        assert!(html.contains(">$600.00<"));
        assert!(html.contains(">$1,000.00<"));
        assert!(html.contains(">-$400.00<"));
        assert!(html.contains("<li class='income"));
        assert!(html.contains("<li class='expense"));
        assert!(html.find("Salary").unwrap() < html.find("Rent").unwrap());
    }

    #[test]
    fn test_render_error_message() {
        let html = render_ledger(
            &ledger(),
            &CurrencyFormat::default(),
            Some("Please enter a description"),
        );
        assert!(html.contains("role='alert'"));
        assert!(html.contains("Please enter a description"));
    }

    #[test]
    fn test_render_persistence_warning() {
        let store = MemoryStore::with_quota(8);
        let mut ledger = Ledger::new(&Config::default(), Box::new(store));
        ledger.record(TransactionDraft {
            description: "Salary".to_string(),
            amount: 1000.0,
            kind: TransactionType::Income,
        });

        let html = render_ledger(&ledger, &CurrencyFormat::default(), None);
        assert!(html.contains("role='status'"));
        assert!(html.contains("Changes are not saved yet"));
        assert!(html.contains(">$1,000.00<"));
    }
}
