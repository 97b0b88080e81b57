//! Settings page rendering - Full page endpoints

use crate::{page_response, AppState};
use pennyweb_config::SymbolPosition;
use pennyweb_utils::{escape_html, format_currency};

pub async fn page_settings(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let config = &state.config;
    let format = config.currency.format();

    let quota = match config.storage.quota_bytes {
        Some(bytes) => format!("{} bytes", bytes),
        None => "Unlimited".to_string(),
    };
    let position = match config.currency.symbol_position {
        SymbolPosition::Before => "Before amount",
        SymbolPosition::After => "After amount",
    };

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Settings</h2></div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Server</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>Host</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Port</p><p class='font-medium'>{}</p></div>
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Storage</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>Backend</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Path</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Quota</p><p class='font-medium'>{}</p></div>
            </div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Ledger</h3>
            <div><p class='text-sm text-gray-500'>Largest amount</p><p class='font-medium'>{}</p></div>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <h3 class='text-lg font-semibold mb-4'>Currency</h3>
            <div class='grid grid-cols-2 gap-4 mb-4'>
                <div><p class='text-sm text-gray-500'>Symbol</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Symbol position</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Decimal places</p><p class='font-medium'>{}</p></div>
            </div>
        </div>"#,
        escape_html(&config.server.host),
        config.server.port,
        config.storage.backend,
        escape_html(&config.storage_path().display().to_string()),
        quota,
        format_currency(config.ledger.max_amount, &format),
        escape_html(&config.currency.symbol),
        position,
        config.currency.decimal_places,
    );

    page_response(&headers, "Settings", "/settings", &inner_content)
}
