//! Utility functions and helpers

use chrono::{DateTime, Local, Utc};

/// Display settings for money amounts
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub decimal_places: usize,
    pub thousands_separator: String,
    pub decimal_separator: String,
    /// Put the symbol before the number ("$1.00") or after it ("1.00 $")
    pub symbol_before: bool,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            decimal_places: 2,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
            symbol_before: true,
        }
    }
}

/// Format a digit string with thousands separators
pub fn format_number(digits: &str, separator: &str) -> String {
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format an amount with fixed decimals, e.g. `-1234.5` -> `-1,234.50`
pub fn format_amount(amount: f64, format: &CurrencyFormat) -> String {
    let fixed = format!("{:.*}", format.decimal_places, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    // -0.001 rounds to "0.00" and should not carry a sign
    if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&format_number(int_part, &format.thousands_separator));
    if let Some(frac) = frac_part {
        out.push_str(&format.decimal_separator);
        out.push_str(frac);
    }
    out
}

/// Format an amount with the currency symbol, e.g. `-400` -> `-$400.00`
pub fn format_currency(amount: f64, format: &CurrencyFormat) -> String {
    let number = format_amount(amount, format);
    if !format.symbol_before {
        return format!("{} {}", number, format.symbol);
    }
    match number.strip_prefix('-') {
        Some(unsigned) => format!("-{}{}", format.symbol, unsigned),
        None => format!("{}{}", format.symbol, number),
    }
}

/// Escape text for safe inclusion in HTML content and attribute values
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Current wall clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Render a millisecond timestamp in local time ("2024-05-01 14:03")
pub fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Timestamp-based id source that never hands out the same id twice.
///
/// Ids follow the wall clock while it moves forward; two requests inside the
/// same millisecond (or a clock that steps backwards) get `last + 1`. Once
/// `u64::MAX` has been issued or observed the generator is exhausted and
/// returns `None`.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id using the system clock
    pub fn next_id(&mut self) -> Option<u64> {
        self.next_id_at(now_millis())
    }

    /// Allocate the next id given the current time in milliseconds
    pub fn next_id_at(&mut self, now: u64) -> Option<u64> {
        let id = now.max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }

    /// Make sure future ids are greater than an id issued elsewhere
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    pub fn last_issued(&self) -> u64 {
        self.last
    }
}
