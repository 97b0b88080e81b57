//! Input validation for new transactions.
//!
//! Validation runs before anything reaches the [`Ledger`](crate::Ledger);
//! callers inspect the `Result` and only record the draft on success.

use thiserror::Error;

use crate::models::TransactionDraft;
use crate::types::TransactionType;

/// Reasons a new transaction is rejected. The messages are shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter a description")]
    EmptyDescription,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Amount cannot exceed {max}")]
    AmountTooLarge { max: f64 },

    #[error("Please select a transaction type")]
    MissingType,
}

/// Check typed input and build a draft. The description is stored as typed;
/// only the emptiness check ignores surrounding whitespace.
pub fn validate_input(
    description: &str,
    amount: f64,
    kind: Option<TransactionType>,
    max_amount: f64,
) -> Result<TransactionDraft, ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }
    if amount > max_amount {
        return Err(ValidationError::AmountTooLarge { max: max_amount });
    }
    let kind = kind.ok_or(ValidationError::MissingType)?;

    Ok(TransactionDraft {
        description: description.to_string(),
        amount,
        kind,
    })
}

/// Check raw form fields and build a draft.
///
/// `kind` accepts "income" or "expense"; an empty value or the form's
/// "none" placeholder counts as missing.
pub fn parse_form_input(
    description: &str,
    amount: &str,
    kind: &str,
    max_amount: f64,
) -> Result<TransactionDraft, ValidationError> {
    let amount = amount.trim().parse::<f64>().unwrap_or(f64::NAN);
    let kind = match kind.trim() {
        "" | "none" => None,
        other => other.parse::<TransactionType>().ok(),
    };
    validate_input(description, amount, kind, max_amount)
}
