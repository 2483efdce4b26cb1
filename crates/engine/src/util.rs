//! Internal helpers for input validation.
//!
//! These utilities are **not** part of the public API. They run before any
//! query so invalid input never reaches the store.

use crate::{EngineError, MoneyCents, ResultEngine};

/// Trim a required display name, rejecting blank input.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an email and check its rough shape (`local@domain`).
///
/// Case is preserved: emails are compared as stored.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        })
        && !trimmed.chars().any(char::is_whitespace);
    if !valid {
        return Err(EngineError::InvalidEmail(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_password(value: &str) -> ResultEngine<()> {
    if value.is_empty() {
        return Err(EngineError::InvalidName(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn require_non_zero(amount: MoneyCents) -> ResultEngine<()> {
    if amount.is_zero() {
        return Err(EngineError::InvalidAmount(
            "amount_minor must not be 0".to_string(),
        ));
    }
    Ok(())
}
