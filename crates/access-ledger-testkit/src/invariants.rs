//! Balance invariants every stored token must satisfy.

use access_ledger_core::{units_for, AccessToken};

/// Check a single token. Returns a description of the first violation.
pub fn check_token(token: &AccessToken) -> Result<(), String> {
    if token.available_accesses < 0 {
        return Err(format!(
            "{}: available_accesses is {}",
            token.token_id, token.available_accesses
        ));
    }
    if token.amount < 0 {
        return Err(format!("{}: amount is {}", token.token_id, token.amount));
    }
    if token.is_root() {
        return Ok(());
    }

    let expected = units_for(token.available_accesses, token.access_quota);
    if token.amount != expected {
        return Err(format!(
            "{}: amount {} != ceil({} / {}) = {}",
            token.token_id, token.amount, token.available_accesses, token.access_quota, expected
        ));
    }
    Ok(())
}

/// Check every token, collecting all violations.
pub fn check_all<'a>(tokens: impl IntoIterator<Item = &'a AccessToken>) -> Result<(), Vec<String>> {
    let violations: Vec<String> = tokens
        .into_iter()
        .filter_map(|token| check_token(token).err())
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
