//! Issuance argument validation.
//!
//! These checks run before any ledger read, so a malformed request never
//! touches storage.

use crate::error::ValidationError;
use crate::quota::total_accesses;
use crate::types::TokenId;

/// Validate the token id of a new record.
pub fn validate_token_id(token_id: &TokenId) -> Result<(), ValidationError> {
    if token_id.is_empty() {
        return Err(ValidationError::EmptyTokenId);
    }
    Ok(())
}

/// Validate an optional expiry date against `now`. Zero means no expiry.
pub fn validate_expiry(expiry_date: i64, now: i64) -> Result<(), ValidationError> {
    if expiry_date < 0 {
        return Err(ValidationError::NegativeExpiry(expiry_date));
    }
    if expiry_date != 0 && expiry_date < now {
        return Err(ValidationError::ExpiryInPast {
            expiry: expiry_date,
            now,
        });
    }
    Ok(())
}

/// Validate the arguments of a transferable issuance.
pub fn validate_transferable_issue(
    token_id: &TokenId,
    amount: i64,
    monthly_token_quota: i64,
    expiry_date: i64,
    now: i64,
) -> Result<(), ValidationError> {
    validate_token_id(token_id)?;

    if amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if monthly_token_quota < 0 {
        return Err(ValidationError::NegativeMonthlyQuota(monthly_token_quota));
    }

    validate_expiry(expiry_date, now)
}

/// Validate the arguments of a standard issuance.
///
/// Returns the total number of accesses the new token will carry.
pub fn validate_standard_issue(
    token_id: &TokenId,
    amount: i64,
    access_quota: i64,
    expiry_date: i64,
    now: i64,
) -> Result<i64, ValidationError> {
    validate_token_id(token_id)?;

    if amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if access_quota <= 0 {
        return Err(ValidationError::NonPositiveAccessQuota(access_quota));
    }

    validate_expiry(expiry_date, now)?;
    total_accesses(amount, access_quota)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn id() -> TokenId {
        TokenId::new("tok")
    }

    #[test]
    fn test_expiry_rules() {
        assert!(validate_expiry(0, NOW).is_ok());
        assert!(validate_expiry(NOW, NOW).is_ok());
        assert_eq!(
            validate_expiry(NOW - 1, NOW),
            Err(ValidationError::ExpiryInPast {
                expiry: NOW - 1,
                now: NOW
            })
        );
        assert_eq!(
            validate_expiry(-5, NOW),
            Err(ValidationError::NegativeExpiry(-5))
        );
    }

    #[test]
    fn test_transferable_rules() {
        assert!(validate_transferable_issue(&id(), 1, 0, 0, NOW).is_ok());
        assert_eq!(
            validate_transferable_issue(&id(), 0, 0, 0, NOW),
            Err(ValidationError::NonPositiveAmount(0))
        );
        assert_eq!(
            validate_transferable_issue(&id(), 5, -1, 0, NOW),
            Err(ValidationError::NegativeMonthlyQuota(-1))
        );
        assert_eq!(
            validate_transferable_issue(&TokenId::new(""), 5, 0, 0, NOW),
            Err(ValidationError::EmptyTokenId)
        );
    }

    #[test]
    fn test_standard_rules() {
        assert_eq!(validate_standard_issue(&id(), 3, 2, 0, NOW), Ok(6));
        assert_eq!(
            validate_standard_issue(&id(), 3, 0, 0, NOW),
            Err(ValidationError::NonPositiveAccessQuota(0))
        );
        assert_eq!(
            validate_standard_issue(&id(), -3, 2, 0, NOW),
            Err(ValidationError::NonPositiveAmount(-3))
        );
        assert!(matches!(
            validate_standard_issue(&id(), i64::MAX, 3, 0, NOW),
            Err(ValidationError::QuotaOverflow { .. })
        ));
    }
}
