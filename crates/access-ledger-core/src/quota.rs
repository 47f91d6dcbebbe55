//! Quota arithmetic: balance deduction, single-access consumption and
//! monthly replenishment.
//!
//! All functions here operate on non-root tokens; callers branch on
//! [`AccessToken::is_root`] first. Timestamps are Unix seconds.

use chrono::{DateTime, Datelike, FixedOffset};

use crate::error::ValidationError;
use crate::token::AccessToken;

/// A deduction the balance cannot cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub available: i64,
    pub required: i64,
}

/// `amount * access_quota`, rejecting overflow.
pub fn total_accesses(amount: i64, access_quota: i64) -> Result<i64, ValidationError> {
    amount
        .checked_mul(access_quota)
        .ok_or(ValidationError::QuotaOverflow {
            amount,
            access_quota,
        })
}

/// Whole units backing `available` accesses: `ceil(available / access_quota)`.
pub fn units_for(available: i64, access_quota: i64) -> i64 {
    if access_quota <= 0 || available <= 0 {
        return 0;
    }
    (available + access_quota - 1) / access_quota
}

/// Whether two timestamps fall in the same (year, month) at `offset`.
pub fn same_calendar_month(a: i64, b: i64, offset: FixedOffset) -> bool {
    match (DateTime::from_timestamp(a, 0), DateTime::from_timestamp(b, 0)) {
        (Some(a), Some(b)) => {
            let a = a.with_timezone(&offset);
            let b = b.with_timezone(&offset);
            a.year() == b.year() && a.month() == b.month()
        }
        // Out-of-range timestamps never trigger a reset.
        _ => true,
    }
}

/// Reset the balance to the monthly quota if the token was last used in an
/// earlier calendar month.
///
/// Returns whether a reset happened. Never-used tokens and tokens without a
/// monthly quota are left alone.
pub fn replenish(token: &mut AccessToken, now: i64, offset: FixedOffset) -> bool {
    if token.is_root() || token.monthly_token_quota <= 0 || token.last_used_at == 0 {
        return false;
    }
    if same_calendar_month(token.last_used_at, now, offset) {
        return false;
    }

    token.amount = token.monthly_token_quota;
    token.available_accesses = token
        .monthly_token_quota
        .saturating_mul(token.access_quota);
    token.last_used_at = now;
    true
}

/// Fails unless the balance holds at least `accesses`.
pub fn ensure_covers(token: &AccessToken, accesses: i64) -> Result<(), Shortfall> {
    if token.available_accesses < accesses {
        return Err(Shortfall {
            available: token.available_accesses,
            required: accesses,
        });
    }
    Ok(())
}

/// Deduct `accesses` from the balance and recompute `amount`.
///
/// Leaves the token untouched on shortfall.
pub fn debit(token: &mut AccessToken, accesses: i64, now: i64) -> Result<(), Shortfall> {
    ensure_covers(token, accesses)?;

    token.available_accesses -= accesses;
    token.amount = units_for(token.available_accesses, token.access_quota);
    token.last_used_at = now;
    Ok(())
}

/// Spend one access. A unit is dropped when its last access is used.
pub fn consume_one(token: &mut AccessToken, now: i64) -> Result<(), Shortfall> {
    if token.available_accesses < 1 {
        return Err(Shortfall {
            available: token.available_accesses,
            required: 1,
        });
    }

    token.available_accesses -= 1;
    if token.access_quota > 0 && token.available_accesses % token.access_quota == 0 {
        token.amount -= 1;
    }
    token.last_used_at = now;
    Ok(())
}
