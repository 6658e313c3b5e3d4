//! Access-control policy: subscription gating, daily quotas, and the
//! login throttle state machine.
//!
//! Everything here is pure; persistence and atomicity live in the repos.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{ResourceCategory, SubscriptionStatus};
use crate::repo::{LoginAttemptRecord, Subscriber};

/// Daily fetch ceiling for training documents
pub const TRAINING_DAILY_LIMIT: i32 = 5;
/// Daily fetch ceiling for videos
pub const VIDEO_DAILY_LIMIT: i32 = 1;

/// Consecutive failed logins before a cooldown is imposed
pub const MAX_LOGIN_ATTEMPTS: i32 = 3;
/// Length of the login cooldown window
pub const LOGIN_COOLDOWN_SECONDS: i64 = 60;

/// Session token lifetime for subscribers
pub const SUBSCRIBER_TOKEN_TTL_DAYS: i64 = 7;
/// Session token lifetime for the coach
pub const COACH_TOKEN_TTL_HOURS: i64 = 24;

/// The per-category daily quota. Policy constants, not user-configurable.
pub fn daily_limit(category: ResourceCategory) -> i32 {
    match category {
        ResourceCategory::Training => TRAINING_DAILY_LIMIT,
        ResourceCategory::Video => VIDEO_DAILY_LIMIT,
    }
}

/// Why the gate refused a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    /// The request was never approved (pending or rejected)
    NotApproved(SubscriptionStatus),
    /// The account was blocked by the coach; denies unconditionally,
    /// regardless of any remaining access window
    Blocked,
    /// The approved access window has elapsed
    Expired,
}

impl AccessDenial {
    pub fn reason(self) -> &'static str {
        match self {
            AccessDenial::NotApproved(_) => "subscription_not_approved",
            AccessDenial::Blocked => "account_blocked",
            AccessDenial::Expired => "subscription_expired",
        }
    }
}

impl From<AccessDenial> for crate::error::ApiError {
    fn from(denial: AccessDenial) -> Self {
        match denial {
            AccessDenial::NotApproved(status) => {
                Self::Forbidden(format!("Subscription is {}", status))
            }
            AccessDenial::Blocked => Self::Forbidden("Account is blocked".into()),
            AccessDenial::Expired => Self::Forbidden("Subscription has expired".into()),
        }
    }
}

/// Gate check: a subscriber may touch resources only while approved and
/// inside the access window. Deny takes effect exactly at the expiry
/// instant.
pub fn check_subscription_active(
    subscriber: &Subscriber,
    now: DateTime<Utc>,
) -> Result<(), AccessDenial> {
    match subscriber.status {
        SubscriptionStatus::Blocked => Err(AccessDenial::Blocked),
        SubscriptionStatus::Pending | SubscriptionStatus::Rejected => {
            Err(AccessDenial::NotApproved(subscriber.status))
        }
        SubscriptionStatus::Approved => match subscriber.access_expires_at {
            Some(expires_at) if expires_at > now => Ok(()),
            _ => Err(AccessDenial::Expired),
        },
    }
}

/// Seconds left on an active cooldown, `None` when attempts are allowed.
///
/// Rounded up so the caller never reports zero for a still-active window.
pub fn cooldown_remaining(record: &LoginAttemptRecord, now: DateTime<Utc>) -> Option<i64> {
    let blocked_until = record.blocked_until?;
    let millis = (blocked_until - now).num_milliseconds();
    if millis <= 0 {
        None
    } else {
        Some((millis + 999) / 1000)
    }
}

/// Register a failed login attempt.
///
/// Hitting the threshold arms a cooldown and resets the counter, so the
/// stored count never exceeds the threshold.
pub fn throttle_failure(record: LoginAttemptRecord, now: DateTime<Utc>) -> LoginAttemptRecord {
    let attempts = record.attempt_count + 1;
    if attempts >= MAX_LOGIN_ATTEMPTS {
        LoginAttemptRecord {
            attempt_count: 0,
            last_attempt_at: now,
            blocked_until: Some(now + Duration::seconds(LOGIN_COOLDOWN_SECONDS)),
            ..record
        }
    } else {
        LoginAttemptRecord {
            attempt_count: attempts,
            last_attempt_at: now,
            ..record
        }
    }
}

/// Register a successful login: counter and cooldown clear unconditionally.
pub fn throttle_success(record: LoginAttemptRecord, now: DateTime<Utc>) -> LoginAttemptRecord {
    LoginAttemptRecord {
        attempt_count: 0,
        last_attempt_at: now,
        blocked_until: None,
        ..record
    }
}
