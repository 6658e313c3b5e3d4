use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a subscription request.
///
/// `Pending` is the initial state. `Approved` and `Rejected` are reachable
/// only from `Pending` (re-approval of an `Approved` record is permitted as
/// an update). `Blocked` is reachable only from `Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Approved,
    Rejected,
    Blocked,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Approved => "approved",
            SubscriptionStatus::Rejected => "rejected",
            SubscriptionStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(SubscriptionStatus::Pending),
            "approved" => Ok(SubscriptionStatus::Approved),
            "rejected" => Ok(SubscriptionStatus::Rejected),
            "blocked" => Ok(SubscriptionStatus::Blocked),
            other => Err(format!("{} is not a valid subscription status", other)),
        }
    }
}
