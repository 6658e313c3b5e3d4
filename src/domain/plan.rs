use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of coaching plans an applicant can request.
///
/// Prices are captured as a snapshot on the subscription record at
/// submission time, so later price changes never mutate existing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "plan_tier", rename_all = "snake_case")]
pub enum PlanTier {
    Monthly,
    Quarterly,
    Yearly,
}

impl PlanTier {
    /// The current price of the tier, in the smallest currency unit
    pub fn price_cents(self) -> i64 {
        match self {
            PlanTier::Monthly => 25_000,
            PlanTier::Quarterly => 65_000,
            PlanTier::Yearly => 220_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Monthly => "monthly",
            PlanTier::Quarterly => "quarterly",
            PlanTier::Yearly => "yearly",
        }
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "monthly" => Ok(PlanTier::Monthly),
            "quarterly" => Ok(PlanTier::Quarterly),
            "yearly" => Ok(PlanTier::Yearly),
            other => Err(format!("{} is not a valid plan tier", other)),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
