//! Billing cycle value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

/// How often a subscription renews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

impl BillingCycle {
    /// Computes the end of a period anchored at `anchor`.
    ///
    /// Uses calendar arithmetic, not fixed day counts: a monthly period
    /// anchored on Jan 31 ends on the last day of February, and an annual
    /// period anchored on a leap day ends on Feb 28 of the following year.
    pub fn period_end_from(&self, anchor: Timestamp) -> Timestamp {
        match self {
            Self::Monthly => anchor.add_months(1),
            Self::Annual => anchor.add_years(1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "annual" => Ok(Self::Annual),
            other => Err(ValidationError::UnknownBillingCycle {
                value: other.to_string(),
            }),
        }
    }
}
