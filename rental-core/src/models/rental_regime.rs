use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calculations::TaxCalculationError;

/// How rental income is declared.
///
/// The two regimes are mutually exclusive: micro-foncier replaces every
/// itemised charge with a flat deduction, réel deducts actual charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalRegime {
    #[serde(alias = "flat", alias = "micro-foncier")]
    MicroFoncier,
    #[serde(alias = "itemized", alias = "réel")]
    Reel,
}

impl RentalRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MicroFoncier => "micro_foncier",
            Self::Reel => "reel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "micro_foncier" | "micro-foncier" | "flat" => Some(Self::MicroFoncier),
            "reel" | "réel" | "itemized" => Some(Self::Reel),
            _ => None,
        }
    }
}

impl FromStr for RentalRegime {
    type Err = TaxCalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TaxCalculationError::InvalidRegime(s.to_string()))
    }
}

impl fmt::Display for RentalRegime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
