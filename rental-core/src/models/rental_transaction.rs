use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Rent,
    DeductibleCharge,
    OtherCharge,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::DeductibleCharge => "deductible_charge",
            Self::OtherCharge => "other_charge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rent" => Some(Self::Rent),
            "deductible_charge" => Some(Self::DeductibleCharge),
            "other_charge" => Some(Self::OtherCharge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalTransaction {
    pub id: i64,
    pub user_id: String,
    pub property_id: Option<i64>,
    pub transaction_date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl RentalTransaction {
    pub fn fiscal_year(&self) -> i32 {
        self.transaction_date.year()
    }
}

/// For recording new transactions (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRentalTransaction {
    pub user_id: String,
    pub property_id: Option<i64>,
    pub transaction_date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub label: String,
}

/// Yearly rent and deductible-charge totals recorded for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalTotals {
    pub gross_rent: Decimal,
    pub deductible_charges: Decimal,
}
