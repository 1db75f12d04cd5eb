use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// One of the quantity buckets a component's total stock is split into
///
/// `OnLoan` is never stored; it is whatever remains of the total once the
/// other three buckets are subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBucket {
    Available,
    OnLoan,
    Damaged,
    UnderMaintenance,
}

impl Display for StockBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Available => write!(f, "available"),
            Self::OnLoan => write!(f, "on loan"),
            Self::Damaged => write!(f, "damaged"),
            Self::UnderMaintenance => write!(f, "under maintenance"),
        }
    }
}

impl FromStr for StockBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "available" => Ok(Self::Available),
            "on_loan" => Ok(Self::OnLoan),
            "damaged" => Ok(Self::Damaged),
            "under_maintenance" | "maintenance" => Ok(Self::UnderMaintenance),
            _ => Err(format!("Unknown stock bucket: {s}")),
        }
    }
}
