use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use strum::EnumProperty;

/// Reason a penalty was charged
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumProperty,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PenaltyType {
    #[sea_orm(string_value = "overdue")]
    #[strum(props(label = "Late Return"))]
    Overdue,
    #[sea_orm(string_value = "damage")]
    #[strum(props(label = "Damage"))]
    Damage,
    #[sea_orm(string_value = "lost")]
    #[strum(props(label = "Lost Item"))]
    Lost,
}

impl PenaltyType {
    /// Human readable label shown on receipts and dashboards
    pub fn label(self) -> &'static str {
        self.get_str("label").unwrap_or_default()
    }
}

impl Display for PenaltyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Overdue => write!(f, "overdue"),
            Self::Damage => write!(f, "damage"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

impl FromStr for PenaltyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overdue" | "late" => Ok(Self::Overdue),
            "damage" | "damaged" => Ok(Self::Damage),
            "lost" => Ok(Self::Lost),
            _ => Err(format!("Unknown penalty type: {s}")),
        }
    }
}

/// Payment state of a penalty; `Paid` is final
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PenaltyStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl Display for PenaltyStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

impl FromStr for PenaltyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "unpaid" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("Unknown penalty status: {s}")),
        }
    }
}

/// How badly a component came back, as recorded by an admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageSeverity {
    Minor,
    Major,
    Lost,
}

impl DamageSeverity {
    /// The penalty type a report of this severity is filed under
    pub fn penalty_type(self) -> PenaltyType {
        match self {
            Self::Minor | Self::Major => PenaltyType::Damage,
            Self::Lost => PenaltyType::Lost,
        }
    }
}

impl Display for DamageSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

impl FromStr for DamageSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            "lost" => Ok(Self::Lost),
            _ => Err(format!("Unknown damage severity: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DamageSeverity, PenaltyStatus, PenaltyType};
    use std::str::FromStr;

    #[test]
    fn test_penalty_type_labels() {
        assert_eq!(PenaltyType::Overdue.label(), "Late Return");
        assert_eq!(PenaltyType::Damage.label(), "Damage");
        assert_eq!(PenaltyType::Lost.label(), "Lost Item");
    }

    #[test]
    fn test_severity_maps_to_penalty_type() {
        assert_eq!(DamageSeverity::Minor.penalty_type(), PenaltyType::Damage);
        assert_eq!(DamageSeverity::Major.penalty_type(), PenaltyType::Damage);
        assert_eq!(DamageSeverity::Lost.penalty_type(), PenaltyType::Lost);
    }

    #[test]
    fn test_penalty_status_parsing() {
        assert_eq!(PenaltyStatus::from_str("Paid").unwrap(), PenaltyStatus::Paid);
        assert_eq!(
            PenaltyStatus::from_str("unpaid").unwrap(),
            PenaltyStatus::Pending
        );
        assert!(PenaltyStatus::from_str("waived").is_err());
    }

    #[test]
    fn test_type_and_severity_parsing() {
        assert_eq!(PenaltyType::from_str("Overdue").unwrap(), PenaltyType::Overdue);
        assert_eq!(
            DamageSeverity::from_str(" major ").unwrap(),
            DamageSeverity::Major
        );
        assert!(DamageSeverity::from_str("catastrophic").is_err());
    }
}
