use crate::penalty::DamageSeverity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inclusive range of amounts an admin may charge for a damage report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: i64,
    pub max: i64,
}

impl AmountRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: i64) -> bool {
        (self.min..=self.max).contains(&amount)
    }
}

/// Reasons a penalty amount could not be derived
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{severity} damage must be charged between {} and {}, got {amount}", .range.min, .range.max)]
    AmountOutOfRange {
        severity: DamageSeverity,
        amount: i64,
        range: AmountRange,
    },

    #[error("component has no replacement cost; an explicit amount is required")]
    MissingReplacementCost,

    #[error("penalty amount must be positive")]
    NonPositiveAmount,
}

/// Rate card used to turn late days and damage reports into money
///
/// Amounts are whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyPolicy {
    /// Charged per item for each whole day past the expected return date
    pub per_day_rate: i64,
    pub minor_damage: AmountRange,
    pub major_damage: AmountRange,
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            per_day_rate: 50,
            minor_damage: AmountRange::new(200, 500),
            major_damage: AmountRange::new(500, 2000),
        }
    }
}

/// Whole days between the expected and actual return, never negative
pub fn days_late(expected_return: NaiveDate, actual_return: NaiveDate) -> i64 {
    (actual_return - expected_return).num_days().max(0)
}

impl PenaltyPolicy {
    /// Amount owed for returning `quantity` items on `actual_return`
    ///
    /// Zero means no penalty should be recorded.
    pub fn overdue_amount(
        &self,
        expected_return: NaiveDate,
        actual_return: NaiveDate,
        quantity: i32,
    ) -> i64 {
        days_late(expected_return, actual_return) * self.per_day_rate * i64::from(quantity.max(0))
    }

    /// Amount owed for a damage report
    ///
    /// Minor and major damage default to the bottom of their range when no
    /// amount is given. Lost items cost the full replacement cost per unit.
    pub fn damage_amount(
        &self,
        severity: DamageSeverity,
        requested: Option<i64>,
        replacement_cost: i64,
        quantity: i32,
    ) -> Result<i64, PolicyError> {
        let amount = match severity {
            DamageSeverity::Minor | DamageSeverity::Major => {
                let range = if severity == DamageSeverity::Minor {
                    self.minor_damage
                } else {
                    self.major_damage
                };

                match requested {
                    Some(amount) if !range.contains(amount) => {
                        return Err(PolicyError::AmountOutOfRange {
                            severity,
                            amount,
                            range,
                        });
                    }
                    Some(amount) => amount,
                    None => range.min,
                }
            }
            DamageSeverity::Lost if replacement_cost > 0 => {
                replacement_cost * i64::from(quantity.max(1))
            }
            DamageSeverity::Lost => requested.ok_or(PolicyError::MissingReplacementCost)?,
        };

        if amount <= 0 {
            return Err(PolicyError::NonPositiveAmount);
        }

        Ok(amount)
    }
}
