use sea_orm::{Iterable, entity::prelude::*};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Largest quantity a student may request in a single booking
pub const MAX_BOOKING_QUANTITY: i32 = 5;

/// Lifecycle state of a booking
///
/// ```text
/// Requested -> Approved | Rejected | Cancelled
/// Approved  -> Returned | Overdue
/// Overdue   -> Returned
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[sea_orm(string_value = "requested")]
    Requested,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Approved)
                | (Self::Requested, Self::Rejected)
                | (Self::Requested, Self::Cancelled)
                | (Self::Approved, Self::Returned)
                | (Self::Approved, Self::Overdue)
                | (Self::Overdue, Self::Returned)
        )
    }

    /// States from which `next` may be entered
    pub fn sources_of(next: Self) -> Vec<Self> {
        Self::iter().filter(|s| s.can_transition_to(next)).collect()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Returned | Self::Cancelled)
    }

    /// Whether a booking in this state currently holds reserved stock
    pub fn holds_stock(self) -> bool {
        matches!(self, Self::Approved | Self::Overdue)
    }

    /// Whether the booking still needs attention from the lab (not yet closed)
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requested" | "pending" => Ok(Self::Requested),
            "approved" | "active" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned" | "completed" => Ok(Self::Returned),
            "overdue" => Ok(Self::Overdue),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown booking status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BookingStatus;
    use sea_orm::Iterable;
    use std::str::FromStr;

    #[test]
    fn test_allowed_transitions() {
        assert!(BookingStatus::Requested.can_transition_to(BookingStatus::Approved));
        assert!(BookingStatus::Requested.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Approved.can_transition_to(BookingStatus::Overdue));
        assert!(BookingStatus::Overdue.can_transition_to(BookingStatus::Returned));

        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Approved));
        assert!(!BookingStatus::Requested.can_transition_to(BookingStatus::Returned));
        assert!(!BookingStatus::Overdue.can_transition_to(BookingStatus::Approved));
        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in BookingStatus::iter().filter(|s| s.is_terminal()) {
            for to in BookingStatus::iter() {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_sources_of_returned() {
        let sources = BookingStatus::sources_of(BookingStatus::Returned);
        assert_eq!(
            sources,
            vec![BookingStatus::Approved, BookingStatus::Overdue]
        );
    }

    #[test]
    fn test_status_round_trip() {
        for status in BookingStatus::iter() {
            let parsed = BookingStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!(
            BookingStatus::from_str("Pending").unwrap(),
            BookingStatus::Requested
        );
        assert_eq!(
            BookingStatus::from_str("completed").unwrap(),
            BookingStatus::Returned
        );
        assert!(BookingStatus::from_str("lost").is_err());
    }
}
