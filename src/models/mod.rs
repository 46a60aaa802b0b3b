//! Closed domain vocabularies shared by entities, services, and handlers.
//!
//! Statuses are persisted as SCREAMING_SNAKE strings; parsing is
//! case-insensitive so legacy rows with mixed casing still resolve.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Demand classification label for an inventory item.
///
/// The label is stored as a loosely-typed optional string; anything
/// absent or unrecognized resolves to `Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemandLabel {
    #[default]
    Low,
    Medium,
    High,
}

impl DemandLabel {
    /// Resolve a stored label, falling back to `Low` when absent or unknown.
    pub fn resolve(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

/// Authoritative order state. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    ReorderRequested,
    PriceProposed,
    PriceApproved,
    PriceNegotiating,
    InProduction,
    Delivered,
    Rejected,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Rejected | Self::Completed | Self::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Customer,
    System,
    Supplier,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Per-line-item supplier negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationStatus {
    Pending,
    Approved,
    Negotiating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcStatus {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Delivered,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Sale,
    Refund,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_label_defaults_to_low() {
        assert_eq!(DemandLabel::resolve(None), DemandLabel::Low);
        assert_eq!(DemandLabel::resolve(Some("")), DemandLabel::Low);
        assert_eq!(DemandLabel::resolve(Some("weird")), DemandLabel::Low);
    }

    #[test]
    fn demand_label_resolution_is_case_insensitive() {
        assert_eq!(DemandLabel::resolve(Some("medium")), DemandLabel::Medium);
        assert_eq!(DemandLabel::resolve(Some("HIGH")), DemandLabel::High);
        assert_eq!(DemandLabel::resolve(Some(" low ")), DemandLabel::Low);
    }

    #[test]
    fn order_status_round_trips_through_storage_form() {
        let status = OrderStatus::ReorderRequested;
        assert_eq!(status.to_string(), "REORDER_REQUESTED");
        assert_eq!(
            "REORDER_REQUESTED".parse::<OrderStatus>().unwrap(),
            status
        );
    }

    #[test]
    fn terminal_states_are_flagged() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::PriceNegotiating.is_terminal());
        assert!(!OrderStatus::InProduction.is_terminal());
    }
}
