//! Room bill - payable aggregate spanning multiple orders of one room

use crate::order::PaymentMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Room bill status, a small one-directional state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    #[default]
    Draft,
    Confirmed,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub const ALL: [BillStatus; 4] = [
        BillStatus::Draft,
        BillStatus::Confirmed,
        BillStatus::Paid,
        BillStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, BillStatus::Paid | BillStatus::Cancelled)
    }

    /// Draft → Confirmed → Paid, or → Cancelled from draft/confirmed
    pub fn can_transition_to(self, next: BillStatus) -> bool {
        use BillStatus::*;
        matches!(
            (self, next),
            (Draft, Confirmed) | (Confirmed, Paid) | (Draft, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BillStatus::Draft => "DRAFT",
            BillStatus::Confirmed => "CONFIRMED",
            BillStatus::Paid => "PAID",
            BillStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Consolidation of multiple unpaid orders sharing a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomBill {
    pub id: String,
    pub room_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    /// Member order ids; every member shares `room_number`
    pub order_ids: Vec<String>,
    pub status: BillStatus,
    pub tip_amount: f64,
    /// `sum(member order totals) + tip_amount`, computed at creation
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    pub updated_at: i64,
}
