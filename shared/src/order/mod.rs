//! Order aggregate state shared between the core and its collaborators

pub mod types;

pub use types::{CreateOrderInput, LineInput, OrderLine, StatusChangeInput};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
///
/// The legal path is `Pending → Preparing → Ready → Served` followed by one
/// of the terminal payment states. `Cancelled` is reachable from any
/// non-terminal status. Terminal orders accept no further direct transitions;
/// a room bill may still force its members to `Paid`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
    Paid,
    ChargedToRoom,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, for exhaustive transition checks
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Paid,
        OrderStatus::ChargedToRoom,
        OrderStatus::Cancelled,
    ];

    /// Terminal statuses accept no further direct transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::ChargedToRoom | OrderStatus::Cancelled
        )
    }

    /// Paid-like statuses settle the order (payment fields become relevant)
    pub fn is_paid_like(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::ChargedToRoom)
    }

    /// Whether `self → next` is a legal direct transition
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Served)
                | (Served, Paid)
                | (Served, ChargedToRoom)
        ) || (!self.is_terminal() && next == Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Served => "SERVED",
            OrderStatus::Paid => "PAID",
            OrderStatus::ChargedToRoom => "CHARGED_TO_ROOM",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Payment method, recorded on entry into a paid-like status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "CASH"),
            PaymentMethod::Card => write!(f, "CARD"),
            PaymentMethod::Transfer => write!(f, "TRANSFER"),
        }
    }
}

/// One customer/room's tab
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Opaque unique ID, assigned at creation
    pub id: String,
    /// Room number identifier (at least one of room_number/client_tag is set)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<i32>,
    /// Free-text client tag identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tag: Option<String>,
    pub status: OrderStatus,
    /// Lines in display order
    pub lines: Vec<OrderLine>,
    pub tip_amount: f64,
    /// Always `sum(line.unit_price * line.quantity) + tip_amount`
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    /// Staff member who created the order (immutable)
    pub created_by: String,
    /// Creation timestamp, Unix milliseconds (immutable)
    pub created_at: i64,
    /// Set once, on first entry into a paid-like status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    pub updated_at: i64,
}

impl Order {
    /// Projection used by fanout payloads that do not need the line detail
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id.clone(),
            room_number: self.room_number,
            client_tag: self.client_tag.clone(),
            status: self.status,
            total_amount: self.total_amount,
            paid_at: self.paid_at,
        }
    }

    /// Whether both identifier fields match (used by the duplicate guard)
    pub fn identifier_matches(&self, room_number: Option<i32>, client_tag: Option<&str>) -> bool {
        self.room_number == room_number && self.client_tag.as_deref() == client_tag
    }
}

/// Compact order view for recipients that do not recompute lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tag: Option<String>,
    pub status: OrderStatus,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
}
