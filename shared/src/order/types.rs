//! Order line snapshots and plain-data command inputs

use super::{OrderStatus, PaymentMethod};
use serde::{Deserialize, Serialize};

/// One menu item within an order
///
/// `name` and `unit_price` are captured from the catalog at order time and
/// never recomputed from a live catalog afterwards, so historical orders do
/// not drift when prices change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Catalog item this line references
    pub item_id: String,
    /// Item name snapshot for display and receipts
    pub name: String,
    /// Price snapshot captured at order time
    pub unit_price: f64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Kitchen-local progress marker, independent of order status
    #[serde(default)]
    pub is_prepared: bool,
}

/// Requested line in a create/edit command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineInput {
    pub item_id: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LineInput {
    pub fn new(item_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Create-order command payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateOrderInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tag: Option<String>,
    pub lines: Vec<LineInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_amount: Option<f64>,
}

/// Status-change command payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeInput {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    /// When supplied on a paid-like transition, replaces the stored tip and
    /// forces a total recompute; when omitted, the stored tip and total stand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_amount: Option<f64>,
}

impl StatusChangeInput {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            payment_method: None,
            payment_reference: None,
            tip_amount: None,
        }
    }

    pub fn with_payment(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn with_tip(mut self, tip: f64) -> Self {
        self.tip_amount = Some(tip);
        self
    }
}
