//! Shared types for the comanda order core
//!
//! Domain types used by the core engine and by transport collaborators:
//! orders and their status machine, room bills, fanout topics and payloads,
//! and the plain-data command inputs.

pub mod bill;
pub mod message;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use bill::{BillStatus, RoomBill};
pub use message::{FanoutMessage, FanoutPayload, Topic};
pub use order::{Order, OrderLine, OrderStatus, OrderSummary, PaymentMethod};
pub use order::types::{CreateOrderInput, LineInput, StatusChangeInput};
