//! Fanout topics and the messages published to them

pub mod payload;

pub use payload::FanoutPayload;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscriber group a payload is routed to
///
/// The four staff roles are fixed; the routing table in the fanout engine
/// decides which of them see each event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Kitchen,
    ServiceStaff,
    FrontDesk,
    Management,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Kitchen => "kitchen",
            Topic::ServiceStaff => "service-staff",
            Topic::FrontDesk => "front-desk",
            Topic::Management => "management",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One routed message: a payload addressed to a topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FanoutMessage {
    pub topic: Topic,
    pub payload: FanoutPayload,
}
