//! Definition of the agent-facing session protocol messages.
//!
//! This module is a structured definition of the WebSocket protocol: both
//! messages received from an agent and messages sent from the server are
//! defined here. The `derive(Deserialize)`/`derive(Serialize)` annotations
//! generate the ability to serialize these structures to JSON using the
//! `serde` crate. More docs for serde can be found at <https://serde.rs>.
use serde_derive::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use broker_common::notification::PendingDelivery;

/// Message types for session protocol messages.
///
/// This enum should be used instead of string literals when referring to
/// message types. String serialization is handled automatically via the
/// strum traits.
///
/// Example:
/// ```
/// use broker_protocol::MessageType;
///
/// let message_type = MessageType::Hello;
/// let message_str = message_type.as_str();  // Returns "hello"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    Hello,
    Register,
    Unregister,
    Ack,
    Notification,
}

impl MessageType {
    /// Converts the enum to its string representation
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Returns the expected message type string for error messages
    pub fn expected_msg(&self) -> String {
        format!(r#"Expected messageType="{}""#, self.as_str())
    }
}

/// Used by the Delivery Engine to tell a session either to deliver a
/// notification, or that the agent it was attached to should be
/// disconnected (e.g. reaped).
#[derive(Debug, Clone)]
pub enum ServerNotification {
    Notification(PendingDelivery),
    Disconnect,
}

/// `(ip, port)` an agent offers as its wake-up rendezvous.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WakeupHostPort {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "messageType", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello {
        uaid: Option<String>,
        #[serde(rename = "channelIDs", skip_serializing_if = "Option::is_none")]
        channel_ids: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        wakeup_hostport: Option<WakeupHostPort>,
    },

    Register {
        #[serde(rename = "channelID")]
        channel_id: Option<String>,
    },

    Unregister {
        #[serde(rename = "channelID")]
        channel_id: Option<String>,
    },

    Ack {
        updates: Vec<ClientAck>,
    },
}

impl ClientMessage {
    /// Get the message type of this message
    pub fn message_type(&self) -> MessageType {
        match self {
            ClientMessage::Hello { .. } => MessageType::Hello,
            ClientMessage::Register { .. } => MessageType::Register,
            ClientMessage::Unregister { .. } => MessageType::Unregister,
            ClientMessage::Ack { .. } => MessageType::Ack,
        }
    }
}

/// One update reported by an agent in the `updates` list of an `ack`
/// message. This is the payload for the `messageType:ack` packet.
#[derive(Debug, Deserialize)]
pub struct ClientAck {
    /// The channel_id which received a notification
    #[serde(rename = "channelID")]
    pub channel_id: String,
    /// The corresponding version number for the message.
    pub version: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "messageType", rename_all = "snake_case")]
pub enum ServerMessage {
    Hello {
        uaid: String,
        status: u32,
    },

    Register {
        #[serde(rename = "channelID")]
        channel_id: String,
        status: u32,
        #[serde(rename = "pushEndpoint")]
        push_endpoint: String,
    },

    Unregister {
        #[serde(rename = "channelID")]
        channel_id: String,
        status: u32,
    },

    Notification {
        updates: Vec<NotificationUpdate>,
    },
}

/// One `{uaid, channelID, version}` entry of an outbound notification
/// message; the current design emits exactly one update per message.
#[derive(Debug, Serialize, Clone)]
pub struct NotificationUpdate {
    pub uaid: String,
    #[serde(rename = "channelID")]
    pub channel_id: String,
    pub version: u64,
}

impl From<PendingDelivery> for NotificationUpdate {
    fn from(pending: PendingDelivery) -> Self {
        Self {
            uaid: pending.uaid,
            channel_id: pending.channel_id,
            version: pending.version,
        }
    }
}

impl ServerMessage {
    /// Get the message type of this message
    pub fn message_type(&self) -> MessageType {
        match self {
            ServerMessage::Hello { .. } => MessageType::Hello,
            ServerMessage::Register { .. } => MessageType::Register,
            ServerMessage::Unregister { .. } => MessageType::Unregister,
            ServerMessage::Notification { .. } => MessageType::Notification,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::error::Error> {
        serde_json::to_string(self)
    }
}
