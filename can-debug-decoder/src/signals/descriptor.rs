//! Message and signal descriptors
//!
//! Static, read-only description of a message class. Descriptors are built once
//! at catalog load time and shared across every decode. They are not validated
//! on construction; a signal that does not fit its message surfaces as a
//! `BitRange` error when a frame is decoded against it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A complete CAN message descriptor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageDescriptor {
    /// Display name
    pub name: String,
    /// Node that transmits the message
    pub sender_node: String,
    /// CAN message ID
    pub id: u32,
    /// Expected payload size in bytes
    pub length: u8,
    /// Free-text description (may be empty)
    pub description: String,
    /// Scheduling policy of the message
    pub send_type: SendType,
    /// Period of cyclic transmission
    pub cycle_time: Duration,
    /// Minimum delay between transmissions
    pub delay_time: Duration,
    /// Signals in rendering order
    pub signals: Vec<SignalLayout>,
}

/// One named bit field within a message
#[derive(Debug, Clone, PartialEq)]
pub struct SignalLayout {
    /// Signal name
    pub name: String,
    /// Start bit, counted LSB-first from byte 0
    pub start_bit: u16,
    /// Length in bits (1-64)
    pub bit_length: u16,
    /// Scale factor applied to the raw value
    pub scale: f64,
    /// Offset added after scaling
    pub offset: f64,
    /// Labels for raw values; the first entry matching a raw value wins
    pub value_descriptions: Vec<ValueDescription>,
    /// Nodes that consume the signal (informational)
    pub receiver_nodes: Vec<String>,
}

impl SignalLayout {
    /// Create an unscaled signal layout
    pub fn new(name: impl Into<String>, start_bit: u16, bit_length: u16) -> Self {
        Self {
            name: name.into(),
            start_bit,
            bit_length,
            scale: 1.0,
            offset: 0.0,
            value_descriptions: Vec::new(),
            receiver_nodes: Vec::new(),
        }
    }

    /// Builder method: set scale and offset
    pub fn with_scaling(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Builder method: append a value description
    pub fn with_value(mut self, value: u64, description: impl Into<String>) -> Self {
        self.value_descriptions.push(ValueDescription {
            value,
            description: description.into(),
        });
        self
    }

    /// Builder method: set receiver nodes
    pub fn with_receivers<I, S>(mut self, receivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.receiver_nodes = receivers.into_iter().map(Into::into).collect();
        self
    }

    /// True when the physical value is exactly the raw value
    pub fn is_unscaled(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }

    /// Label for a raw value, if one is described
    pub fn label_for(&self, raw: u64) -> Option<&str> {
        self.value_descriptions
            .iter()
            .find(|entry| entry.value == raw)
            .map(|entry| entry.description.as_str())
    }
}

/// Raw value to label mapping entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDescription {
    pub value: u64,
    pub description: String,
}

/// How the message is scheduled on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendType {
    Cyclic,
    OnChange,
    OnWrite,
    #[default]
    Other,
}

impl fmt::Display for SendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendType::Cyclic => write!(f, "Cyclic"),
            SendType::OnChange => write!(f, "OnChange"),
            SendType::OnWrite => write!(f, "OnWrite"),
            SendType::Other => write!(f, "Other"),
        }
    }
}
