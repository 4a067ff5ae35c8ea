//! Core types for the CAN debug decoder library
//!
//! This module defines the frame type consumed by the decoder, the decoded
//! output types, and the error type shared by every decode and render
//! operation. Nothing here holds mutable shared state.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// A single classic CAN frame observation
///
/// The payload is a fixed 8-byte buffer. Bytes beyond `length` are always zero,
/// so signals that reach past the transmitted bytes decode as zero bits rather
/// than leaking stale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Frame {
    id: u32,
    length: u8,
    data: [u8; Frame::MAX_LENGTH],
}

impl Frame {
    /// Maximum payload size of a classic CAN frame
    pub const MAX_LENGTH: usize = 8;

    /// Build a frame from an identifier and the transmitted payload bytes
    pub fn new(id: u32, payload: &[u8]) -> Result<Self> {
        if payload.len() > Self::MAX_LENGTH {
            return Err(DecoderError::InvalidFrame(format!(
                "payload of {} bytes exceeds the {} byte frame capacity",
                payload.len(),
                Self::MAX_LENGTH
            )));
        }

        let mut data = [0u8; Self::MAX_LENGTH];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            id,
            length: payload.len() as u8,
            data,
        })
    }

    /// Build a frame from a declared length and a full data buffer
    ///
    /// Bytes past `length` are cleared.
    pub fn from_parts(id: u32, length: u8, data: [u8; Self::MAX_LENGTH]) -> Result<Self> {
        let len = length as usize;
        if len > Self::MAX_LENGTH {
            return Err(DecoderError::InvalidFrame(format!(
                "length {} exceeds the {} byte frame capacity",
                length,
                Self::MAX_LENGTH
            )));
        }

        let mut cleared = [0u8; Self::MAX_LENGTH];
        cleared[..len].copy_from_slice(&data[..len]);

        Ok(Self {
            id,
            length,
            data: cleared,
        })
    }

    /// CAN identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of transmitted payload bytes (DLC)
    pub fn length(&self) -> usize {
        self.length as usize
    }

    /// The full zero-padded 8-byte buffer
    pub fn data(&self) -> &[u8; Self::MAX_LENGTH] {
        &self.data
    }

    /// Only the transmitted payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.length as usize]
    }
}

/// A frame read from a capture, with its capture metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Absolute capture timestamp
    pub timestamp: Timestamp,
    /// Interface the frame was captured on (e.g. `can0`)
    pub interface: String,
    /// The frame itself
    pub frame: Frame,
}

/// Errors that can occur during decoding, rendering, and catalog loading
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error(
        "Signal '{signal}' (start bit {start_bit}, length {bit_length}) does not fit in {available_bits} payload bits"
    )]
    BitRange {
        signal: String,
        start_bit: u16,
        bit_length: u16,
        available_bits: usize,
    },

    #[error("Frame ID 0x{frame_id:x} does not match descriptor ID 0x{descriptor_id:x}")]
    DescriptorMismatch { frame_id: u32, descriptor_id: u32 },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Report {index} failed: {source}")]
    Report {
        index: usize,
        #[source]
        source: Box<DecoderError>,
    },

    #[error("Failed to parse descriptor catalog: {0}")]
    CatalogParse(String),

    #[error("Failed to parse capture line {line}: {reason}")]
    CaptureParse { line: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Physical value of a decoded signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicalValue {
    /// Unscaled signal: the physical value is exactly the raw value
    Integer(u64),
    /// Scaled signal, rendered with `precision` fractional digits at most
    Scaled { value: f64, precision: usize },
}

impl fmt::Display for PhysicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalValue::Integer(v) => write!(f, "{}", v),
            PhysicalValue::Scaled { value, precision } => {
                f.write_str(&format_decimal(*value, *precision))
            }
        }
    }
}

impl Serialize for PhysicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PhysicalValue::Integer(v) => serializer.serialize_u64(*v),
            PhysicalValue::Scaled { value, .. } => serializer.serialize_f64(*value),
        }
    }
}

/// Format `value` with at most `precision` fractional digits, trailing zeros trimmed
fn format_decimal(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    let trimmed = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };

    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// A decoded signal with its raw and physical value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSignal {
    /// Signal name from the descriptor
    pub name: String,
    /// Raw bit-field value before scaling
    pub raw: u64,
    /// Value after scale and offset
    pub physical: PhysicalValue,
    /// Value description matching the raw value, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// All signals of one frame, decoded against its descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// CAN identifier
    pub id: u32,
    /// Message name from the descriptor
    pub name: String,
    /// Sending node
    pub sender: String,
    /// Decoded signals in descriptor order
    pub signals: Vec<DecodedSignal>,
}
