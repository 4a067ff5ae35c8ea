//! TOML layout file parser
//!
//! Parses a message layout file and converts it into descriptors:
//!
//! ```toml
//! [[message]]
//! name = "DriverHeartbeat"
//! id = 100
//! sender = "DRIVER"
//! length = 1
//! send_type = "cyclic"
//! cycle_time_ms = 100
//! delay_time_ms = 2000
//!
//! [[message.signal]]
//! name = "Command"
//! start = 0
//! length = 8
//! receivers = ["SENSOR", "MOTOR"]
//! values = [
//!     { value = 0, description = "None" },
//!     { value = 1, description = "Sync" },
//! ]
//! ```
//!
//! Layouts are taken as written; no consistency checks are made here.

use crate::signals::{MessageDescriptor, SendType, SignalLayout, ValueDescription};
use crate::types::{DecoderError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct LayoutFile {
    #[serde(default, rename = "message")]
    messages: Vec<MessageEntry>,
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    name: String,
    id: u32,
    #[serde(default)]
    sender: String,
    length: u8,
    #[serde(default)]
    description: String,
    #[serde(default)]
    send_type: SendType,
    #[serde(default)]
    cycle_time_ms: u64,
    #[serde(default)]
    delay_time_ms: u64,
    #[serde(default, rename = "signal")]
    signals: Vec<SignalEntry>,
}

#[derive(Debug, Deserialize)]
struct SignalEntry {
    name: String,
    start: u16,
    length: u16,
    #[serde(default = "default_scale")]
    scale: f64,
    #[serde(default)]
    offset: f64,
    #[serde(default)]
    values: Vec<ValueDescription>,
    #[serde(default)]
    receivers: Vec<String>,
}

fn default_scale() -> f64 {
    1.0
}

/// Parse a layout file and return its descriptors in file order
pub fn parse_layout_file(path: &Path) -> Result<Vec<MessageDescriptor>> {
    log::info!("Parsing layout file: {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|e| {
        DecoderError::CatalogParse(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let descriptors = parse_layout(&content)
        .map_err(|e| DecoderError::CatalogParse(format!("{:?}: {}", path, e)))?;

    log::info!("Parsed {} messages from {:?}", descriptors.len(), path);
    Ok(descriptors)
}

/// Parse layout text and return its descriptors in file order
pub fn parse_layout_str(content: &str) -> Result<Vec<MessageDescriptor>> {
    parse_layout(content).map_err(|e| DecoderError::CatalogParse(e.to_string()))
}

fn parse_layout(content: &str) -> std::result::Result<Vec<MessageDescriptor>, toml::de::Error> {
    let file: LayoutFile = toml::from_str(content)?;
    Ok(file.messages.into_iter().map(convert_message).collect())
}

/// Convert a layout entry to a MessageDescriptor
fn convert_message(entry: MessageEntry) -> MessageDescriptor {
    MessageDescriptor {
        name: entry.name,
        sender_node: entry.sender,
        id: entry.id,
        length: entry.length,
        description: entry.description,
        send_type: entry.send_type,
        cycle_time: Duration::from_millis(entry.cycle_time_ms),
        delay_time: Duration::from_millis(entry.delay_time_ms),
        signals: entry.signals.into_iter().map(convert_signal).collect(),
    }
}

/// Convert a layout entry to a SignalLayout
fn convert_signal(entry: SignalEntry) -> SignalLayout {
    SignalLayout {
        name: entry.name,
        start_bit: entry.start,
        bit_length: entry.length,
        scale: entry.scale,
        offset: entry.offset,
        value_descriptions: entry.values,
        receiver_nodes: entry.receivers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEARTBEAT: &str = r#"
        [[message]]
        name = "DriverHeartbeat"
        id = 100
        sender = "DRIVER"
        length = 1
        description = "Sync message used to synchronize the controllers"
        send_type = "cyclic"
        cycle_time_ms = 100
        delay_time_ms = 2000

        [[message.signal]]
        name = "Command"
        start = 0
        length = 8
        receivers = ["SENSOR", "MOTOR"]
        values = [
            { value = 0, description = "None" },
            { value = 1, description = "Sync" },
            { value = 2, description = "Reboot" },
        ]

        [[message]]
        name = "MotorStatus"
        id = 0x101
        sender = "MOTOR"
        length = 3
        send_type = "on_change"

        [[message.signal]]
        name = "WheelSpeed"
        start = 8
        length = 16
        scale = 0.001
        offset = -32.768
    "#;

    #[test]
    fn test_parse_layout() {
        let messages = parse_layout_str(HEARTBEAT).unwrap();
        assert_eq!(messages.len(), 2);

        let heartbeat = &messages[0];
        assert_eq!(heartbeat.name, "DriverHeartbeat");
        assert_eq!(heartbeat.sender_node, "DRIVER");
        assert_eq!(heartbeat.send_type, SendType::Cyclic);
        assert_eq!(heartbeat.cycle_time, Duration::from_millis(100));
        assert_eq!(heartbeat.delay_time, Duration::from_secs(2));

        let command = &heartbeat.signals[0];
        assert_eq!(command.scale, 1.0);
        assert_eq!(command.offset, 0.0);
        assert_eq!(command.label_for(2), Some("Reboot"));
        assert_eq!(command.receiver_nodes, vec!["SENSOR", "MOTOR"]);

        let motor = &messages[1];
        assert_eq!(motor.id, 0x101);
        assert_eq!(motor.send_type, SendType::OnChange);
        assert_eq!(motor.cycle_time, Duration::ZERO);
        assert_eq!(motor.signals[0].offset, -32.768);
    }

    #[test]
    fn test_parse_invalid_layout() {
        let result = parse_layout_str("[[message]]\nname = \"NoId\"\n");
        assert!(matches!(result, Err(DecoderError::CatalogParse(_))));
    }

    #[test]
    fn test_parse_layout_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HEARTBEAT.as_bytes()).unwrap();

        let messages = parse_layout_file(file.path()).unwrap();
        assert_eq!(messages.len(), 2);

        let missing = parse_layout_file(Path::new("does/not/exist.toml"));
        assert!(matches!(missing, Err(DecoderError::CatalogParse(_))));
    }
}
