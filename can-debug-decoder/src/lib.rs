//! CAN Debug Decoder Library
//!
//! Decodes CAN frames against declarative message descriptors and renders them
//! as human-readable diagnostic reports.
//!
//! # Architecture
//!
//! Data flows one way through four pieces:
//! - Descriptors (`signals`) describe a message class; they are read-only
//! - The signal decoder extracts, scales, and labels one bit field
//! - The renderer turns a frame and its descriptor into a text block
//! - The report writer joins many blocks into one response body
//!
//! Around that core sit the collaborators a debugging tool needs: a TOML
//! descriptor catalog and a candump capture reader.
//!
//! The library does NOT:
//! - Validate descriptors for internal consistency
//! - Encode frames from physical values
//! - Convert units beyond linear scale and offset
//!
//! # Example Usage
//!
//! ```
//! use can_debug_decoder::{render, Frame, MessageDescriptor, SendType, SignalLayout};
//! use std::time::Duration;
//!
//! let descriptor = MessageDescriptor {
//!     name: "DriverHeartbeat".to_string(),
//!     sender_node: "DRIVER".to_string(),
//!     id: 100,
//!     length: 1,
//!     send_type: SendType::Cyclic,
//!     cycle_time: Duration::from_millis(100),
//!     delay_time: Duration::from_secs(2),
//!     signals: vec![SignalLayout::new("Command", 0, 8).with_value(1, "Sync")],
//!     ..Default::default()
//! };
//!
//! let frame = Frame::new(100, &[0x01]).unwrap();
//! let text = render(&frame, &descriptor).unwrap();
//! assert!(text.ends_with("Command: 1 (0x1) Sync"));
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod formats;
pub mod message_decoder;
pub mod render;
pub mod report;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::{FailurePolicy, RenderConfig, ReportConfig, RuleWidth};
pub use decoder::{Decoder, FrameEvent};
pub use message_decoder::SignalDecoder;
pub use render::{render, MessageRenderer};
pub use report::{write_reports, ReportOutcome, ReportWriter, SkippedReport, CONTENT_TYPE};
pub use signals::{
    CatalogStats, DescriptorCatalog, FramePair, MessageDescriptor, SendType, SignalLayout,
    ValueDescription,
};
pub use types::{
    CapturedFrame, DecodedMessage, DecodedSignal, DecoderError, Frame, PhysicalValue, Result,
    Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder
        let decoder = Decoder::new(DescriptorCatalog::new());
        let stats = decoder.catalog().stats();
        assert_eq!(stats.num_messages, 0);
    }
}
