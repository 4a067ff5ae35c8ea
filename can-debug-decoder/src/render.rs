//! Message report rendering
//!
//! Turns one frame and its descriptor into a fixed multi-line text block:
//!
//! ```text
//! DriverHeartbeat
//! ===============
//! ID: 100 (0x64)
//! Sender: DRIVER
//! SendType: Cyclic
//! CycleTime: 100ms
//! DelayTime: 2s
//! ===============
//! Command: 1 (0x1) Sync
//! ```
//!
//! Blocks never end with a newline; joining blocks is the report writer's job.

use crate::config::{RenderConfig, RuleWidth};
use crate::message_decoder::SignalDecoder;
use crate::signals::MessageDescriptor;
use crate::types::{DecodedSignal, Frame, Result};
use std::time::Duration;

/// Renders frames into text blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageRenderer {
    config: RenderConfig,
}

impl MessageRenderer {
    /// Create a renderer with the given configuration
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a frame against its descriptor
    ///
    /// The descriptor is not checked against the frame identifier; pairing is
    /// the caller's responsibility. Every header line, `ID:` included, comes
    /// from the descriptor, so a mismatched pair still renders a consistent
    /// header. Only signal values are read from the frame.
    pub fn render(&self, frame: &Frame, descriptor: &MessageDescriptor) -> Result<String> {
        // Decode first so a bad layout never produces a partial block
        let payload = SignalDecoder::visible_payload(frame, descriptor);
        let signals = descriptor
            .signals
            .iter()
            .map(|signal| SignalDecoder::decode(payload, signal))
            .collect::<Result<Vec<_>>>()?;

        let header = [
            format!("ID: {} (0x{:x})", descriptor.id, descriptor.id),
            format!("Sender: {}", descriptor.sender_node),
            format!("SendType: {}", descriptor.send_type),
            format!("CycleTime: {}", format_duration(descriptor.cycle_time)),
            format!("DelayTime: {}", format_duration(descriptor.delay_time)),
        ];

        let name_width = descriptor.name.chars().count();
        let header_rule_width = match self.config.rule_width {
            RuleWidth::MatchName => name_width,
            RuleWidth::WidestHeader => header
                .iter()
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0),
        };

        let mut out = String::new();
        out.push_str(&descriptor.name);
        out.push('\n');
        out.push_str(&"=".repeat(name_width));
        for line in &header {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out.push_str(&"=".repeat(header_rule_width));

        for signal in &signals {
            out.push('\n');
            write_signal_line(&mut out, signal);
        }

        log::trace!(
            "Rendered {} (ID 0x{:X}) with {} signals",
            descriptor.name,
            frame.id(),
            signals.len()
        );

        Ok(out)
    }
}

/// Render a frame with the default configuration
pub fn render(frame: &Frame, descriptor: &MessageDescriptor) -> Result<String> {
    MessageRenderer::default().render(frame, descriptor)
}

/// `<name>: <physical> (0x<raw>)[ <label>]`
fn write_signal_line(out: &mut String, signal: &DecodedSignal) {
    out.push_str(&format!(
        "{}: {} (0x{:x})",
        signal.name, signal.physical, signal.raw
    ));
    if let Some(label) = &signal.label {
        out.push(' ');
        out.push_str(label);
    }
}

/// Format a duration as `0s`, `<n>ms` below one second, or `<n>s`
///
/// Fractions are kept at full precision with trailing zeros dropped:
/// `1500ms` renders as `1.5s`, `500us` as `0.5ms`.
pub fn format_duration(duration: Duration) -> String {
    const NANOS_PER_MILLI: u128 = 1_000_000;
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    if duration.is_zero() {
        return "0s".to_string();
    }

    let nanos = duration.as_nanos();
    if nanos < NANOS_PER_SEC {
        format!("{}ms", format_fixed_point(nanos, NANOS_PER_MILLI))
    } else {
        format!("{}s", format_fixed_point(nanos, NANOS_PER_SEC))
    }
}

/// Format `value / unit` exactly, where `unit` is a power of ten
fn format_fixed_point(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
