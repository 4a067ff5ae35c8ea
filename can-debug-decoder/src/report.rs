//! Report stream writer
//!
//! Renders a sequence of (frame, descriptor) pairs and joins the blocks with a
//! single blank line. The output carries no trailing separator and is empty for
//! an empty input.
//!
//! Failure handling is selected by [`FailurePolicy`]:
//! - `Abort` fails the whole stream on the first bad pair and yields no bytes.
//! - `Skip` leaves failing pairs out of the body and lists them in
//!   [`ReportOutcome::skipped`]. A non-empty `skipped` list is the only signal
//!   that the body is partial.

use crate::config::{FailurePolicy, ReportConfig};
use crate::render::MessageRenderer;
use crate::signals::MessageDescriptor;
use crate::types::{DecoderError, Frame, Result};

/// Content type of a rendered report body
pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Separator between two consecutive blocks
const BLOCK_SEPARATOR: &str = "\n\n";

/// A pair that was left out of a `Skip` report
#[derive(Debug)]
pub struct SkippedReport {
    /// Position of the pair in the input sequence
    pub index: usize,
    /// Identifier of the skipped frame
    pub id: u32,
    /// Why the pair could not be rendered
    pub error: DecoderError,
}

/// Rendered report body plus any skipped pairs
#[derive(Debug, Default)]
pub struct ReportOutcome {
    /// The report body
    pub body: Vec<u8>,
    /// Pairs omitted from `body` (always empty under `Abort`)
    pub skipped: Vec<SkippedReport>,
}

impl ReportOutcome {
    /// True when every input pair made it into the body
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Renders many message blocks into one stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportWriter {
    renderer: MessageRenderer,
    policy: FailurePolicy,
}

impl ReportWriter {
    /// Create a report writer with the given configuration
    pub fn new(config: ReportConfig) -> Self {
        Self {
            renderer: MessageRenderer::new(config.render),
            policy: config.failure_policy,
        }
    }

    /// Content type the body should be served with
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    /// Render every pair in input order
    ///
    /// # Errors
    /// Under `FailurePolicy::Abort`, `DecoderError::Report` wrapping the first
    /// failure. Under `FailurePolicy::Skip` this never fails.
    pub fn write_reports<'a, I>(&self, pairs: I) -> Result<ReportOutcome>
    where
        I: IntoIterator<Item = (&'a Frame, &'a MessageDescriptor)>,
    {
        let mut body = String::new();
        let mut skipped = Vec::new();

        for (index, (frame, descriptor)) in pairs.into_iter().enumerate() {
            match self.renderer.render(frame, descriptor) {
                Ok(block) => {
                    if !body.is_empty() {
                        body.push_str(BLOCK_SEPARATOR);
                    }
                    body.push_str(&block);
                }
                Err(error) => match self.policy {
                    FailurePolicy::Abort => {
                        return Err(DecoderError::Report {
                            index,
                            source: Box::new(error),
                        });
                    }
                    FailurePolicy::Skip => {
                        log::warn!(
                            "Skipping report {} for {} (ID 0x{:X}): {}",
                            index,
                            descriptor.name,
                            frame.id(),
                            error
                        );
                        skipped.push(SkippedReport {
                            index,
                            id: frame.id(),
                            error,
                        });
                    }
                },
            }
        }

        Ok(ReportOutcome {
            body: body.into_bytes(),
            skipped,
        })
    }
}

/// Render pairs with the default configuration, failing atomically
pub fn write_reports<'a, I>(pairs: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'a Frame, &'a MessageDescriptor)>,
{
    ReportWriter::default()
        .write_reports(pairs)
        .map(|outcome| outcome.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use crate::signals::SignalLayout;

    fn descriptor() -> MessageDescriptor {
        MessageDescriptor {
            name: "Status".to_string(),
            sender_node: "ECU".to_string(),
            id: 0x20,
            length: 1,
            signals: vec![SignalLayout::new("State", 0, 8).with_value(1, "Ready")],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let body = write_reports(Vec::<(&Frame, &MessageDescriptor)>::new()).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_single_pair_equals_render() {
        let descriptor = descriptor();
        let frame = Frame::new(0x20, &[1]).unwrap();
        let body = write_reports([(&frame, &descriptor)]).unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            render(&frame, &descriptor).unwrap()
        );
    }

    #[test]
    fn test_blocks_joined_by_one_blank_line() {
        let descriptor = descriptor();
        let first = Frame::new(0x20, &[0]).unwrap();
        let second = Frame::new(0x20, &[1]).unwrap();
        let body = write_reports([(&first, &descriptor), (&second, &descriptor)]).unwrap();

        let expected = format!(
            "{}\n\n{}",
            render(&first, &descriptor).unwrap(),
            render(&second, &descriptor).unwrap()
        );
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_abort_policy_fails_atomically() {
        let good = descriptor();
        let mut bad = descriptor();
        bad.signals.push(SignalLayout::new("Overflow", 0, 16));
        let frame = Frame::new(0x20, &[1]).unwrap();

        let err = write_reports([(&frame, &good), (&frame, &bad), (&frame, &good)]).unwrap_err();
        match err {
            DecoderError::Report { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, DecoderError::BitRange { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_policy_reports_skipped_pairs() {
        let good = descriptor();
        let mut bad = descriptor();
        bad.signals.push(SignalLayout::new("Overflow", 0, 16));
        let frame = Frame::new(0x20, &[1]).unwrap();

        let writer = ReportWriter::new(ReportConfig::new().with_failure_policy(FailurePolicy::Skip));
        let outcome = writer
            .write_reports([(&frame, &bad), (&frame, &good), (&frame, &bad)])
            .unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(
            outcome.skipped.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(
            String::from_utf8(outcome.body).unwrap(),
            render(&frame, &good).unwrap()
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(ReportWriter::default().content_type(), "text/plain; charset=utf-8");
    }
}
