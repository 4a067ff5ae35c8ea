//! candump log file parser
//!
//! Parses the text log written by `candump -l`, one frame per line:
//!
//! ```text
//! (1436509052.249713) vcan0 064#0102
//! (1436509052.250713) vcan0 12345678#DEADBEEF
//! (1436509052.251713) vcan0 123#R
//! ```
//!
//! ## Supported Lines
//! - Classic CAN data frames with 3-digit (standard) or 8-digit (extended) IDs
//! - Remote frames (`#R`), emitted with an empty payload
//! - Blank lines and lines starting with `#` are skipped
//!
//! ## Known Limitations
//! - CAN-FD frames (`##`) are rejected; frames carry at most 8 bytes

use crate::types::{CapturedFrame, DecoderError, Frame, Result, Timestamp};
use chrono::DateTime;
use std::fs::File;
use std::io::{BufRead, BufReader, Split};
use std::path::Path;

/// candump log parser
pub struct CandumpParser;

impl CandumpParser {
    /// Open a candump log and return an iterator over its frames
    pub fn parse(path: &Path) -> Result<CandumpFrameIterator<BufReader<File>>> {
        log::info!("Parsing candump log: {:?}", path);

        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    /// Iterate over frames from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> CandumpFrameIterator<R> {
        CandumpFrameIterator {
            lines: reader.split(b'\n'),
            line_number: 0,
        }
    }

    /// Parse one log line
    pub fn parse_line(line: &str, line_number: usize) -> Result<CapturedFrame> {
        let err = |reason: String| DecoderError::CaptureParse {
            line: line_number,
            reason,
        };

        let mut fields = line.split_whitespace();
        let (Some(stamp), Some(interface), Some(body)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(err("expected `(timestamp) interface id#data`".to_string()));
        };

        let timestamp = parse_timestamp(stamp).ok_or_else(|| err(format!("bad timestamp {stamp:?}")))?;

        if body.contains("##") {
            return Err(err("CAN-FD frames are not supported".to_string()));
        }
        let (id_text, data_text) = body
            .split_once('#')
            .ok_or_else(|| err(format!("missing '#' in {body:?}")))?;

        if id_text.len() != 3 && id_text.len() != 8 {
            return Err(err(format!("identifier {id_text:?} must have 3 or 8 hex digits")));
        }
        let id = u32::from_str_radix(id_text, 16)
            .map_err(|e| err(format!("bad identifier {id_text:?}: {e}")))?;

        let payload = if data_text.starts_with('R') {
            Vec::new()
        } else {
            parse_hex_payload(data_text).ok_or_else(|| err(format!("bad payload {data_text:?}")))?
        };

        let frame = Frame::new(id, &payload).map_err(|e| err(e.to_string()))?;

        Ok(CapturedFrame {
            timestamp,
            interface: interface.to_string(),
            frame,
        })
    }
}

/// Iterator over frames from a candump log
pub struct CandumpFrameIterator<R> {
    lines: Split<R>,
    line_number: usize,
}

impl<R: BufRead> Iterator for CandumpFrameIterator<R> {
    type Item = Result<CapturedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.lines.next()?;
            self.line_number += 1;

            let line = match raw.map(String::from_utf8) {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    return Some(Err(DecoderError::CaptureParse {
                        line: self.line_number,
                        reason: format!("invalid UTF-8: {e}"),
                    }))
                }
                Err(e) => return Some(Err(e.into())),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return Some(CandumpParser::parse_line(trimmed, self.line_number));
        }
    }
}

/// `(seconds.fraction)` to an absolute timestamp
fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let (secs, frac) = inner.split_once('.').unwrap_or((inner, ""));

    let secs: i64 = secs.parse().ok()?;
    if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Right-pad the fraction to nanoseconds
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        format!("{:0<9}", frac).parse().ok()?
    };

    DateTime::from_timestamp(secs, nanos)
}

/// Hex byte pairs, optionally separated by '.'
fn parse_hex_payload(text: &str) -> Option<Vec<u8>> {
    let digits: String = text.chars().filter(|c| *c != '.').collect();
    if digits.len() % 2 != 0 {
        return None;
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok())
        .collect()
}
