//! Main decoder API
//!
//! The Decoder ties a descriptor catalog to a capture: it pairs every captured
//! frame with its descriptor so the pairs can be rendered or decoded.

use crate::signals::{DescriptorCatalog, FramePair};
use crate::types::{CapturedFrame, Result, Timestamp};
use std::path::Path;

/// The main decoder struct - entry point for capture processing
pub struct Decoder {
    catalog: DescriptorCatalog,
}

/// One captured frame, paired with its descriptor when the catalog has one
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// The catalog describes this frame's identifier
    Paired {
        timestamp: Timestamp,
        interface: String,
        pair: FramePair,
    },
    /// No descriptor for this identifier
    Unknown(CapturedFrame),
}

impl FrameEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            FrameEvent::Paired { timestamp, .. } => *timestamp,
            FrameEvent::Unknown(captured) => captured.timestamp,
        }
    }

    /// Get the CAN ID of this event
    pub fn id(&self) -> u32 {
        match self {
            FrameEvent::Paired { pair, .. } => pair.frame().id(),
            FrameEvent::Unknown(captured) => captured.frame.id(),
        }
    }
}

impl Decoder {
    /// Create a decoder over an already-built catalog
    pub fn new(catalog: DescriptorCatalog) -> Self {
        Self { catalog }
    }

    /// Load a catalog from a TOML layout file
    ///
    /// # Example
    /// ```no_run
    /// use can_debug_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::from_layout_file(Path::new("layout.toml")).unwrap();
    /// ```
    pub fn from_layout_file(path: &Path) -> Result<Self> {
        log::info!("Loading layout file: {:?}", path);
        let catalog = DescriptorCatalog::load(path)?;
        log::info!(
            "Layout file loaded: {} messages, {} signals",
            catalog.stats().num_messages,
            catalog.stats().num_signals
        );
        Ok(Self::new(catalog))
    }

    /// The catalog used for pairing
    pub fn catalog(&self) -> &DescriptorCatalog {
        &self.catalog
    }

    /// Decode a capture file and return an iterator of frame events
    ///
    /// Only candump logs (`.log`, `.candump`) are supported.
    pub fn decode_file(
        &self,
        path: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<FrameEvent>> + '_>> {
        log::info!("Decoding capture file: {:?}", path);

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("log") | Some("candump") => {
                let frames = crate::formats::CandumpParser::parse(path)?;
                Ok(Box::new(self.pair_frames(frames)))
            }
            _ => Err(crate::types::DecoderError::CaptureParse {
                line: 0,
                reason: format!("Unsupported capture format: {:?}", extension),
            }),
        }
    }

    /// Pair a stream of captured frames with their descriptors
    pub fn pair_frames<I>(&self, frames: I) -> PairingIterator<'_, I>
    where
        I: Iterator<Item = Result<CapturedFrame>>,
    {
        PairingIterator {
            frames,
            catalog: &self.catalog,
        }
    }
}

/// Iterator that pairs captured frames with catalog descriptors
pub struct PairingIterator<'a, I> {
    frames: I,
    catalog: &'a DescriptorCatalog,
}

impl<'a, I> PairingIterator<'a, I> {
    fn process_frame(&self, captured: CapturedFrame) -> FrameEvent {
        match self.catalog.pair(captured.frame) {
            Some(pair) => {
                log::debug!(
                    "Paired frame ID 0x{:X} with {}",
                    captured.frame.id(),
                    pair.descriptor().name
                );
                FrameEvent::Paired {
                    timestamp: captured.timestamp,
                    interface: captured.interface,
                    pair,
                }
            }
            None => {
                log::trace!("Unknown CAN ID: 0x{:X}", captured.frame.id());
                FrameEvent::Unknown(captured)
            }
        }
    }
}

impl<'a, I> Iterator for PairingIterator<'a, I>
where
    I: Iterator<Item = Result<CapturedFrame>>,
{
    type Item = Result<FrameEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.frames.next()?.map(|captured| self.process_frame(captured)))
    }
}
