//! Descriptor catalog
//!
//! An immutable lookup table from CAN ID to message descriptor. The catalog is
//! built once and passed by reference; descriptors are shared behind `Arc` so
//! frame pairs can outlive a borrow of the catalog.

use crate::signals::MessageDescriptor;
use crate::types::{DecoderError, Frame, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A frame matched with the descriptor for its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct FramePair {
    frame: Frame,
    descriptor: Arc<MessageDescriptor>,
}

impl FramePair {
    /// Pair a frame with a descriptor, checking that the identifiers agree
    pub fn new(frame: Frame, descriptor: Arc<MessageDescriptor>) -> Result<Self> {
        if frame.id() != descriptor.id {
            return Err(DecoderError::DescriptorMismatch {
                frame_id: frame.id(),
                descriptor_id: descriptor.id,
            });
        }
        Ok(Self { frame, descriptor })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// Borrow as the tuple shape the report writer consumes
    pub fn as_pair(&self) -> (&Frame, &MessageDescriptor) {
        (&self.frame, &self.descriptor)
    }
}

/// Immutable message descriptor catalog
#[derive(Debug, Clone, Default)]
pub struct DescriptorCatalog {
    /// Descriptors by CAN ID
    messages: HashMap<u32, Arc<MessageDescriptor>>,

    /// Message name lookup
    /// Key: message name, Value: CAN ID
    names: HashMap<String, u32>,
}

impl DescriptorCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors
    ///
    /// When two descriptors share an ID the first one is kept.
    pub fn from_descriptors<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = MessageDescriptor>,
    {
        let mut messages: HashMap<u32, Arc<MessageDescriptor>> = HashMap::new();
        let mut names = HashMap::new();

        for descriptor in descriptors {
            if let Some(existing) = messages.get(&descriptor.id) {
                log::warn!(
                    "Ignoring duplicate descriptor {} for ID 0x{:X} (already defined by {})",
                    descriptor.name,
                    descriptor.id,
                    existing.name
                );
                continue;
            }

            names.entry(descriptor.name.clone()).or_insert(descriptor.id);
            messages.insert(descriptor.id, Arc::new(descriptor));
        }

        Self { messages, names }
    }

    /// Load a catalog from a TOML layout file
    pub fn load(path: &Path) -> Result<Self> {
        let descriptors = crate::signals::layout::parse_layout_file(path)?;
        Ok(Self::from_descriptors(descriptors))
    }

    /// Parse a catalog from TOML layout text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let descriptors = crate::signals::layout::parse_layout_str(content)?;
        Ok(Self::from_descriptors(descriptors))
    }

    /// Descriptor for a CAN ID
    pub fn get(&self, id: u32) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(&id)
    }

    /// Descriptor by message name
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.names.get(name).and_then(|id| self.messages.get(id))
    }

    /// Pair a frame with the descriptor for its identifier
    pub fn pair(&self, frame: Frame) -> Option<FramePair> {
        self.messages.get(&frame.id()).map(|descriptor| FramePair {
            frame,
            descriptor: Arc::clone(descriptor),
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All CAN IDs in the catalog, ascending
    pub fn identifiers(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.messages.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get catalog statistics
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.values().map(|msg| msg.signals.len()).sum(),
        }
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    /// Total number of message descriptors
    pub num_messages: usize,
    /// Total number of signal layouts
    pub num_signals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalLayout;

    fn message(id: u32, name: &str, signals: usize) -> MessageDescriptor {
        MessageDescriptor {
            name: name.to_string(),
            id,
            length: 8,
            signals: (0..signals)
                .map(|i| SignalLayout::new(format!("S{i}"), (i * 8) as u16, 8))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = DescriptorCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.stats(), CatalogStats { num_messages: 0, num_signals: 0 });
    }

    #[test]
    fn test_lookup() {
        let catalog = DescriptorCatalog::from_descriptors([
            message(0x200, "Battery", 2),
            message(0x100, "Engine", 3),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.identifiers(), vec![0x100, 0x200]);
        assert_eq!(catalog.get(0x100).unwrap().name, "Engine");
        assert_eq!(catalog.get_by_name("Battery").unwrap().id, 0x200);
        assert!(catalog.get(0x300).is_none());
        assert_eq!(catalog.stats().num_signals, 5);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let catalog = DescriptorCatalog::from_descriptors([
            message(0x100, "First", 1),
            message(0x100, "Second", 1),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0x100).unwrap().name, "First");
        assert!(catalog.get_by_name("Second").is_none());
    }

    #[test]
    fn test_pair_by_frame_id() {
        let catalog = DescriptorCatalog::from_descriptors([message(0x100, "Engine", 1)]);

        let pair = catalog.pair(Frame::new(0x100, &[1]).unwrap()).unwrap();
        assert_eq!(pair.descriptor().name, "Engine");
        assert_eq!(pair.frame().payload(), &[1]);

        assert!(catalog.pair(Frame::new(0x101, &[1]).unwrap()).is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let catalog = DescriptorCatalog::from_toml_str(
            r#"
            [[message]]
            name = "Pedals"
            id = 0x300
            length = 2

            [[message.signal]]
            name = "Throttle"
            start = 0
            length = 10
            scale = 0.1
            "#,
        )
        .unwrap();

        let pedals = catalog.get_by_name("Pedals").unwrap();
        assert_eq!(pedals.id, 0x300);
        assert_eq!(pedals.signals[0].scale, 0.1);

        assert!(DescriptorCatalog::from_toml_str("[[message]]").is_err());
    }

    #[test]
    fn test_frame_pair_mismatch() {
        let descriptor = Arc::new(message(0x100, "Engine", 1));
        let err = FramePair::new(Frame::new(0x101, &[]).unwrap(), descriptor).unwrap_err();
        assert!(matches!(
            err,
            DecoderError::DescriptorMismatch { frame_id: 0x101, descriptor_id: 0x100 }
        ));
    }
}
