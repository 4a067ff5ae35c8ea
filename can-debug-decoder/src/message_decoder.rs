//! Signal Decoding Engine
//!
//! Extracts signal values from frame payloads based on signal layouts from the
//! descriptor catalog. Handles bit extraction, physical value conversion, and
//! value description lookup.
//!
//! # Bit numbering
//!
//! Bits are numbered least-significant-bit first within each byte, and bytes in
//! ascending index order (Intel layout). Bit 0 is the LSB of byte 0, bit 8 the
//! LSB of byte 1. A signal starting at bit `s` with length `n` takes payload
//! bits `s..s+n`, with bit `s` becoming the LSB of the raw value.

use crate::signals::{MessageDescriptor, SignalLayout};
use crate::types::{DecodedMessage, DecodedSignal, DecoderError, Frame, PhysicalValue, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Widest signal the decoder can extract
const MAX_BIT_LENGTH: usize = 64;

/// Signal decoder - extracts signals from frame payloads
pub struct SignalDecoder;

impl SignalDecoder {
    /// Decode one signal from a payload
    ///
    /// # Errors
    /// `DecoderError::BitRange` when the signal has an invalid length or does
    /// not fit inside `payload`. A raw value without a value description is
    /// not an error; the label is simply `None`.
    pub fn decode(payload: &[u8], signal: &SignalLayout) -> Result<DecodedSignal> {
        let raw = Self::extract_signal_value(payload, signal)?;

        let physical = if signal.is_unscaled() {
            PhysicalValue::Integer(raw)
        } else {
            PhysicalValue::Scaled {
                value: raw as f64 * signal.scale + signal.offset,
                precision: fraction_digits(signal.scale).max(fraction_digits(signal.offset)),
            }
        };

        Ok(DecodedSignal {
            name: signal.name.clone(),
            raw,
            physical,
            label: signal.label_for(raw).map(str::to_string),
        })
    }

    /// Decode every signal of a frame, in descriptor order
    ///
    /// Signals only see the first `descriptor.length` bytes of the frame.
    pub fn decode_message(frame: &Frame, descriptor: &MessageDescriptor) -> Result<DecodedMessage> {
        let payload = Self::visible_payload(frame, descriptor);

        let signals = descriptor
            .signals
            .iter()
            .map(|signal| Self::decode(payload, signal))
            .collect::<Result<Vec<_>>>()?;

        Ok(DecodedMessage {
            id: frame.id(),
            name: descriptor.name.clone(),
            sender: descriptor.sender_node.clone(),
            signals,
        })
    }

    /// Payload bytes a descriptor is allowed to address
    pub(crate) fn visible_payload<'a>(frame: &'a Frame, descriptor: &MessageDescriptor) -> &'a [u8] {
        let len = (descriptor.length as usize).min(Frame::MAX_LENGTH);
        &frame.data()[..len]
    }

    /// Extract the raw unsigned value of a signal
    fn extract_signal_value(payload: &[u8], signal: &SignalLayout) -> Result<u64> {
        let start_bit = signal.start_bit as usize;
        let length = signal.bit_length as usize;
        let available_bits = (payload.len() * 8).min(MAX_BIT_LENGTH);

        if length == 0 || length > MAX_BIT_LENGTH || start_bit + length > available_bits {
            return Err(DecoderError::BitRange {
                signal: signal.name.clone(),
                start_bit: signal.start_bit,
                bit_length: signal.bit_length,
                available_bits,
            });
        }

        Ok(Self::extract_little_endian(payload, start_bit, length))
    }

    /// Extract `length` bits starting at `start_bit`, LSB-first
    ///
    /// Caller guarantees `start_bit + length <= 64` and `length >= 1`.
    fn extract_little_endian(payload: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut buf = [0u8; 8];
        let used = payload.len().min(buf.len());
        buf[..used].copy_from_slice(&payload[..used]);

        let shifted = LittleEndian::read_u64(&buf) >> start_bit;
        if length == MAX_BIT_LENGTH {
            shifted
        } else {
            shifted & ((1u64 << length) - 1)
        }
    }
}

/// Number of fractional digits in the shortest representation of `value`
fn fraction_digits(value: f64) -> usize {
    if !value.is_finite() {
        return 0;
    }
    let text = value.abs().to_string();
    text.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_little_endian_simple() {
        // Signal: 8 bits starting at bit 0 (byte 0)
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        let value = SignalDecoder::extract_little_endian(&data, 0, 8);
        assert_eq!(value, 0xAB);
    }

    #[test]
    fn test_extract_little_endian_cross_byte() {
        // Signal: 16 bits starting at bit 0 (bytes 0-1)
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        let value = SignalDecoder::extract_little_endian(&data, 0, 16);
        assert_eq!(value, 0xCDAB);
    }

    #[test]
    fn test_extract_unaligned_multi_byte() {
        // 0xAB = 1010_1011, 0xCD = 1100_1101
        // Bits 4..16 are the high nibble of byte 0 followed by all of byte 1
        let data = vec![0xAB, 0xCD];
        let value = SignalDecoder::extract_little_endian(&data, 4, 12);
        assert_eq!(value, 0xCDA);

        // Bits 6..11: top two bits of byte 0 (0b10) then low three of byte 1 (0b101)
        let value = SignalDecoder::extract_little_endian(&data, 6, 5);
        assert_eq!(value, 0b101_10);
    }

    #[test]
    fn test_extract_full_width() {
        let data = vec![0xFF; 8];
        assert_eq!(SignalDecoder::extract_little_endian(&data, 0, 64), u64::MAX);
    }

    #[test]
    fn test_decode_unscaled_is_integer() {
        let signal = SignalLayout::new("Counter", 0, 8);
        let decoded = SignalDecoder::decode(&[0x2A], &signal).unwrap();
        assert_eq!(decoded.raw, 42);
        assert_eq!(decoded.physical, PhysicalValue::Integer(42));
        assert_eq!(decoded.physical.to_string(), "42");
        assert_eq!(decoded.label, None);
    }

    #[test]
    fn test_decode_scaled_minimal_decimals() {
        let signal = SignalLayout::new("Voltage", 0, 8).with_scaling(0.1, 0.0);
        let decoded = SignalDecoder::decode(&[3], &signal).unwrap();
        assert_eq!(decoded.physical.to_string(), "0.3");

        let decoded = SignalDecoder::decode(&[120], &signal).unwrap();
        assert_eq!(decoded.physical.to_string(), "12");
    }

    #[test]
    fn test_decode_integral_scale_with_offset() {
        let signal = SignalLayout::new("Temperature", 0, 8).with_scaling(1.0, -40.0);
        let decoded = SignalDecoder::decode(&[0], &signal).unwrap();
        assert_eq!(decoded.physical.to_string(), "-40");

        let signal = SignalLayout::new("Temperature", 0, 8).with_scaling(0.5, -40.0);
        let decoded = SignalDecoder::decode(&[85], &signal).unwrap();
        assert_eq!(decoded.physical.to_string(), "2.5");
    }

    #[test]
    fn test_decode_label_matches_raw_not_physical() {
        let signal = SignalLayout::new("Gear", 0, 4)
            .with_scaling(10.0, 0.0)
            .with_value(2, "Second")
            .with_value(20, "Twenty");
        let decoded = SignalDecoder::decode(&[0x02], &signal).unwrap();
        assert_eq!(decoded.physical.to_string(), "20");
        assert_eq!(decoded.label.as_deref(), Some("Second"));
    }

    #[test]
    fn test_decode_out_of_range() {
        let signal = SignalLayout::new("Wide", 4, 8);
        let err = SignalDecoder::decode(&[0xFF], &signal).unwrap_err();
        match err {
            DecoderError::BitRange {
                signal,
                available_bits,
                ..
            } => {
                assert_eq!(signal, "Wide");
                assert_eq!(available_bits, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_invalid_lengths() {
        let data = [0u8; 8];
        assert!(SignalDecoder::decode(&data, &SignalLayout::new("Empty", 0, 0)).is_err());
        assert!(SignalDecoder::decode(&data, &SignalLayout::new("TooWide", 0, 65)).is_err());
        assert!(SignalDecoder::decode(&data, &SignalLayout::new("Full", 0, 64)).is_ok());
    }

    #[test]
    fn test_decode_message_limits_to_descriptor_length() {
        let descriptor = MessageDescriptor {
            name: "Short".to_string(),
            id: 0x10,
            length: 1,
            signals: vec![SignalLayout::new("Second", 8, 8)],
            ..Default::default()
        };
        let frame = Frame::new(0x10, &[0x01, 0x02]).unwrap();
        let result = SignalDecoder::decode_message(&frame, &descriptor);
        assert!(matches!(result, Err(DecoderError::BitRange { .. })));
    }

    #[test]
    fn test_fraction_digits() {
        assert_eq!(fraction_digits(1.0), 0);
        assert_eq!(fraction_digits(0.1), 1);
        assert_eq!(fraction_digits(0.025), 3);
        assert_eq!(fraction_digits(-40.0), 0);
    }
}
