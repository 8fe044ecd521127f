//! AMF0 value encoder and decoder
//!
//! AMF0 is the serialization format legacy remoting clients speak natively;
//! every packet value starts in AMF0 even when the payload itself is AMF3
//! (the 0x11 marker hands the rest of the value to the AMF3 codec).
//!
//! Type Markers:
//! ```text
//! 0x00 - Number (IEEE 754 double)
//! 0x01 - Boolean
//! 0x02 - String (UTF-8, 16-bit length prefix)
//! 0x03 - Object (key-value pairs until 0x000009)
//! 0x04 - MovieClip (reserved, rejected)
//! 0x05 - Null
//! 0x06 - Undefined
//! 0x07 - Reference (16-bit index)
//! 0x08 - ECMA Array (associative array)
//! 0x09 - Object End (0x000009 sequence)
//! 0x0A - Strict Array (dense array)
//! 0x0B - Date (double + timezone)
//! 0x0C - Long String (UTF-8, 32-bit length prefix)
//! 0x0D - Unsupported (reads as Undefined)
//! 0x0E - RecordSet (reserved, rejected)
//! 0x0F - XML Document
//! 0x10 - Typed Object (class name + properties)
//! 0x11 - AVM+ (switch to AMF3)
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;

use super::amf3::{Amf3Decoder, Amf3Encoder};
use super::value::AmfValue;
use crate::error::AmfError;

// AMF0 type markers
const MARKER_NUMBER: u8 = 0x00;
const MARKER_BOOLEAN: u8 = 0x01;
const MARKER_STRING: u8 = 0x02;
const MARKER_OBJECT: u8 = 0x03;
const MARKER_NULL: u8 = 0x05;
const MARKER_UNDEFINED: u8 = 0x06;
const MARKER_REFERENCE: u8 = 0x07;
const MARKER_ECMA_ARRAY: u8 = 0x08;
const MARKER_OBJECT_END: u8 = 0x09;
const MARKER_STRICT_ARRAY: u8 = 0x0A;
const MARKER_DATE: u8 = 0x0B;
const MARKER_LONG_STRING: u8 = 0x0C;
const MARKER_UNSUPPORTED: u8 = 0x0D;
const MARKER_XML_DOCUMENT: u8 = 0x0F;
const MARKER_TYPED_OBJECT: u8 = 0x10;
const MARKER_AVMPLUS: u8 = 0x11;

/// Maximum nesting depth for objects/arrays (prevent stack overflow)
const MAX_NESTING_DEPTH: usize = 64;

/// AMF0 decoder
///
/// Parsing is strict: unknown markers, truncated input, bad UTF-8 and
/// missing object-end sequences are all errors. The reference table and the
/// embedded AMF3 decoder persist across calls until [`reset`](Self::reset),
/// so one decoder instance services all values of one packet.
pub struct Amf0Decoder {
    /// Complex values seen so far, in encounter order, for 0x07 references
    references: Vec<AmfValue>,
    /// Embedded AMF3 decoder entered through the 0x11 marker
    amf3: Amf3Decoder,
    depth: usize,
}

impl Amf0Decoder {
    pub fn new() -> Self {
        Self {
            references: Vec::new(),
            amf3: Amf3Decoder::new(),
            depth: 0,
        }
    }

    /// Clear reference tables and depth (call between packets).
    pub fn reset(&mut self) {
        self.references.clear();
        self.amf3.reset();
        self.depth = 0;
    }

    /// Decode a single AMF0 value, advancing the cursor past it.
    pub fn decode<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        if !buf.has_remaining() {
            return Err(AmfError::UnexpectedEof);
        }

        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(AmfError::NestingTooDeep);
        }

        let marker = buf.get_u8();
        let result = self.decode_value(marker, buf);
        self.depth -= 1;
        result
    }

    fn decode_value<B: Buf>(&mut self, marker: u8, buf: &mut B) -> Result<AmfValue, AmfError> {
        match marker {
            MARKER_NUMBER => {
                if buf.remaining() < 8 {
                    return Err(AmfError::UnexpectedEof);
                }
                Ok(AmfValue::Number(buf.get_f64()))
            }
            MARKER_BOOLEAN => {
                if !buf.has_remaining() {
                    return Err(AmfError::UnexpectedEof);
                }
                Ok(AmfValue::Boolean(buf.get_u8() != 0))
            }
            MARKER_STRING => Ok(AmfValue::String(read_utf8(buf)?)),
            MARKER_LONG_STRING => Ok(AmfValue::String(read_utf8_long(buf)?)),
            MARKER_OBJECT => self.decode_object(buf),
            MARKER_NULL => Ok(AmfValue::Null),
            MARKER_UNDEFINED => Ok(AmfValue::Undefined),
            MARKER_REFERENCE => self.decode_reference(buf),
            MARKER_ECMA_ARRAY => self.decode_ecma_array(buf),
            MARKER_STRICT_ARRAY => self.decode_strict_array(buf),
            MARKER_DATE => self.decode_date(buf),
            MARKER_UNSUPPORTED => Ok(AmfValue::Undefined),
            MARKER_XML_DOCUMENT => Ok(AmfValue::Xml(read_utf8_long(buf)?)),
            MARKER_TYPED_OBJECT => self.decode_typed_object(buf),
            MARKER_AVMPLUS => self.amf3.decode(buf),
            _ => Err(AmfError::UnknownMarker(marker)),
        }
    }

    fn decode_object<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        // Register before decoding so nested references can point here
        let slot = self.reserve_reference();
        let properties = self.decode_property_map(buf)?;

        let obj = AmfValue::Object(properties);
        self.references[slot] = obj.clone();
        Ok(obj)
    }

    fn decode_ecma_array<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        if buf.remaining() < 4 {
            return Err(AmfError::UnexpectedEof);
        }
        // Associative count is a hint only; the end marker is authoritative
        let _count = buf.get_u32();

        let slot = self.reserve_reference();
        let properties = self.decode_property_map(buf)?;

        let arr = AmfValue::EcmaArray(properties);
        self.references[slot] = arr.clone();
        Ok(arr)
    }

    fn decode_strict_array<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        if buf.remaining() < 4 {
            return Err(AmfError::UnexpectedEof);
        }
        let count = buf.get_u32() as usize;

        let slot = self.reserve_reference();

        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            elements.push(self.decode(buf)?);
        }

        let arr = AmfValue::Array(elements);
        self.references[slot] = arr.clone();
        Ok(arr)
    }

    fn decode_typed_object<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let class_name = read_utf8(buf)?;

        let slot = self.reserve_reference();
        let properties = self.decode_property_map(buf)?;

        let obj = AmfValue::TypedObject {
            class_name,
            properties,
        };
        self.references[slot] = obj.clone();
        Ok(obj)
    }

    fn decode_date<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        if buf.remaining() < 10 {
            return Err(AmfError::UnexpectedEof);
        }
        let timestamp = buf.get_f64();
        // Timezone offset is deprecated and always written as 0
        let _timezone = buf.get_i16();
        Ok(AmfValue::Date(timestamp))
    }

    fn decode_reference<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        if buf.remaining() < 2 {
            return Err(AmfError::UnexpectedEof);
        }
        let index = buf.get_u16() as usize;
        match self.references.get(index) {
            Some(value) => Ok(value.clone()),
            None => Err(AmfError::InvalidReference(index as u32)),
        }
    }

    /// Key/value pairs terminated by an empty key plus the object-end marker.
    fn decode_property_map<B: Buf>(
        &mut self,
        buf: &mut B,
    ) -> Result<HashMap<String, AmfValue>, AmfError> {
        let mut properties = HashMap::new();
        loop {
            let key = read_utf8(buf)?;
            if key.is_empty() {
                if !buf.has_remaining() {
                    return Err(AmfError::UnexpectedEof);
                }
                if buf.get_u8() != MARKER_OBJECT_END {
                    return Err(AmfError::InvalidObjectEnd);
                }
                return Ok(properties);
            }
            let value = self.decode(buf)?;
            properties.insert(key, value);
        }
    }

    fn reserve_reference(&mut self) -> usize {
        let slot = self.references.len();
        self.references.push(AmfValue::Null);
        slot
    }
}

impl Default for Amf0Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// AMF0 encoder writing into a caller-supplied buffer
///
/// The embedded AMF3 encoder (used for the 0x11 escape) keeps its reference
/// tables across calls until [`reset`](Self::reset), mirroring the decoder.
pub struct Amf0Encoder {
    amf3: Amf3Encoder,
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Self {
            amf3: Amf3Encoder::new(),
        }
    }

    /// Clear the embedded AMF3 reference tables (call between packets).
    pub fn reset(&mut self) {
        self.amf3.reset();
    }

    /// Encode a single value in AMF0.
    pub fn encode(&mut self, buf: &mut BytesMut, value: &AmfValue) -> Result<(), AmfError> {
        match value {
            AmfValue::Null => {
                buf.put_u8(MARKER_NULL);
            }
            AmfValue::Undefined => {
                buf.put_u8(MARKER_UNDEFINED);
            }
            AmfValue::Boolean(b) => {
                buf.put_u8(MARKER_BOOLEAN);
                buf.put_u8(u8::from(*b));
            }
            AmfValue::Number(n) => {
                buf.put_u8(MARKER_NUMBER);
                buf.put_f64(*n);
            }
            AmfValue::Integer(i) => {
                // No integer type in AMF0
                buf.put_u8(MARKER_NUMBER);
                buf.put_f64(*i as f64);
            }
            AmfValue::String(s) => {
                if s.len() > u16::MAX as usize {
                    buf.put_u8(MARKER_LONG_STRING);
                    put_long_bytes(buf, s.as_bytes())?;
                } else {
                    buf.put_u8(MARKER_STRING);
                    write_utf8(buf, s)?;
                }
            }
            AmfValue::Object(props) => {
                buf.put_u8(MARKER_OBJECT);
                self.encode_property_map(buf, props)?;
            }
            AmfValue::EcmaArray(props) => {
                buf.put_u8(MARKER_ECMA_ARRAY);
                buf.put_u32(props.len() as u32);
                self.encode_property_map(buf, props)?;
            }
            AmfValue::Array(elements) => {
                buf.put_u8(MARKER_STRICT_ARRAY);
                buf.put_u32(elements.len() as u32);
                for elem in elements {
                    self.encode(buf, elem)?;
                }
            }
            AmfValue::Date(timestamp) => {
                buf.put_u8(MARKER_DATE);
                buf.put_f64(*timestamp);
                buf.put_i16(0);
            }
            AmfValue::Xml(s) => {
                buf.put_u8(MARKER_XML_DOCUMENT);
                put_long_bytes(buf, s.as_bytes())?;
            }
            AmfValue::TypedObject {
                class_name,
                properties,
            } => {
                buf.put_u8(MARKER_TYPED_OBJECT);
                write_utf8(buf, class_name)?;
                self.encode_property_map(buf, properties)?;
            }
            AmfValue::ByteArray(_) => {
                // AMF3-only type; escape through the avmplus marker so the
                // payload survives instead of degrading to null
                self.encode_amf3(buf, value)?;
            }
        }
        Ok(())
    }

    /// Encode a value as the AMF3 escape: 0x11 marker followed by AMF3 bytes.
    pub fn encode_amf3(&mut self, buf: &mut BytesMut, value: &AmfValue) -> Result<(), AmfError> {
        buf.put_u8(MARKER_AVMPLUS);
        self.amf3.encode(buf, value)
    }

    fn encode_property_map(
        &mut self,
        buf: &mut BytesMut,
        props: &HashMap<String, AmfValue>,
    ) -> Result<(), AmfError> {
        for (key, val) in props {
            write_utf8(buf, key)?;
            self.encode(buf, val)?;
        }
        buf.put_u16(0);
        buf.put_u8(MARKER_OBJECT_END);
        Ok(())
    }
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a UTF-8 string with 16-bit length prefix.
pub(super) fn read_utf8<B: Buf>(buf: &mut B) -> Result<String, AmfError> {
    if buf.remaining() < 2 {
        return Err(AmfError::UnexpectedEof);
    }
    let len = buf.get_u16() as usize;
    read_utf8_body(buf, len)
}

/// Read a UTF-8 string with 32-bit length prefix.
fn read_utf8_long<B: Buf>(buf: &mut B) -> Result<String, AmfError> {
    if buf.remaining() < 4 {
        return Err(AmfError::UnexpectedEof);
    }
    let len = buf.get_u32() as usize;
    read_utf8_body(buf, len)
}

fn read_utf8_body<B: Buf>(buf: &mut B, len: usize) -> Result<String, AmfError> {
    if buf.remaining() < len {
        return Err(AmfError::UnexpectedEof);
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| AmfError::InvalidUtf8)
}

/// Write a UTF-8 string with 16-bit length prefix (no type marker).
pub(super) fn write_utf8(buf: &mut BytesMut, s: &str) -> Result<(), AmfError> {
    if s.len() > u16::MAX as usize {
        return Err(AmfError::StringTooLong(s.len()));
    }
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn put_long_bytes(buf: &mut BytesMut, bytes: &[u8]) -> Result<(), AmfError> {
    if bytes.len() > u32::MAX as usize {
        return Err(AmfError::StringTooLong(bytes.len()));
    }
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
    Ok(())
}

/// Encode a single value to a fresh byte buffer.
pub fn encode(value: &AmfValue) -> Result<Bytes, AmfError> {
    let mut encoder = Amf0Encoder::new();
    let mut buf = BytesMut::new();
    encoder.encode(&mut buf, value)?;
    Ok(buf.freeze())
}

/// Decode a single value from a byte slice.
pub fn decode(data: &[u8]) -> Result<AmfValue, AmfError> {
    let mut decoder = Amf0Decoder::new();
    let mut cursor = data;
    decoder.decode(&mut cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &AmfValue) -> AmfValue {
        let encoded = encode(value).unwrap();
        decode(&encoded).unwrap()
    }

    #[test]
    fn test_scalar_roundtrips() {
        assert_eq!(roundtrip(&AmfValue::Number(42.5)), AmfValue::Number(42.5));
        assert_eq!(
            roundtrip(&AmfValue::Boolean(true)),
            AmfValue::Boolean(true)
        );
        assert_eq!(
            roundtrip(&AmfValue::Boolean(false)),
            AmfValue::Boolean(false)
        );
        assert_eq!(roundtrip(&AmfValue::Null), AmfValue::Null);
        assert_eq!(roundtrip(&AmfValue::Undefined), AmfValue::Undefined);
        assert_eq!(
            roundtrip(&AmfValue::String(String::new())),
            AmfValue::String(String::new())
        );
    }

    #[test]
    fn test_string_roundtrip() {
        let value = AmfValue::String("echo.EchoService.echo".into());
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_long_string_uses_long_marker() {
        let long = "x".repeat(70_000);
        let encoded = encode(&AmfValue::String(long.clone())).unwrap();
        assert_eq!(encoded[0], 0x0C);
        assert_eq!(decode(&encoded).unwrap(), AmfValue::String(long));
    }

    #[test]
    fn test_number_special_values() {
        let decoded = roundtrip(&AmfValue::Number(f64::NAN));
        match decoded {
            AmfValue::Number(n) => assert!(n.is_nan()),
            other => panic!("expected Number, got {:?}", other),
        }
        assert_eq!(
            roundtrip(&AmfValue::Number(f64::INFINITY)),
            AmfValue::Number(f64::INFINITY)
        );
    }

    #[test]
    fn test_object_roundtrip() {
        let mut props = HashMap::new();
        props.insert("operation".to_string(), AmfValue::String("echo".into()));
        props.insert("argCount".to_string(), AmfValue::Number(1.0));
        props.insert("oneway".to_string(), AmfValue::Boolean(false));
        let value = AmfValue::Object(props);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_typed_object_roundtrip() {
        let mut props = HashMap::new();
        props.insert("source".to_string(), AmfValue::String("EchoService".into()));
        props.insert("timestamp".to_string(), AmfValue::Number(0.0));
        let value = AmfValue::TypedObject {
            class_name: "flex.messaging.messages.RemotingMessage".to_string(),
            properties: props,
        };
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_ecma_array_roundtrip() {
        let mut props = HashMap::new();
        props.insert("0".to_string(), AmfValue::String("first".into()));
        props.insert("length".to_string(), AmfValue::Number(1.0));
        let value = AmfValue::EcmaArray(props);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_strict_array_roundtrip() {
        let value = AmfValue::Array(vec![
            AmfValue::Number(1.0),
            AmfValue::String("two".into()),
            AmfValue::Null,
        ]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_nested_objects() {
        let mut inner = HashMap::new();
        inner.insert("city".to_string(), AmfValue::String("Berlin".into()));

        let mut outer = HashMap::new();
        outer.insert("address".to_string(), AmfValue::Object(inner));
        outer.insert("age".to_string(), AmfValue::Number(30.0));

        let value = AmfValue::Object(outer);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_date_roundtrip() {
        let value = AmfValue::Date(1_700_000_000_000.0);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_xml_roundtrip() {
        let value = AmfValue::Xml("<result><status>ok</status></result>".into());
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_integer_encoded_as_number() {
        let encoded = encode(&AmfValue::Integer(42)).unwrap();
        assert_eq!(encoded[0], 0x00);
        assert_eq!(decode(&encoded).unwrap(), AmfValue::Number(42.0));
    }

    #[test]
    fn test_byte_array_escapes_to_amf3() {
        let value = AmfValue::ByteArray(vec![1, 2, 3, 4]);
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded[0], 0x11);
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_reference_decode() {
        let mut props = HashMap::new();
        props.insert("id".to_string(), AmfValue::Number(7.0));
        let obj = AmfValue::Object(props);

        let mut data = encode(&obj).unwrap().to_vec();
        // Reference marker pointing at the object decoded above
        data.extend_from_slice(&[0x07, 0x00, 0x00]);

        let mut decoder = Amf0Decoder::new();
        let mut cursor = &data[..];
        let first = decoder.decode(&mut cursor).unwrap();
        let second = decoder.decode(&mut cursor).unwrap();
        assert_eq!(first, obj);
        assert_eq!(second, obj);
    }

    #[test]
    fn test_reference_out_of_range() {
        let result = decode(&[0x07, 0x00, 0x05]);
        assert!(matches!(result, Err(AmfError::InvalidReference(5))));
    }

    #[test]
    fn test_decoder_reset_clears_references() {
        let mut decoder = Amf0Decoder::new();
        let data = encode(&AmfValue::Object(HashMap::new())).unwrap();
        let mut cursor = &data[..];
        decoder.decode(&mut cursor).unwrap();

        decoder.reset();

        let mut cursor = &[0x07u8, 0x00, 0x00][..];
        let result = decoder.decode(&mut cursor);
        assert!(matches!(result, Err(AmfError::InvalidReference(0))));
    }

    #[test]
    fn test_unknown_marker_rejected() {
        assert!(matches!(
            decode(&[0xFF]),
            Err(AmfError::UnknownMarker(0xFF))
        ));
        // MovieClip is reserved and never valid
        assert!(matches!(
            decode(&[0x04]),
            Err(AmfError::UnknownMarker(0x04))
        ));
    }

    #[test]
    fn test_unsupported_marker_reads_as_undefined() {
        assert_eq!(decode(&[0x0D]).unwrap(), AmfValue::Undefined);
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert!(matches!(decode(&[]), Err(AmfError::UnexpectedEof)));
    }

    #[test]
    fn test_decode_truncated_number() {
        let result = decode(&[0x00, 0x40, 0x45]);
        assert!(matches!(result, Err(AmfError::UnexpectedEof)));
    }

    #[test]
    fn test_decode_truncated_string() {
        // Length prefix says 16 bytes but none follow
        let result = decode(&[0x02, 0x00, 0x10]);
        assert!(matches!(result, Err(AmfError::UnexpectedEof)));
    }

    #[test]
    fn test_object_missing_end_marker() {
        // Object, one property, empty key, then nothing
        let data = [0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00];
        assert!(matches!(decode(&data), Err(AmfError::UnexpectedEof)));
    }

    #[test]
    fn test_object_wrong_end_marker() {
        // Empty key followed by a marker that is not 0x09
        let data = [0x03, 0x00, 0x00, 0x08];
        assert!(matches!(decode(&data), Err(AmfError::InvalidObjectEnd)));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let mut nested = AmfValue::Object(HashMap::new());
        for _ in 0..70 {
            let mut wrapper = HashMap::new();
            wrapper.insert("nested".to_string(), nested);
            nested = AmfValue::Object(wrapper);
        }

        let encoded = encode(&nested).unwrap();
        assert!(matches!(
            decode(&encoded),
            Err(AmfError::NestingTooDeep)
        ));
    }

    #[test]
    fn test_oversized_key_rejected_on_encode() {
        let mut props = HashMap::new();
        props.insert("k".repeat(70_000), AmfValue::Null);
        let result = encode(&AmfValue::Object(props));
        assert!(matches!(result, Err(AmfError::StringTooLong(70_000))));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        // String of length 2 carrying a broken UTF-8 sequence
        let result = decode(&[0x02, 0x00, 0x02, 0xC3, 0x28]);
        assert!(matches!(result, Err(AmfError::InvalidUtf8)));
    }
}
