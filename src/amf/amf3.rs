//! AMF3 value encoder and decoder
//!
//! AMF3 is the ActionScript 3.0 generation of the format: native integers,
//! U29 variable-length headers, and string/object/trait reference tables.
//! Flex-era remoting clients carry their bodies in AMF3, reached from an
//! AMF0 stream through the 0x11 escape marker.
//!
//! Type Markers:
//! ```text
//! 0x00 - Undefined
//! 0x01 - Null
//! 0x02 - Boolean false
//! 0x03 - Boolean true
//! 0x04 - Integer (29-bit signed)
//! 0x05 - Double
//! 0x06 - String
//! 0x07 - XML Document (legacy)
//! 0x08 - Date
//! 0x09 - Array
//! 0x0A - Object
//! 0x0B - XML
//! 0x0C - ByteArray
//! ```
//!
//! Vector and dictionary markers (0x0D..0x11) are rejected as unknown.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;

use super::value::AmfValue;
use crate::error::AmfError;

// AMF3 type markers
const MARKER_UNDEFINED: u8 = 0x00;
const MARKER_NULL: u8 = 0x01;
const MARKER_FALSE: u8 = 0x02;
const MARKER_TRUE: u8 = 0x03;
const MARKER_INTEGER: u8 = 0x04;
const MARKER_DOUBLE: u8 = 0x05;
const MARKER_STRING: u8 = 0x06;
const MARKER_XML_DOC: u8 = 0x07;
const MARKER_DATE: u8 = 0x08;
const MARKER_ARRAY: u8 = 0x09;
const MARKER_OBJECT: u8 = 0x0A;
const MARKER_XML: u8 = 0x0B;
const MARKER_BYTE_ARRAY: u8 = 0x0C;

/// Maximum nesting depth for objects/arrays (prevent stack overflow)
const MAX_NESTING_DEPTH: usize = 64;

/// 29-bit signed integer bounds
const AMF3_INT_MAX: i32 = 0x0FFF_FFFF;
const AMF3_INT_MIN: i32 = -0x1000_0000;

/// Largest byte length a U29 length header can carry
const MAX_U29_LENGTH: usize = 0x0FFF_FFFF;

/// Object header bit layout, low to high: value-inline, trait-inline,
/// externalizable, dynamic; sealed property count above.
const HEADER_VALUE_INLINE: u32 = 0x01;
const HEADER_TRAIT_INLINE: u32 = 0x02;
const HEADER_EXTERNALIZABLE: u32 = 0x04;
const HEADER_DYNAMIC: u32 = 0x08;

/// AMF3 decoder
///
/// Reference tables persist across calls until [`reset`](Self::reset), so
/// one decoder instance services all values of one packet.
pub struct Amf3Decoder {
    string_refs: Vec<String>,
    object_refs: Vec<AmfValue>,
    trait_refs: Vec<TraitDef>,
    depth: usize,
}

/// Shape of an AMF3 object: class name, sealed member names, dynamic flag.
#[derive(Clone, Debug)]
struct TraitDef {
    class_name: String,
    is_dynamic: bool,
    sealed: Vec<String>,
}

impl Amf3Decoder {
    pub fn new() -> Self {
        Self {
            string_refs: Vec::new(),
            object_refs: Vec::new(),
            trait_refs: Vec::new(),
            depth: 0,
        }
    }

    /// Clear reference tables and depth (call between packets).
    pub fn reset(&mut self) {
        self.string_refs.clear();
        self.object_refs.clear();
        self.trait_refs.clear();
        self.depth = 0;
    }

    /// Decode a single AMF3 value, advancing the cursor past it.
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
            MARKER_UNDEFINED => Ok(AmfValue::Undefined),
            MARKER_NULL => Ok(AmfValue::Null),
            MARKER_FALSE => Ok(AmfValue::Boolean(false)),
            MARKER_TRUE => Ok(AmfValue::Boolean(true)),
            MARKER_INTEGER => self.decode_integer(buf),
            MARKER_DOUBLE => {
                if buf.remaining() < 8 {
                    return Err(AmfError::UnexpectedEof);
                }
                Ok(AmfValue::Number(buf.get_f64()))
            }
            MARKER_STRING => Ok(AmfValue::String(self.read_string(buf)?)),
            MARKER_DATE => self.decode_date(buf),
            MARKER_ARRAY => self.decode_array(buf),
            MARKER_OBJECT => self.decode_object(buf),
            MARKER_BYTE_ARRAY => self.decode_byte_array(buf),
            MARKER_XML | MARKER_XML_DOC => self.decode_xml(buf),
            _ => Err(AmfError::UnknownMarker(marker)),
        }
    }

    fn decode_integer<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let value = read_u29(buf)?;
        // Sign-extend from 29 bits
        let signed = if value & 0x1000_0000 != 0 {
            (value | 0xE000_0000) as i32
        } else {
            value as i32
        };
        Ok(AmfValue::Integer(signed))
    }

    fn decode_date<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let header = read_u29(buf)?;
        if header & HEADER_VALUE_INLINE == 0 {
            return self.object_by_ref(header >> 1);
        }
        if buf.remaining() < 8 {
            return Err(AmfError::UnexpectedEof);
        }
        let value = AmfValue::Date(buf.get_f64());
        self.object_refs.push(value.clone());
        Ok(value)
    }

    fn decode_array<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let header = read_u29(buf)?;
        if header & HEADER_VALUE_INLINE == 0 {
            return self.object_by_ref(header >> 1);
        }
        let dense_count = (header >> 1) as usize;

        // Register before decoding so nested references can point here
        let slot = self.object_refs.len();
        self.object_refs.push(AmfValue::Null);

        // Associative portion: key/value pairs until the empty key
        let mut assoc = HashMap::new();
        loop {
            let key = self.read_string(buf)?;
            if key.is_empty() {
                break;
            }
            assoc.insert(key, self.decode(buf)?);
        }

        let mut dense = Vec::with_capacity(dense_count.min(1024));
        for _ in 0..dense_count {
            dense.push(self.decode(buf)?);
        }

        let value = if assoc.is_empty() {
            AmfValue::Array(dense)
        } else if dense.is_empty() {
            AmfValue::EcmaArray(assoc)
        } else {
            // Mixed array; fold dense values in under their index keys
            for (i, v) in dense.into_iter().enumerate() {
                assoc.insert(i.to_string(), v);
            }
            AmfValue::EcmaArray(assoc)
        };

        self.object_refs[slot] = value.clone();
        Ok(value)
    }

    fn decode_object<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let header = read_u29(buf)?;
        if header & HEADER_VALUE_INLINE == 0 {
            return self.object_by_ref(header >> 1);
        }

        let slot = self.object_refs.len();
        self.object_refs.push(AmfValue::Null);

        let trait_def = if header & HEADER_TRAIT_INLINE == 0 {
            let idx = header >> 2;
            match self.trait_refs.get(idx as usize) {
                Some(t) => t.clone(),
                None => return Err(AmfError::InvalidReference(idx)),
            }
        } else if header & HEADER_EXTERNALIZABLE != 0 {
            // Externalizable bodies need a per-class decoder registry
            let class_name = self.read_string(buf)?;
            return Err(AmfError::Externalizable(class_name));
        } else {
            let is_dynamic = header & HEADER_DYNAMIC != 0;
            let sealed_count = (header >> 4) as usize;

            let class_name = self.read_string(buf)?;
            let mut sealed = Vec::with_capacity(sealed_count.min(1024));
            for _ in 0..sealed_count {
                sealed.push(self.read_string(buf)?);
            }

            let trait_def = TraitDef {
                class_name,
                is_dynamic,
                sealed,
            };
            self.trait_refs.push(trait_def.clone());
            trait_def
        };

        let mut props = HashMap::new();
        for name in &trait_def.sealed {
            props.insert(name.clone(), self.decode(buf)?);
        }
        if trait_def.is_dynamic {
            loop {
                let key = self.read_string(buf)?;
                if key.is_empty() {
                    break;
                }
                props.insert(key, self.decode(buf)?);
            }
        }

        let value = if trait_def.class_name.is_empty() {
            AmfValue::Object(props)
        } else {
            AmfValue::TypedObject {
                class_name: trait_def.class_name,
                properties: props,
            }
        };

        self.object_refs[slot] = value.clone();
        Ok(value)
    }

    fn decode_byte_array<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let header = read_u29(buf)?;
        if header & HEADER_VALUE_INLINE == 0 {
            return self.object_by_ref(header >> 1);
        }
        let len = (header >> 1) as usize;
        if buf.remaining() < len {
            return Err(AmfError::UnexpectedEof);
        }
        let mut data = vec![0u8; len];
        buf.copy_to_slice(&mut data);

        let value = AmfValue::ByteArray(data);
        self.object_refs.push(value.clone());
        Ok(value)
    }

    fn decode_xml<B: Buf>(&mut self, buf: &mut B) -> Result<AmfValue, AmfError> {
        let header = read_u29(buf)?;
        if header & HEADER_VALUE_INLINE == 0 {
            return self.object_by_ref(header >> 1);
        }
        let len = (header >> 1) as usize;
        if buf.remaining() < len {
            return Err(AmfError::UnexpectedEof);
        }
        let mut bytes = vec![0u8; len];
        buf.copy_to_slice(&mut bytes);
        let s = String::from_utf8(bytes).map_err(|_| AmfError::InvalidUtf8)?;

        let value = AmfValue::Xml(s);
        self.object_refs.push(value.clone());
        Ok(value)
    }

    /// AMF3 string: U29 header, low bit clear means a table reference.
    fn read_string<B: Buf>(&mut self, buf: &mut B) -> Result<String, AmfError> {
        let header = read_u29(buf)?;
        if header & HEADER_VALUE_INLINE == 0 {
            let idx = header >> 1;
            return match self.string_refs.get(idx as usize) {
                Some(s) => Ok(s.clone()),
                None => Err(AmfError::InvalidReference(idx)),
            };
        }

        let len = (header >> 1) as usize;
        if len == 0 {
            return Ok(String::new());
        }
        if buf.remaining() < len {
            return Err(AmfError::UnexpectedEof);
        }
        let mut bytes = vec![0u8; len];
        buf.copy_to_slice(&mut bytes);
        let s = String::from_utf8(bytes).map_err(|_| AmfError::InvalidUtf8)?;

        // Only non-empty strings enter the reference table
        self.string_refs.push(s.clone());
        Ok(s)
    }

    fn object_by_ref(&self, idx: u32) -> Result<AmfValue, AmfError> {
        match self.object_refs.get(idx as usize) {
            Some(value) => Ok(value.clone()),
            None => Err(AmfError::InvalidReference(idx)),
        }
    }
}

impl Default for Amf3Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// AMF3 encoder writing into a caller-supplied buffer
///
/// Emits strings through the reference table; objects and traits are always
/// written inline, which any conforming decoder accepts.
pub struct Amf3Encoder {
    string_refs: HashMap<String, u32>,
}

impl Amf3Encoder {
    pub fn new() -> Self {
        Self {
            string_refs: HashMap::new(),
        }
    }

    /// Clear the string reference table (call between packets).
    pub fn reset(&mut self) {
        self.string_refs.clear();
    }

    /// Encode a single value in AMF3.
    pub fn encode(&mut self, buf: &mut BytesMut, value: &AmfValue) -> Result<(), AmfError> {
        match value {
            AmfValue::Undefined => buf.put_u8(MARKER_UNDEFINED),
            AmfValue::Null => buf.put_u8(MARKER_NULL),
            AmfValue::Boolean(false) => buf.put_u8(MARKER_FALSE),
            AmfValue::Boolean(true) => buf.put_u8(MARKER_TRUE),
            AmfValue::Integer(i) if (AMF3_INT_MIN..=AMF3_INT_MAX).contains(i) => {
                buf.put_u8(MARKER_INTEGER);
                write_u29(buf, *i as u32 & 0x1FFF_FFFF);
            }
            AmfValue::Integer(i) => {
                // Out of 29-bit range; falls back to double
                buf.put_u8(MARKER_DOUBLE);
                buf.put_f64(*i as f64);
            }
            AmfValue::Number(n) => {
                buf.put_u8(MARKER_DOUBLE);
                buf.put_f64(*n);
            }
            AmfValue::String(s) => {
                buf.put_u8(MARKER_STRING);
                self.write_string(buf, s)?;
            }
            AmfValue::Array(elements) => {
                buf.put_u8(MARKER_ARRAY);
                write_u29(buf, count_header(elements.len())?);
                // Empty associative portion
                self.write_string(buf, "")?;
                for elem in elements {
                    self.encode(buf, elem)?;
                }
            }
            AmfValue::EcmaArray(props) => {
                // Associative-only array: zero dense elements
                buf.put_u8(MARKER_ARRAY);
                write_u29(buf, 1);
                for (key, val) in props {
                    self.write_string(buf, key)?;
                    self.encode(buf, val)?;
                }
                self.write_string(buf, "")?;
            }
            AmfValue::Object(props) => {
                buf.put_u8(MARKER_OBJECT);
                self.write_dynamic_object(buf, "", props)?;
            }
            AmfValue::TypedObject {
                class_name,
                properties,
            } => {
                buf.put_u8(MARKER_OBJECT);
                self.write_dynamic_object(buf, class_name, properties)?;
            }
            AmfValue::Date(timestamp) => {
                buf.put_u8(MARKER_DATE);
                write_u29(buf, HEADER_VALUE_INLINE);
                buf.put_f64(*timestamp);
            }
            AmfValue::Xml(s) => {
                buf.put_u8(MARKER_XML);
                write_u29(buf, length_header(s.len())?);
                buf.put_slice(s.as_bytes());
            }
            AmfValue::ByteArray(data) => {
                buf.put_u8(MARKER_BYTE_ARRAY);
                write_u29(buf, length_header(data.len())?);
                buf.put_slice(data);
            }
        }
        Ok(())
    }

    /// Inline trait, zero sealed members, dynamic; properties follow as
    /// key/value pairs closed by the empty key.
    fn write_dynamic_object(
        &mut self,
        buf: &mut BytesMut,
        class_name: &str,
        props: &HashMap<String, AmfValue>,
    ) -> Result<(), AmfError> {
        write_u29(
            buf,
            HEADER_VALUE_INLINE | HEADER_TRAIT_INLINE | HEADER_DYNAMIC,
        );
        self.write_string(buf, class_name)?;
        for (key, val) in props {
            self.write_string(buf, key)?;
            self.encode(buf, val)?;
        }
        self.write_string(buf, "")
    }

    fn write_string(&mut self, buf: &mut BytesMut, s: &str) -> Result<(), AmfError> {
        if s.is_empty() {
            write_u29(buf, HEADER_VALUE_INLINE);
            return Ok(());
        }
        if let Some(&idx) = self.string_refs.get(s) {
            write_u29(buf, idx << 1);
            return Ok(());
        }
        let idx = self.string_refs.len() as u32;
        self.string_refs.insert(s.to_string(), idx);
        write_u29(buf, length_header(s.len())?);
        buf.put_slice(s.as_bytes());
        Ok(())
    }
}

impl Default for Amf3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a U29 variable-length integer: up to three 7-bit groups with a
/// continuation bit, then a full fourth byte.
fn read_u29<B: Buf>(buf: &mut B) -> Result<u32, AmfError> {
    let mut value: u32 = 0;
    for _ in 0..3 {
        if !buf.has_remaining() {
            return Err(AmfError::UnexpectedEof);
        }
        let byte = buf.get_u8();
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    if !buf.has_remaining() {
        return Err(AmfError::UnexpectedEof);
    }
    Ok((value << 8) | u32::from(buf.get_u8()))
}

/// Write a U29 variable-length integer.
fn write_u29(buf: &mut BytesMut, value: u32) {
    let value = value & 0x1FFF_FFFF;
    if value < 0x80 {
        buf.put_u8(value as u8);
    } else if value < 0x4000 {
        buf.put_u8((value >> 7) as u8 | 0x80);
        buf.put_u8((value & 0x7F) as u8);
    } else if value < 0x20_0000 {
        buf.put_u8((value >> 14) as u8 | 0x80);
        buf.put_u8((value >> 7) as u8 & 0x7F | 0x80);
        buf.put_u8((value & 0x7F) as u8);
    } else {
        buf.put_u8((value >> 22) as u8 | 0x80);
        buf.put_u8((value >> 15) as u8 & 0x7F | 0x80);
        buf.put_u8((value >> 8) as u8 & 0x7F | 0x80);
        buf.put_u8((value & 0xFF) as u8);
    }
}

/// U29 length header for an inline value: `len << 1 | 1`.
fn length_header(len: usize) -> Result<u32, AmfError> {
    if len > MAX_U29_LENGTH {
        return Err(AmfError::StringTooLong(len));
    }
    Ok((len as u32) << 1 | 1)
}

/// U29 element-count header for a dense array: `count << 1 | 1`.
fn count_header(count: usize) -> Result<u32, AmfError> {
    if count > MAX_U29_LENGTH {
        return Err(AmfError::TooManyEntries(count));
    }
    Ok((count as u32) << 1 | 1)
}

/// Encode a single value to a fresh byte buffer.
pub fn encode(value: &AmfValue) -> Result<Bytes, AmfError> {
    let mut encoder = Amf3Encoder::new();
    let mut buf = BytesMut::new();
    encoder.encode(&mut buf, value)?;
    Ok(buf.freeze())
}

/// Decode a single value from a byte slice.
pub fn decode(data: &[u8]) -> Result<AmfValue, AmfError> {
    let mut decoder = Amf3Decoder::new();
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
    fn test_u29_boundaries() {
        let mut buf = BytesMut::new();
        let cases = [0u32, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, 0x1FFF_FFFF];
        for v in cases {
            write_u29(&mut buf, v);
        }

        let frozen = buf.freeze();
        let mut cursor = &frozen[..];
        for v in cases {
            assert_eq!(read_u29(&mut cursor).unwrap(), v);
        }
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_u29_truncated() {
        // Continuation bit set but nothing follows
        let mut cursor = &[0x80u8][..];
        assert!(matches!(
            read_u29(&mut cursor),
            Err(AmfError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_scalar_roundtrips() {
        assert_eq!(roundtrip(&AmfValue::Null), AmfValue::Null);
        assert_eq!(roundtrip(&AmfValue::Undefined), AmfValue::Undefined);
        assert_eq!(
            roundtrip(&AmfValue::Boolean(true)),
            AmfValue::Boolean(true)
        );
        assert_eq!(
            roundtrip(&AmfValue::Boolean(false)),
            AmfValue::Boolean(false)
        );
        assert_eq!(roundtrip(&AmfValue::Number(2.5)), AmfValue::Number(2.5));
    }

    #[test]
    fn test_integer_sign_range() {
        for v in [0, 1, -1, 1000, -1000, AMF3_INT_MAX, AMF3_INT_MIN] {
            assert_eq!(roundtrip(&AmfValue::Integer(v)), AmfValue::Integer(v));
        }
    }

    #[test]
    fn test_integer_out_of_range_becomes_double() {
        let encoded = encode(&AmfValue::Integer(AMF3_INT_MAX + 1)).unwrap();
        assert_eq!(encoded[0], MARKER_DOUBLE);
        assert_eq!(
            decode(&encoded).unwrap(),
            AmfValue::Number((AMF3_INT_MAX as f64) + 1.0)
        );
    }

    #[test]
    fn test_string_roundtrip() {
        let value = AmfValue::String("echo.EchoService".into());
        assert_eq!(roundtrip(&value), value);
        assert_eq!(
            roundtrip(&AmfValue::String(String::new())),
            AmfValue::String(String::new())
        );
    }

    #[test]
    fn test_string_reference_reuse() {
        let repeated = AmfValue::Array(vec![
            AmfValue::String("responder".into()),
            AmfValue::String("responder".into()),
        ]);
        let encoded = encode(&repeated).unwrap();
        assert_eq!(decode(&encoded).unwrap(), repeated);

        // Second occurrence is a 2-byte reference (marker + ref header)
        // instead of marker + header + 9 bytes of payload
        let naive = 1 + 1 + (1 + 1 + 9) * 2;
        assert!(encoded.len() < naive);
    }

    #[test]
    fn test_dynamic_object_roundtrip() {
        let mut props = HashMap::new();
        props.insert("operation".to_string(), AmfValue::String("echo".into()));
        props.insert("count".to_string(), AmfValue::Integer(3));
        let value = AmfValue::Object(props);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_typed_object_roundtrip() {
        let mut props = HashMap::new();
        props.insert("destination".to_string(), AmfValue::String("echo".into()));
        props.insert("body".to_string(), AmfValue::String("hello".into()));
        let value = AmfValue::TypedObject {
            class_name: "flex.messaging.messages.RemotingMessage".to_string(),
            properties: props,
        };
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_dense_array_roundtrip() {
        let value = AmfValue::Array(vec![
            AmfValue::Integer(1),
            AmfValue::String("two".into()),
            AmfValue::Null,
        ]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_ecma_array_roundtrip() {
        let mut props = HashMap::new();
        props.insert("first".to_string(), AmfValue::Integer(1));
        props.insert("second".to_string(), AmfValue::Boolean(true));
        let value = AmfValue::EcmaArray(props);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_mixed_array_decodes_as_ecma() {
        // Dense element plus an associative key, hand-built
        let mut buf = BytesMut::new();
        buf.put_u8(MARKER_ARRAY);
        write_u29(&mut buf, (1 << 1) | 1); // one dense element
        write_u29(&mut buf, (4 << 1) | 1); // assoc key "name"
        buf.put_slice(b"name");
        buf.put_u8(MARKER_TRUE);
        write_u29(&mut buf, 1); // end of associative portion
        buf.put_u8(MARKER_NULL); // dense element 0

        let decoded = decode(&buf).unwrap();
        let props = decoded.as_object().expect("ecma array");
        assert_eq!(props.get("name"), Some(&AmfValue::Boolean(true)));
        assert_eq!(props.get("0"), Some(&AmfValue::Null));
    }

    #[test]
    fn test_date_roundtrip() {
        let value = AmfValue::Date(1_700_000_000_000.0);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_xml_roundtrip() {
        let value = AmfValue::Xml("<amfx><body/></amfx>".into());
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_byte_array_roundtrip() {
        let value = AmfValue::ByteArray(vec![0x00, 0xFF, 0x7F, 0x80]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_object_reference_decode() {
        let mut props = HashMap::new();
        props.insert("id".to_string(), AmfValue::Integer(9));
        let obj = AmfValue::Object(props);

        let mut data = encode(&obj).unwrap().to_vec();
        // Object marker with a reference header pointing at index 0
        data.extend_from_slice(&[MARKER_OBJECT, 0x00]);

        let mut decoder = Amf3Decoder::new();
        let mut cursor = &data[..];
        let first = decoder.decode(&mut cursor).unwrap();
        let second = decoder.decode(&mut cursor).unwrap();
        assert_eq!(first, obj);
        assert_eq!(second, obj);
    }

    #[test]
    fn test_invalid_reference() {
        // String marker with reference header pointing at an empty table
        let result = decode(&[MARKER_STRING, 0x04]);
        assert!(matches!(result, Err(AmfError::InvalidReference(2))));
    }

    #[test]
    fn test_externalizable_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u8(MARKER_OBJECT);
        write_u29(
            &mut buf,
            HEADER_VALUE_INLINE | HEADER_TRAIT_INLINE | HEADER_EXTERNALIZABLE,
        );
        write_u29(&mut buf, (1 << 1) | 1);
        buf.put_slice(b"X");

        let result = decode(&buf);
        match result {
            Err(AmfError::Externalizable(class)) => assert_eq!(class, "X"),
            other => panic!("expected externalizable rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_marker_rejected() {
        assert!(matches!(
            decode(&[0x0D]),
            Err(AmfError::UnknownMarker(0x0D))
        ));
    }

    #[test]
    fn test_truncated_double() {
        assert!(matches!(
            decode(&[MARKER_DOUBLE, 0x40, 0x09]),
            Err(AmfError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let mut nested = AmfValue::Array(vec![]);
        for _ in 0..70 {
            nested = AmfValue::Array(vec![nested]);
        }
        let encoded = encode(&nested).unwrap();
        assert!(matches!(
            decode(&encoded),
            Err(AmfError::NestingTooDeep)
        ));
    }

    #[test]
    fn test_decoder_reset_clears_references() {
        let mut decoder = Amf3Decoder::new();
        let data = encode(&AmfValue::String("cached".into())).unwrap();
        let mut cursor = &data[..];
        decoder.decode(&mut cursor).unwrap();

        decoder.reset();

        // Reference to string index 0 no longer resolves
        let mut cursor = &[MARKER_STRING, 0x00][..];
        assert!(matches!(
            decoder.decode(&mut cursor),
            Err(AmfError::InvalidReference(0))
        ));
    }
}
