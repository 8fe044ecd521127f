//! AMF value tree
//!
//! AMF0 and AMF3 differ on the wire but describe the same value space, so
//! both codecs in this crate decode into and encode from this one enum.
//! Remoting peers exchange these as header values and body payloads; the
//! bridge itself never looks inside them.

use std::collections::HashMap;

/// A single AMF value of either encoding generation.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    /// Null (AMF0 0x05, AMF3 0x01)
    Null,

    /// Undefined (AMF0 0x06, AMF3 0x00)
    Undefined,

    /// Boolean (AMF0 0x01, AMF3 0x02/0x03)
    Boolean(bool),

    /// IEEE 754 double (AMF0 0x00, AMF3 0x05)
    Number(f64),

    /// 29-bit signed integer (AMF3 0x04). AMF0 has no integer type and
    /// writes these as Number.
    Integer(i32),

    /// UTF-8 string, long or short form (AMF0 0x02/0x0C, AMF3 0x06)
    String(String),

    /// Dense array (AMF0 strict array 0x0A, AMF3 array 0x09 dense part)
    Array(Vec<AmfValue>),

    /// Anonymous object; keys are always strings (AMF0 0x03, AMF3 0x0A)
    Object(HashMap<String, AmfValue>),

    /// Object carrying a class alias, e.g. `flex.messaging.messages.RemotingMessage`
    TypedObject {
        class_name: String,
        properties: HashMap<String, AmfValue>,
    },

    /// Associative array (AMF0 ECMA array 0x08; AMF3 arrays with string keys)
    EcmaArray(HashMap<String, AmfValue>),

    /// Milliseconds since the Unix epoch, UTC (AMF0 0x0B, AMF3 0x08)
    Date(f64),

    /// XML document body (AMF0 0x0F, AMF3 0x07/0x0B)
    Xml(String),

    /// Raw bytes (AMF3 only, 0x0C)
    ByteArray(Vec<u8>),
}

impl AmfValue {
    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmfValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric contents; integers widen to f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AmfValue::Number(n) => Some(*n),
            AmfValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Boolean contents, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AmfValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Property map of any object-shaped value.
    pub fn as_object(&self) -> Option<&HashMap<String, AmfValue>> {
        match self {
            AmfValue::Object(m) => Some(m),
            AmfValue::EcmaArray(m) => Some(m),
            AmfValue::TypedObject { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Element list, if this is a dense array.
    pub fn as_array(&self) -> Option<&[AmfValue]> {
        match self {
            AmfValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, AmfValue::Null | AmfValue::Undefined)
    }

    /// Property lookup on any object-shaped value.
    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        self.as_object()?.get(key)
    }

    /// String property lookup on any object-shaped value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
}

impl Default for AmfValue {
    fn default() -> Self {
        AmfValue::Null
    }
}

impl From<bool> for AmfValue {
    fn from(v: bool) -> Self {
        AmfValue::Boolean(v)
    }
}

impl From<f64> for AmfValue {
    fn from(v: f64) -> Self {
        AmfValue::Number(v)
    }
}

impl From<i32> for AmfValue {
    fn from(v: i32) -> Self {
        AmfValue::Integer(v)
    }
}

impl From<String> for AmfValue {
    fn from(v: String) -> Self {
        AmfValue::String(v)
    }
}

impl From<&str> for AmfValue {
    fn from(v: &str) -> Self {
        AmfValue::String(v.to_string())
    }
}
