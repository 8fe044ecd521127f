//! Unified error types for amf-bridge

use std::fmt;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all bridge operations
#[derive(Debug)]
pub enum Error {
    /// Buffer-to-envelope decoding failure
    Decode(DecodeError),
    /// Envelope-to-buffer encoding failure
    Encode(EncodeError),
    /// AMF codec error outside a bridge call
    Amf(AmfError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode(e) => write!(f, "Decode error: {}", e),
            Error::Encode(e) => write!(f, "Encode error: {}", e),
            Error::Amf(e) => write!(f, "AMF error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Amf(e) => Some(e),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::Encode(err)
    }
}

impl From<AmfError> for Error {
    fn from(err: AmfError) -> Self {
        Error::Amf(err)
    }
}

/// Errors raised while decoding a wire buffer into an envelope
#[derive(Debug)]
pub enum DecodeError {
    /// The (offset, len) view does not fit inside the backing array
    BufferOutOfRange {
        offset: usize,
        len: usize,
        backing: usize,
    },
    /// A complete packet parsed but bytes were left over
    TrailingBytes { remaining: usize },
    Amf(AmfError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::BufferOutOfRange {
                offset,
                len,
                backing,
            } => write!(
                f,
                "Buffer view out of range: offset {} + len {} exceeds backing array of {} bytes",
                offset, len, backing
            ),
            DecodeError::TrailingBytes { remaining } => {
                write!(f, "{} trailing bytes after a complete AMF packet", remaining)
            }
            DecodeError::Amf(e) => write!(f, "Malformed AMF payload: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Amf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AmfError> for DecodeError {
    fn from(err: AmfError) -> Self {
        DecodeError::Amf(err)
    }
}

/// Errors raised while encoding an envelope into a wire buffer
#[derive(Debug)]
pub enum EncodeError {
    /// The envelope carries no AMF packet under the expected property key
    MissingAmfProperty,
    /// Offset plus serialized length exceeds the pipeline's declared ceiling
    MessageTooLarge { size: usize, max: usize },
    Amf(AmfError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::MissingAmfProperty => {
                write!(f, "Envelope has no AMF packet property")
            }
            EncodeError::MessageTooLarge { size, max } => {
                write!(f, "Message too large: {} bytes (max {})", size, max)
            }
            EncodeError::Amf(e) => write!(f, "AMF serialization failed: {}", e),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Amf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AmfError> for EncodeError {
    fn from(err: AmfError) -> Self {
        EncodeError::Amf(err)
    }
}

/// AMF codec errors
#[derive(Debug)]
pub enum AmfError {
    UnexpectedEof,
    UnknownMarker(u8),
    InvalidUtf8,
    InvalidReference(u32),
    NestingTooDeep,
    InvalidObjectEnd,
    /// Packet version tag other than 0 (AMF0) or 3 (AMF3)
    UnsupportedVersion(u16),
    /// AMF3 externalizable trait; carries the class name
    Externalizable(String),
    /// A string or byte payload exceeds its length field
    StringTooLong(usize),
    /// An entry count exceeds its count field
    TooManyEntries(usize),
}

impl fmt::Display for AmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmfError::UnexpectedEof => write!(f, "Unexpected end of AMF data"),
            AmfError::UnknownMarker(m) => write!(f, "Unknown AMF marker: 0x{:02x}", m),
            AmfError::InvalidUtf8 => write!(f, "Invalid UTF-8 in AMF string"),
            AmfError::InvalidReference(idx) => write!(f, "Invalid AMF reference: {}", idx),
            AmfError::NestingTooDeep => write!(f, "AMF nesting too deep"),
            AmfError::InvalidObjectEnd => write!(f, "Invalid object end marker"),
            AmfError::UnsupportedVersion(v) => write!(f, "Unsupported AMF packet version: {}", v),
            AmfError::Externalizable(class) => {
                write!(f, "Externalizable class not supported: {}", class)
            }
            AmfError::StringTooLong(len) => {
                write!(f, "String of {} bytes exceeds its length field", len)
            }
            AmfError::TooManyEntries(count) => {
                write!(f, "{} entries exceed the count field", count)
            }
        }
    }
}

impl std::error::Error for AmfError {}
