//! AMF packet framing
//!
//! A remoting request or response travels as a packet: a version word,
//! a run of context headers, then a run of message bodies.
//!
//! Wire layout (all integers big-endian):
//! ```text
//! u16 version        0 = AMF0 values, 3 = AMF3-capable client
//! u16 header count
//! per header:
//!   UTF-8 name       u16 length prefix
//!   u8  must-understand
//!   u32 advisory byte length (unreliable, ignored on read)
//!   value
//! u16 body count
//! per body:
//!   UTF-8 target URI
//!   UTF-8 response URI
//!   u32 advisory byte length
//!   value
//! ```
//!
//! Values always start in AMF0 regardless of the packet version; a
//! version 3 packet reaches AMF3 through the 0x11 escape marker. One
//! reference table set spans the whole packet.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::amf0::{self, Amf0Decoder, Amf0Encoder};
use super::value::AmfValue;
use crate::error::AmfError;

/// Advisory length written for headers and bodies. Real lengths are
/// only known after encoding, so the unknown sentinel goes out instead;
/// every consumer is required to ignore the field.
pub const UNKNOWN_CONTENT_LENGTH: u32 = 0xFFFF_FFFF;

/// Packet-level format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmfVersion {
    /// ActionScript 1/2 clients, plain AMF0 values
    #[default]
    Amf0,
    /// ActionScript 3 clients, values escape to AMF3
    Amf3,
}

impl TryFrom<u16> for AmfVersion {
    type Error = AmfError;

    fn try_from(raw: u16) -> Result<Self, AmfError> {
        match raw {
            0 => Ok(Self::Amf0),
            3 => Ok(Self::Amf3),
            other => Err(AmfError::UnsupportedVersion(other)),
        }
    }
}

impl From<AmfVersion> for u16 {
    fn from(version: AmfVersion) -> u16 {
        match version {
            AmfVersion::Amf0 => 0,
            AmfVersion::Amf3 => 3,
        }
    }
}

/// A complete remoting packet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AmfPacket {
    pub version: AmfVersion,
    pub headers: Vec<AmfHeader>,
    pub bodies: Vec<AmfBody>,
}

impl AmfPacket {
    pub fn new(version: AmfVersion) -> Self {
        Self {
            version,
            headers: Vec::new(),
            bodies: Vec::new(),
        }
    }
}

/// Out-of-band context attached to a packet (credentials, debug flags).
#[derive(Debug, Clone, PartialEq)]
pub struct AmfHeader {
    pub name: String,
    /// Receiver must reject the packet if it cannot process this header
    pub must_understand: bool,
    pub value: AmfValue,
}

impl AmfHeader {
    pub fn new(name: impl Into<String>, must_understand: bool, value: AmfValue) -> Self {
        Self {
            name: name.into(),
            must_understand,
            value,
        }
    }
}

/// One remote invocation or its result.
#[derive(Debug, Clone, PartialEq)]
pub struct AmfBody {
    /// Service and method for requests, response routing key for replies
    pub target_uri: String,
    /// Client-chosen key the reply targets, e.g. "/1"
    pub response_uri: String,
    pub value: AmfValue,
}

impl AmfBody {
    pub fn new(
        target_uri: impl Into<String>,
        response_uri: impl Into<String>,
        value: AmfValue,
    ) -> Self {
        Self {
            target_uri: target_uri.into(),
            response_uri: response_uri.into(),
            value,
        }
    }
}

/// Packet reader. Reference tables reset at each packet boundary.
pub struct PacketDecoder {
    values: Amf0Decoder,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self {
            values: Amf0Decoder::new(),
        }
    }

    /// Decode one packet, advancing the cursor past it. Bytes left behind
    /// the cursor are the caller's concern.
    pub fn decode<B: Buf>(&mut self, buf: &mut B) -> Result<AmfPacket, AmfError> {
        self.values.reset();

        if buf.remaining() < 2 {
            return Err(AmfError::UnexpectedEof);
        }
        let version = AmfVersion::try_from(buf.get_u16())?;

        let header_count = read_count(buf)?;
        let mut headers = Vec::with_capacity(header_count.min(64));
        for _ in 0..header_count {
            headers.push(self.decode_header(buf)?);
        }

        let body_count = read_count(buf)?;
        let mut bodies = Vec::with_capacity(body_count.min(64));
        for _ in 0..body_count {
            bodies.push(self.decode_body(buf)?);
        }

        Ok(AmfPacket {
            version,
            headers,
            bodies,
        })
    }

    fn decode_header<B: Buf>(&mut self, buf: &mut B) -> Result<AmfHeader, AmfError> {
        let name = amf0::read_utf8(buf)?;
        if !buf.has_remaining() {
            return Err(AmfError::UnexpectedEof);
        }
        let must_understand = buf.get_u8() != 0;
        skip_advisory_length(buf)?;
        let value = self.values.decode(buf)?;
        Ok(AmfHeader {
            name,
            must_understand,
            value,
        })
    }

    fn decode_body<B: Buf>(&mut self, buf: &mut B) -> Result<AmfBody, AmfError> {
        let target_uri = amf0::read_utf8(buf)?;
        let response_uri = amf0::read_utf8(buf)?;
        skip_advisory_length(buf)?;
        let value = self.values.decode(buf)?;
        Ok(AmfBody {
            target_uri,
            response_uri,
            value,
        })
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Packet writer. Reference tables reset at each packet boundary.
pub struct PacketEncoder {
    values: Amf0Encoder,
}

impl PacketEncoder {
    pub fn new() -> Self {
        Self {
            values: Amf0Encoder::new(),
        }
    }

    /// Encode one packet into `buf`.
    pub fn encode(&mut self, buf: &mut BytesMut, packet: &AmfPacket) -> Result<(), AmfError> {
        self.values.reset();

        buf.put_u16(packet.version.into());

        write_count(buf, packet.headers.len())?;
        for header in &packet.headers {
            amf0::write_utf8(buf, &header.name)?;
            buf.put_u8(header.must_understand as u8);
            buf.put_u32(UNKNOWN_CONTENT_LENGTH);
            self.encode_value(buf, packet.version, &header.value)?;
        }

        write_count(buf, packet.bodies.len())?;
        for body in &packet.bodies {
            amf0::write_utf8(buf, &body.target_uri)?;
            amf0::write_utf8(buf, &body.response_uri)?;
            buf.put_u32(UNKNOWN_CONTENT_LENGTH);
            self.encode_value(buf, packet.version, &body.value)?;
        }

        Ok(())
    }

    fn encode_value(
        &mut self,
        buf: &mut BytesMut,
        version: AmfVersion,
        value: &AmfValue,
    ) -> Result<(), AmfError> {
        match version {
            AmfVersion::Amf0 => self.values.encode(buf, value),
            AmfVersion::Amf3 => self.values.encode_amf3(buf, value),
        }
    }
}

impl Default for PacketEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn read_count<B: Buf>(buf: &mut B) -> Result<usize, AmfError> {
    if buf.remaining() < 2 {
        return Err(AmfError::UnexpectedEof);
    }
    Ok(buf.get_u16() as usize)
}

fn write_count(buf: &mut BytesMut, count: usize) -> Result<(), AmfError> {
    if count > u16::MAX as usize {
        return Err(AmfError::TooManyEntries(count));
    }
    buf.put_u16(count as u16);
    Ok(())
}

fn skip_advisory_length<B: Buf>(buf: &mut B) -> Result<(), AmfError> {
    if buf.remaining() < 4 {
        return Err(AmfError::UnexpectedEof);
    }
    buf.advance(4);
    Ok(())
}

/// Encode a packet to a fresh byte buffer.
pub fn encode(packet: &AmfPacket) -> Result<Bytes, AmfError> {
    let mut encoder = PacketEncoder::new();
    let mut buf = BytesMut::new();
    encoder.encode(&mut buf, packet)?;
    Ok(buf.freeze())
}

/// Decode a packet from a byte slice. The whole slice need not be
/// consumed; callers that require exhaustion check for themselves.
pub fn decode(data: &[u8]) -> Result<AmfPacket, AmfError> {
    let mut decoder = PacketDecoder::new();
    let mut cursor = data;
    decoder.decode(&mut cursor)
}
