//! Buffered AMF transcoding between wire buffers and envelopes

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::amf::{AmfPacket, PacketDecoder, PacketEncoder};
use crate::error::{DecodeError, EncodeError};
use crate::pipeline::{BufferPool, ByteBuffer, EnvelopeVersion, MessageEnvelope};

/// Content type and media type of AMF payloads on the wire.
pub const AMF_CONTENT_TYPE: &str = "application/x-amf";

/// Envelope property key the parsed packet travels under.
pub const AMF_PROPERTY_KEY: &str = "amf";

/// Transcoder between AMF wire bytes and pipeline envelopes.
///
/// One instance serves every channel of a listener concurrently: all
/// state is call-local, so no locking is needed. Only the buffered
/// operations are functional; the streamed pair is a declared capability
/// gap (see [`supports_streaming`](Self::supports_streaming)).
#[derive(Debug, Default)]
pub struct AmfMessageEncoder;

impl AmfMessageEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn content_type(&self) -> &'static str {
        AMF_CONTENT_TYPE
    }

    pub fn media_type(&self) -> &'static str {
        AMF_CONTENT_TYPE
    }

    /// Envelopes produced and consumed here are unversioned; AMF packets
    /// carry their own framing.
    pub fn envelope_version(&self) -> EnvelopeVersion {
        EnvelopeVersion::None
    }

    /// Streamed transcoding is not implemented; the streamed operations
    /// are silent no-ops. Callers route around them with this probe.
    pub fn supports_streaming(&self) -> bool {
        false
    }

    /// Content negotiation predicate: ASCII case-insensitive media type
    /// match, `;`-separated parameters ignored.
    pub fn is_content_type_supported(&self, content_type: &str) -> bool {
        let media = content_type.split(';').next().unwrap_or("").trim();
        media.eq_ignore_ascii_case(AMF_CONTENT_TYPE)
    }

    /// Decode one complete AMF packet from the buffer's view and wrap it
    /// in an unversioned envelope under [`AMF_PROPERTY_KEY`].
    ///
    /// The buffer is read-only and never retained. Exactly the view's
    /// bytes must form the packet: a short view fails inside the codec,
    /// leftover bytes fail with [`DecodeError::TrailingBytes`].
    pub fn decode_buffered(&self, buffer: &ByteBuffer) -> Result<MessageEnvelope, DecodeError> {
        let bytes = buffer.as_slice().ok_or(DecodeError::BufferOutOfRange {
            offset: buffer.offset(),
            len: buffer.len(),
            backing: buffer.backing().len(),
        })?;

        let mut decoder = PacketDecoder::new();
        let mut cursor = bytes;
        let packet = decoder.decode(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(DecodeError::TrailingBytes {
                remaining: cursor.len(),
            });
        }

        tracing::trace!(
            bytes = bytes.len(),
            headers = packet.headers.len(),
            bodies = packet.bodies.len(),
            "Decoded AMF packet"
        );

        let mut envelope = MessageEnvelope::new(EnvelopeVersion::None);
        envelope.insert(AMF_PROPERTY_KEY, packet);
        Ok(envelope)
    }

    /// Serialize the envelope's AMF packet into a pooled buffer.
    ///
    /// Bytes land at `message_offset`; everything before the offset is
    /// reserved for the caller's transport framing and left exactly as
    /// the pool handed it out. The returned view spans the message bytes
    /// only, and its backing array must eventually go back to `pool`.
    ///
    /// The serialized length is taken from the sink's write position,
    /// never its capacity; the sink over-allocates and capacity would
    /// leak trailing garbage onto the wire. The size ceiling is enforced
    /// before any pool acquisition.
    pub fn encode_buffered(
        &self,
        envelope: &MessageEnvelope,
        max_message_size: usize,
        pool: &dyn BufferPool,
        message_offset: usize,
    ) -> Result<ByteBuffer, EncodeError> {
        let packet = envelope
            .get::<AmfPacket>(AMF_PROPERTY_KEY)
            .ok_or(EncodeError::MissingAmfProperty)?;

        let mut sink = BytesMut::new();
        let mut encoder = PacketEncoder::new();
        encoder.encode(&mut sink, packet)?;

        let len = sink.len();
        let total = message_offset.saturating_add(len);
        if total > max_message_size {
            return Err(EncodeError::MessageTooLarge {
                size: total,
                max: max_message_size,
            });
        }

        let mut backing = pool.acquire(total);
        backing[message_offset..total].copy_from_slice(&sink);

        tracing::trace!(
            bytes = len,
            offset = message_offset,
            headers = packet.headers.len(),
            bodies = packet.bodies.len(),
            "Encoded AMF packet"
        );

        Ok(ByteBuffer::new(backing, message_offset, len))
    }

    /// Streamed decode is unsupported: reads nothing, reports no message.
    /// The absence of a message is not an error.
    pub async fn decode_streamed<R>(
        &self,
        _stream: R,
        _max_header_size: usize,
        content_type: &str,
    ) -> Result<Option<MessageEnvelope>, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        tracing::debug!(content_type = %content_type, "Streamed decode not supported");
        Ok(None)
    }

    /// Streamed encode is unsupported: writes nothing, flushes nothing.
    pub async fn encode_streamed<W>(
        &self,
        _envelope: &MessageEnvelope,
        _stream: W,
    ) -> Result<(), EncodeError>
    where
        W: AsyncWrite + Unpin,
    {
        tracing::debug!("Streamed encode not supported");
        Ok(())
    }
}
