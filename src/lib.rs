//! amf-bridge: AMF message transcoding bridge
//!
//! This library converts byte buffers carrying Action Message Format
//! (AMF) payloads into transport-neutral message envelopes and back,
//! supporting:
//! - Buffered decode/encode with pooled output buffers
//! - Full AMF0 and AMF3 value codecs with the avmplus (0x11) escape
//! - AMF packet framing (version tag, headers, bodies)
//! - Content negotiation for `application/x-amf`
//! - Declared-capability streamed stubs (always no-op)
//!
//! # Example: Round Trip
//!
//! ```
//! use amf_bridge::{
//!     AmfBody, AmfMessageEncoderFactory, AmfPacket, AmfValue, AmfVersion,
//!     BufferPool, MessageEnvelope, SizeClassPool, AMF_PROPERTY_KEY,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = AmfMessageEncoderFactory::new();
//!     let encoder = factory.encoder();
//!     let pool = SizeClassPool::new();
//!
//!     let mut packet = AmfPacket::new(AmfVersion::Amf0);
//!     packet.bodies.push(AmfBody::new(
//!         "echo.EchoService.echo",
//!         "/1",
//!         AmfValue::String("hello".into()),
//!     ));
//!
//!     let mut envelope = MessageEnvelope::default();
//!     envelope.insert(AMF_PROPERTY_KEY, packet);
//!
//!     let buffer = encoder.encode_buffered(&envelope, 64 * 1024, &pool, 0)?;
//!     let decoded = encoder.decode_buffered(&buffer)?;
//!     assert!(decoded.get::<AmfPacket>(AMF_PROPERTY_KEY).is_some());
//!
//!     pool.release(buffer.into_backing());
//!     Ok(())
//! }
//! ```

pub mod amf;
pub mod bridge;
pub mod error;
pub mod pipeline;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use bridge::encoder::{AmfMessageEncoder, AMF_CONTENT_TYPE, AMF_PROPERTY_KEY};
pub use bridge::factory::AmfMessageEncoderFactory;
pub use amf::{AmfBody, AmfHeader, AmfPacket, AmfValue, AmfVersion};
pub use pipeline::buffer::{BufferPool, ByteBuffer, PoolStats, SizeClassPool};
pub use pipeline::envelope::{EnvelopeVersion, MessageEnvelope};
