//! The transcoding boundary between AMF wire bytes and the pipeline
//!
//! Two tightly coupled pieces: the factory a listener queries at setup,
//! and the encoder every channel then shares for buffered decode and
//! encode. Streamed transcoding is deliberately unsupported.
//!
//! ```text
//!   wire bytes                          pipeline
//!   ──────────►  decode_buffered  ───►  MessageEnvelope { "amf": AmfPacket }
//!   ◄──────────  encode_buffered  ◄───  MessageEnvelope { "amf": AmfPacket }
//!   (pooled ByteBuffer views, content type application/x-amf)
//! ```

pub mod encoder;
pub mod factory;

pub use encoder::{AmfMessageEncoder, AMF_CONTENT_TYPE, AMF_PROPERTY_KEY};
pub use factory::AmfMessageEncoderFactory;
