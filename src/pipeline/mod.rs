//! Pipeline-side primitives the bridge trades in
//!
//! The hosting request/response pipeline speaks envelopes and pooled
//! byte buffers; the types here are its contract surface. Nothing in
//! this module knows about AMF.

pub mod buffer;
pub mod envelope;

pub use buffer::{BufferPool, ByteBuffer, PoolStats, SizeClassPool};
pub use envelope::{EnvelopeVersion, MessageEnvelope};
