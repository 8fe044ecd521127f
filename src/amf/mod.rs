//! AMF (Action Message Format) serialization
//!
//! Everything needed to read and write Flash remoting payloads: the
//! dynamic value model, both marker generations, and the packet frame
//! that carries headers and bodies.
//!
//! # Layering
//!
//! ```text
//!   packet::PacketDecoder / PacketEncoder
//!     │  version word, header table, body table
//!     ▼
//!   amf0::Amf0Decoder / Amf0Encoder
//!     │  every value starts here; 0x11 escapes out
//!     ▼
//!   amf3::Amf3Decoder / Amf3Encoder
//!        U29 headers, reference tables, traits
//! ```
//!
//! Decoder and encoder pairs keep reference tables between values so a
//! whole packet shares one table set; [`packet`] resets them at packet
//! boundaries.

pub mod amf0;
pub mod amf3;
pub mod packet;
pub mod value;

pub use amf0::{Amf0Decoder, Amf0Encoder};
pub use amf3::{Amf3Decoder, Amf3Encoder};
pub use packet::{AmfBody, AmfHeader, AmfPacket, AmfVersion, PacketDecoder, PacketEncoder};
pub use value::AmfValue;
