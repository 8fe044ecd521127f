//! End-to-end AMF transcoding example
//!
//! Run with: cargo run --example remoting_roundtrip
//!
//! Builds a Flex-style remoting request, encodes it through the bridge
//! into a pooled buffer (leaving room for transport framing), dumps the
//! wire bytes, then decodes them back into an envelope and prints what
//! came out. Finishes by poking the streamed stubs to show the declared
//! capability gap.

use std::collections::HashMap;

use amf_bridge::{
    AmfBody, AmfHeader, AmfMessageEncoderFactory, AmfPacket, AmfValue, AmfVersion,
    BufferPool, MessageEnvelope, SizeClassPool, AMF_PROPERTY_KEY,
};

/// Transport bytes reserved in front of the message.
const FRAMING_RESERVE: usize = 4;

fn build_request() -> AmfPacket {
    let mut packet = AmfPacket::new(AmfVersion::Amf3);

    packet.headers.push(AmfHeader::new(
        "DSId",
        false,
        AmfValue::String("nil".into()),
    ));

    let mut message = HashMap::new();
    message.insert(
        "destination".to_string(),
        AmfValue::String("echo".into()),
    );
    message.insert(
        "operation".to_string(),
        AmfValue::String("echo".into()),
    );
    message.insert(
        "body".to_string(),
        AmfValue::Array(vec![AmfValue::String("hello".into())]),
    );

    packet.bodies.push(AmfBody::new(
        "null",
        "/1",
        AmfValue::TypedObject {
            class_name: "flex.messaging.messages.RemotingMessage".to_string(),
            properties: message,
        },
    ));

    packet
}

fn hexdump(bytes: &[u8]) {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("  {:04x}  {:<47}  {}", row * 16, hex.join(" "), ascii);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("amf_bridge=trace".parse()?),
        )
        .init();

    let factory = AmfMessageEncoderFactory::new();
    let encoder = factory.encoder();
    let pool = SizeClassPool::new();

    println!("Content type:      {}", encoder.content_type());
    println!("Envelope version:  {}", factory.envelope_version());
    println!("Streaming support: {}", encoder.supports_streaming());
    println!();

    // Outbound: envelope -> pooled wire buffer
    let request = build_request();
    let mut envelope = MessageEnvelope::default();
    envelope.insert(AMF_PROPERTY_KEY, request);

    let buffer = encoder.encode_buffered(&envelope, 64 * 1024, &pool, FRAMING_RESERVE)?;
    println!(
        "Encoded {} message bytes at offset {} (backing array: {} bytes)",
        buffer.len(),
        buffer.offset(),
        buffer.backing().len()
    );
    if let Some(wire) = buffer.as_slice() {
        hexdump(wire);
    }
    println!();

    // Inbound: wire buffer -> envelope
    let decoded = encoder.decode_buffered(&buffer)?;
    if let Some(packet) = decoded.get::<AmfPacket>(AMF_PROPERTY_KEY) {
        println!(
            "Decoded packet: version {:?}, {} header(s), {} body(ies)",
            packet.version,
            packet.headers.len(),
            packet.bodies.len()
        );
        for header in &packet.headers {
            println!("  header {:?} must_understand={}", header.name, header.must_understand);
        }
        for body in &packet.bodies {
            println!(
                "  body target={:?} response={:?}",
                body.target_uri, body.response_uri
            );
            if let Some(class) = body.value.as_object().and_then(|p| p.get("operation")) {
                println!("    operation: {:?}", class);
            }
        }
    }
    println!();

    // The backing array goes home once the bytes are on the wire
    pool.release(buffer.into_backing());
    println!("Pool stats: {:?}", pool.stats());

    // Streamed transcoding is a declared no-op
    let mut sink: Vec<u8> = Vec::new();
    encoder.encode_streamed(&envelope, &mut sink).await?;
    let streamed = encoder
        .decode_streamed(&b"ignored"[..], 1024, encoder.content_type())
        .await?;
    println!(
        "Streamed encode wrote {} bytes, streamed decode produced {:?}",
        sink.len(),
        streamed.map(|_| "a message")
    );

    Ok(())
}
