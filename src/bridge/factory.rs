//! Encoder factory shared across channel instances

use std::sync::Arc;

use super::encoder::AmfMessageEncoder;
use crate::pipeline::EnvelopeVersion;

/// Provider the hosting pipeline queries once at listener setup.
///
/// Builds exactly one [`AmfMessageEncoder`] at construction and hands
/// the same instance to every channel; there is no lazy initialization
/// and no per-call state, so no locking either.
#[derive(Debug, Default)]
pub struct AmfMessageEncoderFactory {
    encoder: Arc<AmfMessageEncoder>,
}

impl AmfMessageEncoderFactory {
    pub fn new() -> Self {
        Self {
            encoder: Arc::new(AmfMessageEncoder::new()),
        }
    }

    /// The shared encoder instance.
    pub fn encoder(&self) -> Arc<AmfMessageEncoder> {
        Arc::clone(&self.encoder)
    }

    /// Version of the envelopes the encoder produces; delegates.
    pub fn envelope_version(&self) -> EnvelopeVersion {
        self.encoder.envelope_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_shares_one_encoder() {
        let factory = AmfMessageEncoderFactory::new();
        let a = factory.encoder();
        let b = factory.encoder();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_version_delegates_to_encoder() {
        let factory = AmfMessageEncoderFactory::new();
        assert_eq!(
            factory.envelope_version(),
            factory.encoder().envelope_version()
        );
        assert_eq!(factory.envelope_version(), EnvelopeVersion::None);
    }

    #[test]
    fn test_default_matches_new() {
        let factory = AmfMessageEncoderFactory::default();
        assert_eq!(factory.envelope_version(), EnvelopeVersion::None);
    }

    #[test]
    fn test_factory_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AmfMessageEncoderFactory>();
    }
}
