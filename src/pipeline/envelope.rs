//! Transport-neutral message envelope
//!
//! The hosting pipeline moves opaque messages around as envelopes: a
//! version tag plus named properties. Transcoders attach their parsed
//! payload as a property and the dispatch layers never look inside.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Envelope addressing/versioning scheme.
///
/// AMF payloads carry their own framing, so the bridge always produces
/// unversioned envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeVersion {
    #[default]
    None,
}

impl fmt::Display for EnvelopeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeVersion::None => write!(f, "none"),
        }
    }
}

/// Generic message carrier with a heterogeneous property bag.
///
/// Properties are stored type-erased; readers name the concrete type
/// they expect and get `None` on absence or a type mismatch.
pub struct MessageEnvelope {
    version: EnvelopeVersion,
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl MessageEnvelope {
    pub fn new(version: EnvelopeVersion) -> Self {
        Self {
            version,
            properties: HashMap::new(),
        }
    }

    pub fn version(&self) -> EnvelopeVersion {
        self.version
    }

    /// Attach a property, replacing any previous value under the key.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.properties.insert(key.into(), Box::new(value));
    }

    /// Borrow a property as a concrete type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.properties.get(key)?.downcast_ref::<T>()
    }

    /// Take a property out of the bag. Asking with the wrong type leaves
    /// the entry in place and returns `None`.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let boxed = self.properties.remove(key)?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                self.properties.insert(key.to_string(), other);
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Default for MessageEnvelope {
    fn default() -> Self {
        Self::new(EnvelopeVersion::None)
    }
}

impl fmt::Debug for MessageEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("MessageEnvelope")
            .field("version", &self.version)
            .field("properties", &keys)
            .finish()
    }
}
