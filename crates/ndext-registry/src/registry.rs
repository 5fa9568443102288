use std::collections::HashMap;
use std::sync::OnceLock;

use bytes::{Bytes, BytesMut};
use ndext_frame::{
    decode_array, encode_array, strip_envelope, ElementKind, EnvelopeForm, FrameError, Rank,
};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::value::{ArrayKind, ArrayValue};

/// Highest tag usable by applications; 128-255 read back as negative
/// MessagePack extension types.
pub const MAX_APPLICATION_TAG: u8 = 127;

/// First tag of each element kind's block; ranks 1-3 take consecutive tags.
const STANDARD_BASE_TAGS: [(ElementKind, u8); 5] = [
    (ElementKind::Float32, 11),
    (ElementKind::Float64, 21),
    (ElementKind::Int16, 31),
    (ElementKind::Int32, 41),
    (ElementKind::Int64, 51),
];

/// Whether a registered kind has a working encode/decode routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Implemented,
    /// Registered so the tag is reserved, but every encode/decode fails.
    Unimplemented,
}

/// One row of the tag matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub kind: ArrayKind,
    pub tag: u8,
    pub support: Support,
}

/// The standard (element kind x rank) tag matrix.
pub fn standard_entries() -> impl Iterator<Item = RegistryEntry> {
    STANDARD_BASE_TAGS.into_iter().flat_map(|(element, base)| {
        Rank::ALL.into_iter().map(move |rank| {
            let support = match (element, rank) {
                (ElementKind::Int16 | ElementKind::Int64, Rank::Three) => Support::Unimplemented,
                _ => Support::Implemented,
            };
            RegistryEntry {
                kind: ArrayKind::new(element, rank),
                tag: base + rank.get() as u8 - 1,
                support,
            }
        })
    })
}

/// Tag-keyed table of array kinds, consulted to route values to frames and
/// frames back to values.
///
/// Populate it before sharing; lookups only need `&self`, so a registry
/// behind an `Arc` or in [`ExtRegistry::global`] is read-only.
#[derive(Debug, Clone)]
pub struct ExtRegistry {
    by_tag: HashMap<u8, RegistryEntry>,
    by_kind: HashMap<ArrayKind, u8>,
    config: RegistryConfig,
}

impl ExtRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            by_tag: HashMap::new(),
            by_kind: HashMap::new(),
            config,
        }
    }

    /// A registry holding the standard tag matrix.
    pub fn standard() -> Self {
        Self::standard_with_config(RegistryConfig::default())
    }

    /// A registry holding the standard tag matrix, with explicit config.
    pub fn standard_with_config(config: RegistryConfig) -> Self {
        let mut registry = Self::with_config(config);
        for entry in standard_entries() {
            registry.insert(entry);
        }
        registry
    }

    /// The process-wide standard registry, built on first use.
    pub fn global() -> &'static ExtRegistry {
        static GLOBAL: OnceLock<ExtRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ExtRegistry::standard)
    }

    /// Register the standard tag matrix. Calling this again is a no-op.
    pub fn register_standard(&mut self) -> Result<()> {
        for entry in standard_entries() {
            self.register(entry.kind, entry.tag, entry.support)?;
        }
        Ok(())
    }

    /// Register `kind` under `tag`.
    ///
    /// Tags must fall in the application range 0-127. Re-registering an
    /// identical entry succeeds; reusing a tag or kind for something else,
    /// or changing an entry's support, is an error.
    pub fn register(&mut self, kind: ArrayKind, tag: u8, support: Support) -> Result<()> {
        if tag > MAX_APPLICATION_TAG {
            return Err(RegistryError::ReservedTag(tag));
        }
        if let Some(existing) = self.by_tag.get(&tag) {
            if existing.kind != kind {
                return Err(RegistryError::TagConflict {
                    tag,
                    existing: existing.kind,
                });
            }
            if existing.support != support {
                return Err(RegistryError::SupportConflict {
                    kind,
                    tag,
                    existing: existing.support,
                });
            }
        }
        if let Some(&existing_tag) = self.by_kind.get(&kind) {
            if existing_tag != tag {
                return Err(RegistryError::KindConflict {
                    kind,
                    tag: existing_tag,
                });
            }
        }

        self.insert(RegistryEntry { kind, tag, support });
        debug!(tag, %kind, ?support, "registered array extension type");
        Ok(())
    }

    fn insert(&mut self, entry: RegistryEntry) {
        self.by_tag.insert(entry.tag, entry);
        self.by_kind.insert(entry.kind, entry.tag);
    }

    /// Tag registered for `kind`.
    pub fn tag_for(&self, kind: ArrayKind) -> Option<u8> {
        self.by_kind.get(&kind).copied()
    }

    /// Array kind registered under `tag`.
    pub fn kind_for(&self, tag: u8) -> Option<ArrayKind> {
        self.by_tag.get(&tag).map(|entry| entry.kind)
    }

    /// Full entry for `tag`.
    pub fn entry(&self, tag: u8) -> Option<&RegistryEntry> {
        self.by_tag.get(&tag)
    }

    /// Check if a tag is registered.
    pub fn is_registered(&self, tag: u8) -> bool {
        self.by_tag.contains_key(&tag)
    }

    /// All entries, sorted by tag.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> = self.by_tag.values().copied().collect();
        entries.sort_unstable_by_key(|entry| entry.tag);
        entries
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn implemented_entry_for_kind(&self, kind: ArrayKind) -> Result<&RegistryEntry> {
        let tag = self.tag_for(kind).ok_or(RegistryError::Unregistered(kind))?;
        let entry = self
            .by_tag
            .get(&tag)
            .ok_or(RegistryError::Unregistered(kind))?;
        ensure_implemented(entry)?;
        Ok(entry)
    }

    /// Encode `value` as a complete extension frame.
    pub fn encode(&self, value: &ArrayValue) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_into(value, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the extension frame for `value` to `dst`.
    pub fn encode_into(&self, value: &ArrayValue, dst: &mut BytesMut) -> Result<EnvelopeForm> {
        let entry = self.implemented_entry_for_kind(value.kind())?;
        let config = &self.config.frame;
        let form = match value {
            ArrayValue::Float32(array) => encode_array(entry.tag, array, config, dst),
            ArrayValue::Float64(array) => encode_array(entry.tag, array, config, dst),
            ArrayValue::Int16(array) => encode_array(entry.tag, array, config, dst),
            ArrayValue::Int32(array) => encode_array(entry.tag, array, config, dst),
            ArrayValue::Int64(array) => encode_array(entry.tag, array, config, dst),
        }?;
        Ok(form)
    }

    /// Decode a complete extension frame, routing on its tag.
    pub fn decode(&self, frame: &[u8]) -> Result<ArrayValue> {
        let envelope = strip_envelope(frame)?;
        self.decode_body(envelope.tag, envelope.payload)
    }

    /// Decode a frame body whose envelope was already stripped.
    pub fn decode_body(&self, tag: u8, body: &[u8]) -> Result<ArrayValue> {
        let entry = self.by_tag.get(&tag).ok_or(RegistryError::UnknownTag(tag))?;
        ensure_implemented(entry)?;

        let rank = entry.kind.rank;
        let value = match entry.kind.element {
            ElementKind::Float32 => ArrayValue::Float32(decode_array(rank, body)?),
            ElementKind::Float64 => ArrayValue::Float64(decode_array(rank, body)?),
            ElementKind::Int16 => ArrayValue::Int16(decode_array(rank, body)?),
            ElementKind::Int32 => ArrayValue::Int32(decode_array(rank, body)?),
            ElementKind::Int64 => ArrayValue::Int64(decode_array(rank, body)?),
        };
        Ok(value)
    }
}

impl Default for ExtRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_implemented(entry: &RegistryEntry) -> Result<()> {
    match entry.support {
        Support::Implemented => Ok(()),
        Support::Unimplemented => Err(FrameError::NotImplemented {
            element: entry.kind.element,
            rank: entry.kind.rank,
        }
        .into()),
    }
}
