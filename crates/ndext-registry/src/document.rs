//! MessagePack document integration.
//!
//! Arrays travel inside ordinary MessagePack maps and arrays as extension
//! values. Documents are written with `rmpv`, except that extension values
//! are framed with the registry's envelope policy so the bytes match
//! [`ExtRegistry::encode`].
//!
//! Registry tags are limited to 0-127, so they map onto MessagePack's
//! signed extension type unchanged. Negative types are never arrays.

use std::io::{Read, Write};

use bytes::BytesMut;
use ndext_frame::{encode_frame, strip_envelope, FrameError};
use rmpv::Value;
use tracing::trace;

use crate::error::{RegistryError, Result};
use crate::registry::ExtRegistry;
use crate::value::ArrayValue;

impl ExtRegistry {
    /// Wrap `array` as a MessagePack extension value.
    pub fn to_value(&self, array: &ArrayValue) -> Result<Value> {
        let frame = self.encode(array)?;
        let envelope = strip_envelope(&frame)?;
        let ext_type =
            i8::try_from(envelope.tag).map_err(|_| RegistryError::ReservedTag(envelope.tag))?;
        Ok(Value::Ext(ext_type, envelope.payload.to_vec()))
    }

    /// Decode an extension value into an array.
    ///
    /// Returns `Ok(None)` for non-extension values and negative extension
    /// types, and for extension values with unregistered tags unless
    /// `fail_on_unknown_tag` is set.
    pub fn from_value(&self, value: &Value) -> Result<Option<ArrayValue>> {
        let Value::Ext(ext_type, body) = value else {
            return Ok(None);
        };
        let Ok(tag) = u8::try_from(*ext_type) else {
            trace!(ext_type, "skipping reserved extension type");
            return Ok(None);
        };

        if !self.is_registered(tag) {
            if self.config().fail_on_unknown_tag {
                return Err(RegistryError::UnknownTag(tag));
            }
            trace!(tag, "skipping unregistered extension value");
            return Ok(None);
        }
        self.decode_body(tag, body).map(Some)
    }

    /// Write `value` as MessagePack, framing extension values with the
    /// configured envelope policy.
    pub fn write_document<W: Write>(&self, wr: &mut W, value: &Value) -> Result<()> {
        match value {
            Value::Ext(ext_type, body) => {
                // Negative types keep their two's-complement byte on the wire.
                let mut buf = BytesMut::new();
                encode_frame(*ext_type as u8, body, self.config().frame.envelope, &mut buf)?;
                wr.write_all(&buf).map_err(FrameError::Io)?;
            }
            Value::Array(items) => {
                rmp::encode::write_array_len(wr, container_len(items.len())?)
                    .map_err(|err| RegistryError::Encode(err.to_string()))?;
                for item in items {
                    self.write_document(wr, item)?;
                }
            }
            Value::Map(entries) => {
                rmp::encode::write_map_len(wr, container_len(entries.len())?)
                    .map_err(|err| RegistryError::Encode(err.to_string()))?;
                for (key, item) in entries {
                    self.write_document(wr, key)?;
                    self.write_document(wr, item)?;
                }
            }
            other => rmpv::encode::write_value(wr, other)
                .map_err(|err| RegistryError::Encode(err.to_string()))?,
        }
        Ok(())
    }

    /// Serialize `value` into a new buffer.
    pub fn to_vec(&self, value: &Value) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_document(&mut buf, value)?;
        Ok(buf)
    }

    /// Collect every registered array in `value`, keyed by its path.
    ///
    /// Paths start at `$`; map entries append `.key` and array items `[i]`.
    pub fn extract_arrays(&self, value: &Value) -> Result<Vec<(String, ArrayValue)>> {
        let mut found = Vec::new();
        self.collect_arrays(value, "$".to_string(), &mut found)?;
        Ok(found)
    }

    fn collect_arrays(
        &self,
        value: &Value,
        path: String,
        found: &mut Vec<(String, ArrayValue)>,
    ) -> Result<()> {
        match value {
            Value::Ext(..) => {
                if let Some(array) = self.from_value(value)? {
                    found.push((path, array));
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.collect_arrays(item, format!("{path}[{index}]"), found)?;
                }
            }
            Value::Map(entries) => {
                for (key, item) in entries {
                    let key = match key.as_str() {
                        Some(key) => key.to_string(),
                        None => key.to_string(),
                    };
                    self.collect_arrays(item, format!("{path}.{key}"), found)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Read one MessagePack document. Extension values of any envelope form are
/// kept as raw `Value::Ext` for [`ExtRegistry::from_value`].
pub fn read_document<R: Read>(rd: &mut R) -> Result<Value> {
    rmpv::decode::read_value(rd).map_err(|err| RegistryError::Decode(err.to_string()))
}

/// Read one MessagePack document from a byte slice.
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    let mut cursor = bytes;
    read_document(&mut cursor)
}

fn container_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| RegistryError::Encode(format!("container too large: {len}")))
}
