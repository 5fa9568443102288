use ndext_frame::FrameError;

use crate::registry::Support;
use crate::value::ArrayKind;

/// Errors that can occur while routing arrays through the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Encoding or decoding the frame itself failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// No array kind is registered under this tag.
    #[error("no array type registered for extension tag {0}")]
    UnknownTag(u8),

    /// The array kind has no registered tag.
    #[error("{0} arrays are not registered")]
    Unregistered(ArrayKind),

    /// The tag is already registered for a different array kind.
    #[error("extension tag {tag} already registered for {existing}")]
    TagConflict { tag: u8, existing: ArrayKind },

    /// The array kind is already registered under a different tag.
    #[error("{kind} arrays already registered under tag {tag}")]
    KindConflict { kind: ArrayKind, tag: u8 },

    /// Re-registering a kind and tag with a different support level.
    #[error("{kind} arrays already registered under tag {tag} as {existing:?}")]
    SupportConflict {
        kind: ArrayKind,
        tag: u8,
        existing: Support,
    },

    /// Tags above 127 are negative MessagePack extension types, which are
    /// reserved.
    #[error("extension tag {0} is outside the application range 0-127")]
    ReservedTag(u8),

    /// Writing a MessagePack document failed.
    #[error("failed to encode document: {0}")]
    Encode(String),

    /// Reading a MessagePack document failed.
    #[error("failed to decode document: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
