//! Extension tag registry for typed array frames.
//!
//! Maps each (element kind, rank) pair to a MessagePack extension tag and
//! routes values and frames between the two. Build the registry once at
//! startup, then share it read-only.
//!
//! The standard matrix:
//!
//! | element | rank 1 | rank 2 | rank 3 |
//! |---------|--------|--------|--------|
//! | float32 | 11     | 12     | 13     |
//! | float64 | 21     | 22     | 23     |
//! | int16   | 31     | 32     | 33 (not implemented) |
//! | int32   | 41     | 42     | 43     |
//! | int64   | 51     | 52     | 53 (not implemented) |

pub mod config;
pub mod document;
pub mod error;
pub mod registry;
pub mod value;

pub use config::RegistryConfig;
pub use document::{from_slice, read_document};
pub use error::{RegistryError, Result};
pub use registry::{standard_entries, ExtRegistry, RegistryEntry, Support, MAX_APPLICATION_TAG};
pub use rmpv::Value;
pub use value::{ArrayKind, ArrayValue};
