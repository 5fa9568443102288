//! Typed N-dimensional arrays as MessagePack extension values.
//!
//! ndext packs rank 1-3 arrays of `i16`, `i32`, `i64`, `f32` and `f64` into
//! compact, self-describing extension frames, and routes them through
//! MessagePack documents by extension tag.
//!
//! # Crate Structure
//!
//! - [`frame`]: Byte packing, row-major flattening, and the frame envelope
//! - [`registry`]: Tag registry and MessagePack document integration

/// Re-export frame types.
pub mod frame {
    pub use ndext_frame::*;
}

/// Re-export registry types.
pub mod registry {
    pub use ndext_registry::*;
}

pub use ndext_frame::{ElementKind, FrameError, NdArray, Rank};
pub use ndext_registry::{ArrayKind, ArrayValue, ExtRegistry, RegistryError};
