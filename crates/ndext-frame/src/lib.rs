//! Binary framing of typed N-dimensional arrays as MessagePack extension values.
//!
//! Every array is carried in one self-describing frame:
//! - A marker byte selecting the envelope form (`ext 32` when encoding)
//! - A big-endian body length and a one-byte extension tag
//! - For rank 2/3, little-endian `u32` sizes for each dimension
//! - Row-major, little-endian element bytes
//!
//! Encoding and decoding are pure functions over caller buffers.
//! [`ArrayReader`] and [`ArrayWriter`] move whole frames over blocking
//! byte streams.

pub mod array;
pub mod codec;
pub mod element;
pub mod error;
pub mod flatten;
pub mod reader;
pub mod shape;
pub mod writer;

#[cfg(test)]
mod proptest_tests;

pub use array::NdArray;
pub use codec::{
    decode_array, decode_frame, encode_array, encode_frame, marshal, read_shape, strip_envelope,
    unmarshal, write_envelope, Envelope, EnvelopeForm, EnvelopePolicy, Frame, FrameConfig,
    DEFAULT_MAX_PAYLOAD, EXT16, EXT32, EXT8,
};
pub use element::{pack, packed_len, unpack, Element, ElementKind};
pub use error::{FrameError, Result};
pub use flatten::{flatten, flatten_rank2, flatten_rank3, unflatten, MIN_SEQUENCE_BUDGET};
pub use reader::ArrayReader;
pub use shape::{Rank, Shape};
pub use writer::ArrayWriter;
