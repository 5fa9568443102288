//! Byte-plane packing of fixed-width numeric values.
//!
//! Every element is written little-endian. Floats are written as their IEEE
//! bit pattern, so NaN payloads and signed zeros survive a round trip.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};

/// The scalar type carried by an array frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ElementKind {
    /// All element kinds, in registry order.
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::Int16,
        ElementKind::Int32,
        ElementKind::Int64,
    ];

    /// Number of bytes used to encode one value.
    pub const fn width(self) -> usize {
        match self {
            ElementKind::Int16 => 2,
            ElementKind::Int32 | ElementKind::Float32 => 4,
            ElementKind::Int64 | ElementKind::Float64 => 8,
        }
    }

    /// Lowercase name, as accepted on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Int16 => "int16",
            ElementKind::Int32 => "int32",
            ElementKind::Int64 => "int64",
            ElementKind::Float32 => "float32",
            ElementKind::Float64 => "float64",
        }
    }

    /// Parse a lowercase kind name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A scalar that can be packed into an array frame.
///
/// Sealed: only the five wire element kinds implement it.
pub trait Element:
    sealed::Sealed + Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Wire element kind.
    const KIND: ElementKind;
    /// Encoded width in bytes.
    const WIDTH: usize = Self::KIND.width();

    /// Append the little-endian encoding of `self` to `dst`.
    fn put_le<B: BufMut>(self, dst: &mut B);

    /// Read one little-endian value from `src`.
    fn get_le<B: Buf>(src: &mut B) -> Self;
}

macro_rules! impl_element {
    ($ty:ty, $kind:expr, $put:ident, $get:ident) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const KIND: ElementKind = $kind;

            #[inline]
            fn put_le<B: BufMut>(self, dst: &mut B) {
                dst.$put(self);
            }

            #[inline]
            fn get_le<B: Buf>(src: &mut B) -> Self {
                src.$get()
            }
        }
    };
}

impl_element!(i16, ElementKind::Int16, put_i16_le, get_i16_le);
impl_element!(i32, ElementKind::Int32, put_i32_le, get_i32_le);
impl_element!(i64, ElementKind::Int64, put_i64_le, get_i64_le);
impl_element!(f32, ElementKind::Float32, put_f32_le, get_f32_le);
impl_element!(f64, ElementKind::Float64, put_f64_le, get_f64_le);

/// Number of bytes `count` values of `T` occupy.
pub fn packed_len<T: Element>(count: usize) -> Result<usize> {
    count
        .checked_mul(T::WIDTH)
        .ok_or(FrameError::PayloadTooLarge {
            size: usize::MAX,
            max: u32::MAX as usize,
        })
}

/// Pack `values` into the start of `dest`, returning the number of bytes written.
///
/// `dest` is caller-owned and is never resized.
pub fn pack<T: Element>(values: &[T], dest: &mut [u8]) -> Result<usize> {
    let needed = packed_len::<T>(values.len())?;
    if dest.len() < needed {
        return Err(FrameError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }

    let mut out = &mut dest[..needed];
    for &value in values {
        value.put_le(&mut out);
    }
    Ok(needed)
}

/// Read `count` values of `T` from the start of `src`.
pub fn unpack<T: Element>(src: &[u8], count: usize) -> Result<Vec<T>> {
    let needed = packed_len::<T>(count)?;
    if src.len() < needed {
        return Err(FrameError::BufferTooSmall {
            needed,
            available: src.len(),
        });
    }

    let mut input = &src[..needed];
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(T::get_le(&mut input));
    }
    Ok(values)
}
