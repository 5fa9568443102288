use std::fmt;

use ndext_frame::{ElementKind, NdArray, Rank, Shape};

/// An (element kind, rank) pair; the unit a registry tag identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayKind {
    pub element: ElementKind,
    pub rank: Rank,
}

impl ArrayKind {
    pub const fn new(element: ElementKind, rank: Rank) -> Self {
        Self { element, rank }
    }
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rank {}", self.element, self.rank)
    }
}

/// An array of any supported element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Float32(NdArray<f32>),
    Float64(NdArray<f64>),
    Int16(NdArray<i16>),
    Int32(NdArray<i32>),
    Int64(NdArray<i64>),
}

impl ArrayValue {
    pub fn element(&self) -> ElementKind {
        match self {
            ArrayValue::Float32(_) => ElementKind::Float32,
            ArrayValue::Float64(_) => ElementKind::Float64,
            ArrayValue::Int16(_) => ElementKind::Int16,
            ArrayValue::Int32(_) => ElementKind::Int32,
            ArrayValue::Int64(_) => ElementKind::Int64,
        }
    }

    pub fn rank(&self) -> Rank {
        match self {
            ArrayValue::Float32(array) => array.rank(),
            ArrayValue::Float64(array) => array.rank(),
            ArrayValue::Int16(array) => array.rank(),
            ArrayValue::Int32(array) => array.rank(),
            ArrayValue::Int64(array) => array.rank(),
        }
    }

    pub fn kind(&self) -> ArrayKind {
        ArrayKind::new(self.element(), self.rank())
    }

    /// Validated shape of the wrapped array.
    pub fn shape(&self) -> ndext_frame::Result<Shape> {
        match self {
            ArrayValue::Float32(array) => array.shape(),
            ArrayValue::Float64(array) => array.shape(),
            ArrayValue::Int16(array) => array.shape(),
            ArrayValue::Int32(array) => array.shape(),
            ArrayValue::Int64(array) => array.shape(),
        }
    }
}

macro_rules! impl_conversions {
    ($ty:ty, $variant:ident) => {
        impl From<NdArray<$ty>> for ArrayValue {
            fn from(array: NdArray<$ty>) -> Self {
                ArrayValue::$variant(array)
            }
        }

        impl TryFrom<ArrayValue> for NdArray<$ty> {
            type Error = ArrayValue;

            fn try_from(value: ArrayValue) -> Result<Self, Self::Error> {
                match value {
                    ArrayValue::$variant(array) => Ok(array),
                    other => Err(other),
                }
            }
        }
    };
}

impl_conversions!(f32, Float32);
impl_conversions!(f64, Float64);
impl_conversions!(i16, Int16);
impl_conversions!(i32, Int32);
impl_conversions!(i64, Int64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_reflects_variant_and_rank() {
        let value = ArrayValue::from(NdArray::Rank2(vec![vec![1i16, 2]]));
        assert_eq!(value.kind(), ArrayKind::new(ElementKind::Int16, Rank::Two));
        assert_eq!(value.kind().to_string(), "int16 rank 2");
    }

    #[test]
    fn try_from_unwraps_matching_variant() {
        let value = ArrayValue::Float64(NdArray::Rank1(vec![0.25]));
        let array = NdArray::<f64>::try_from(value).unwrap();
        assert_eq!(array, NdArray::Rank1(vec![0.25]));
    }

    #[test]
    fn try_from_returns_mismatched_value() {
        let value = ArrayValue::Int32(NdArray::Rank1(vec![1]));
        let err = NdArray::<i64>::try_from(value.clone()).unwrap_err();
        assert_eq!(err, value);
    }
}
