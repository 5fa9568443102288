use crate::element::Element;
use crate::error::{FrameError, Result};
use crate::shape::{Rank, Shape};

/// A ranked, typed numeric array as carried by one extension frame.
///
/// Nested vectors are expected to be rectangular; [`NdArray::shape`]
/// checks this and the encoder refuses ragged input.
#[derive(Debug, Clone, PartialEq)]
pub enum NdArray<T> {
    Rank1(Vec<T>),
    Rank2(Vec<Vec<T>>),
    Rank3(Vec<Vec<Vec<T>>>),
}

impl<T: Element> NdArray<T> {
    /// An empty array of the given rank.
    pub fn empty(rank: Rank) -> Self {
        match rank {
            Rank::One => NdArray::Rank1(Vec::new()),
            Rank::Two => NdArray::Rank2(Vec::new()),
            Rank::Three => NdArray::Rank3(Vec::new()),
        }
    }

    pub fn rank(&self) -> Rank {
        match self {
            NdArray::Rank1(_) => Rank::One,
            NdArray::Rank2(_) => Rank::Two,
            NdArray::Rank3(_) => Rank::Three,
        }
    }

    /// Validated shape, read from the first sibling at each depth.
    ///
    /// Sizes of an empty outer sequence are zero all the way down.
    pub fn shape(&self) -> Result<Shape> {
        match self {
            NdArray::Rank1(values) => Ok(Shape::rank1(dim(values.len())?)),
            NdArray::Rank2(rows) => {
                let cols = rows.first().map_or(0, Vec::len);
                for row in rows {
                    check_len(1, cols, row.len())?;
                }
                Ok(Shape::rank2(dim(rows.len())?, dim(cols)?))
            }
            NdArray::Rank3(planes) => {
                let rows = planes.first().map_or(0, Vec::len);
                let cols = planes
                    .first()
                    .and_then(|plane| plane.first())
                    .map_or(0, Vec::len);
                for plane in planes {
                    check_len(1, rows, plane.len())?;
                    for row in plane {
                        check_len(2, cols, row.len())?;
                    }
                }
                Ok(Shape::rank3(dim(planes.len())?, dim(rows)?, dim(cols)?))
            }
        }
    }

    /// Total number of scalar values.
    pub fn len(&self) -> usize {
        match self {
            NdArray::Rank1(values) => values.len(),
            NdArray::Rank2(rows) => rows.iter().map(Vec::len).sum(),
            NdArray::Rank3(planes) => planes.iter().flatten().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar values in row-major order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = T> + '_> {
        match self {
            NdArray::Rank1(values) => Box::new(values.iter().copied()),
            NdArray::Rank2(rows) => Box::new(rows.iter().flatten().copied()),
            NdArray::Rank3(planes) => Box::new(planes.iter().flatten().flatten().copied()),
        }
    }
}

pub(crate) fn check_len(depth: usize, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(FrameError::Ragged {
            depth,
            expected,
            found,
        });
    }
    Ok(())
}

fn dim(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        size: len,
        max: u32::MAX as usize,
    })
}
