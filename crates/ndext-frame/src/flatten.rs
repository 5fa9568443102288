//! Row-major flattening of rank 1-3 arrays onto a byte plane.
//!
//! Every size is handled the same way, including empty outer sequences and
//! single-element rows: the destination is always fully written.

use crate::array::{check_len, NdArray};
use crate::element::{pack, packed_len, unpack, Element};
use crate::error::{FrameError, Result};
use crate::shape::{Rank, Shape};

/// Flatten `array` into the start of `dest`, returning the bytes written.
pub fn flatten<T: Element>(array: &NdArray<T>, dest: &mut [u8]) -> Result<usize> {
    match array {
        NdArray::Rank1(values) => pack(values, dest),
        NdArray::Rank2(rows) => flatten_rank2(rows, dest),
        NdArray::Rank3(planes) => flatten_rank3(planes, dest),
    }
}

/// Pack each row at a stride of `len(rows[0]) * width`.
pub fn flatten_rank2<T: Element>(rows: &[Vec<T>], dest: &mut [u8]) -> Result<usize> {
    let cols = rows.first().map_or(0, Vec::len);
    let stride = packed_len::<T>(cols)?;

    let mut offset = 0usize;
    for row in rows {
        check_len(1, cols, row.len())?;
        offset += pack(row, tail(dest, offset, stride)?)?;
    }
    Ok(offset)
}

/// Pack each plane at a stride of `len(planes[0]) * len(planes[0][0]) * width`,
/// one row at a time.
pub fn flatten_rank3<T: Element>(planes: &[Vec<Vec<T>>], dest: &mut [u8]) -> Result<usize> {
    let rows = planes.first().map_or(0, Vec::len);
    let cols = planes
        .first()
        .and_then(|plane| plane.first())
        .map_or(0, Vec::len);
    let stride = packed_len::<T>(cols)?;

    let mut offset = 0usize;
    for plane in planes {
        check_len(1, rows, plane.len())?;
        for row in plane {
            check_len(2, cols, row.len())?;
            offset += pack(row, tail(dest, offset, stride)?)?;
        }
    }
    Ok(offset)
}

/// Fewest nested sequences a body may declare, however short it is.
pub const MIN_SEQUENCE_BUDGET: usize = 64 * 1024;

/// Rebuild an array of `shape` from a payload that starts right after the
/// dimension header.
///
/// A zero-length innermost dimension makes the element bytes free, so the
/// outer dimensions are bounded separately: the number of nested sequences
/// may not exceed `max(payload.len(), MIN_SEQUENCE_BUDGET)`, or the decode
/// fails with [`FrameError::TooManyRows`].
pub fn unflatten<T: Element>(shape: &Shape, payload: &[u8]) -> Result<NdArray<T>> {
    let needed = shape.payload_len(T::WIDTH)?;
    if payload.len() < needed {
        return Err(FrameError::TruncatedPayload {
            declared: needed,
            available: payload.len(),
        });
    }
    check_sequence_budget(shape, payload.len())?;

    let dims = shape.dims();
    match shape.rank() {
        Rank::One => Ok(NdArray::Rank1(unpack(payload, dims[0] as usize)?)),
        Rank::Two => {
            let (rows, cols) = (dims[0] as usize, dims[1] as usize);
            Ok(NdArray::Rank2(unflatten_rows(payload, rows, cols)?))
        }
        Rank::Three => {
            let (planes, rows, cols) = (dims[0] as usize, dims[1] as usize, dims[2] as usize);
            let plane_stride = rows.saturating_mul(cols).saturating_mul(T::WIDTH);
            let planes = (0..planes)
                .map(|plane| unflatten_rows(&payload[plane * plane_stride..], rows, cols))
                .collect::<Result<Vec<_>>>()?;
            Ok(NdArray::Rank3(planes))
        }
    }
}

/// Number of `Vec`s a decode of `shape` allocates below the outermost one.
fn nested_sequences(shape: &Shape) -> usize {
    let dims = shape.dims();
    match shape.rank() {
        Rank::One => 0,
        Rank::Two => dims[0] as usize,
        Rank::Three => {
            let planes = dims[0] as usize;
            planes.saturating_mul(dims[1] as usize).saturating_add(planes)
        }
    }
}

fn check_sequence_budget(shape: &Shape, payload_len: usize) -> Result<()> {
    let count = nested_sequences(shape);
    let max = payload_len.max(MIN_SEQUENCE_BUDGET);
    if count > max {
        return Err(FrameError::TooManyRows { count, max });
    }
    Ok(())
}

fn unflatten_rows<T: Element>(payload: &[u8], rows: usize, cols: usize) -> Result<Vec<Vec<T>>> {
    let stride = cols.saturating_mul(T::WIDTH);
    (0..rows)
        .map(|row| unpack(&payload[row * stride..], cols))
        .collect()
}

fn tail(dest: &mut [u8], offset: usize, stride: usize) -> Result<&mut [u8]> {
    let available = dest.len();
    dest.get_mut(offset..)
        .ok_or(FrameError::BufferTooSmall {
            needed: offset + stride,
            available,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat<T: Element>(array: &NdArray<T>) -> Vec<u8> {
        let len = array.shape().unwrap().payload_len(T::WIDTH).unwrap();
        let mut dest = vec![0xEEu8; len];
        let written = flatten(array, &mut dest).unwrap();
        assert_eq!(written, len);
        dest
    }

    #[test]
    fn rank2_is_row_major() {
        let array = NdArray::Rank2(vec![vec![1i16, 2, 3], vec![4, 5, 6]]);
        assert_eq!(flat(&array), vec![1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0]);
    }

    #[test]
    fn rank2_single_column_is_written() {
        let array = NdArray::Rank2(vec![vec![7i32], vec![8]]);
        let mut dest = vec![0xEEu8; 8];
        flatten(&array, &mut dest).unwrap();
        assert_eq!(dest, vec![7, 0, 0, 0, 8, 0, 0, 0]);
    }

    #[test]
    fn rank2_empty_outer_writes_nothing() {
        let array = NdArray::<f32>::Rank2(vec![]);
        assert!(flat(&array).is_empty());
    }

    #[test]
    fn rank3_single_column_is_written() {
        let array = NdArray::Rank3(vec![vec![vec![1i64], vec![2]], vec![vec![3], vec![4]]]);
        let decoded: NdArray<i64> = unflatten(&Shape::rank3(2, 2, 1), &flat(&array)).unwrap();
        assert_eq!(decoded, array);
    }

    #[test]
    fn flatten_rejects_ragged_rows() {
        let array = NdArray::Rank2(vec![vec![1.0f64, 2.0], vec![3.0]]);
        let mut dest = vec![0u8; 32];
        assert!(matches!(
            flatten(&array, &mut dest),
            Err(FrameError::Ragged { depth: 1, .. })
        ));
    }

    #[test]
    fn flatten_rejects_short_destination() {
        let array = NdArray::Rank2(vec![vec![1i32, 2], vec![3, 4]]);
        let mut dest = vec![0u8; 12];
        assert!(matches!(
            flatten(&array, &mut dest),
            Err(FrameError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn unflatten_rank2() {
        let payload: Vec<u8> = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let decoded: NdArray<f64> = unflatten(&Shape::rank2(2, 3), &payload).unwrap();
        assert_eq!(
            decoded,
            NdArray::Rank2(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
        );
    }

    #[test]
    fn unflatten_empty_rows_keeps_outer_len() {
        let decoded: NdArray<i64> = unflatten(&Shape::rank2(2, 0), &[]).unwrap();
        assert_eq!(decoded, NdArray::Rank2(vec![vec![], vec![]]));
    }

    #[test]
    fn unflatten_ignores_trailing_bytes() {
        let decoded: NdArray<i16> = unflatten(&Shape::rank2(1, 1), &[5, 0, 9, 9]).unwrap();
        assert_eq!(decoded, NdArray::Rank2(vec![vec![5]]));
    }

    #[test]
    fn unflatten_bounds_rows_of_empty_columns() {
        let err = unflatten::<i32>(&Shape::rank2(u32::MAX, 0), &[]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TooManyRows {
                count,
                max: MIN_SEQUENCE_BUDGET
            } if count == u32::MAX as usize
        ));
    }

    #[test]
    fn unflatten_bounds_planes_of_empty_rows() {
        for shape in [
            Shape::rank3(1, u32::MAX, 0),
            Shape::rank3(u32::MAX, 0, 0),
            Shape::rank3(u32::MAX, u32::MAX, 0),
        ] {
            let err = unflatten::<f64>(&shape, &[]).unwrap_err();
            assert!(
                matches!(err, FrameError::TooManyRows { .. }),
                "{shape}: {err}"
            );
        }
    }

    #[test]
    fn unflatten_allows_empty_rows_within_budget() {
        let decoded: NdArray<i16> =
            unflatten(&Shape::rank3(2, 3, 0), &[]).unwrap();
        assert_eq!(
            decoded,
            NdArray::Rank3(vec![vec![vec![], vec![], vec![]], vec![vec![], vec![], vec![]]])
        );

        let rows = MIN_SEQUENCE_BUDGET as u32;
        let decoded: NdArray<i16> = unflatten(&Shape::rank2(rows, 0), &[]).unwrap();
        assert_eq!(decoded.shape().unwrap(), Shape::rank2(rows, 0));
    }

    #[test]
    fn unflatten_detects_short_payload() {
        let err = unflatten::<i32>(&Shape::rank3(2, 2, 2), &[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedPayload {
                declared: 32,
                available: 31
            }
        ));
    }
}
