//! Conversion between JSON nested lists and typed arrays.

use ndext_frame::{Element, ElementKind, NdArray, Rank};
use ndext_registry::ArrayValue;
use serde_json::Value;

use crate::exit::{CliError, CliResult};

/// Element types that can be read from and written to JSON numbers.
trait JsonScalar: Element {
    fn from_json(value: &Value) -> Option<Self>;
    fn to_json(self) -> Value;
}

macro_rules! int_scalar {
    ($($t:ty),*) => {$(
        impl JsonScalar for $t {
            fn from_json(value: &Value) -> Option<Self> {
                value.as_i64().and_then(|n| <$t>::try_from(n).ok())
            }

            fn to_json(self) -> Value {
                Value::from(self)
            }
        }
    )*};
}

int_scalar!(i16, i32, i64);

impl JsonScalar for f32 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64().map(|n| n as f32)
    }

    fn to_json(self) -> Value {
        Value::from(self)
    }
}

impl JsonScalar for f64 {
    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn to_json(self) -> Value {
        Value::from(self)
    }
}

/// Nesting depth of `value`, following the first element at each level.
pub fn infer_rank(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.first().map_or(0, infer_rank),
        _ => 0,
    }
}

/// Build a typed array of `kind` from JSON nested lists.
///
/// The rank is inferred from the nesting when `rank` is `None`.
pub fn array_from_json(
    kind: ElementKind,
    rank: Option<Rank>,
    value: &Value,
) -> CliResult<ArrayValue> {
    let rank = match rank {
        Some(rank) => rank,
        None => {
            let depth = infer_rank(value);
            Rank::from_usize(depth).ok_or_else(|| {
                CliError::invalid(format!(
                    "cannot infer rank from JSON nesting depth {depth}; expected 1, 2 or 3"
                ))
            })?
        }
    };

    let array = match kind {
        ElementKind::Float32 => ArrayValue::Float32(build(rank, value, kind)?),
        ElementKind::Float64 => ArrayValue::Float64(build(rank, value, kind)?),
        ElementKind::Int16 => ArrayValue::Int16(build(rank, value, kind)?),
        ElementKind::Int32 => ArrayValue::Int32(build(rank, value, kind)?),
        ElementKind::Int64 => ArrayValue::Int64(build(rank, value, kind)?),
    };
    Ok(array)
}

/// Render a typed array as JSON nested lists.
pub fn array_to_json(value: &ArrayValue) -> Value {
    match value {
        ArrayValue::Float32(array) => render(array),
        ArrayValue::Float64(array) => render(array),
        ArrayValue::Int16(array) => render(array),
        ArrayValue::Int32(array) => render(array),
        ArrayValue::Int64(array) => render(array),
    }
}

fn build<T: JsonScalar>(rank: Rank, value: &Value, kind: ElementKind) -> CliResult<NdArray<T>> {
    let array = match rank {
        Rank::One => NdArray::Rank1(scalars(value, kind, "$")?),
        Rank::Two => NdArray::Rank2(
            list(value, "$")?
                .iter()
                .enumerate()
                .map(|(i, row)| scalars(row, kind, &format!("$[{i}]")))
                .collect::<CliResult<_>>()?,
        ),
        Rank::Three => NdArray::Rank3(
            list(value, "$")?
                .iter()
                .enumerate()
                .map(|(i, plane)| {
                    list(plane, &format!("$[{i}]"))?
                        .iter()
                        .enumerate()
                        .map(|(j, row)| scalars(row, kind, &format!("$[{i}][{j}]")))
                        .collect::<CliResult<Vec<_>>>()
                })
                .collect::<CliResult<_>>()?,
        ),
    };
    Ok(array)
}

fn list<'a>(value: &'a Value, path: &str) -> CliResult<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CliError::invalid(format!("expected a list at {path}")))
}

fn scalars<T: JsonScalar>(value: &Value, kind: ElementKind, path: &str) -> CliResult<Vec<T>> {
    list(value, path)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            T::from_json(item).ok_or_else(|| {
                CliError::invalid(format!("{path}[{i}] is not a valid {kind} value: {item}"))
            })
        })
        .collect()
}

fn render<T: JsonScalar>(array: &NdArray<T>) -> Value {
    let row = |values: &[T]| Value::Array(values.iter().map(|&v| v.to_json()).collect());
    match array {
        NdArray::Rank1(values) => row(values.as_slice()),
        NdArray::Rank2(rows) => Value::Array(rows.iter().map(|r| row(r.as_slice())).collect()),
        NdArray::Rank3(planes) => Value::Array(
            planes
                .iter()
                .map(|plane| Value::Array(plane.iter().map(|r| row(r.as_slice())).collect()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_rank_from_nesting() {
        assert_eq!(infer_rank(&json!(5)), 0);
        assert_eq!(infer_rank(&json!([])), 1);
        assert_eq!(infer_rank(&json!([1, 2])), 1);
        assert_eq!(infer_rank(&json!([[1], [2]])), 2);
        assert_eq!(infer_rank(&json!([[[1]]])), 3);
    }

    #[test]
    fn builds_rank2_int32() {
        let value = array_from_json(ElementKind::Int32, None, &json!([[1, 2, 3], [4, 5, 6]]))
            .expect("valid input");
        match value {
            ArrayValue::Int32(NdArray::Rank2(rows)) => {
                assert_eq!(rows, vec![vec![1, 2, 3], vec![4, 5, 6]]);
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn explicit_rank_overrides_inference() {
        let value = array_from_json(ElementKind::Float64, Some(Rank::Two), &json!([]))
            .expect("empty rank 2");
        assert_eq!(value.rank(), Rank::Two);
    }

    #[test]
    fn rejects_out_of_range_integers() {
        let err = array_from_json(ElementKind::Int16, None, &json!([1, 40000]))
            .expect_err("40000 does not fit in int16");
        assert!(err.message.contains("$[1]"));
        assert!(err.message.contains("int16"));
    }

    #[test]
    fn rejects_fractional_integers() {
        let err = array_from_json(ElementKind::Int64, None, &json!([1.5]))
            .expect_err("1.5 is not an integer");
        assert!(err.message.contains("$[0]"));
    }

    #[test]
    fn rejects_scalars_and_deep_nesting() {
        assert!(array_from_json(ElementKind::Int32, None, &json!(7)).is_err());
        assert!(array_from_json(ElementKind::Int32, None, &json!([[[[1]]]])).is_err());
    }

    #[test]
    fn rejects_mismatched_explicit_rank() {
        let err = array_from_json(ElementKind::Int32, Some(Rank::Two), &json!([1, 2]))
            .expect_err("rows must be lists");
        assert!(err.message.contains("$[0]"));
    }

    #[test]
    fn renders_back_to_nested_lists() {
        let input = json!([[[1.5, 2.0]], [[3.0, 4.25]]]);
        let value = array_from_json(ElementKind::Float64, None, &input).expect("valid input");
        assert_eq!(array_to_json(&value), input);
    }
}
