use std::io::Cursor;

use ndext::frame::{ArrayReader, ArrayWriter};
use ndext::registry::Value;
use ndext::{ArrayValue, ExtRegistry, NdArray, Rank};

#[test]
fn arrays_stream_through_array_writer_and_reader() {
    let registry = ExtRegistry::global();
    let matrix: NdArray<f32> = NdArray::Rank2(vec![vec![0.5, 1.5], vec![2.5, 3.5]]);
    let counts: NdArray<i64> = NdArray::Rank1(vec![i64::MIN, 0, i64::MAX]);
    let matrix_tag = registry
        .tag_for(ArrayValue::from(matrix.clone()).kind())
        .expect("float32 rank 2 is registered");
    let counts_tag = registry
        .tag_for(ArrayValue::from(counts.clone()).kind())
        .expect("int64 rank 1 is registered");

    let mut writer = ArrayWriter::new(Vec::new());
    writer
        .write_array(matrix_tag, &matrix)
        .expect("matrix should write");
    writer
        .write_array(counts_tag, &counts)
        .expect("counts should write");
    let wire = writer.into_inner();

    let mut reader = ArrayReader::new(Cursor::new(wire));
    let frame = reader
        .next_frame()
        .expect("first frame reads")
        .expect("first frame present");
    let first = registry
        .decode_body(frame.tag, &frame.payload)
        .expect("first frame should decode");
    assert_eq!(first, ArrayValue::from(matrix));

    let (tag, second) = reader
        .read_array::<i64>(Rank::One)
        .expect("second frame reads")
        .expect("second frame present");
    assert_eq!(tag, counts_tag);
    assert_eq!(second, counts);
    assert!(reader.next_frame().expect("clean end").is_none());
}

#[test]
fn documents_carry_arrays_alongside_plain_values() {
    let registry = ExtRegistry::standard();
    let weights = ArrayValue::from(NdArray::Rank3(vec![vec![vec![1i32, 2], vec![3, 4]]]));
    let document = Value::Map(vec![
        (Value::from("name"), Value::from("layer-1")),
        (
            Value::from("weights"),
            registry.to_value(&weights).expect("int32 rank 3 encodes"),
        ),
    ]);

    let bytes = registry.to_vec(&document).expect("document should encode");
    let decoded = ndext::registry::from_slice(&bytes).expect("document should decode");
    let arrays = registry
        .extract_arrays(&decoded)
        .expect("arrays should decode");

    assert_eq!(arrays.len(), 1);
    assert_eq!(arrays[0].0, "$.weights");
    assert_eq!(arrays[0].1, weights);
}
