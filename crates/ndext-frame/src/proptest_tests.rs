//! Property-based round-trip tests over arbitrary rectangular shapes.

use proptest::collection::vec;
use proptest::prelude::*;

use crate::codec::{marshal, strip_envelope, unmarshal, EnvelopePolicy, FrameConfig};
use crate::{Element, NdArray, Rank};

const MAX_DIM: usize = 6;

/// Strategy for rectangular arrays of the given rank, empty shapes included.
fn arb_array<T, S>(elem: S, rank: Rank) -> BoxedStrategy<NdArray<T>>
where
    T: Element,
    S: Strategy<Value = T> + Clone + 'static,
{
    match rank {
        Rank::One => vec(elem, 0..=MAX_DIM * MAX_DIM)
            .prop_map(NdArray::Rank1)
            .boxed(),
        Rank::Two => (0..=MAX_DIM, 0..=MAX_DIM)
            .prop_flat_map(move |(rows, cols)| vec(vec(elem.clone(), cols), rows))
            .prop_map(NdArray::Rank2)
            .boxed(),
        Rank::Three => (0..=MAX_DIM, 0..=MAX_DIM, 0..=MAX_DIM)
            .prop_flat_map(move |(planes, rows, cols)| {
                vec(vec(vec(elem.clone(), cols), rows), planes)
            })
            .prop_map(NdArray::Rank3)
            .boxed(),
    }
}

fn arb_rank() -> impl Strategy<Value = Rank> {
    prop_oneof![Just(Rank::One), Just(Rank::Two), Just(Rank::Three)]
}

fn arb_policy() -> impl Strategy<Value = EnvelopePolicy> {
    prop_oneof![Just(EnvelopePolicy::Ext32), Just(EnvelopePolicy::Compact)]
}

fn round_trip<T: Element>(tag: u8, array: &NdArray<T>, envelope: EnvelopePolicy) {
    let config = FrameConfig {
        envelope,
        ..FrameConfig::default()
    };
    let frame = marshal(tag, array, &config).expect("rectangular arrays encode");
    let envelope = strip_envelope(&frame).expect("encoded frames strip");
    assert_eq!(envelope.frame_len(), frame.len());

    let (decoded_tag, decoded) = unmarshal::<T>(array.rank(), &frame).expect("decode");
    assert_eq!(decoded_tag, tag);
    assert_eq!(&decoded, array);
}

proptest! {
    #[test]
    fn int16_round_trip(
        array in arb_rank().prop_flat_map(|rank| arb_array(any::<i16>(), rank)),
        policy in arb_policy(),
    ) {
        round_trip(31, &array, policy);
    }

    #[test]
    fn int32_round_trip(
        array in arb_rank().prop_flat_map(|rank| arb_array(any::<i32>(), rank)),
        policy in arb_policy(),
    ) {
        round_trip(41, &array, policy);
    }

    #[test]
    fn int64_round_trip(
        array in arb_rank().prop_flat_map(|rank| arb_array(any::<i64>(), rank)),
        policy in arb_policy(),
    ) {
        round_trip(51, &array, policy);
    }

    #[test]
    fn float32_round_trip(
        array in arb_rank().prop_flat_map(|rank| {
            arb_array(any::<f32>().prop_filter("not NaN", |f| !f.is_nan()), rank)
        }),
        policy in arb_policy(),
    ) {
        round_trip(11, &array, policy);
    }

    #[test]
    fn float64_round_trip(
        array in arb_rank().prop_flat_map(|rank| {
            arb_array(any::<f64>().prop_filter("not NaN", |f| !f.is_nan()), rank)
        }),
        policy in arb_policy(),
    ) {
        round_trip(21, &array, policy);
    }

    #[test]
    fn truncated_frames_never_panic(
        array in arb_array(any::<i32>(), Rank::Two),
        cut in 0usize..64,
    ) {
        let frame = marshal(42, &array, &FrameConfig::default()).unwrap();
        let end = frame.len().saturating_sub(cut + 1);
        let _ = unmarshal::<i32>(Rank::Two, &frame[..end]);
    }
}
