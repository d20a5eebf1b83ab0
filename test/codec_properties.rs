//! Codec property tests
//!
//! Byte-length monotonicity, scalar and array round trips, and range length
//! recomputation over generated inputs.

use proptest::prelude::*;
use vunit_ext::codec::{
    decode_array, decode_range, decode_scalar, encode_array, encode_range, encode_scalar,
    pack_sub_byte, unpack_sub_byte, ArrayValue, Direction, Fixed, Range,
};
use vunit_ext::TypeTag;

fn arb_tag() -> impl Strategy<Value = TypeTag> {
    prop::sample::select(TypeTag::ALL.to_vec())
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::To), Just(Direction::Downto)]
}

fn arb_range() -> impl Strategy<Value = Range> {
    (any::<u32>(), any::<u32>(), arb_direction()).prop_map(|(l, r, d)| Range::new(l, r, d))
}

fn arb_small_fixed() -> impl Strategy<Value = Fixed> {
    prop_oneof![
        Just(Fixed::Null),
        any::<bool>().prop_map(Fixed::Boolean),
        any::<bool>().prop_map(Fixed::Bit),
        any::<u8>().prop_map(Fixed::Character),
        (0u8..4).prop_map(Fixed::SeverityLevel),
        (0u8..3).prop_map(Fixed::FileOpenKind),
        (0u8..4).prop_map(Fixed::FileOpenStatus),
        (0u8..9).prop_map(Fixed::StdUlogic),
        arb_tag().prop_map(Fixed::Type),
        any::<u8>().prop_map(Fixed::Byte),
    ]
}

fn arb_wide_fixed() -> impl Strategy<Value = Fixed> {
    prop_oneof![
        any::<i32>().prop_map(Fixed::Integer),
        (-1.0e300..1.0e300f64).prop_map(Fixed::Real),
        any::<i64>().prop_map(Fixed::Time),
        (-1.0e9..1.0e9f64, -1.0e9..1.0e9f64).prop_map(|(re, im)| Fixed::Complex { re, im }),
        (0.0..1.0e9f64, -3.2..3.2f64).prop_map(|(mag, arg)| Fixed::ComplexPolar { mag, arg }),
        arb_range().prop_map(Fixed::Range),
        any::<i32>().prop_map(Fixed::IntegerVectorPtr),
        any::<i32>().prop_map(Fixed::StringPtr),
    ]
}

fn arb_fixed() -> impl Strategy<Value = Fixed> {
    prop_oneof![arb_small_fixed(), arb_wide_fixed()]
}

/// A vector tag together with a matching array value
fn arb_array() -> impl Strategy<Value = (TypeTag, ArrayValue)> {
    prop_oneof![
        prop::collection::vec(any::<bool>(), 0..40)
            .prop_map(|v| (TypeTag::BooleanVector, ArrayValue::from_booleans(&v))),
        prop::collection::vec(any::<bool>(), 0..40)
            .prop_map(|v| (TypeTag::BitVector, ArrayValue::from_booleans(&v))),
        "[ -~]{0,32}".prop_map(|s| (TypeTag::String, ArrayValue::from_text(&s))),
        prop::collection::vec(any::<i32>(), 0..16)
            .prop_map(|v| (TypeTag::IntegerVector, ArrayValue::from_integers(&v))),
        prop::collection::vec(-1.0e12..1.0e12f64, 0..16)
            .prop_map(|v| (TypeTag::RealVector, ArrayValue::from_reals(&v))),
        prop::collection::vec(any::<i64>(), 0..16)
            .prop_map(|v| (TypeTag::TimeVector, ArrayValue::from_times(&v))),
        prop::collection::vec(0u8..9, 0..33)
            .prop_map(|v| (TypeTag::StdUlogicVector, ArrayValue::from_std_ulogic(&v))),
        prop::collection::vec(0u8..9, 0..33)
            .prop_map(|v| (TypeTag::NumericStdSigned, ArrayValue::from_std_ulogic(&v))),
    ]
}

proptest! {
    #[test]
    fn prop_byte_length_monotonic(tag in arb_tag(), count in 0usize..10_000) {
        prop_assert!(tag.byte_length(count) <= tag.byte_length(count + 1));
    }

    #[test]
    fn prop_byte_length_covers_bits(tag in arb_tag(), count in 0usize..10_000) {
        let bits = tag.width_bits() as usize * count;
        prop_assert_eq!(tag.byte_length(count), bits / 8 + usize::from(bits % 8 != 0));
    }

    #[test]
    fn prop_scalar_round_trip(value in arb_fixed()) {
        let mut buf = Vec::new();
        let written = encode_scalar(&value, &mut buf);
        prop_assert_eq!(written, value.tag().byte_length(1));
        let mut offset = 0;
        let back = decode_scalar(&buf, &mut offset, value.tag()).unwrap();
        prop_assert_eq!(back, value);
        prop_assert_eq!(offset, buf.len());
    }

    #[test]
    fn prop_range_length_recomputed(range in arb_range(), forged in any::<u32>()) {
        let mut sent = range;
        sent.length = forged;
        let mut buf = Vec::new();
        encode_range(&sent, &mut buf);
        let mut offset = 0;
        let back = decode_range(&buf, &mut offset).unwrap();
        prop_assert_eq!(back, range);
        prop_assert_eq!(back.length, Range::length_of(range.left, range.right, range.direction));
    }

    #[test]
    fn prop_array_round_trip((tag, array) in arb_array(), descending in any::<bool>()) {
        let array = if descending && !array.is_empty() {
            let n = array.len() as u32;
            array.with_bounds(Range::downto(n - 1, 0))
        } else {
            array
        };
        let mut buf = Vec::new();
        let written = encode_array(&array, tag, &mut buf).unwrap();
        prop_assert_eq!(written, buf.len());
        let mut offset = 0;
        let back = decode_array(&buf, &mut offset, tag).unwrap();
        prop_assert_eq!(back.bounds, array.bounds);
        prop_assert_eq!(back.elements, array.elements);
        prop_assert_eq!(offset, buf.len());
    }

    #[test]
    fn prop_sub_byte_packing(width in prop::sample::select(vec![1u32, 2, 4]),
                             raw in prop::collection::vec(any::<u8>(), 0..64)) {
        let mask = ((1u16 << width) - 1) as u8;
        let values: Vec<u8> = raw.iter().map(|v| v & mask).collect();
        let packed = pack_sub_byte(width, &values);
        prop_assert_eq!(packed.len(), (values.len() * width as usize).div_ceil(8));
        prop_assert_eq!(unpack_sub_byte(width, &packed, values.len()), values);
    }

    #[test]
    fn prop_truncated_array_is_an_error((tag, array) in arb_array(), cut in 1usize..8) {
        let mut buf = Vec::new();
        encode_array(&array, tag, &mut buf).unwrap();
        let keep = buf.len().saturating_sub(cut);
        let mut offset = 0;
        prop_assert!(decode_array(&buf[..keep], &mut offset, tag).is_err());
        prop_assert_eq!(offset, 0);
    }
}
