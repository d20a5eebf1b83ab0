//! Typed item scenarios
//!
//! Items exchanged the way a test bench and a foreign peer exchange them:
//! built from values, shipped as wire bytes, and read back with type checks.

use vunit_ext::codec::{Direction, Fixed, Range, MIN_BIT_VECTOR_BYTES};
use vunit_ext::{ArrayValue, DecodeOptions, Item, ItemError, TypeMismatch, TypeTag};

#[test]
fn test_message_of_mixed_items() {
    let items = vec![
        Item::from_string("read"),
        Item::from_int(0x40),
        Item::from_array(
            &ArrayValue::from_std_ulogic(&[2, 3, 3, 2, 1, 4]),
            TypeTag::StdUlogicVector,
        )
        .unwrap(),
        Item::from_fixed(Fixed::Time(10_000_000)),
        Item::from_fixed(Fixed::Range(Range::downto(31, 0))),
    ];

    let mut wire = Vec::new();
    for item in &items {
        item.encode(&mut wire);
    }

    let mut offset = 0;
    let mut received = Vec::new();
    while offset < wire.len() {
        received.push(Item::decode(&wire, &mut offset).unwrap());
    }
    assert_eq!(received, items);

    assert_eq!(received[0].to_text().unwrap(), "read");
    assert_eq!(received[1].to_int().unwrap(), 0x40);
    let slv = received[2].to_array(TypeTag::StdUlogicVector).unwrap();
    assert_eq!(slv.std_ulogic(), vec![2, 3, 3, 2, 1, 4]);
    assert_eq!(
        received[3].to_fixed(TypeTag::Time).unwrap(),
        Fixed::Time(10_000_000)
    );
    match received[4].to_fixed(TypeTag::Range).unwrap() {
        Fixed::Range(r) => {
            assert_eq!(r.direction, Direction::Downto);
            assert_eq!(r.length, 32);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_reading_with_the_wrong_type() {
    let item = Item::from_string("42");
    assert_eq!(
        item.to_int(),
        Err(ItemError::TypeMismatch(TypeMismatch {
            got: TypeTag::String,
            expected: TypeTag::Integer,
        }))
    );
    assert!(item.to_array(TypeTag::BitVector).is_err());
    assert!(Item::from_int(1).to_string_array().is_err());
}

#[test]
fn test_null_string() {
    let item = Item::from_string("");
    let array = item.to_string_array().unwrap();
    assert!(array.is_empty());
    assert_eq!(array.bounds.to_string(), "1 to 0");
    assert_eq!(item.to_text().unwrap(), "");
}

#[test]
fn test_bit_vector_packing_on_the_wire() {
    let bits = ArrayValue::from_booleans(&[true, false, true, true, false, false, false, false, true]);
    let item = Item::from_array(&bits, TypeTag::BitVector).unwrap();
    // 9-byte header, then 9 bits packed LSB-first into 2 bytes
    assert_eq!(item.code().len(), 11);
    assert_eq!(&item.code()[9..], [0b0000_1101, 0b0000_0001]);
}

#[test]
fn test_short_bit_vector_padding_option() {
    let bits = ArrayValue::from_booleans(&[true, true, false]);
    let item = Item::from_array(&bits, TypeTag::BooleanVector).unwrap();

    let exact = item.to_array(TypeTag::BooleanVector).unwrap();
    assert_eq!(exact.elements.len(), 1);

    let padded = item
        .to_array_with(
            TypeTag::BooleanVector,
            &DecodeOptions {
                pad_short_bit_vectors: true,
            },
        )
        .unwrap();
    assert_eq!(padded.elements.len(), MIN_BIT_VECTOR_BYTES);
    assert_eq!(padded.booleans(), vec![true, true, false]);

    let ints = Item::from_array(&ArrayValue::from_integers(&[1]), TypeTag::IntegerVector).unwrap();
    let unpadded = ints
        .to_array_with(
            TypeTag::IntegerVector,
            &DecodeOptions {
                pad_short_bit_vectors: true,
            },
        )
        .unwrap();
    assert_eq!(unpadded.elements.len(), 4);
}

#[test]
fn test_char_item_wire_form() {
    let item = Item::from_char(b'Z');
    assert_eq!(item.to_bytes(), [TypeTag::Character.code(), b'Z']);
    assert_eq!(Item::from_bytes(&item.to_bytes()).unwrap().to_char().unwrap(), b'Z');
}
