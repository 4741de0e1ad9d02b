//! Name encodings decoded from the blob's name region

mod common;

use common::{encode_literal, encode_packed};
use jdbg_core::format::names::decode_name;

const ALPHABET: &str = "012345678ABCDEFGHIJKLMNOPQRSTUVWXYabcdefghijklmnopqrstuvwxy_";

#[test]
fn test_packed_alphabet()
{
    let encoded = encode_packed(ALPHABET).unwrap();
    assert_eq!(decode_name(&encoded, 0).unwrap(), ALPHABET);

    let prefixed = format!("@{ALPHABET}");
    let encoded = encode_packed(&prefixed).unwrap();
    assert_eq!(encoded[0], 2);
    assert_eq!(decode_name(&encoded, 0).unwrap(), prefixed);
}

#[test]
fn test_packed_names_of_every_phase()
{
    // Lengths 1..=8 end the string in each of the four phases twice.
    for len in 1..=8 {
        let name: String = "Abcdefgh".chars().take(len).collect();
        let encoded = encode_packed(&name).unwrap();
        assert_eq!(decode_name(&encoded, 0).unwrap(), name);
    }
}

#[test]
fn test_literal_names()
{
    for name in ["Unit1.pas", "C:\\src\\Main.dpr", "Zebra9", "naïve", "x"] {
        let encoded = encode_literal(name);
        assert_eq!(encoded[0], 1);
        assert_eq!(decode_name(&encoded, 0).unwrap(), name);
    }
}

#[test]
fn test_names_without_codes_are_not_packed()
{
    assert!(encode_packed("Unit1.pas").is_none());
    assert!(encode_packed("Zulu").is_none());
    assert!(encode_packed("z").is_none());
    assert!(encode_packed("9").is_none());
}

#[test]
fn test_name_at_offset_inside_region()
{
    let mut region = encode_literal("First.pas");
    let second = region.len();
    region.extend(encode_packed("Second").unwrap());
    assert_eq!(decode_name(&region, 0).unwrap(), "First.pas");
    assert_eq!(decode_name(&region, second).unwrap(), "Second");
}
