//! Payload Codec Tests

use mocktcp::protocol::{decode_hex, encode, encode_hex, PayloadType};
use mocktcp::{ErrorClass, MockError};

// =============================================================================
// Tag Parsing
// =============================================================================

#[test]
fn test_payload_type_parse() {
    assert_eq!("string".parse::<PayloadType>().unwrap(), PayloadType::String);
    assert_eq!("byte".parse::<PayloadType>().unwrap(), PayloadType::Byte);
}

#[test]
fn test_payload_type_rejects_unknown_tags() {
    for tag in ["", "bytes", "String", "hex", "utf8"] {
        match tag.parse::<PayloadType>() {
            Err(MockError::InvalidEncoding(got)) => assert_eq!(got, tag),
            other => panic!("Expected InvalidEncoding for {:?}, got {:?}", tag, other),
        }
    }
}

#[test]
fn test_payload_type_display_matches_tag() {
    assert_eq!(PayloadType::String.to_string(), "string");
    assert_eq!(PayloadType::Byte.to_string(), "byte");
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_encode_string_is_verbatim() {
    let bytes = encode("string", "GET / HTTP/1.1\\r\\n").unwrap();
    // No escape processing
    assert_eq!(bytes, b"GET / HTTP/1.1\\r\\n");
}

#[test]
fn test_encode_string_utf8() {
    assert_eq!(encode("string", "héllo").unwrap(), "héllo".as_bytes());
}

#[test]
fn test_encode_byte_decodes_hex() {
    assert_eq!(encode("byte", "00ff10Ab").unwrap(), vec![0x00, 0xff, 0x10, 0xab]);
}

#[test]
fn test_encode_empty_payloads() {
    assert!(encode("string", "").unwrap().is_empty());
    assert!(encode("byte", "").unwrap().is_empty());
}

#[test]
fn test_encode_unknown_tag_is_config_error() {
    let err = encode("binary", "00").unwrap_err();
    assert!(matches!(err, MockError::InvalidEncoding(_)));
    assert_eq!(err.class(), ErrorClass::Config);
}

// =============================================================================
// Hex
// =============================================================================

#[test]
fn test_decode_hex_odd_length() {
    let err = decode_hex("abc").unwrap_err();
    assert!(matches!(err, MockError::InvalidHexPayload(_)));
    assert_eq!(err.class(), ErrorClass::Config);
}

#[test]
fn test_decode_hex_invalid_digit() {
    for bad in ["zz", "0g", "g0", "12 4", "0x12"] {
        assert!(
            matches!(decode_hex(bad), Err(MockError::InvalidHexPayload(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_decode_hex_errors_carry_detail() {
    match decode_hex("0g") {
        Err(MockError::InvalidHexPayload(msg)) => assert!(msg.contains("offset 1"), "{}", msg),
        other => panic!("Expected InvalidHexPayload, got {:?}", other),
    }
    match decode_hex("abc") {
        Err(MockError::InvalidHexPayload(msg)) => assert!(msg.contains("odd length 3"), "{}", msg),
        other => panic!("Expected InvalidHexPayload, got {:?}", other),
    }
}

#[test]
fn test_decode_hex_is_case_insensitive() {
    assert_eq!(decode_hex("DEADBEEF").unwrap(), decode_hex("deadbeef").unwrap());
}

#[test]
fn test_hex_round_trip() {
    let mixed_case = "0001fe7fDeAdBeEf";
    let bytes = decode_hex(mixed_case).unwrap();
    let rendered = encode_hex(&bytes);

    assert_eq!(rendered, mixed_case.to_lowercase());
    assert_eq!(decode_hex(&rendered).unwrap(), bytes);
}

#[test]
fn test_encode_hex_all_byte_values() {
    let all: Vec<u8> = (0..=255).collect();
    let rendered = encode_hex(&all);

    assert_eq!(rendered.len(), 512);
    assert!(rendered.starts_with("000102"));
    assert!(rendered.ends_with("fdfeff"));
    assert_eq!(decode_hex(&rendered).unwrap(), all);
}
