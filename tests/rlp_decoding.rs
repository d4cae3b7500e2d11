//! Integration tests for RLP decoding through the public API
//!
//! These tests cover the canonical vectors, truncation handling, arena reuse
//! across parses and decoding through shared pools.

use std::sync::Arc;
use std::thread;
use trinity_primitives::config::DecoderConfig;
use trinity_primitives::error::DecodeError;
use trinity_primitives::rlp::{self, Decoder, DecoderPool, OwnedValue, ValueKind};

/// Helper building a short list from already encoded items
fn list(items: &[&[u8]]) -> Vec<u8> {
    let payload: Vec<u8> = items.concat();
    assert!(payload.len() < 56, "helper only builds short lists");
    let mut out = vec![0xc0 + payload.len() as u8];
    out.extend(payload);
    out
}

/// Valid encodings covering every prefix range
fn valid_encodings() -> Vec<Vec<u8>> {
    let mut long_string = vec![0xb8, 0x40];
    long_string.extend([0x11; 0x40]);

    let mut long_list = vec![0xf8, 0x3c];
    for _ in 0..15 {
        long_list.extend(b"\x83dog");
    }

    vec![
        vec![0x80],
        vec![0x00],
        vec![0x7f],
        b"\x83dog".to_vec(),
        b"\xc8\x83cat\x83dog".to_vec(),
        vec![0xc0],
        vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0],
        long_string,
        long_list,
    ]
}

#[test]
fn test_canonical_vectors() -> Result<(), Box<dyn std::error::Error>> {
    let mut decoder = Decoder::new();

    let value = decoder.decode(&[0x80])?;
    assert_eq!(value.kind(), ValueKind::Bytes);
    assert_eq!(value.as_bytes(), Some(&[][..]));

    let value = decoder.decode(&[0x00])?;
    assert_eq!(value.as_bytes(), Some(&[0x00][..]));

    let value = decoder.decode(b"\x83dog")?;
    assert_eq!(value.as_bytes(), Some(&b"dog"[..]));

    let value = decoder.decode(b"\xc8\x83cat\x83dog")?;
    assert_eq!(value.kind(), ValueKind::Array);
    assert_eq!(
        value.to_owned_value(),
        OwnedValue::Array(vec!["cat".into(), "dog".into()])
    );

    Ok(())
}

#[test]
fn test_every_valid_encoding_decodes() {
    let mut decoder = Decoder::new();
    for encoding in valid_encodings() {
        assert!(
            decoder.decode(&encoding).is_ok(),
            "failed to decode {}",
            hex_of(&encoding)
        );
    }
}

#[test]
fn test_dropping_last_byte_is_truncation() {
    let mut decoder = Decoder::new();
    for encoding in valid_encodings() {
        let cut = &encoding[..encoding.len() - 1];
        match decoder.decode(cut) {
            Err(err) => assert!(
                err.is_truncated(),
                "{} failed with {} instead of truncation",
                hex_of(cut),
                err
            ),
            Ok(value) => panic!("{} decoded to {:?}", hex_of(cut), value),
        }
    }
}

#[test]
fn test_reused_decoder_leaves_no_residue() -> Result<(), Box<dyn std::error::Error>> {
    let mut decoder = Decoder::new();

    let long = list(&[b"\x01", b"\x02", b"\x03", b"\x04", b"\x05", b"\x06", b"\x07"]);
    let value = decoder.decode(&long)?;
    assert_eq!(value.len(), 7);

    let short = list(&[b"\x09", &list(&[b"\x0a"])]);
    let value = decoder.decode(&short)?;
    assert_eq!(value.len(), 2);
    assert_eq!(value.get(0).and_then(|v| v.as_bytes()), Some(&[0x09][..]));
    assert_eq!(value.get(1).map(|v| v.len()), Some(1));

    // the arena keeps its slots even though the second tree is smaller
    assert_eq!(decoder.arena().len(), 4);
    assert!(decoder.arena().capacity() >= 8);

    Ok(())
}

#[test]
fn test_failed_decode_does_not_poison_decoder() -> Result<(), Box<dyn std::error::Error>> {
    let mut decoder = Decoder::new();
    let err = decoder.decode(b"\xc5\x83cat").unwrap_err();
    assert!(err.is_truncated());

    let value = decoder.decode(b"\xc4\x83cat")?;
    assert_eq!(value.len(), 1);
    Ok(())
}

#[test]
fn test_malformed_ending_error_chain() {
    let mut decoder = Decoder::new();
    // inner list declares 1 byte but its item is 2 bytes long
    let input = [0xc3, 0xc1, 0x81, 0xff];
    let err = decoder.decode(&input).unwrap_err();

    assert_eq!(err.root_cause(), &DecodeError::MalformedListEnding { overrun: 1 });
    let message = err.to_string();
    assert!(message.starts_with("cannot parse short list: cannot parse list item"));
}

#[test]
fn test_owned_value_outlives_decoder() {
    let owned = {
        let mut decoder = Decoder::new();
        let input = b"\xc8\x83cat\x83dog".to_vec();
        let value = decoder.decode(&input).map(|v| v.to_owned_value());
        value.unwrap()
    };
    assert_eq!(owned.kind(), ValueKind::Array);
}

#[test]
fn test_pool_shared_across_threads() {
    let pool = Arc::new(DecoderPool::from_config(&DecoderConfig::default()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for encoding in valid_encodings() {
                    let kind = pool.decode_with(&encoding, |v| v.kind()).unwrap();
                    assert_eq!(kind == ValueKind::Array, encoding[0] >= 0xc0);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(pool.idle() >= 1);
}

#[test]
fn test_global_pool_scoped_guard() {
    let pool = rlp::global_pool();
    {
        let mut decoder = pool.get();
        let value = decoder.decode(b"\x83dog").unwrap();
        assert_eq!(value.len(), 3);
    }
    assert!(pool.idle() >= 1);
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
