//! End-to-end boot decryption scenarios.

use caracal_core::rsa::{
    self, BLOCK_OUTPUT, BLOCK_SIZE, MAX_PLAINTEXT, RsaError, decrypted_size, header_block_count,
};

/// 52-byte minimum payload: header claims one block, then bytes 1..=51.
fn minimum_payload() -> Vec<u8> {
    let mut bytes = vec![0xFFu8]; // 256 - 0xFF = 1 block
    bytes.extend(1..=BLOCK_SIZE as u8);
    bytes
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_minimum_payload_validates() {
    let payload = minimum_payload();
    assert_eq!(payload.len(), 52);
    assert!(rsa::validate(&payload));
    assert_eq!(header_block_count(&payload), Some(1));
    assert_eq!(decrypted_size(&payload), Some(50));
}

#[test]
fn test_minimum_payload_decrypts_to_fifty_bytes() {
    let result = rsa::decrypt(&minimum_payload()).unwrap();
    assert_eq!(result.data.len(), 50);
    assert_eq!(result.block_count, 1);
    // Arbitrary input essentially never folds to a zero accumulator.
    assert!(!result.valid);
    assert_ne!(result.checksum, 0);
}

#[test]
fn test_sixteen_block_claim_rejected() {
    // Header 0xF0 claims 16 blocks: outside [1, 15].
    let mut payload = vec![0xF0u8];
    payload.extend([0u8; 51]);
    assert!(!rsa::validate(&payload));
    assert_eq!(
        rsa::decrypt(&payload),
        Err(RsaError::BadBlockCount { count: 16 })
    );
}

#[test]
fn test_zero_block_claim_rejected() {
    let mut payload = vec![0x00u8]; // 256 - 0 = 256 blocks
    payload.extend([0u8; 51]);
    assert!(!rsa::validate(&payload));
}

#[test]
fn test_empty_input_rejected() {
    assert!(!rsa::validate(&[]));
    assert_eq!(rsa::decrypt(&[]), Err(RsaError::TooShort { len: 0 }));
}

#[test]
fn test_header_only_input_rejected() {
    // 51 bytes: one short of header + one block.
    let payload = vec![0xFFu8; 51];
    assert!(!rsa::validate(&payload));
    assert_eq!(rsa::decrypt(&payload), Err(RsaError::TooShort { len: 51 }));
}

#[test]
fn test_truncated_multi_block_rejected() {
    // Claims 3 blocks but carries only 2.
    let mut payload = vec![0xFDu8];
    payload.extend([0u8; 2 * BLOCK_SIZE]);
    assert!(!rsa::validate(&payload));
    assert!(matches!(
        rsa::decrypt(&payload),
        Err(RsaError::TruncatedPayload { .. })
    ));
}

// =============================================================================
// Encrypt / decrypt round trips
// =============================================================================

#[test]
fn test_multi_block_round_trip() {
    // 200 bytes -> exactly 4 blocks.
    let plaintext: Vec<u8> = (0..200u32).map(|i| ((i * 17 + 3) % 256) as u8).collect();
    let encrypted = rsa::encrypt(&plaintext).unwrap();
    assert_eq!(encrypted.block_count, 4);
    assert_eq!(encrypted.data.len(), 1 + 4 * BLOCK_SIZE);

    let decrypted = rsa::decrypt(&encrypted.data).unwrap();
    assert_eq!(decrypted.block_count, 4);
    assert_eq!(decrypted.data, plaintext);
}

#[test]
fn test_single_byte_round_trip() {
    let encrypted = rsa::encrypt(&[0xA5]).unwrap();
    assert_eq!(encrypted.block_count, 1);
    let decrypted = rsa::decrypt(&encrypted.data).unwrap();
    assert_eq!(decrypted.data[0], 0xA5);
    // Zero padding fills the rest of the block.
    assert!(decrypted.data[1..].iter().all(|&b| b == 0));
    // Padding ends the accumulator at zero, so the payload is genuine.
    assert!(decrypted.valid);
}

#[test]
fn test_maximum_plaintext_round_trip() {
    let plaintext: Vec<u8> = (0..MAX_PLAINTEXT as u32).map(|i| (i % 251) as u8).collect();
    let encrypted = rsa::encrypt(&plaintext).unwrap();
    assert_eq!(encrypted.block_count, 15);
    let decrypted = rsa::decrypt(&encrypted.data).unwrap();
    assert_eq!(decrypted.data, plaintext);
}

#[test]
fn test_partial_final_block_padding() {
    // 60 bytes: 2 blocks, 40 bytes of padding.
    let plaintext: Vec<u8> = (1..=60u8).collect();
    let encrypted = rsa::encrypt(&plaintext).unwrap();
    assert_eq!(encrypted.block_count, 2);
    let decrypted = rsa::decrypt(&encrypted.data).unwrap();
    assert_eq!(decrypted.data.len(), 2 * BLOCK_OUTPUT);
    assert_eq!(&decrypted.data[..60], plaintext.as_slice());
}

#[test]
fn test_checksum_zero_when_plaintext_ends_at_zero() {
    // The accumulator equals the last emitted byte; a trailing zero
    // byte therefore validates.
    let mut plaintext = vec![0x11u8; 50];
    plaintext[49] = 0x00;
    let encrypted = rsa::encrypt(&plaintext).unwrap();
    let decrypted = rsa::decrypt(&encrypted.data).unwrap();
    assert!(decrypted.valid);
    assert_eq!(decrypted.checksum, 0);
}

#[test]
fn test_checksum_nonzero_when_plaintext_ends_nonzero() {
    let plaintext = vec![0x11u8; 50]; // last output byte is 0x11
    let encrypted = rsa::encrypt(&plaintext).unwrap();
    let decrypted = rsa::decrypt(&encrypted.data).unwrap();
    assert!(!decrypted.valid);
    assert_eq!(decrypted.checksum, 0x11);
}

// =============================================================================
// Encrypt input limits
// =============================================================================

#[test]
fn test_encrypt_empty_rejected() {
    assert_eq!(rsa::encrypt(&[]), Err(RsaError::InputEmpty));
}

#[test]
fn test_encrypt_over_750_rejected() {
    let too_big = vec![0u8; MAX_PLAINTEXT + 1];
    assert_eq!(
        rsa::encrypt(&too_big),
        Err(RsaError::InputTooLarge {
            len: MAX_PLAINTEXT + 1
        })
    );
}

#[test]
fn test_encrypt_header_encodes_block_count() {
    let one = rsa::encrypt(&[1u8; 50]).unwrap();
    assert_eq!(one.data[0], 0xFF); // 256 - 1
    let four = rsa::encrypt(&[1u8; 200]).unwrap();
    assert_eq!(four.data[0], 0xFC); // 256 - 4
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_decrypt_is_deterministic() {
    let payload = minimum_payload();
    let first = rsa::decrypt(&payload).unwrap();
    let second = rsa::decrypt(&payload).unwrap();
    assert_eq!(first, second);
}
