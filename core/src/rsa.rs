//! Boot ROM cartridge decryption.
//!
//! Lynx cartridges carry their loader encrypted with a 408-bit RSA key;
//! the boot ROM recovers each 51-byte block by cubing it modulo the
//! public modulus (e = 3) and folding the result through a running byte
//! accumulator that must land on zero. Operands are 51-byte big-endian
//! integers, and the modular multiply is the boot ROM's shift-add loop:
//! double, conditionally add, subtract the modulus until it no longer
//! fits. The matching private exponent makes the encrypt direction
//! available for authoring test payloads.

/// Encrypted payload geometry: 51 ciphertext bytes in, 50 loader bytes
/// out per block, at most 15 blocks.
pub const BLOCK_SIZE: usize = 51;
pub const BLOCK_OUTPUT: usize = 50;
pub const MAX_BLOCKS: usize = 15;
pub const MAX_PLAINTEXT: usize = MAX_BLOCKS * BLOCK_OUTPUT;

/// 408-bit public modulus, big-endian.
pub const PUBLIC_MODULUS: [u8; BLOCK_SIZE] = [
    0xC9, 0x6F, 0x62, 0xEA, 0x6D, 0x1F, 0xEF, 0x21, //
    0xA4, 0xC7, 0xC6, 0x58, 0xEE, 0xFB, 0x83, 0xBF, //
    0x38, 0x5F, 0x8F, 0x1C, 0x31, 0xC8, 0xF4, 0x99, //
    0x8C, 0xB2, 0x0B, 0x22, 0xAE, 0xFF, 0x63, 0x94, //
    0x84, 0x0A, 0x60, 0x1B, 0x12, 0xA0, 0xB6, 0x99, //
    0xCF, 0x90, 0x77, 0xAF, 0x1D, 0x35, 0x50, 0xC8, //
    0x57, 0x13, 0x37,
];

/// Private exponent matching `PUBLIC_MODULUS` with e = 3, recovered
/// from the factored modulus. Lets tests round-trip arbitrary payloads.
pub const PRIVATE_EXPONENT: [u8; BLOCK_SIZE] = [
    0x21, 0x92, 0x90, 0x7C, 0x67, 0x85, 0x52, 0x85, //
    0x9B, 0x76, 0xA1, 0x0E, 0xD2, 0x7F, 0x40, 0x9F, //
    0xDE, 0xBA, 0x97, 0xDA, 0x08, 0x4C, 0x28, 0xC4, //
    0x42, 0x18, 0xF1, 0x67, 0x77, 0x02, 0x1A, 0xDB, //
    0x38, 0xE7, 0x74, 0xDF, 0x6F, 0xD4, 0xD5, 0x3F, //
    0xE7, 0xBA, 0xED, 0x13, 0xB9, 0xDD, 0xF0, 0xC2, //
    0x13, 0x94, 0x3B,
];

/// Structural problems with an encrypted payload or plaintext input.
#[derive(Debug, Clone, PartialEq)]
pub enum RsaError {
    /// Shorter than one header byte plus one block.
    TooShort { len: usize },
    /// Header block count decoded outside [1, 15].
    BadBlockCount { count: u16 },
    /// Header promises more blocks than the payload holds.
    TruncatedPayload { expected: usize, len: usize },
    /// Encrypt input empty.
    InputEmpty,
    /// Encrypt input beyond 15 blocks of 50 bytes.
    InputTooLarge { len: usize },
}

impl std::fmt::Display for RsaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "encrypted payload too short: {len} bytes"),
            Self::BadBlockCount { count } => write!(f, "block count {count} outside 1-15"),
            Self::TruncatedPayload { expected, len } => {
                write!(f, "payload needs {expected} bytes, got {len}")
            }
            Self::InputEmpty => write!(f, "plaintext is empty"),
            Self::InputTooLarge { len } => {
                write!(f, "plaintext {len} bytes exceeds {MAX_PLAINTEXT}")
            }
        }
    }
}

impl std::error::Error for RsaError {}

/// Output of `decrypt`. `valid` reports the boot ROM's acceptance test
/// (final accumulator zero); the data is produced either way so a bad
/// dump can still be inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptResult {
    pub data: Vec<u8>,
    pub block_count: u8,
    pub checksum: u8,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncryptResult {
    pub data: Vec<u8>,
    pub block_count: u8,
}

// ---------------------------------------------------------------------------
// Big-endian multi-byte arithmetic (52-byte working width: one spare
// high byte so doubling a value below the modulus cannot overflow)
// ---------------------------------------------------------------------------

const WORK: usize = BLOCK_SIZE + 1;

/// value <<= 1. Returns the bit shifted out of the top.
fn double_value(value: &mut [u8]) -> u8 {
    let mut carry = 0;
    for byte in value.iter_mut().rev() {
        let next_carry = *byte >> 7;
        *byte = (*byte << 1) | carry;
        carry = next_carry;
    }
    carry
}

/// value += other (same length). Returns the final carry.
fn plus_equals_value(value: &mut [u8], other: &[u8]) -> u8 {
    let mut carry = 0u16;
    for (a, b) in value.iter_mut().rev().zip(other.iter().rev()) {
        let sum = *a as u16 + *b as u16 + carry;
        *a = sum as u8;
        carry = sum >> 8;
    }
    carry as u8
}

/// value -= other (same length). Returns the final borrow: 1 means
/// `other` was larger and the result wrapped.
fn minus_equals_value(value: &mut [u8], other: &[u8]) -> u8 {
    let mut borrow = 0i16;
    for (a, b) in value.iter_mut().rev().zip(other.iter().rev()) {
        let diff = *a as i16 - *b as i16 - borrow;
        *a = diff as u8;
        borrow = (diff < 0) as i16;
    }
    borrow as u8
}

fn widen(src: &[u8; BLOCK_SIZE]) -> [u8; WORK] {
    let mut out = [0u8; WORK];
    out[1..].copy_from_slice(src);
    out
}

/// result = a * b mod modulus, by the boot ROM's bit-serial loop:
/// for each multiplier bit, double the partial result, add the
/// multiplicand when the bit is set, and subtract the modulus until the
/// subtraction borrows.
pub fn montgomery_multiply(
    result: &mut [u8; BLOCK_SIZE],
    a: &[u8; BLOCK_SIZE],
    b: &[u8; BLOCK_SIZE],
    modulus: &[u8; BLOCK_SIZE],
) {
    let wide_b = widen(b);
    let wide_n = widen(modulus);
    let mut acc = [0u8; WORK];

    for &byte in a.iter() {
        for bit in (0..8).rev() {
            double_value(&mut acc);
            reduce(&mut acc, &wide_n);
            if byte & (1 << bit) != 0 {
                plus_equals_value(&mut acc, &wide_b);
                reduce(&mut acc, &wide_n);
            }
        }
    }
    result.copy_from_slice(&acc[1..]);
}

/// Subtract the modulus while it still fits ("repeat if borrow cleared").
fn reduce(acc: &mut [u8; WORK], modulus: &[u8; WORK]) {
    loop {
        let mut trial = *acc;
        if minus_equals_value(&mut trial, modulus) != 0 {
            break;
        }
        *acc = trial;
    }
}

/// result = base ^ exponent mod modulus (square-and-multiply, MSB first).
pub fn modular_exponentiate(
    result: &mut [u8; BLOCK_SIZE],
    base: &[u8; BLOCK_SIZE],
    exponent: &[u8; BLOCK_SIZE],
    modulus: &[u8; BLOCK_SIZE],
) {
    let mut acc = [0u8; BLOCK_SIZE];
    acc[BLOCK_SIZE - 1] = 1;
    let mut started = false;

    for &byte in exponent.iter() {
        for bit in (0..8).rev() {
            if started {
                let square = acc;
                montgomery_multiply(&mut acc, &square, &square, modulus);
            }
            if byte & (1 << bit) != 0 {
                let partial = acc;
                montgomery_multiply(&mut acc, &partial, base, modulus);
                started = true;
            }
        }
    }
    result.copy_from_slice(&acc);
}

// ---------------------------------------------------------------------------
// Payload validation / decrypt / encrypt
// ---------------------------------------------------------------------------

/// Block count claimed by the header byte: stored as 256 - N.
pub fn header_block_count(encrypted: &[u8]) -> Option<u16> {
    encrypted.first().map(|&b| 256 - b as u16)
}

/// Check the payload's structure: header present, block count in
/// [1, 15], enough data for every block.
pub fn validate(encrypted: &[u8]) -> bool {
    check_structure(encrypted).is_ok()
}

fn check_structure(encrypted: &[u8]) -> Result<usize, RsaError> {
    if encrypted.len() < 1 + BLOCK_SIZE {
        return Err(RsaError::TooShort {
            len: encrypted.len(),
        });
    }
    let count = header_block_count(encrypted).unwrap_or(0);
    if count == 0 || count as usize > MAX_BLOCKS {
        return Err(RsaError::BadBlockCount { count });
    }
    let expected = 1 + count as usize * BLOCK_SIZE;
    if encrypted.len() < expected {
        return Err(RsaError::TruncatedPayload {
            expected,
            len: encrypted.len(),
        });
    }
    Ok(count as usize)
}

/// Decrypted output size for a structurally valid payload.
pub fn decrypted_size(encrypted: &[u8]) -> Option<usize> {
    check_structure(encrypted).ok().map(|n| n * BLOCK_OUTPUT)
}

/// Decrypt a boot payload. Each block is cubed modulo the public key
/// (two multiplies: square, then times the block again) and folded
/// through the running accumulator; the accumulator survives across
/// blocks and must end at zero for the payload to be genuine.
pub fn decrypt(encrypted: &[u8]) -> Result<DecryptResult, RsaError> {
    let block_count = check_structure(encrypted)?;

    let mut data = Vec::with_capacity(block_count * BLOCK_OUTPUT);
    let mut accumulator = 0u8;

    for block_index in 0..block_count {
        let start = 1 + block_index * BLOCK_SIZE;
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(&encrypted[start..start + BLOCK_SIZE]);

        let mut squared = [0u8; BLOCK_SIZE];
        montgomery_multiply(&mut squared, &block, &block, &PUBLIC_MODULUS);
        let mut cubed = [0u8; BLOCK_SIZE];
        montgomery_multiply(&mut cubed, &squared, &block, &PUBLIC_MODULUS);

        for i in (1..BLOCK_SIZE).rev() {
            accumulator = accumulator.wrapping_add(cubed[i]);
            data.push(accumulator);
        }
    }

    Ok(DecryptResult {
        data,
        block_count: block_count as u8,
        checksum: accumulator,
        valid: accumulator == 0,
    })
}

/// Encrypt a loader image with the private exponent. The plaintext is
/// zero-padded up to a 50-byte block boundary; the header byte encodes
/// the block count as 256 - N.
pub fn encrypt(plaintext: &[u8]) -> Result<EncryptResult, RsaError> {
    if plaintext.is_empty() {
        return Err(RsaError::InputEmpty);
    }
    if plaintext.len() > MAX_PLAINTEXT {
        return Err(RsaError::InputTooLarge {
            len: plaintext.len(),
        });
    }

    let block_count = plaintext.len().div_ceil(BLOCK_OUTPUT);
    let mut data = Vec::with_capacity(1 + block_count * BLOCK_SIZE);
    data.push((256 - block_count as u16) as u8);

    let mut accumulator = 0u8;
    for block_index in 0..block_count {
        // Reconstruct the pre-accumulator block: each byte is the
        // difference between consecutive desired outputs. Byte 0 stays
        // zero, keeping the block value below the modulus.
        let mut message = [0u8; BLOCK_SIZE];
        for i in (1..BLOCK_SIZE).rev() {
            let out_index = block_index * BLOCK_OUTPUT + (BLOCK_SIZE - 1 - i);
            let desired = plaintext.get(out_index).copied().unwrap_or(0);
            message[i] = desired.wrapping_sub(accumulator);
            accumulator = desired;
        }

        let mut cipher = [0u8; BLOCK_SIZE];
        modular_exponentiate(&mut cipher, &message, &PRIVATE_EXPONENT, &PUBLIC_MODULUS);
        data.extend_from_slice(&cipher);
    }

    Ok(EncryptResult {
        data,
        block_count: block_count as u8,
    })
}
