//! Base80 text transport.
//!
//! Big-integer base conversion between raw bytes and an 80-symbol alphabet
//! safe for placement in a URL fragment. Works like Base58: the byte buffer
//! is treated as a base-256 integer and re-expressed in base 80, with a
//! leading run of zero bytes preserved as a matching run of the alphabet's
//! zero character.

use super::error::Error;

/// Current alphabet: digits, letters, then 18 fragment-safe punctuation
/// characters. '/' and '%' are deliberately absent.
pub const ALPHABET: &[u8; 80] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._~!$&'()*+,;=:@?";

/// Historical alphabet. Identical except the last symbol was '#', which
/// terminates a URL fragment; it was replaced by '?' and the old alphabet is
/// kept decode-only.
pub const LEGACY_ALPHABET: &[u8; 80] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._~!$&'()*+,;=:@#";

const BASE: u32 = 80;

/// Encodes bytes with the current alphabet.
pub fn to_base80(bytes: &[u8]) -> String {
    encode_with(bytes, ALPHABET)
}

/// Decodes a string produced with the current alphabet.
pub fn from_base80(text: &str) -> Result<Vec<u8>, Error> {
    decode_with(text, ALPHABET)
}

/// Decodes a string produced with the historical alphabet.
pub fn from_base80_legacy(text: &str) -> Result<Vec<u8>, Error> {
    decode_with(text, LEGACY_ALPHABET)
}

fn encode_with(bytes: &[u8], alphabet: &[u8; 80]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // Repeatedly divide the base-256 number by 80, collecting remainders.
    let mut digits: Vec<u8> = Vec::new();
    let mut num: Vec<u8> = bytes[zeros..].to_vec();
    while !num.is_empty() {
        let mut remainder: u32 = 0;
        let mut quotient = Vec::with_capacity(num.len());
        for &byte in &num {
            let acc = (remainder << 8) | u32::from(byte);
            let q = acc / BASE;
            remainder = acc % BASE;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        digits.push(remainder as u8);
        num = quotient;
    }

    let mut out = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        out.push(alphabet[0] as char);
    }
    for &d in digits.iter().rev() {
        out.push(alphabet[d as usize] as char);
    }
    out
}

fn decode_with(text: &str, alphabet: &[u8; 80]) -> Result<Vec<u8>, Error> {
    let mut values = Vec::with_capacity(text.len());
    for c in text.chars() {
        let value = if c.is_ascii() {
            alphabet.iter().position(|&b| b == c as u8)
        } else {
            None
        };
        values.push(value.ok_or(Error::InvalidCharacter(c))? as u32);
    }

    let zeros = values.iter().take_while(|&&v| v == 0).count();

    // Horner evaluation in base 80 over a growing base-256 buffer.
    let mut bytes: Vec<u8> = Vec::new();
    for &value in &values[zeros..] {
        let mut carry = value;
        for byte in bytes.iter_mut().rev() {
            let acc = u32::from(*byte) * BASE + carry;
            *byte = (acc & 0xFF) as u8;
            carry = acc >> 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabets_are_distinct_and_fragment_safe() {
        assert_eq!(ALPHABET.len(), 80);
        assert!(!ALPHABET.contains(&b'/'));
        assert!(!ALPHABET.contains(&b'%'));
        assert!(!ALPHABET.contains(&b'#'));
        assert!(LEGACY_ALPHABET.contains(&b'#'));
        let mut sorted = ALPHABET.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 80);
    }

    #[test]
    fn empty_input() {
        assert_eq!(to_base80(&[]), "");
        assert_eq!(from_base80("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn all_zero_input() {
        for len in 1..=5 {
            let bytes = vec![0u8; len];
            let text = to_base80(&bytes);
            assert_eq!(text, "0".repeat(len));
            assert_eq!(from_base80(&text).unwrap(), bytes);
        }
    }

    #[test]
    fn leading_zeros_preserved() {
        let bytes = [0, 0, 1, 2, 3];
        let text = to_base80(&bytes);
        assert!(text.starts_with("00"));
        assert_eq!(from_base80(&text).unwrap(), bytes);
    }

    #[test]
    fn roundtrip_assorted_buffers() {
        let cases: Vec<Vec<u8>> = vec![
            vec![1],
            vec![79],
            vec![80],
            vec![255],
            vec![255, 255, 255, 255],
            vec![0, 255, 0, 255],
            (0..=255u8).collect(),
            b"hello world".to_vec(),
        ];
        for bytes in cases {
            let text = to_base80(&bytes);
            assert_eq!(from_base80(&text).unwrap(), bytes, "bytes {bytes:?}");
        }
    }

    #[test]
    fn roundtrip_pseudorandom_buffers() {
        // Deterministic xorshift so failures are reproducible.
        let mut state = 0x2545F4914F6CDD1Du64;
        for len in [1usize, 2, 7, 16, 33, 120] {
            let mut bytes = Vec::with_capacity(len);
            for _ in 0..len {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                bytes.push((state & 0xFF) as u8);
            }
            let text = to_base80(&bytes);
            assert_eq!(from_base80(&text).unwrap(), bytes, "len {len}");
        }
    }

    #[test]
    fn single_symbol_values() {
        assert_eq!(to_base80(&[5]), "5");
        assert_eq!(to_base80(&[79]), "?");
        assert_eq!(to_base80(&[80]), "10");
    }

    #[test]
    fn invalid_character_rejected() {
        assert!(matches!(from_base80("ab/c"), Err(Error::InvalidCharacter('/'))));
        assert!(matches!(from_base80("ab#c"), Err(Error::InvalidCharacter('#'))));
        assert!(matches!(from_base80("\u{00E9}"), Err(Error::InvalidCharacter(_))));
    }

    #[test]
    fn legacy_alphabet_decodes_hash() {
        // 79 encodes to the last symbol of each alphabet.
        assert_eq!(from_base80_legacy("#").unwrap(), vec![79]);
        assert_eq!(from_base80("?").unwrap(), vec![79]);
        // Shared prefix symbols decode identically.
        let bytes = b"same".to_vec();
        let text = to_base80(&bytes);
        if !text.contains('?') {
            assert_eq!(from_base80_legacy(&text).unwrap(), bytes);
        }
    }
}
