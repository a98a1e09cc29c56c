//! Envelope framing: magic, version/flags, compression, encryption split.
//!
//! Current envelope: `MTG` + one byte packing a 4-bit version and 4-bit
//! flags (bit 0 = encrypted), then the DEFLATE-compressed bitstream, or the
//! salt/nonce/ciphertext triple when encrypted. The legacy `QRM` envelope is
//! a 3-byte magic + 1 version byte (3 through 6), always unencrypted.
//! Decoders identify the generation purely from these leading bytes.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::crypto::{self, NONCE_LEN, SALT_LEN};
use super::error::Error;

/// Current envelope magic.
pub const MAGIC: &[u8; 3] = b"MTG";

/// Legacy envelope magic, versions 3 through 6.
pub const LEGACY_MAGIC: &[u8; 3] = b"QRM";

/// Current envelope version nibble.
pub const VERSION: u8 = 1;

/// Flags nibble bit 0: body is encrypted.
pub const FLAG_ENCRYPTED: u8 = 0b0001;

/// Raw DEFLATE at maximum compression.
pub fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    // Writing into a Vec cannot fail.
    encoder.write_all(bytes).expect("deflate into memory");
    encoder.finish().expect("deflate into memory")
}

/// Raw INFLATE; failure here is what drives transport fallback.
pub fn inflate(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|_| Error::Decompression)?;
    Ok(out)
}

/// Wraps a compressed payload in the current unencrypted envelope.
pub fn wrap_plain(compressed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION << 4);
    out.extend_from_slice(compressed);
    out
}

/// Wraps a compressed payload in the current encrypted envelope.
pub fn wrap_encrypted(compressed: &[u8], password: &str) -> Result<Vec<u8>, Error> {
    let (salt, nonce, ciphertext) = crypto::seal(password, compressed)?;
    let mut out = Vec::with_capacity(4 + SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.push((VERSION << 4) | FLAG_ENCRYPTED);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Envelope generation identified from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detected {
    /// Current envelope; flag tells whether the body is encrypted.
    Current { encrypted: bool },
    /// Legacy QRM envelope with its version byte.
    Legacy(u8),
    /// No recognized magic; candidate for the JSON fallback.
    Unrecognized,
}

/// Inspects the leading bytes without touching the body.
pub fn detect(bytes: &[u8]) -> Detected {
    if bytes.len() >= 4 {
        if &bytes[..3] == MAGIC {
            let version = bytes[3] >> 4;
            let flags = bytes[3] & 0x0F;
            if version == VERSION {
                return Detected::Current {
                    encrypted: flags & FLAG_ENCRYPTED != 0,
                };
            }
        }
        if &bytes[..3] == LEGACY_MAGIC && (3..=6).contains(&bytes[3]) {
            return Detected::Legacy(bytes[3]);
        }
    }
    Detected::Unrecognized
}

/// Recovers the compressed inner payload from a current envelope.
///
/// `password` is consulted only when the encryption flag is set; an
/// encrypted body without a password yields [`Error::PasswordRequired`].
pub fn open_current(bytes: &[u8], password: Option<&str>) -> Result<Vec<u8>, Error> {
    let encrypted = match detect(bytes) {
        Detected::Current { encrypted } => encrypted,
        _ => return Err(Error::UnsupportedFormat),
    };
    let body = &bytes[4..];
    if !encrypted {
        return Ok(body.to_vec());
    }

    let password = password.ok_or(Error::PasswordRequired)?;
    if body.len() < SALT_LEN + NONCE_LEN + crypto::TAG_LEN {
        return Err(Error::TruncatedEnvelope);
    }
    let (salt, rest) = body.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    crypto::open(password, salt, nonce, ciphertext)
}
