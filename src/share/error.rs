//! Error type for the share codec.
//!
//! Transport and decompression failures are recovered internally by falling
//! back to legacy transports; everything surfaced here is final. Password
//! conditions get their own variants so callers can prompt instead of
//! treating the link as corrupt.

use thiserror::Error;

/// Errors that can occur while encoding or decoding a share segment.
#[derive(Debug, Error)]
pub enum Error {
    /// A value does not fit the requested bit width at write time.
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        /// The offending value.
        value: i64,
        /// Requested field width.
        bits: u32,
    },

    /// Requested an unsupported field width.
    #[error("invalid field width of {0} bits")]
    InvalidWidth(u32),

    /// The bitstream ended before a field could be read in full.
    #[error("unexpected end of bitstream while reading {0} bits")]
    UnexpectedEnd(u32),

    /// A transport string contains a character outside its alphabet.
    #[error("invalid transport character '{0}'")]
    InvalidCharacter(char),

    /// All transports produced bytes that failed to decompress.
    #[error("failed to decode payload")]
    Decompression,

    /// The envelope is shorter than its declared layout.
    #[error("share envelope is truncated")]
    TruncatedEnvelope,

    /// No known magic/version matched and the JSON fallback did not apply.
    #[error("unsupported share payload format")]
    UnsupportedFormat,

    /// More atoms than the 10-bit count field can carry.
    #[error("molecule has {count} atoms but the format supports at most {max}")]
    TooManyAtoms {
        /// Actual atom count.
        count: usize,
        /// Field capacity.
        max: usize,
    },

    /// More bonds than the 12-bit count field can carry.
    #[error("molecule has {count} bonds but the format supports at most {max}")]
    TooManyBonds {
        /// Actual bond count.
        count: usize,
        /// Field capacity.
        max: usize,
    },

    /// A bond field references an atom outside the decoded range.
    #[error("bond references atom {index} outside the decoded range of {count} atoms")]
    BondIndexOutOfRange {
        /// The out-of-range index.
        index: usize,
        /// Decoded atom count.
        count: usize,
    },

    /// The reserved 00 bond order code appeared in the stream.
    #[error("invalid bond order code {0} in payload")]
    InvalidBondOrder(u8),

    /// Encoding requires at least one atom.
    #[error("molecule is empty: at least one atom is required")]
    EmptyMolecule,

    /// A bond references an atom missing from the input molecule.
    #[error("bond between atoms {i} and {j} references a missing atom")]
    InvalidBond {
        /// First bond index.
        i: usize,
        /// Second bond index.
        j: usize,
    },

    /// The segment is encrypted and no password was supplied.
    #[error("password required to decode this share segment")]
    PasswordRequired,

    /// Authentication failed while decrypting.
    #[error("wrong password or data corrupted")]
    WrongPassword,

    /// The cipher rejected the encryption request.
    #[error("encryption failed")]
    Encryption,
}
