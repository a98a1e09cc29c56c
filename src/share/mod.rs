//! Share codec: encode a molecule + render style into a compact,
//! URL-fragment-safe string and decode any historical segment back.
//!
//! Encode always targets the latest format: center and reorder atoms,
//! quantize, build the bitstream, DEFLATE, optionally encrypt, wrap in the
//! envelope, then Base80-encode. Decode is a cascade that must accept every
//! string any historical encoder ever produced: current Base80 first, then
//! the legacy Base80 alphabet, then base64url; after byte recovery the
//! envelope magic selects the generation-specific parser, with a structured
//! JSON fallback for the oldest links.

pub mod base80;
pub mod bits;
pub mod crypto;
pub mod elements;
pub mod envelope;
pub mod error;
pub mod legacy;
pub mod payload;
pub mod spatial;
pub mod title;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub use error::Error;
pub use payload::{SharePayload, WireVersion, MAX_ATOMS, MAX_BONDS};

use crate::model::{Atom, Bond, Molecule, ShareStyle};
use payload::{DecodedPayload, PayloadInput};

/// Encode-time options.
#[derive(Debug, Clone)]
pub struct ShareOptions {
    /// Drop bond records from the stream; the decoder re-derives them.
    pub omit_bonds: bool,
    /// Low bits discarded from quantized coordinates, 0..=8.
    pub precision_drop: u8,
    /// Enable spatial reordering and delta coding.
    pub use_delta: bool,
    /// Optional label, sanitized to the 64-character title alphabet.
    pub title: Option<String>,
}

impl Default for ShareOptions {
    fn default() -> Self {
        Self {
            omit_bonds: false,
            precision_drop: 0,
            use_delta: true,
            title: None,
        }
    }
}

/// Result of an encode call.
#[derive(Debug)]
pub struct EncodedShare {
    /// URL-fragment-safe segment.
    pub encoded: String,
    /// Envelope size in bytes before text encoding.
    pub byte_length: usize,
    /// Header metadata describing what was written.
    pub payload: SharePayload,
    /// Chosen coordinate scale exponent.
    pub scale_exp: u8,
}

/// Result of a decode call.
#[derive(Debug)]
pub struct DecodedShare {
    pub payload: SharePayload,
    pub molecule: Molecule,
    pub style: ShareStyle,
}

/// Encodes a molecule into an unencrypted share segment.
pub fn encode_share_data(
    molecule: &Molecule,
    style: &ShareStyle,
    options: &ShareOptions,
) -> Result<EncodedShare, Error> {
    let (compressed, meta) = encode_inner(molecule, style, options)?;
    let enveloped = envelope::wrap_plain(&compressed);
    finish_encode(enveloped, meta)
}

/// Encodes a molecule into a password-protected share segment.
pub fn encode_share_data_encrypted(
    molecule: &Molecule,
    style: &ShareStyle,
    options: &ShareOptions,
    password: &str,
) -> Result<EncodedShare, Error> {
    let (compressed, meta) = encode_inner(molecule, style, options)?;
    let enveloped = envelope::wrap_encrypted(&compressed, password)?;
    finish_encode(enveloped, meta)
}

fn encode_inner(
    molecule: &Molecule,
    style: &ShareStyle,
    options: &ShareOptions,
) -> Result<(Vec<u8>, SharePayload), Error> {
    let sanitized = options
        .title
        .as_deref()
        .map(title::sanitize_title)
        .filter(|t| !t.is_empty());

    let prepared = spatial::prepare(molecule, options.use_delta, options.precision_drop)?;
    let stream = payload::encode_payload(&PayloadInput {
        prepared: &prepared,
        style,
        delta: options.use_delta,
        omit_bonds: options.omit_bonds,
        title: sanitized.as_deref(),
    })?;

    let meta = SharePayload {
        version: WireVersion::Current,
        atom_count: prepared.atoms.len(),
        bond_count: if options.omit_bonds { 0 } else { prepared.bonds.len() },
        scale_exp: prepared.scale_exp,
        coord_bits: prepared.coord_bits,
        delta: options.use_delta,
        bonds_omitted: options.omit_bonds,
        title: sanitized,
    };
    Ok((envelope::deflate(&stream), meta))
}

fn finish_encode(enveloped: Vec<u8>, meta: SharePayload) -> Result<EncodedShare, Error> {
    let scale_exp = meta.scale_exp;
    Ok(EncodedShare {
        encoded: base80::to_base80(&enveloped),
        byte_length: enveloped.len(),
        payload: meta,
        scale_exp,
    })
}

/// Decodes a share segment. Fails with [`Error::PasswordRequired`] when the
/// segment is encrypted. `guess_bonds` is the external bond inference
/// collaborator, invoked only when the stream was written without bonds.
pub fn decode_share_segment<F>(segment: &str, guess_bonds: F) -> Result<DecodedShare, Error>
where
    F: FnOnce(&[Atom]) -> Vec<Bond>,
{
    decode_with_password(segment, None, guess_bonds)
}

/// Decodes a password-protected share segment. A wrong password surfaces as
/// [`Error::WrongPassword`], never as plausible-but-corrupt data.
pub fn decode_share_segment_encrypted<F>(
    segment: &str,
    password: &str,
    guess_bonds: F,
) -> Result<DecodedShare, Error>
where
    F: FnOnce(&[Atom]) -> Vec<Bond>,
{
    decode_with_password(segment, Some(password), guess_bonds)
}

fn decode_with_password<F>(
    segment: &str,
    password: Option<&str>,
    guess_bonds: F,
) -> Result<DecodedShare, Error>
where
    F: FnOnce(&[Atom]) -> Vec<Bond>,
{
    let transports: [fn(&str) -> Result<Vec<u8>, Error>; 3] = [
        base80::from_base80,
        base80::from_base80_legacy,
        decode_base64url,
    ];

    for transport in transports {
        let bytes = match transport(segment) {
            Ok(bytes) => bytes,
            // Invalid character for this alphabet: try the next transport.
            Err(_) => continue,
        };
        match decode_envelope(&bytes, password) {
            Ok(decoded) => return Ok(finish_decode(decoded, guess_bonds)),
            // Wrong transport produces garbage bytes that fail to inflate.
            Err(Error::Decompression) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(Error::Decompression)
}

fn decode_base64url(segment: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD.decode(segment).map_err(|e| match e {
        base64::DecodeError::InvalidByte(_, byte) => Error::InvalidCharacter(char::from(byte)),
        _ => Error::UnsupportedFormat,
    })
}

/// Dispatches recovered envelope bytes to the generation-specific parser.
fn decode_envelope(bytes: &[u8], password: Option<&str>) -> Result<DecodedPayload, Error> {
    match envelope::detect(bytes) {
        envelope::Detected::Current { .. } => {
            let compressed = envelope::open_current(bytes, password)?;
            let inner = envelope::inflate(&compressed)?;
            payload::decode_payload(&inner, WireVersion::Current)
        }
        envelope::Detected::Legacy(version) => {
            let inner = envelope::inflate(&bytes[4..])?;
            legacy::decode_version(&inner, version)
        }
        envelope::Detected::Unrecognized => {
            let inner = envelope::inflate(bytes)?;
            legacy::decode_json(&inner)
        }
    }
}

fn finish_decode<F>(decoded: DecodedPayload, guess_bonds: F) -> DecodedShare
where
    F: FnOnce(&[Atom]) -> Vec<Bond>,
{
    let DecodedPayload {
        mut molecule,
        style,
        meta,
    } = decoded;
    if meta.bonds_omitted {
        molecule.bonds = guess_bonds(&molecule.atoms);
    }
    DecodedShare {
        payload: meta,
        molecule,
        style,
    }
}

/// Builds the shareable URL for an encoded segment: base, `/qr#`, segment.
pub fn build_share_url(base_url: &str, encoded: &str) -> String {
    format!("{}/qr#{}", base_url.trim_end_matches('/'), encoded)
}
