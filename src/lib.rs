//! A pure Rust codec for sharing small molecular structures as compact,
//! URL-fragment-safe strings. It packs atoms, bonds, and render style into a
//! bit-level payload, compresses and optionally password-protects it, and
//! emits a Base80 segment suitable for QR codes and URL fragments. The
//! decoder accepts every historical share format ever shipped.
//!
//! # Features
//!
//! - **Compact bitstream** — Per-message element dictionary, fixed-point
//!   coordinate quantization with an adaptive scale exponent, optional
//!   spatial reordering with delta coding
//! - **Encryption** — PBKDF2-derived AES-256-GCM for password-protected
//!   shares
//! - **Fragment-safe transport** — Base80 text encoding using only
//!   characters valid in a URL fragment
//! - **Full backward compatibility** — Decodes the current envelope, four
//!   generations of the legacy binary format, and the original JSON payload
//!
//! # Quick Start
//!
//! Encoding takes a [`Molecule`], a [`ShareStyle`], and [`ShareOptions`];
//! decoding takes the segment plus a bond inference fallback used when the
//! stream was written without bonds:
//!
//! ```
//! use molshare::{Atom, Bond, BondOrder, Molecule, ShareStyle};
//! use molshare::{decode_share_segment, encode_share_data, Error, ShareOptions};
//!
//! // Carbon monoxide: two atoms, one double bond.
//! let molecule = Molecule {
//!     atoms: vec![
//!         Atom::new("C", [0.0, 0.0, 0.0]),
//!         Atom::new("O", [1.2, 0.0, 0.0]),
//!     ],
//!     bonds: vec![Bond::new(0, 1, BondOrder::Double)],
//!     title: None,
//! };
//!
//! let encoded = encode_share_data(&molecule, &ShareStyle::default(), &ShareOptions::default())?;
//! let decoded = decode_share_segment(&encoded.encoded, |_| Vec::new())?;
//!
//! assert_eq!(decoded.molecule.atoms.len(), 2);
//! assert_eq!(decoded.molecule.bonds.len(), 1);
//! # Ok::<(), Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`model`] — Molecule, atom, bond, and render style types
//! - [`share`] — The codec: bitstream, envelope, transport, legacy decoders

pub mod model;
pub mod share;

pub use model::{Atom, Bond, BondOrder, Material, Molecule, Quality, ShareStyle};
pub use share::{
    build_share_url, decode_share_segment, decode_share_segment_encrypted, encode_share_data,
    encode_share_data_encrypted, DecodedShare, EncodedShare, Error, ShareOptions, SharePayload,
    WireVersion,
};
