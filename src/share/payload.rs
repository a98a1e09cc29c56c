//! Inner bitstream payload, current layout.
//!
//! Field order (widths in bits): atomCount(10), bondCount(12), scaleExp(2),
//! coordBits-8(4), material(2), atomScaleQ6(6), bondRadiusQ6(6), quality(2),
//! deltaFlag(1), omitBondsFlag(1), dictSize(7), dictSize x elementCode(7),
//! optional title block, atom records, then bond records unless omitted.
//! Wire version 6 of the legacy QRM envelope uses this same layout, so its
//! decoder lives here too.

use std::fmt;

use super::bits::{index_bits, BitReader, BitWriter};
use super::elements;
use super::error::Error;
use super::spatial::{dequantize, PreparedAtoms};
use super::title;
use crate::model::{Atom, Bond, BondOrder, Material, Molecule, Quality, ShareStyle};

/// Capacity of the 10-bit atom count field.
pub const MAX_ATOMS: usize = 1023;

/// Capacity of the 12-bit bond count field.
pub const MAX_BONDS: usize = 4095;

/// Wire generation a decoded segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVersion {
    /// Structured JSON payload, version tag 2.
    JsonV2,
    /// QRM binary envelope, versions 3 through 6.
    Qrm(u8),
    /// Current MTG envelope, version 1.
    Current,
}

impl fmt::Display for WireVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireVersion::JsonV2 => write!(f, "json-v2"),
            WireVersion::Qrm(v) => write!(f, "qrm-v{v}"),
            WireVersion::Current => write!(f, "mtg-v1"),
        }
    }
}

/// Decoded header metadata surfaced to callers alongside the molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct SharePayload {
    pub version: WireVersion,
    pub atom_count: usize,
    pub bond_count: usize,
    pub scale_exp: u8,
    pub coord_bits: u32,
    pub delta: bool,
    pub bonds_omitted: bool,
    pub title: Option<String>,
}

/// Fully parsed inner payload before bond inference is applied.
#[derive(Debug)]
pub struct DecodedPayload {
    pub molecule: Molecule,
    pub style: ShareStyle,
    pub meta: SharePayload,
}

/// Encoder-side inputs for the current layout.
pub struct PayloadInput<'a> {
    pub prepared: &'a PreparedAtoms,
    pub style: &'a ShareStyle,
    pub delta: bool,
    pub omit_bonds: bool,
    /// Already sanitized; `None` or empty writes an absent title block.
    pub title: Option<&'a str>,
}

/// Builds the current-version bitstream.
pub fn encode_payload(input: &PayloadInput<'_>) -> Result<Vec<u8>, Error> {
    let atoms = &input.prepared.atoms;
    let bonds = &input.prepared.bonds;
    if atoms.len() > MAX_ATOMS {
        return Err(Error::TooManyAtoms {
            count: atoms.len(),
            max: MAX_ATOMS,
        });
    }
    if bonds.len() > MAX_BONDS {
        return Err(Error::TooManyBonds {
            count: bonds.len(),
            max: MAX_BONDS,
        });
    }

    let mut w = BitWriter::new();
    w.write_unsigned(atoms.len() as u32, 10)?;
    let bond_count = if input.omit_bonds { 0 } else { bonds.len() };
    w.write_unsigned(bond_count as u32, 12)?;
    w.write_unsigned(u32::from(input.prepared.scale_exp), 2)?;
    w.write_unsigned(input.prepared.coord_bits - 8, 4)?;
    w.write_unsigned(u32::from(input.style.material.code()), 2)?;
    w.write_unsigned(u32::from(ShareStyle::quantize_scale(input.style.atom_scale)), 6)?;
    w.write_unsigned(u32::from(ShareStyle::quantize_scale(input.style.bond_radius)), 6)?;
    w.write_unsigned(u32::from(input.style.quality.code()), 2)?;
    w.write_unsigned(u32::from(input.delta), 1)?;
    w.write_unsigned(u32::from(input.omit_bonds), 1)?;

    let dictionary = build_dictionary(atoms);
    w.write_unsigned(dictionary.len() as u32, 7)?;
    for &code in &dictionary {
        w.write_unsigned(u32::from(code), 7)?;
    }

    title::write_title(&mut w, input.title)?;

    write_atoms(&mut w, input, &dictionary)?;

    if !input.omit_bonds {
        write_bonds(&mut w, bonds, atoms.len())?;
    }

    Ok(w.into_bytes())
}

/// Per-message element dictionary in first-appearance order.
fn build_dictionary(atoms: &[Atom]) -> Vec<u8> {
    let mut dictionary: Vec<u8> = Vec::new();
    for atom in atoms {
        let code = elements::symbol_to_code(&atom.symbol);
        if !dictionary.contains(&code) {
            dictionary.push(code);
        }
    }
    dictionary
}

fn write_atoms(w: &mut BitWriter, input: &PayloadInput<'_>, dictionary: &[u8]) -> Result<(), Error> {
    let dict_bits = index_bits(dictionary.len());
    let bits = input.prepared.coord_bits;
    let limit = 1i64 << (bits - 1);

    let mut previous = [0i64; 3];
    for (idx, (atom, q)) in input
        .prepared
        .atoms
        .iter()
        .zip(&input.prepared.quantized)
        .enumerate()
    {
        let code = elements::symbol_to_code(&atom.symbol);
        let dict_index = dictionary.iter().position(|&c| c == code).unwrap_or(0);
        w.write_unsigned(dict_index as u32, dict_bits)?;

        for k in 0..3 {
            let value = i64::from(q[k]);
            let field = if input.delta && idx > 0 {
                value - previous[k]
            } else {
                value
            };
            // Out-of-range deltas only occur once the scale exponent is
            // exhausted; they clamp, trading precision for a valid stream.
            let clamped = field.clamp(-limit, limit - 1);
            w.write_signed(clamped as i32, bits)?;
            previous[k] = value;
        }
    }
    Ok(())
}

fn write_bonds(w: &mut BitWriter, bonds: &[Bond], atom_count: usize) -> Result<(), Error> {
    let bits = index_bits(atom_count);
    for bond in bonds {
        w.write_unsigned(bond.i as u32, bits)?;
        w.write_unsigned(bond.j as u32, bits)?;
        w.write_unsigned(u32::from(bond.order.code()), 2)?;
    }
    Ok(())
}

/// Parses the current layout (also QRM version 6).
pub fn decode_payload(bytes: &[u8], version: WireVersion) -> Result<DecodedPayload, Error> {
    let mut r = BitReader::new(bytes);

    let atom_count = r.read_unsigned(10)? as usize;
    let bond_count = r.read_unsigned(12)? as usize;
    let scale_exp = r.read_unsigned(2)? as u8;
    let coord_bits = r.read_unsigned(4)? + 8;
    let material = Material::from_code(r.read_unsigned(2)? as u8);
    let atom_scale = ShareStyle::dequantize_scale(r.read_unsigned(6)? as u8);
    let bond_radius = ShareStyle::dequantize_scale(r.read_unsigned(6)? as u8);
    let quality = Quality::from_code(r.read_unsigned(2)? as u8);
    let delta = r.read_unsigned(1)? == 1;
    let bonds_omitted = r.read_unsigned(1)? == 1;

    let dict_size = r.read_unsigned(7)? as usize;
    let mut dictionary = Vec::with_capacity(dict_size);
    for _ in 0..dict_size {
        dictionary.push(r.read_unsigned(7)? as u8);
    }

    let decoded_title = title::read_title(&mut r)?;

    let atoms = read_atoms(&mut r, atom_count, coord_bits, scale_exp, delta, &dictionary)?;
    let bonds = if bonds_omitted {
        Vec::new()
    } else {
        read_bonds(&mut r, bond_count, atom_count)?
    };

    let style = ShareStyle {
        material,
        quality,
        atom_scale,
        bond_radius,
    };
    let meta = SharePayload {
        version,
        atom_count,
        bond_count,
        scale_exp,
        coord_bits,
        delta,
        bonds_omitted,
        title: decoded_title.clone(),
    };
    Ok(DecodedPayload {
        molecule: Molecule {
            atoms,
            bonds,
            title: decoded_title,
        },
        style,
        meta,
    })
}

fn read_atoms(
    r: &mut BitReader<'_>,
    atom_count: usize,
    coord_bits: u32,
    scale_exp: u8,
    delta: bool,
    dictionary: &[u8],
) -> Result<Vec<Atom>, Error> {
    let dict_bits = index_bits(dictionary.len());
    let mut atoms = Vec::with_capacity(atom_count);
    let mut previous = [0i64; 3];
    for idx in 0..atom_count {
        let dict_index = r.read_unsigned(dict_bits)? as usize;
        // Out-of-range dictionary slots degrade to carbon, same as unknown
        // element codes.
        let code = dictionary.get(dict_index).copied().unwrap_or(elements::FALLBACK_CODE);
        let symbol = elements::code_to_symbol(code);

        let mut q = [0i16; 3];
        for k in 0..3 {
            let field = i64::from(r.read_signed(coord_bits)?);
            let value = if delta && idx > 0 { previous[k] + field } else { field };
            previous[k] = value;
            q[k] = value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
        }
        atoms.push(Atom::new(symbol, dequantize(q, scale_exp)));
    }
    Ok(atoms)
}

fn read_bonds(r: &mut BitReader<'_>, bond_count: usize, atom_count: usize) -> Result<Vec<Bond>, Error> {
    let bits = index_bits(atom_count);
    let mut bonds = Vec::with_capacity(bond_count);
    for _ in 0..bond_count {
        let i = r.read_unsigned(bits)? as usize;
        let j = r.read_unsigned(bits)? as usize;
        let code = r.read_unsigned(2)? as u8;
        let order = BondOrder::from_code(code).ok_or(Error::InvalidBondOrder(code))?;
        for index in [i, j] {
            if index >= atom_count {
                return Err(Error::BondIndexOutOfRange {
                    index,
                    count: atom_count,
                });
            }
        }
        bonds.push(Bond::new(i, j, order));
    }
    Ok(bonds)
}
