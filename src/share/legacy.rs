//! Historical wire layouts.
//!
//! Old links must keep decoding forever, so every generation keeps its exact
//! parser: QRM version 3 (flat 18-bit coordinates, alphabetical element
//! table), versions 4 and 5 (dictionary + delta coding, fixed 16-bit
//! coordinates, title added in 5), version 6 (identical to the current inner
//! layout), and the version-2 structured JSON payload that predates the
//! binary formats entirely. Dispatch is a closed table keyed on the version
//! byte; each arm owns its field order.

use serde::{Deserialize, Serialize};

use super::bits::{index_bits, BitReader};
use super::elements;
use super::error::Error;
use super::payload::{self, DecodedPayload, SharePayload, WireVersion};
use super::spatial::dequantize;
use super::title;
use crate::model::{Atom, Bond, BondOrder, Material, Molecule, Quality, ShareStyle};

/// Parses a decompressed legacy bitstream according to its version byte.
pub fn decode_version(bytes: &[u8], version: u8) -> Result<DecodedPayload, Error> {
    match version {
        3 => decode_v3(bytes),
        4 => decode_v4_v5(bytes, false),
        5 => decode_v4_v5(bytes, true),
        6 => payload::decode_payload(bytes, WireVersion::Qrm(6)),
        _ => Err(Error::UnsupportedFormat),
    }
}

/// Version 3: no material, no dictionary, no title; one 7-bit alphabetical
/// element code per atom and flat 18-bit signed millangstrom coordinates.
fn decode_v3(bytes: &[u8]) -> Result<DecodedPayload, Error> {
    let mut r = BitReader::new(bytes);

    let atom_count = r.read_unsigned(10)? as usize;
    let bond_count = r.read_unsigned(12)? as usize;
    let atom_scale = ShareStyle::dequantize_scale(r.read_unsigned(6)? as u8);
    let bond_radius = ShareStyle::dequantize_scale(r.read_unsigned(6)? as u8);
    let quality = Quality::from_code(r.read_unsigned(2)? as u8);

    let mut atoms = Vec::with_capacity(atom_count);
    for _ in 0..atom_count {
        let code = r.read_unsigned(7)? as u8;
        let symbol = elements::legacy_code_to_symbol(code);
        let mut position = [0.0f64; 3];
        for p in &mut position {
            *p = f64::from(r.read_signed(18)?) / 1000.0;
        }
        atoms.push(Atom::new(symbol, position));
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for _ in 0..bond_count {
        let i = r.read_unsigned(10)? as usize;
        let j = r.read_unsigned(10)? as usize;
        let code = r.read_unsigned(2)? as u8;
        let order = BondOrder::from_code(code).ok_or(Error::InvalidBondOrder(code))?;
        if i >= atom_count || j >= atom_count {
            return Err(Error::BondIndexOutOfRange {
                index: i.max(j),
                count: atom_count,
            });
        }
        bonds.push(Bond::new(i, j, order));
    }

    let style = ShareStyle {
        material: Material::Standard,
        quality,
        atom_scale,
        bond_radius,
    };
    let meta = SharePayload {
        version: WireVersion::Qrm(3),
        atom_count,
        bond_count,
        scale_exp: 0,
        coord_bits: 18,
        delta: false,
        bonds_omitted: false,
        title: None,
    };
    Ok(DecodedPayload {
        molecule: Molecule {
            atoms,
            bonds,
            title: None,
        },
        style,
        meta,
    })
}

/// Versions 4 and 5: element dictionary and optional delta coding with fixed
/// 16-bit coordinates. Version 5 added the title block.
fn decode_v4_v5(bytes: &[u8], with_title: bool) -> Result<DecodedPayload, Error> {
    let mut r = BitReader::new(bytes);

    let atom_count = r.read_unsigned(10)? as usize;
    let bond_count = r.read_unsigned(12)? as usize;
    let scale_exp = r.read_unsigned(2)? as u8;
    let material = Material::from_code(r.read_unsigned(2)? as u8);
    let atom_scale = ShareStyle::dequantize_scale(r.read_unsigned(6)? as u8);
    let bond_radius = ShareStyle::dequantize_scale(r.read_unsigned(6)? as u8);
    let quality = Quality::from_code(r.read_unsigned(2)? as u8);
    let delta = r.read_unsigned(1)? == 1;

    let dict_size = r.read_unsigned(7)? as usize;
    let mut dictionary = Vec::with_capacity(dict_size);
    for _ in 0..dict_size {
        dictionary.push(r.read_unsigned(7)? as u8);
    }

    let decoded_title = if with_title { title::read_title(&mut r)? } else { None };

    let dict_bits = index_bits(dictionary.len());
    let mut atoms = Vec::with_capacity(atom_count);
    let mut previous = [0i64; 3];
    for idx in 0..atom_count {
        let dict_index = r.read_unsigned(dict_bits)? as usize;
        let code = dictionary
            .get(dict_index)
            .copied()
            .unwrap_or(elements::FALLBACK_CODE);
        let mut q = [0i16; 3];
        for k in 0..3 {
            let field = i64::from(r.read_signed(16)?);
            let value = if delta && idx > 0 { previous[k] + field } else { field };
            previous[k] = value;
            q[k] = value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
        }
        atoms.push(Atom::new(elements::code_to_symbol(code), dequantize(q, scale_exp)));
    }

    let bits = index_bits(atom_count);
    let mut bonds = Vec::with_capacity(bond_count);
    for _ in 0..bond_count {
        let i = r.read_unsigned(bits)? as usize;
        let j = r.read_unsigned(bits)? as usize;
        let code = r.read_unsigned(2)? as u8;
        let order = BondOrder::from_code(code).ok_or(Error::InvalidBondOrder(code))?;
        if i >= atom_count || j >= atom_count {
            return Err(Error::BondIndexOutOfRange {
                index: i.max(j),
                count: atom_count,
            });
        }
        bonds.push(Bond::new(i, j, order));
    }

    let version = if with_title { 5 } else { 4 };
    let style = ShareStyle {
        material,
        quality,
        atom_scale,
        bond_radius,
    };
    let meta = SharePayload {
        version: WireVersion::Qrm(version),
        atom_count,
        bond_count,
        scale_exp,
        coord_bits: 16,
        delta,
        bonds_omitted: false,
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

/// Version-2 structured JSON payload shape.
#[derive(Debug, Serialize, Deserialize)]
struct JsonPayload {
    version: u8,
    atoms: Vec<JsonAtom>,
    #[serde(default)]
    bonds: Vec<JsonBond>,
    #[serde(default)]
    style: Option<JsonStyle>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonAtom {
    symbol: String,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonBond {
    i: usize,
    j: usize,
    order: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonStyle {
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    atom_scale: Option<f64>,
    #[serde(default)]
    bond_radius: Option<f64>,
}

/// Interprets decompressed bytes as the legacy JSON structure. Anything that
/// is not valid UTF-8 JSON with a version tag of 2 is an unsupported format.
pub fn decode_json(bytes: &[u8]) -> Result<DecodedPayload, Error> {
    let text = std::str::from_utf8(bytes).map_err(|_| Error::UnsupportedFormat)?;
    let parsed: JsonPayload = serde_json::from_str(text).map_err(|_| Error::UnsupportedFormat)?;
    if parsed.version != 2 {
        return Err(Error::UnsupportedFormat);
    }

    let atom_count = parsed.atoms.len();
    let atoms: Vec<Atom> = parsed
        .atoms
        .iter()
        .map(|a| Atom::new(elements::code_to_symbol(elements::symbol_to_code(&a.symbol)), [a.x, a.y, a.z]))
        .collect();

    let mut bonds = Vec::with_capacity(parsed.bonds.len());
    for b in &parsed.bonds {
        if b.i >= atom_count || b.j >= atom_count {
            return Err(Error::BondIndexOutOfRange {
                index: b.i.max(b.j),
                count: atom_count,
            });
        }
        let order = BondOrder::from_code(b.order).ok_or(Error::InvalidBondOrder(b.order))?;
        bonds.push(Bond::new(b.i, b.j, order));
    }

    let defaults = ShareStyle::default();
    let style = match &parsed.style {
        Some(s) => ShareStyle {
            material: s
                .material
                .as_deref()
                .and_then(|m| m.parse().ok())
                .unwrap_or(defaults.material),
            quality: s
                .quality
                .as_deref()
                .and_then(|q| q.parse().ok())
                .unwrap_or(defaults.quality),
            atom_scale: s.atom_scale.unwrap_or(defaults.atom_scale),
            bond_radius: s.bond_radius.unwrap_or(defaults.bond_radius),
        },
        None => defaults,
    };

    let bond_count = bonds.len();
    let meta = SharePayload {
        version: WireVersion::JsonV2,
        atom_count,
        bond_count,
        scale_exp: 0,
        coord_bits: 0,
        delta: false,
        bonds_omitted: false,
        title: parsed.title.clone(),
    };
    Ok(DecodedPayload {
        molecule: Molecule {
            atoms,
            bonds,
            title: parsed.title,
        },
        style,
        meta,
    })
}

/// Test-only writers for the historical layouts: the crate never encodes
/// them anymore, but backward-compatibility fixtures need byte-exact
/// streams from each generation.
#[cfg(test)]
pub mod writers {
    use super::*;
    use crate::share::bits::BitWriter;

    pub fn write_v3(molecule: &Molecule, style: &ShareStyle) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_unsigned(molecule.atoms.len() as u32, 10).unwrap();
        w.write_unsigned(molecule.bonds.len() as u32, 12).unwrap();
        w.write_unsigned(u32::from(ShareStyle::quantize_scale(style.atom_scale)), 6)
            .unwrap();
        w.write_unsigned(u32::from(ShareStyle::quantize_scale(style.bond_radius)), 6)
            .unwrap();
        w.write_unsigned(u32::from(style.quality.code()), 2).unwrap();
        for atom in &molecule.atoms {
            w.write_unsigned(u32::from(elements::symbol_to_legacy_code(&atom.symbol)), 7)
                .unwrap();
            for k in 0..3 {
                let q = (atom.position[k] * 1000.0).round() as i32;
                w.write_signed(q, 18).unwrap();
            }
        }
        for bond in &molecule.bonds {
            w.write_unsigned(bond.i as u32, 10).unwrap();
            w.write_unsigned(bond.j as u32, 10).unwrap();
            w.write_unsigned(u32::from(bond.order.code()), 2).unwrap();
        }
        w.into_bytes()
    }

    pub fn write_v4_v5(
        molecule: &Molecule,
        style: &ShareStyle,
        delta: bool,
        title: Option<&str>,
        with_title_block: bool,
    ) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_unsigned(molecule.atoms.len() as u32, 10).unwrap();
        w.write_unsigned(molecule.bonds.len() as u32, 12).unwrap();
        w.write_unsigned(0, 2).unwrap(); // scale exponent 0
        w.write_unsigned(u32::from(style.material.code()), 2).unwrap();
        w.write_unsigned(u32::from(ShareStyle::quantize_scale(style.atom_scale)), 6)
            .unwrap();
        w.write_unsigned(u32::from(ShareStyle::quantize_scale(style.bond_radius)), 6)
            .unwrap();
        w.write_unsigned(u32::from(style.quality.code()), 2).unwrap();
        w.write_unsigned(u32::from(delta), 1).unwrap();

        let mut dictionary: Vec<u8> = Vec::new();
        for atom in &molecule.atoms {
            let code = elements::symbol_to_code(&atom.symbol);
            if !dictionary.contains(&code) {
                dictionary.push(code);
            }
        }
        w.write_unsigned(dictionary.len() as u32, 7).unwrap();
        for &code in &dictionary {
            w.write_unsigned(u32::from(code), 7).unwrap();
        }

        if with_title_block {
            title::write_title(&mut w, title).unwrap();
        }

        let dict_bits = index_bits(dictionary.len());
        let mut previous = [0i64; 3];
        for (idx, atom) in molecule.atoms.iter().enumerate() {
            let code = elements::symbol_to_code(&atom.symbol);
            let dict_index = dictionary.iter().position(|&c| c == code).unwrap();
            w.write_unsigned(dict_index as u32, dict_bits).unwrap();
            for k in 0..3 {
                let value = (atom.position[k] * 1000.0).round() as i64;
                let field = if delta && idx > 0 { value - previous[k] } else { value };
                w.write_signed(field as i32, 16).unwrap();
                previous[k] = value;
            }
        }

        let bits = index_bits(molecule.atoms.len());
        for bond in &molecule.bonds {
            w.write_unsigned(bond.i as u32, bits).unwrap();
            w.write_unsigned(bond.j as u32, bits).unwrap();
            w.write_unsigned(u32::from(bond.order.code()), 2).unwrap();
        }
        w.into_bytes()
    }

    pub fn write_json_v2(molecule: &Molecule, style: &ShareStyle) -> Vec<u8> {
        let doc = JsonPayload {
            version: 2,
            atoms: molecule
                .atoms
                .iter()
                .map(|a| JsonAtom {
                    symbol: a.symbol.clone(),
                    x: a.position[0],
                    y: a.position[1],
                    z: a.position[2],
                })
                .collect(),
            bonds: molecule
                .bonds
                .iter()
                .map(|b| JsonBond {
                    i: b.i,
                    j: b.j,
                    order: b.order.code(),
                })
                .collect(),
            style: Some(JsonStyle {
                material: Some(style.material.to_string()),
                quality: Some(style.quality.to_string()),
                atom_scale: Some(style.atom_scale),
                bond_radius: Some(style.bond_radius),
            }),
            title: molecule.title.clone(),
        };
        serde_json::to_vec(&doc).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol_fragment() -> Molecule {
        Molecule {
            atoms: vec![
                Atom::new("C", [-0.7, 0.1, 0.0]),
                Atom::new("C", [0.7, -0.1, 0.0]),
                Atom::new("O", [1.4, 1.0, 0.3]),
            ],
            bonds: vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(1, 2, BondOrder::Single),
            ],
            title: None,
        }
    }

    #[test]
    fn v3_roundtrip_with_legacy_element_table() {
        let molecule = ethanol_fragment();
        let style = ShareStyle {
            material: Material::Glass, // not representable in v3
            quality: Quality::Low,
            atom_scale: 0.5,
            bond_radius: 0.1,
        };
        let bytes = writers::write_v3(&molecule, &style);
        let decoded = decode_version(&bytes, 3).unwrap();

        assert_eq!(decoded.meta.version, WireVersion::Qrm(3));
        // v3 has no material field; decoders fall back to standard.
        assert_eq!(decoded.style.material, Material::Standard);
        assert_eq!(decoded.style.quality, Quality::Low);
        assert_eq!(decoded.molecule.atoms.len(), 3);
        assert_eq!(decoded.molecule.bonds, molecule.bonds);
        for (orig, back) in molecule.atoms.iter().zip(&decoded.molecule.atoms) {
            assert_eq!(orig.symbol, back.symbol);
            for k in 0..3 {
                assert!((orig.position[k] - back.position[k]).abs() <= 0.001);
            }
        }
    }

    #[test]
    fn v4_roundtrip_without_title() {
        let molecule = ethanol_fragment();
        let style = ShareStyle::default();
        let bytes = writers::write_v4_v5(&molecule, &style, true, None, false);
        let decoded = decode_version(&bytes, 4).unwrap();

        assert_eq!(decoded.meta.version, WireVersion::Qrm(4));
        assert!(decoded.meta.delta);
        assert_eq!(decoded.meta.title, None);
        assert_eq!(decoded.molecule.bonds, molecule.bonds);
        for (orig, back) in molecule.atoms.iter().zip(&decoded.molecule.atoms) {
            for k in 0..3 {
                assert!((orig.position[k] - back.position[k]).abs() <= 0.001);
            }
        }
    }

    #[test]
    fn v5_roundtrip_with_title() {
        let molecule = ethanol_fragment();
        let bytes = writers::write_v4_v5(&molecule, &ShareStyle::default(), false, Some("ethanol"), true);
        let decoded = decode_version(&bytes, 5).unwrap();
        assert_eq!(decoded.meta.version, WireVersion::Qrm(5));
        assert_eq!(decoded.meta.title.as_deref(), Some("ethanol"));
        assert_eq!(decoded.molecule.title.as_deref(), Some("ethanol"));
    }

    #[test]
    fn unknown_version_rejected() {
        assert!(matches!(decode_version(&[0u8; 8], 9), Err(Error::UnsupportedFormat)));
    }

    #[test]
    fn json_v2_roundtrip() {
        let mut molecule = ethanol_fragment();
        molecule.title = Some("ethanol".to_string());
        let style = ShareStyle {
            material: Material::Metal,
            quality: Quality::Ultra,
            atom_scale: 0.4,
            bond_radius: 0.08,
        };
        let bytes = writers::write_json_v2(&molecule, &style);
        let decoded = decode_json(&bytes).unwrap();

        assert_eq!(decoded.meta.version, WireVersion::JsonV2);
        assert_eq!(decoded.style.material, Material::Metal);
        assert_eq!(decoded.style.quality, Quality::Ultra);
        assert_eq!(decoded.molecule.atoms.len(), 3);
        assert_eq!(decoded.molecule.bonds, molecule.bonds);
        assert_eq!(decoded.molecule.title.as_deref(), Some("ethanol"));
        assert!((decoded.molecule.atoms[0].position[0] + 0.7).abs() < 1e-12);
    }

    #[test]
    fn json_with_wrong_version_tag_rejected() {
        let bytes = br#"{"version":9,"atoms":[]}"#;
        assert!(matches!(decode_json(bytes), Err(Error::UnsupportedFormat)));
    }

    #[test]
    fn json_missing_style_uses_defaults() {
        let bytes = br#"{"version":2,"atoms":[{"symbol":"C","x":0,"y":0,"z":0}]}"#;
        let decoded = decode_json(bytes).unwrap();
        assert_eq!(decoded.style, ShareStyle::default());
        assert!(decoded.molecule.bonds.is_empty());
    }

    #[test]
    fn non_json_rejected() {
        assert!(matches!(decode_json(&[0xFF, 0xFE]), Err(Error::UnsupportedFormat)));
        assert!(matches!(decode_json(b"not json"), Err(Error::UnsupportedFormat)));
    }
}
