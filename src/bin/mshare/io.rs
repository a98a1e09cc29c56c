//! JSON molecule documents read and written by the CLI.
//!
//! This is a human-editable interchange format, not the wire format: symbols
//! and bond orders are strings, style fields are optional and fall back to
//! the library defaults.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use molshare::{Atom, Bond, BondOrder, Material, Molecule, Quality, ShareStyle};

#[derive(Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub atoms: Vec<DocAtom>,
    #[serde(default)]
    pub bonds: Vec<DocBond>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<DocStyle>,
}

#[derive(Serialize, Deserialize)]
pub struct DocAtom {
    pub symbol: String,
    pub position: [f64; 3],
}

#[derive(Serialize, Deserialize)]
pub struct DocBond {
    pub i: usize,
    pub j: usize,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_order() -> String {
    "single".to_string()
}

#[derive(Serialize, Deserialize, Default)]
pub struct DocStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_radius: Option<f64>,
}

pub fn read_document(path: Option<&Path>) -> Result<Document> {
    let text = match path {
        Some(p) => {
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("invalid molecule document")
}

pub fn write_document(path: Option<&Path>, doc: &Document) -> Result<()> {
    let text = serde_json::to_string_pretty(doc).context("failed to serialize document")?;
    match path {
        Some(p) => fs::write(p, text + "\n")
            .with_context(|| format!("failed to write {}", p.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}

pub fn into_molecule(doc: Document) -> Result<(Molecule, ShareStyle)> {
    let atoms: Vec<Atom> = doc
        .atoms
        .into_iter()
        .map(|a| Atom::new(a.symbol, a.position))
        .collect();

    let mut bonds = Vec::with_capacity(doc.bonds.len());
    for b in doc.bonds {
        let order: BondOrder = b.order.parse()?;
        bonds.push(Bond::new(b.i, b.j, order));
    }

    let mut style = ShareStyle::default();
    if let Some(s) = doc.style {
        if let Some(m) = s.material {
            style.material = m.parse::<Material>()?;
        }
        if let Some(q) = s.quality {
            style.quality = q.parse::<Quality>()?;
        }
        if let Some(v) = s.atom_scale {
            style.atom_scale = v;
        }
        if let Some(v) = s.bond_radius {
            style.bond_radius = v;
        }
    }

    Ok((
        Molecule {
            atoms,
            bonds,
            title: doc.title,
        },
        style,
    ))
}

pub fn from_molecule(molecule: &Molecule, style: &ShareStyle) -> Document {
    Document {
        title: molecule.title.clone(),
        atoms: molecule
            .atoms
            .iter()
            .map(|a| DocAtom {
                symbol: a.symbol.clone(),
                position: a.position,
            })
            .collect(),
        bonds: molecule
            .bonds
            .iter()
            .map(|b| DocBond {
                i: b.i,
                j: b.j,
                order: b.order.to_string().to_lowercase(),
            })
            .collect(),
        style: Some(DocStyle {
            material: Some(style.material.to_string()),
            quality: Some(style.quality.to_string()),
            atom_scale: Some(style.atom_scale),
            bond_radius: Some(style.bond_radius),
        }),
    }
}

/// Accepts either a bare segment or a full share URL; everything after the
/// last `#` is the segment.
pub fn extract_segment(input: &str) -> &str {
    let trimmed = input.trim();
    match trimmed.rfind('#') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}
