//! Spatial reordering and coordinate quantization.
//!
//! Delta coding pays off when consecutive atoms are spatially close, so the
//! encoder re-walks the bond graph breadth-first before quantizing: high
//! degree atoms are visited before leaves inside a component, and each
//! disconnected component starts at the atom nearest the previous one. Bond
//! endpoints are remapped with the permutation, so connectivity is preserved
//! exactly; only the atom ordering and the coordinate precision are lossy.

use std::collections::VecDeque;

use super::bits::signed_coord_bits;
use super::error::Error;
use crate::model::{Atom, Bond, Molecule};

/// Fixed-point unit: millionths of the scale, i.e. millångströms at M = 1.
pub const COORD_UNIT: f64 = 1000.0;

/// Largest scale exponent the 2-bit field can carry.
pub const MAX_SCALE_EXP: u8 = 3;

/// Quantized, reordered encode input.
#[derive(Debug)]
pub struct PreparedAtoms {
    /// Centered atoms in traversal order.
    pub atoms: Vec<Atom>,
    /// Bonds with endpoints remapped to the new ordering.
    pub bonds: Vec<Bond>,
    /// Scale exponent e; coordinate scale is 2^e.
    pub scale_exp: u8,
    /// Signed width of each coordinate field, 8..=16.
    pub coord_bits: u32,
    /// Fixed-point coordinates, one triple per atom in the new order.
    pub quantized: Vec<[i16; 3]>,
}

/// Centers, reorders (when `use_delta` is set), and quantizes a molecule.
pub fn prepare(molecule: &Molecule, use_delta: bool, precision_drop: u8) -> Result<PreparedAtoms, Error> {
    if molecule.atoms.is_empty() {
        return Err(Error::EmptyMolecule);
    }
    if let Some(bond) = molecule.first_invalid_bond() {
        return Err(Error::InvalidBond { i: bond.i, j: bond.j });
    }

    let centered = center_atoms(&molecule.atoms);

    let (atoms, bonds) = if use_delta {
        reorder(&centered, &molecule.bonds)
    } else {
        (centered, molecule.bonds.clone())
    };

    let drop = precision_drop.min(8);
    let (scale_exp, coord_bits, quantized) = quantize(&atoms, use_delta, drop);

    Ok(PreparedAtoms {
        atoms,
        bonds,
        scale_exp,
        coord_bits,
        quantized,
    })
}

/// Reconstructs real coordinates from a quantized triple.
pub fn dequantize(q: [i16; 3], scale_exp: u8) -> [f64; 3] {
    let scale = f64::from(1u32 << scale_exp.min(MAX_SCALE_EXP));
    [
        f64::from(q[0]) * scale / COORD_UNIT,
        f64::from(q[1]) * scale / COORD_UNIT,
        f64::from(q[2]) * scale / COORD_UNIT,
    ]
}

fn center_atoms(atoms: &[Atom]) -> Vec<Atom> {
    let n = atoms.len() as f64;
    let mut centroid = [0.0f64; 3];
    for atom in atoms {
        for k in 0..3 {
            centroid[k] += atom.position[k];
        }
    }
    for c in &mut centroid {
        *c /= n;
    }

    atoms
        .iter()
        .map(|a| {
            let mut atom = a.clone();
            for k in 0..3 {
                atom.position[k] -= centroid[k];
            }
            atom
        })
        .collect()
}

fn distance_sq(a: [f64; 3], b: [f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Greedy breadth-first reordering over the bond graph.
fn reorder(atoms: &[Atom], bonds: &[Bond]) -> (Vec<Atom>, Vec<Bond>) {
    let n = atoms.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for bond in bonds {
        adjacency[bond.i].push(bond.j);
        adjacency[bond.j].push(bond.i);
    }
    let degree: Vec<usize> = adjacency.iter().map(Vec::len).collect();

    let mut visited = vec![false; n];
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut queue: VecDeque<usize> = VecDeque::new();

    while order.len() < n {
        let start = if order.is_empty() {
            // First component starts at the atom nearest the origin
            // (coordinates are already centered on the centroid).
            nearest_unvisited(atoms, &visited, [0.0; 3])
        } else {
            // Chain each later component to wherever the walk left off.
            let anchor = atoms[*order.last().unwrap()].position;
            nearest_unvisited(atoms, &visited, anchor)
        };

        visited[start] = true;
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            order.push(current);
            // Branch atoms before leaves keeps consecutive deltas short.
            let mut neighbors: Vec<usize> = adjacency[current]
                .iter()
                .copied()
                .filter(|&next| !visited[next])
                .collect();
            neighbors.sort_by(|&a, &b| degree[b].cmp(&degree[a]).then(a.cmp(&b)));
            for next in neighbors {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    let mut new_index = vec![0usize; n];
    for (new, &old) in order.iter().enumerate() {
        new_index[old] = new;
    }

    let reordered: Vec<Atom> = order.iter().map(|&old| atoms[old].clone()).collect();
    let remapped: Vec<Bond> = bonds
        .iter()
        .map(|b| Bond::new(new_index[b.i], new_index[b.j], b.order))
        .collect();

    (reordered, remapped)
}

fn nearest_unvisited(atoms: &[Atom], visited: &[bool], target: [f64; 3]) -> usize {
    let mut best = usize::MAX;
    let mut best_dist = f64::INFINITY;
    for (idx, atom) in atoms.iter().enumerate() {
        if visited[idx] {
            continue;
        }
        let d = distance_sq(atom.position, target);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    best
}

/// Picks the scale exponent and coordinate width, then quantizes.
///
/// The exponent search is bounded to 0..=3; if even e = 3 cannot fit the
/// values (or their deltas) in 16 bits, coordinates are clamped and precision
/// is silently lost, matching the historical encoder.
fn quantize(atoms: &[Atom], use_delta: bool, precision_drop: u8) -> (u8, u32, Vec<[i16; 3]>) {
    for exp in 0..=MAX_SCALE_EXP {
        let scale = f64::from(1u32 << exp);
        let mut fits = true;
        let mut quantized: Vec<[i16; 3]> = Vec::with_capacity(atoms.len());

        for atom in atoms {
            let mut triple = [0i16; 3];
            for k in 0..3 {
                let raw = (atom.position[k] * COORD_UNIT / scale).round();
                let reduced = reduce_precision(raw as i64, precision_drop);
                if exp < MAX_SCALE_EXP && (reduced > i64::from(i16::MAX) || reduced < i64::from(i16::MIN)) {
                    fits = false;
                    break;
                }
                triple[k] = reduced.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
            }
            if !fits {
                break;
            }
            quantized.push(triple);
        }
        if !fits {
            continue;
        }

        let max_abs = if use_delta {
            max_abs_delta(&quantized)
        } else {
            max_abs_value(&quantized)
        };
        match signed_coord_bits(max_abs) {
            Some(bits) => return (exp, bits, quantized),
            // Needs more than 16 bits: retry at a coarser scale, or accept
            // 16-bit clamping once the exponent is exhausted.
            None if exp < MAX_SCALE_EXP => continue,
            None => return (exp, 16, quantized),
        }
    }
    unreachable!("exponent loop always returns at MAX_SCALE_EXP");
}

fn reduce_precision(value: i64, drop: u8) -> i64 {
    if drop == 0 {
        return value;
    }
    let step = 1i64 << drop;
    let half = step / 2;
    if value >= 0 {
        (value + half) / step * step
    } else {
        -((-value + half) / step * step)
    }
}

fn max_abs_value(quantized: &[[i16; 3]]) -> i64 {
    quantized
        .iter()
        .flat_map(|t| t.iter())
        .map(|&v| i64::from(v).abs())
        .max()
        .unwrap_or(0)
}

/// Maximum magnitude actually written in delta mode: the first atom's
/// absolute coordinates plus every consecutive delta.
fn max_abs_delta(quantized: &[[i16; 3]]) -> i64 {
    let mut max = quantized
        .first()
        .map(|t| t.iter().map(|&v| i64::from(v).abs()).max().unwrap_or(0))
        .unwrap_or(0);
    for pair in quantized.windows(2) {
        for k in 0..3 {
            let d = (i64::from(pair[1][k]) - i64::from(pair[0][k])).abs();
            max = max.max(d);
        }
    }
    max
}
