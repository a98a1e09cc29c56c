use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::atom::Atom;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid bond order string: '{0}'")]
pub struct ParseBondOrderError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
}

impl BondOrder {
    /// 2-bit wire code: 01 = single, 10 = double, 11 = triple. 00 is invalid.
    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            _ => None,
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondOrder::Single => write!(f, "Single"),
            BondOrder::Double => write!(f, "Double"),
            BondOrder::Triple => write!(f, "Triple"),
        }
    }
}

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "1" => Ok(BondOrder::Single),
            "double" | "2" => Ok(BondOrder::Double),
            "triple" | "3" => Ok(BondOrder::Triple),
            _ => Err(ParseBondOrderError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        if idx1 <= idx2 {
            Self { i: idx1, j: idx2, order }
        } else {
            Self { i: idx2, j: idx1, order }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    pub title: Option<String>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// First bond referencing an atom index outside the current ordering,
    /// if any. Encode rejects molecules where this returns `Some`.
    pub fn first_invalid_bond(&self) -> Option<&Bond> {
        let n = self.atoms.len();
        self.bonds.iter().find(|b| b.i >= n || b.j >= n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn bond_normalizes_index_order() {
        let b = Bond::new(5, 2, BondOrder::Double);
        assert_eq!(b.i, 2);
        assert_eq!(b.j, 5);
    }

    #[test]
    fn bondorder_wire_codes() {
        assert_eq!(BondOrder::Single.code(), 1);
        assert_eq!(BondOrder::Double.code(), 2);
        assert_eq!(BondOrder::Triple.code(), 3);
        assert_eq!(BondOrder::from_code(2), Some(BondOrder::Double));
        assert_eq!(BondOrder::from_code(0), None);
    }

    #[test]
    fn bondorder_from_str_variants() {
        assert_eq!(BondOrder::from_str("single").unwrap(), BondOrder::Single);
        assert_eq!(BondOrder::from_str("2").unwrap(), BondOrder::Double);
        assert_eq!(BondOrder::from_str("Triple").unwrap(), BondOrder::Triple);
        assert!(BondOrder::from_str("aromatic").is_err());
    }

    #[test]
    fn bond_validity_check() {
        let mut m = Molecule::new();
        m.atoms.push(Atom::new("C", [0.0, 0.0, 0.0]));
        m.atoms.push(Atom::new("O", [1.2, 0.0, 0.0]));
        m.bonds.push(Bond::new(0, 1, BondOrder::Double));
        assert!(m.first_invalid_bond().is_none());
        m.bonds.push(Bond::new(0, 2, BondOrder::Single));
        assert_eq!(m.first_invalid_bond(), Some(&Bond::new(0, 2, BondOrder::Single)));
    }
}
