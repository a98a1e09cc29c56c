pub mod atom;
pub mod molecule;
pub mod style;

pub use atom::Atom;
pub use molecule::{Bond, BondOrder, Molecule, ParseBondOrderError};
pub use style::{Material, ParseMaterialError, ParseQualityError, Quality, ShareStyle};
