//! Element symbol codebook.
//!
//! The current wire versions key elements by atomic number; wire version 3
//! used an alphabetical index into the same symbol set. Both tables must stay
//! decodable, and the caller selects the table from the detected format
//! version rather than guessing.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Atomic number used when a symbol or code is not recognized.
pub const FALLBACK_CODE: u8 = 6;

/// Symbol substituted for unknown or out-of-range codes.
pub const FALLBACK_SYMBOL: &str = "C";

/// Element symbols indexed by atomic number minus one (H through Og).
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

fn symbol_index() -> &'static HashMap<&'static str, u8> {
    static INDEX: OnceLock<HashMap<&'static str, u8>> = OnceLock::new();
    INDEX.get_or_init(|| {
        SYMBOLS
            .iter()
            .enumerate()
            .map(|(i, &s)| (s, (i + 1) as u8))
            .collect()
    })
}

/// Symbols sorted lexicographically; position = legacy (version 3) code.
fn legacy_table() -> &'static Vec<&'static str> {
    static TABLE: OnceLock<Vec<&'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut sorted = SYMBOLS.to_vec();
        sorted.sort_unstable();
        sorted
    })
}

/// Normalizes symbol case: single letters upper-cased, multi-letter symbols
/// title-cased ("cl" -> "Cl", "FE" -> "Fe").
pub fn normalize_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = String::with_capacity(trimmed.len());
            out.extend(first.to_uppercase());
            for c in chars {
                out.extend(c.to_lowercase());
            }
            out
        }
    }
}

/// Maps a symbol to its atomic number; unknown symbols fall back to carbon.
pub fn symbol_to_code(symbol: &str) -> u8 {
    let normalized = normalize_symbol(symbol);
    symbol_index()
        .get(normalized.as_str())
        .copied()
        .unwrap_or(FALLBACK_CODE)
}

/// Inverse table lookup; unknown or out-of-range codes yield "C".
pub fn code_to_symbol(code: u8) -> &'static str {
    if code == 0 || code as usize > SYMBOLS.len() {
        return FALLBACK_SYMBOL;
    }
    SYMBOLS[code as usize - 1]
}

/// Legacy alphabetical-index lookup used only by wire version 3.
pub fn legacy_code_to_symbol(code: u8) -> &'static str {
    legacy_table()
        .get(code as usize)
        .copied()
        .unwrap_or(FALLBACK_SYMBOL)
}

/// Legacy alphabetical code for a symbol, used by the version 3 test writer.
pub fn symbol_to_legacy_code(symbol: &str) -> u8 {
    let normalized = normalize_symbol(symbol);
    legacy_table()
        .iter()
        .position(|&s| s == normalized)
        .map(|i| i as u8)
        .unwrap_or_else(|| {
            legacy_table()
                .iter()
                .position(|&s| s == FALLBACK_SYMBOL)
                .unwrap() as u8
        })
}
