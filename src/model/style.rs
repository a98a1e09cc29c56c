use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid material string: '{0}'")]
pub struct ParseMaterialError(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quality string: '{0}'")]
pub struct ParseQualityError(String);

/// Render material, 2 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Material {
    #[default]
    Standard,
    Metal,
    Toon,
    Glass,
}

impl Material {
    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            Material::Standard => 0,
            Material::Metal => 1,
            Material::Toon => 2,
            Material::Glass => 3,
        }
    }

    /// Unknown codes fall back to the default material.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Material::Metal,
            2 => Material::Toon,
            3 => Material::Glass,
            _ => Material::Standard,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::Standard => write!(f, "standard"),
            Material::Metal => write!(f, "metal"),
            Material::Toon => write!(f, "toon"),
            Material::Glass => write!(f, "glass"),
        }
    }
}

impl FromStr for Material {
    type Err = ParseMaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Material::Standard),
            "metal" => Ok(Material::Metal),
            "toon" => Ok(Material::Toon),
            "glass" => Ok(Material::Glass),
            _ => Err(ParseMaterialError(s.to_string())),
        }
    }
}

/// Render quality, 2 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quality {
    Low,
    Medium,
    High,
    Ultra,
}

impl Quality {
    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            Quality::Low => 0,
            Quality::Medium => 1,
            Quality::High => 2,
            Quality::Ultra => 3,
        }
    }

    /// Unknown codes fall back to the default quality.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Quality::Low,
            1 => Quality::Medium,
            3 => Quality::Ultra,
            _ => Quality::High,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Low => write!(f, "low"),
            Quality::Medium => write!(f, "medium"),
            Quality::High => write!(f, "high"),
            Quality::Ultra => write!(f, "ultra"),
        }
    }
}

impl FromStr for Quality {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            "ultra" => Ok(Quality::Ultra),
            _ => Err(ParseQualityError(s.to_string())),
        }
    }
}

/// Step of the 6-bit scale quantization used for atom scale and bond radius.
pub const SCALE_STEP: f64 = 0.02;

/// Shared render style transmitted alongside the molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareStyle {
    pub material: Material,
    pub quality: Quality,
    pub atom_scale: f64,
    pub bond_radius: f64,
}

impl Default for ShareStyle {
    fn default() -> Self {
        Self {
            material: Material::Standard,
            quality: Quality::High,
            atom_scale: 0.6,
            bond_radius: 0.12,
        }
    }
}

impl ShareStyle {
    /// Quantizes a scale value to a 6-bit step of 0.02, clamped to [0, 1.26].
    pub fn quantize_scale(value: f64) -> u8 {
        let q = (value / SCALE_STEP).round();
        q.clamp(0.0, 63.0) as u8
    }

    pub fn dequantize_scale(q: u8) -> f64 {
        f64::from(q.min(63)) * SCALE_STEP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn material_codes_roundtrip() {
        for m in [Material::Standard, Material::Metal, Material::Toon, Material::Glass] {
            assert_eq!(Material::from_code(m.code()), m);
        }
    }

    #[test]
    fn quality_codes_roundtrip() {
        for q in [Quality::Low, Quality::Medium, Quality::High, Quality::Ultra] {
            assert_eq!(Quality::from_code(q.code()), q);
        }
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(Material::from_str("Glass").unwrap(), Material::Glass);
        assert_eq!(Material::Metal.to_string(), "metal");
        assert_eq!(Quality::from_str("ultra").unwrap(), Quality::Ultra);
        assert!(Quality::from_str("extreme").is_err());
    }

    #[test]
    fn scale_quantization() {
        assert_eq!(ShareStyle::quantize_scale(0.6), 30);
        assert_eq!(ShareStyle::quantize_scale(0.12), 6);
        assert_eq!(ShareStyle::quantize_scale(-1.0), 0);
        assert_eq!(ShareStyle::quantize_scale(9.0), 63);
        assert!((ShareStyle::dequantize_scale(30) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn scale_quantization_error_bound() {
        for v in [0.0, 0.011, 0.3, 0.55, 1.26] {
            let q = ShareStyle::quantize_scale(v);
            assert!((ShareStyle::dequantize_scale(q) - v).abs() <= SCALE_STEP / 2.0 + 1e-12);
        }
    }
}
