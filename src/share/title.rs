//! Optional title block codec.
//!
//! Titles use a restricted 64-character alphabet so each character fits in
//! 6 bits: space, hyphen, digits, then upper and lower case letters. Input
//! outside the alphabet is sanitized to hyphens before encoding.

use super::bits::{BitReader, BitWriter};
use super::error::Error;

const ALPHABET: &[u8; 64] = b" -0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Longest title the 6-bit length field carries.
pub const MAX_TITLE_LEN: usize = 63;

fn char_to_code(c: char) -> Option<u32> {
    if c.is_ascii() {
        ALPHABET.iter().position(|&b| b == c as u8).map(|i| i as u32)
    } else {
        None
    }
}

/// Maps any unsupported character to hyphen, collapses whitespace runs,
/// trims leading hyphens and surrounding whitespace, truncates to 63 chars.
pub fn sanitize_title(input: &str) -> String {
    let mut mapped = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_whitespace() {
            mapped.push(' ');
        } else if char_to_code(c).is_some() {
            mapped.push(c);
        } else {
            mapped.push('-');
        }
    }

    let mut collapsed = String::with_capacity(mapped.len());
    let mut prev_space = false;
    for c in mapped.chars() {
        if c == ' ' {
            if !prev_space {
                collapsed.push(c);
            }
            prev_space = true;
        } else {
            collapsed.push(c);
            prev_space = false;
        }
    }

    let trimmed = collapsed.trim().trim_start_matches('-').trim();
    trimmed.chars().take(MAX_TITLE_LEN).collect()
}

/// Writes the title block: 1-bit presence flag, then 6-bit length and one
/// 6-bit code per character. `title` must already be sanitized.
pub fn write_title(writer: &mut BitWriter, title: Option<&str>) -> Result<(), Error> {
    match title {
        Some(t) if !t.is_empty() => {
            writer.write_unsigned(1, 1)?;
            let len = t.chars().count().min(MAX_TITLE_LEN);
            writer.write_unsigned(len as u32, 6)?;
            for c in t.chars().take(len) {
                // Sanitized input only contains alphabet characters; anything
                // else still degrades to hyphen rather than corrupting offsets.
                let code = char_to_code(c).unwrap_or(1);
                writer.write_unsigned(code, 6)?;
            }
            Ok(())
        }
        _ => writer.write_unsigned(0, 1),
    }
}

/// Reads the title block. Unknown codes decode as hyphen.
pub fn read_title(reader: &mut BitReader<'_>) -> Result<Option<String>, Error> {
    if reader.read_unsigned(1)? == 0 {
        return Ok(None);
    }
    let len = reader.read_unsigned(6)? as usize;
    let mut title = String::with_capacity(len);
    for _ in 0..len {
        let code = reader.read_unsigned(6)? as usize;
        title.push(ALPHABET.get(code).map(|&b| b as char).unwrap_or('-'));
    }
    Ok(Some(title))
}
