//! Bit-level integer codec.
//!
//! Packs fixed-width unsigned and two's-complement signed integers into a
//! byte buffer MSB-first, crossing byte boundaries as needed. Every wire
//! version of the share format is built on top of this pair, so the overflow
//! checks and bit order here are load-bearing for all of them.

use super::error::Error;

/// Widest field any layout uses.
const MAX_FIELD_BITS: u32 = 32;

/// MSB-first bit packer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Bits already used in the last byte, 0..8. 0 means byte-aligned.
    partial_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` as `bits` bits. Fails before emitting anything if the
    /// value does not fit or the width is unsupported.
    pub fn write_unsigned(&mut self, value: u32, bits: u32) -> Result<(), Error> {
        if bits == 0 || bits > MAX_FIELD_BITS {
            return Err(Error::InvalidWidth(bits));
        }
        if bits < 32 && u64::from(value) >= 1u64 << bits {
            return Err(Error::ValueOutOfRange {
                value: i64::from(value),
                bits,
            });
        }

        let mut remaining = bits;
        while remaining > 0 {
            if self.partial_bits == 0 {
                self.bytes.push(0);
            }
            let free = 8 - self.partial_bits;
            let take = remaining.min(free);
            let chunk = (value >> (remaining - take)) & ((1u32 << take) - 1);
            let last = self.bytes.last_mut().unwrap();
            *last |= (chunk as u8) << (free - take);
            self.partial_bits = (self.partial_bits + take) % 8;
            remaining -= take;
        }
        Ok(())
    }

    /// Writes a two's-complement signed value. Requires `bits >= 2`.
    pub fn write_signed(&mut self, value: i32, bits: u32) -> Result<(), Error> {
        if bits < 2 || bits > MAX_FIELD_BITS {
            return Err(Error::InvalidWidth(bits));
        }
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        let v = i64::from(value);
        if v < min || v > max {
            return Err(Error::ValueOutOfRange { value: v, bits });
        }
        let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
        self.write_unsigned((value as u32) & mask, bits)
    }

    /// Pads the current partial byte with zero bits.
    pub fn align_to_byte(&mut self) {
        self.partial_bits = 0;
    }

    /// Finalizes the stream, implicitly byte-aligning.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.bytes
    }

    /// Number of whole bytes the stream occupies so far.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// MSB-first bit reader over a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    /// Absolute bit cursor.
    cursor: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// Reads `bits` bits as an unsigned value. Fails with an explicit error
    /// when reading past the end of the buffer.
    pub fn read_unsigned(&mut self, bits: u32) -> Result<u32, Error> {
        if bits == 0 || bits > MAX_FIELD_BITS {
            return Err(Error::InvalidWidth(bits));
        }
        if self.cursor + bits as usize > self.bytes.len() * 8 {
            return Err(Error::UnexpectedEnd(bits));
        }

        let mut value: u32 = 0;
        let mut remaining = bits;
        while remaining > 0 {
            let byte = self.bytes[self.cursor / 8];
            let offset = (self.cursor % 8) as u32;
            let avail = 8 - offset;
            let take = remaining.min(avail);
            let chunk = (u32::from(byte) >> (avail - take)) & ((1u32 << take) - 1);
            value = (value << take) | chunk;
            self.cursor += take as usize;
            remaining -= take;
        }
        Ok(value)
    }

    /// Reads a two's-complement signed value. Requires `bits >= 2`.
    pub fn read_signed(&mut self, bits: u32) -> Result<i32, Error> {
        if bits < 2 {
            return Err(Error::InvalidWidth(bits));
        }
        let raw = self.read_unsigned(bits)?;
        let sign = 1u32 << (bits - 1);
        if raw & sign != 0 {
            // Sign-extend.
            let ext = if bits == 32 { 0 } else { u32::MAX << bits };
            Ok((raw | ext) as i32)
        } else {
            Ok(raw as i32)
        }
    }

    /// Advances the cursor to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        self.cursor = (self.cursor + 7) / 8 * 8;
    }

    /// Bits left in the buffer.
    pub fn remaining_bits(&self) -> usize {
        self.bytes.len() * 8 - self.cursor
    }
}

/// Minimal width able to hold `count` distinct indices, never below 1 bit.
pub fn index_bits(count: usize) -> u32 {
    let mut bits = 1;
    while (1usize << bits) < count {
        bits += 1;
    }
    bits
}

/// Minimal signed width (including sign bit) that fits `max_abs`, clamped to
/// the 8..=16 range the coordinate field supports. Returns `None` when even
/// 16 bits is not enough.
pub fn signed_coord_bits(max_abs: i64) -> Option<u32> {
    for bits in 8..=16u32 {
        let limit = 1i64 << (bits - 1);
        if max_abs < limit {
            return Some(bits);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_roundtrip_all_widths() {
        for bits in 1..=16u32 {
            let max = (1u64 << bits) - 1;
            let samples = [0u64, 1, max / 2, max.saturating_sub(1), max];
            let mut w = BitWriter::new();
            for &v in &samples {
                w.write_unsigned(v as u32, bits).unwrap();
            }
            let bytes = w.into_bytes();
            let mut r = BitReader::new(&bytes);
            for &v in &samples {
                assert_eq!(r.read_unsigned(bits).unwrap(), v as u32, "width {bits}");
            }
        }
    }

    #[test]
    fn signed_roundtrip_all_widths() {
        for bits in 2..=16u32 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            let samples = [min, min + 1, -1, 0, 1, max - 1, max];
            let mut w = BitWriter::new();
            for &v in &samples {
                w.write_signed(v as i32, bits).unwrap();
            }
            let bytes = w.into_bytes();
            let mut r = BitReader::new(&bytes);
            for &v in &samples {
                assert_eq!(r.read_signed(bits).unwrap(), v as i32, "width {bits}");
            }
        }
    }

    #[test]
    fn msb_first_byte_layout() {
        let mut w = BitWriter::new();
        w.write_unsigned(0b101, 3).unwrap();
        w.write_unsigned(0b01101, 5).unwrap();
        w.write_unsigned(0xAB, 8).unwrap();
        assert_eq!(w.into_bytes(), vec![0b1010_1101, 0xAB]);
    }

    #[test]
    fn fields_cross_byte_boundaries() {
        let mut w = BitWriter::new();
        w.write_unsigned(0x3FF, 10).unwrap();
        w.write_unsigned(0, 2).unwrap();
        w.write_unsigned(0xFFF, 12).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 3);
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_unsigned(10).unwrap(), 0x3FF);
        assert_eq!(r.read_unsigned(2).unwrap(), 0);
        assert_eq!(r.read_unsigned(12).unwrap(), 0xFFF);
    }

    #[test]
    fn overflow_write_emits_nothing() {
        let mut w = BitWriter::new();
        w.write_unsigned(1, 1).unwrap();
        let before = w.byte_len();
        assert!(matches!(
            w.write_unsigned(8, 3),
            Err(Error::ValueOutOfRange { value: 8, bits: 3 })
        ));
        assert_eq!(w.byte_len(), before);
        // The stream stays usable after a rejected write.
        w.write_unsigned(7, 3).unwrap();
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_unsigned(1).unwrap(), 1);
        assert_eq!(r.read_unsigned(3).unwrap(), 7);
    }

    #[test]
    fn signed_bounds_rejected() {
        let mut w = BitWriter::new();
        assert!(w.write_signed(-5, 4).is_ok());
        assert!(matches!(w.write_signed(8, 4), Err(Error::ValueOutOfRange { .. })));
        assert!(matches!(w.write_signed(-9, 4), Err(Error::ValueOutOfRange { .. })));
        assert!(matches!(w.write_signed(0, 1), Err(Error::InvalidWidth(1))));
    }

    #[test]
    fn read_past_end_fails() {
        let bytes = [0xFFu8];
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_unsigned(6).unwrap(), 0b111111);
        assert!(matches!(r.read_unsigned(3), Err(Error::UnexpectedEnd(3))));
        // The two remaining bits are still readable afterwards.
        assert_eq!(r.read_unsigned(2).unwrap(), 0b11);
    }

    #[test]
    fn align_pads_with_zero_bits() {
        let mut w = BitWriter::new();
        w.write_unsigned(1, 1).unwrap();
        w.align_to_byte();
        w.write_unsigned(0xFF, 8).unwrap();
        assert_eq!(w.into_bytes(), vec![0b1000_0000, 0xFF]);
    }

    #[test]
    fn index_bits_minimums() {
        assert_eq!(index_bits(0), 1);
        assert_eq!(index_bits(1), 1);
        assert_eq!(index_bits(2), 1);
        assert_eq!(index_bits(3), 2);
        assert_eq!(index_bits(4), 2);
        assert_eq!(index_bits(5), 3);
        assert_eq!(index_bits(1023), 10);
        assert_eq!(index_bits(1024), 10);
    }

    #[test]
    fn coord_bit_widths() {
        assert_eq!(signed_coord_bits(0), Some(8));
        assert_eq!(signed_coord_bits(127), Some(8));
        assert_eq!(signed_coord_bits(128), Some(9));
        assert_eq!(signed_coord_bits(32767), Some(16));
        assert_eq!(signed_coord_bits(32768), None);
    }
}
