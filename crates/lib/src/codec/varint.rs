//! 7-bit variable-length integers and delta-coded sequences.
//!
//! A varint stores seven payload bits per byte, least significant group
//! first, with the high bit set on every byte except the last. A `u64`
//! therefore takes between one and ten bytes.
//!
//! A delta-coded sequence is a varint element count followed by each element
//! as the zig-zag encoded difference from its predecessor (the first element
//! is relative to zero). Ascending runs of small steps cost one byte per
//! element; descending steps stay lossless.

use super::{ByteReader, ByteWriter, CodecError};

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Maps a signed difference onto the unsigned range, small magnitudes first.
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes [`ByteWriter::write_varint`] uses for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

impl ByteWriter {
    /// Appends `value` as a 7-bit variable-length integer.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.write_u8((value as u8) | 0x80);
            value >>= 7;
        }
        self.write_u8(value as u8);
    }

    /// Appends a delta-coded sequence.
    pub fn write_delta_sequence(&mut self, values: &[u64]) {
        self.write_varint(values.len() as u64);
        let mut previous = 0u64;
        for &value in values {
            let delta = value.wrapping_sub(previous) as i64;
            self.write_varint(zigzag_encode(delta));
            previous = value;
        }
    }
}

impl ByteReader<'_> {
    /// Reads a 7-bit variable-length integer.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let start = self.position();
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let payload = u64::from(byte & 0x7f);
            // The tenth byte may only contribute the single remaining bit.
            if i == MAX_VARINT_LEN - 1 && payload > 1 {
                return Err(CodecError::VarintOverflow { offset: start });
            }
            value |= payload << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow { offset: start })
    }

    /// Reads a varint that must fit a `usize` count or position.
    pub fn read_len(&mut self) -> Result<usize, CodecError> {
        let value = self.read_varint()?;
        usize::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
            value,
            target: "usize",
        })
    }

    /// Reads a delta-coded sequence into `out`, replacing its contents.
    ///
    /// The declared count is checked against the remaining input before
    /// anything is reserved, so a corrupt count cannot trigger a huge
    /// allocation.
    pub fn read_delta_sequence(&mut self, out: &mut Vec<u64>) -> Result<(), CodecError> {
        out.clear();
        let count = self.read_len()?;
        if count > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                offset: self.position(),
                needed: count - self.remaining(),
            });
        }
        out.reserve(count);
        let mut previous = 0u64;
        for _ in 0..count {
            let delta = zigzag_decode(self.read_varint()?);
            previous = previous.wrapping_add(delta as u64);
            out.push(previous);
        }
        Ok(())
    }
}
