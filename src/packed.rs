//! 7-bit packing of integers for sysex payloads.
//!
//! Every payload byte must keep its top bit clear, so values are split into
//! 7-bit groups, least significant first. A packed u32 spends five bytes
//! and the last one only carries bits 28..=31.

use crate::{Decode, Encode};

pub const U14_LEN: usize = 2;
pub const U32_LEN: usize = 5;
pub const U64_LEN: usize = 2 * U32_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackError {
    EncodeBufferTooSmall { expected: usize, found: usize },
    DecodeBufferTooSmall { expected_at_least: usize, found: usize },
}

/// Splits a value of up to 14 bits into two 7-bit bytes, LSB first.
pub fn two_7bit_bytes(value: u16) -> [u8; 2] {
    [(value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
}

/// Joins an LSB, MSB pair back into a value.
pub fn from_two_7bit_bytes(lsb: u8, msb: u8) -> u16 {
    lsb as u16 | (msb as u16) << 7
}

fn check_encode(buffer: &[u8], expected: usize) -> Result<(), PackError> {
    if buffer.len() < expected {
        return Err(PackError::EncodeBufferTooSmall {
            expected,
            found: buffer.len(),
        });
    }
    Ok(())
}

fn check_decode(data: &[u8], expected_at_least: usize) -> Result<(), PackError> {
    if data.len() < expected_at_least {
        return Err(PackError::DecodeBufferTooSmall {
            expected_at_least,
            found: data.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedU14(pub u16);

impl Encode for PackedU14 {
    type Error = PackError;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        check_encode(buffer, U14_LEN)?;
        buffer[..U14_LEN].copy_from_slice(&two_7bit_bytes(self.0));
        Ok(U14_LEN)
    }
}

impl<'a> Decode<'a> for PackedU14 {
    type Error = PackError;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error> {
        check_decode(data, U14_LEN)?;
        Ok(PackedU14(from_two_7bit_bytes(data[0], data[1])))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedU32(pub u32);

impl PackedU32 {
    pub fn bytes(&self) -> [u8; U32_LEN] {
        let v = self.0;
        [
            (v & 0x7F) as u8,
            ((v >> 7) & 0x7F) as u8,
            ((v >> 14) & 0x7F) as u8,
            ((v >> 21) & 0x7F) as u8,
            // only 4 bits left
            ((v >> 28) & 0x0F) as u8,
        ]
    }
}

impl Encode for PackedU32 {
    type Error = PackError;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        check_encode(buffer, U32_LEN)?;
        buffer[..U32_LEN].copy_from_slice(&self.bytes());
        Ok(U32_LEN)
    }
}

impl<'a> Decode<'a> for PackedU32 {
    type Error = PackError;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error> {
        check_decode(data, U32_LEN)?;
        let mut v = data[0] as u32;
        v |= (data[1] as u32) << 7;
        v |= (data[2] as u32) << 14;
        v |= (data[3] as u32) << 21;
        v |= (data[4] as u32) << 28;
        Ok(PackedU32(v))
    }
}

/// Two chained u32 packs, low word first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedU64(pub u64);

impl PackedU64 {
    pub fn bytes(&self) -> [u8; U64_LEN] {
        let mut out = [0; U64_LEN];
        out[..U32_LEN].copy_from_slice(&PackedU32(self.0 as u32).bytes());
        out[U32_LEN..].copy_from_slice(&PackedU32((self.0 >> 32) as u32).bytes());
        out
    }
}

impl Encode for PackedU64 {
    type Error = PackError;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        check_encode(buffer, U64_LEN)?;
        buffer[..U64_LEN].copy_from_slice(&self.bytes());
        Ok(U64_LEN)
    }
}

impl<'a> Decode<'a> for PackedU64 {
    type Error = PackError;

    fn decode(data: &'a [u8]) -> Result<Self, Self::Error> {
        check_decode(data, U64_LEN)?;
        let low = PackedU32::decode(&data[..U32_LEN])?.0 as u64;
        let high = PackedU32::decode(&data[U32_LEN..U64_LEN])?.0 as u64;
        Ok(PackedU64(low | high << 32))
    }
}
