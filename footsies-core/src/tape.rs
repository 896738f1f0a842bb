//! Binary match tape.
//!
//! ```text
//! 0   magic "FTSY"   u32 le
//! 4   version        u8
//! 5   reserved       3 bytes, zero
//! 8   seed           u32 le
//! 12  frame count    u32 le
//! 16  inputs         one byte per frame: P1 low nibble, P2 high nibble
//! ..  winner         u32 le (0 none, 1 P1, 2 P2, 3 tie)
//! ..  final frame    u32 le
//! ..  crc32          u32 le over everything before it
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    TAPE_FOOTER_SIZE, TAPE_HEADER_SIZE, TAPE_MAGIC, TAPE_RESERVED_INPUT_BITS, TAPE_VERSION,
};
use crate::error::TapeError;
use crate::events::Winner;
use crate::input::button;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeHeader {
    pub magic: u32,
    pub version: u8,
    pub seed: u32,
    pub frame_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeFooter {
    /// `None` when the match was cut off before anyone won it.
    pub winner: Option<Winner>,
    pub final_frame: u32,
    pub checksum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TapeView<'a> {
    pub header: TapeHeader,
    pub inputs: &'a [u8],
    pub footer: TapeFooter,
}

impl TapeView<'_> {
    pub fn frame(&self, index: usize) -> Option<[u8; 2]> {
        self.inputs.get(index).copied().map(decode_input_byte)
    }
}

#[inline]
pub fn encode_input_byte(bits: [u8; 2]) -> u8 {
    (bits[0] & button::MASK) | ((bits[1] & button::MASK) << 4)
}

#[inline]
pub fn decode_input_byte(byte: u8) -> [u8; 2] {
    [byte & button::MASK, (byte >> 4) & button::MASK]
}

fn winner_code(winner: Option<Winner>) -> u32 {
    match winner {
        None => 0,
        Some(Winner::P1) => 1,
        Some(Winner::P2) => 2,
        Some(Winner::Tie) => 3,
    }
}

fn winner_from_code(code: u32) -> Result<Option<Winner>, TapeError> {
    match code {
        0 => Ok(None),
        1 => Ok(Some(Winner::P1)),
        2 => Ok(Some(Winner::P2)),
        3 => Ok(Some(Winner::Tie)),
        found => Err(TapeError::UnknownWinner { found }),
    }
}

pub fn parse_tape(bytes: &[u8], max_frames: u32) -> Result<TapeView<'_>, TapeError> {
    let min_len = TAPE_HEADER_SIZE + TAPE_FOOTER_SIZE;
    if bytes.len() < min_len {
        return Err(TapeError::TooShort {
            actual: bytes.len(),
            min: min_len,
        });
    }

    let magic = read_u32_le(bytes, 0);
    if magic != TAPE_MAGIC {
        return Err(TapeError::InvalidMagic { found: magic });
    }

    let version = bytes[4];
    if version != TAPE_VERSION {
        return Err(TapeError::UnsupportedVersion { found: version });
    }
    if bytes[5..8].iter().any(|&b| b != 0) {
        return Err(TapeError::HeaderReservedNonZero);
    }

    let seed = read_u32_le(bytes, 8);
    let frame_count = read_u32_le(bytes, 12);
    if frame_count == 0 || frame_count > max_frames {
        return Err(TapeError::FrameCountOutOfRange {
            frame_count,
            max_frames,
        });
    }

    let expected_len = TAPE_HEADER_SIZE + frame_count as usize + TAPE_FOOTER_SIZE;
    if bytes.len() != expected_len {
        return Err(TapeError::LengthMismatch {
            expected: expected_len,
            actual: bytes.len(),
        });
    }

    let inputs_start = TAPE_HEADER_SIZE;
    let inputs_end = inputs_start + frame_count as usize;

    let winner = read_u32_le(bytes, inputs_end);
    let final_frame = read_u32_le(bytes, inputs_end + 4);
    let checksum = read_u32_le(bytes, inputs_end + 8);

    let computed = crc32_and_validate_inputs(bytes, inputs_start, inputs_end)?;
    if checksum != computed {
        return Err(TapeError::CrcMismatch {
            stored: checksum,
            computed,
        });
    }

    Ok(TapeView {
        header: TapeHeader {
            magic,
            version,
            seed,
            frame_count,
        },
        inputs: &bytes[inputs_start..inputs_end],
        footer: TapeFooter {
            winner: winner_from_code(winner)?,
            final_frame,
            checksum,
        },
    })
}

pub fn serialize_tape(
    seed: u32,
    inputs: &[u8],
    winner: Option<Winner>,
    final_frame: u32,
) -> Vec<u8> {
    let total_len = TAPE_HEADER_SIZE + inputs.len() + TAPE_FOOTER_SIZE;
    let mut data = vec![0u8; total_len];

    write_u32_le(&mut data, 0, TAPE_MAGIC);
    data[4] = TAPE_VERSION;
    write_u32_le(&mut data, 8, seed);
    write_u32_le(&mut data, 12, inputs.len() as u32);

    let body_end = TAPE_HEADER_SIZE + inputs.len();
    data[TAPE_HEADER_SIZE..body_end].copy_from_slice(inputs);

    write_u32_le(&mut data, body_end, winner_code(winner));
    write_u32_le(&mut data, body_end + 4, final_frame);

    let checksum = crc32(&data[..body_end + 8]);
    write_u32_le(&mut data, body_end + 8, checksum);

    data
}

#[inline]
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[inline]
fn write_u32_le(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;
        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

fn crc32_update(crc: u32, byte: u8) -> u32 {
    CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8)
}

pub fn crc32(data: &[u8]) -> u32 {
    data.iter()
        .fold(0xFFFF_FFFFu32, |crc, &byte| crc32_update(crc, byte))
        ^ 0xFFFF_FFFF
}

/// CRC over header, inputs and the first two footer words, rejecting input
/// bytes with reserved bits on the way.
fn crc32_and_validate_inputs(
    bytes: &[u8],
    inputs_start: usize,
    inputs_end: usize,
) -> Result<u32, TapeError> {
    let mut crc = 0xFFFF_FFFFu32;
    for (i, &byte) in bytes[..inputs_end + 8].iter().enumerate() {
        if (inputs_start..inputs_end).contains(&i) && byte & TAPE_RESERVED_INPUT_BITS != 0 {
            return Err(TapeError::ReservedInputBits {
                frame: (i - inputs_start) as u32,
                byte,
            });
        }
        crc = crc32_update(crc, byte);
    }
    Ok(crc ^ 0xFFFF_FFFF)
}
