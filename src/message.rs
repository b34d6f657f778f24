// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - message.rs
 *
 * Copyright (C) 2023 Hubert Figuière
 *
 * This library is free software: you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public License
 * as published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library.  If not, see
 * <http://www.gnu.org/licenses/>.
 */

//! Message framing.
//!
//! A formatted message is a chunk array whose length is a multiple of
//! 8. The first chunk starts with the conjugation map byte for its
//! group, then the 3 signature bytes, then the big-endian u32 payload
//! size. Chunks 1 and 2 are the magic chunks announcing the bitplane
//! caps. Payload bytes follow from chunk 3, skipping the first byte of
//! every 8th chunk, which holds that group's conjugation map.

use byteorder::{BigEndian, ByteOrder};

use crate::chunk::{DataChunk, CHECKERBOARD};
use crate::planes::BitPlaneCaps;
use crate::{Error, Result};

/// Validity marker, checked on extraction. Redundant with the magic
/// chunks; its main job is padding the header chunk to 8 bytes.
pub(crate) const SIGNATURE: [u8; 3] = [0x2F, 0x64, 0xA9];

/// Split 7+7 over the two magic chunks, whose last bytes carry the
/// packed caps.
pub(crate) const MAGIC_14: [u8; 14] = [
    0x35, 0xDB, 0xAA, 0xD5, 0x0A, 0xB7, 0x4C, 0x55, 0xB3, 0x52, 0xB5, 0xAA, 0x37, 0x55,
];

/// Bytes of overhead in a formatted message: 3 signature bytes, 4 size
/// bytes and the 16 bytes of the two magic chunks. Conjugation map
/// bytes are not counted, each group of 8 chunks carries 63 bytes.
const FORMATTING_OVERHEAD: usize = SIGNATURE.len() + 4 + 16;

/// The two caps-announcing chunks for a formatted message.
pub(crate) fn generate_magic_chunks(caps: BitPlaneCaps) -> [DataChunk; 2] {
    let (hi, lo) = caps.pack();
    let mut magic0 = DataChunk::default();
    let mut magic1 = DataChunk::default();
    magic0.bytes[..7].copy_from_slice(&MAGIC_14[..7]);
    magic0.bytes[7] = hi;
    magic1.bytes[..7].copy_from_slice(&MAGIC_14[7..]);
    magic1.bytes[7] = lo;
    [magic0, magic1]
}

/// Check a chunk against one 7-byte half of [`MAGIC_14`], directly and
/// in conjugated form. On a match, return the caps byte it carries,
/// un-conjugated if needed.
pub(crate) fn match_magic_chunk(chunk: &DataChunk, magic_half: &[u8]) -> Option<u8> {
    if chunk.bytes[..7] == magic_half[..7] {
        return Some(chunk.bytes[7]);
    }
    if (0..7).all(|i| chunk.bytes[i] ^ CHECKERBOARD[i] == magic_half[i]) {
        return Some(chunk.bytes[7] ^ CHECKERBOARD[7]);
    }
    None
}

/// Conjugate a group of 8 chunks so that each one ends up with
/// complexity >= 0.5.
///
/// The 7-bit conjugation map recording which of chunks 1..=7 were
/// conjugated lands in the first byte of chunk 0, MSB clear. If chunk
/// 0 itself then needs conjugating, the checkerboard XOR sets that
/// MSB, which is how the extractor knows to undo it.
pub(crate) fn conjugate_group(group: &mut [DataChunk]) {
    debug_assert_eq!(group.len(), 8);

    let mut conj_map = 0_u8;
    for i in 1..8 {
        conj_map <<= 1;
        if group[i].complexity() < 0.5 {
            group[i].conjugate();
            conj_map |= 1;
        }
    }

    group[0].bytes[0] = conj_map;
    if group[0].complexity() < 0.5 {
        group[0].conjugate();
    }
}

/// Undo [`conjugate_group`].
pub(crate) fn de_conjugate_group(group: &mut [DataChunk]) {
    debug_assert_eq!(group.len(), 8);

    if group[0].bytes[0] & 0x80 == 0x80 {
        group[0].conjugate();
    }

    let conj_map = group[0].bytes[0];
    for i in 1..8 {
        if conj_map & (0x80 >> i) != 0 {
            group[i].conjugate();
        }
    }
}

/// How large of a message can be stored after formatting, given the
/// number of complex chunks available. Two chunks are reserved for the
/// magic chunks and the rest is rounded down to whole groups of 8.
pub(crate) fn calculate_message_capacity_from_chunk_count(chunk_count: usize) -> usize {
    let usable_chunks = chunk_count.saturating_sub(2) / 8 * 8;
    (usable_chunks / 8 * 63).saturating_sub(SIGNATURE.len() + 4)
}

/// Format a message for hiding.
///
/// The layout is described in the module documentation. Extending the
/// formatted message to a multiple of 8 chunks means a message within
/// 63 bytes of the cover capacity may no longer fit.
pub(crate) fn format_message(message: &[u8], caps: BitPlaneCaps) -> Vec<DataChunk> {
    let formatted_size = FORMATTING_OVERHEAD + message.len();
    let group_count = (formatted_size + 62) / 63;

    let mut buffer = vec![0_u8; group_count * 64];
    buffer[1..4].copy_from_slice(&SIGNATURE);
    BigEndian::write_u32(&mut buffer[4..8], message.len() as u32);

    let magic_chunks = generate_magic_chunks(caps);
    buffer[8..16].copy_from_slice(&magic_chunks[0].bytes);
    buffer[16..24].copy_from_slice(&magic_chunks[1].bytes);

    // The payload starts at the 3rd chunk (24th byte).
    let mut out_index = 24;
    for &byte in message {
        // skip over the conjugation byte
        if out_index % 64 == 0 {
            out_index += 1;
        }
        buffer[out_index] = byte;
        out_index += 1;
    }

    let mut chunks: Vec<DataChunk> = buffer
        .chunks_exact(8)
        .map(|bytes| DataChunk::from_bytes(bytes.try_into().unwrap()))
        .collect();
    for group in chunks.chunks_exact_mut(8) {
        conjugate_group(group);
    }

    chunks
}

/// Recover the payload size from the header chunk, verifying the
/// signature on the way.
pub(crate) fn parse_size_chunk(mut chunk: DataChunk) -> Result<u32> {
    if chunk.bytes[0] & 0x80 == 0x80 {
        chunk.conjugate();
    }
    if chunk.bytes[1..4] != SIGNATURE {
        return Err(Error::InvalidSignature);
    }
    Ok(BigEndian::read_u32(&chunk.bytes[4..8]))
}

/// Undo what [`format_message`] did.
///
/// The declared size is clamped to what the chunk count can actually
/// represent, so a tampered or truncated image never makes us read
/// beyond the collected chunks.
pub(crate) fn unformat_message(mut chunks: Vec<DataChunk>) -> Result<Vec<u8>> {
    if chunks.len() < 8 {
        return Ok(Vec::new());
    }

    let declared_size = parse_size_chunk(chunks[0])? as usize;
    let group_count = chunks.len() / 8;
    chunks.truncate(group_count * 8);
    let max_message_size = (group_count * 63).saturating_sub(FORMATTING_OVERHEAD);
    let message_size = declared_size.min(max_message_size);

    for group in chunks.chunks_exact_mut(8) {
        de_conjugate_group(group);
    }

    let mut buffer = Vec::with_capacity(chunks.len() * 8);
    for chunk in &chunks {
        buffer.extend_from_slice(&chunk.bytes);
    }

    let mut message = Vec::with_capacity(message_size);
    let mut in_index = 24;
    while message.len() < message_size {
        if in_index % 64 == 0 {
            in_index += 1;
        }
        message.push(buffer[in_index]);
        in_index += 1;
    }

    Ok(message)
}
