// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - chunk.rs
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

//! The 8x8 bit tile, its complexity metric and the complexity
//! distribution used to pick an embedding threshold.

use static_assertions::assert_eq_size;

/// The 8x8 checkerboard. XORing a chunk with it flips every bit
/// transition, taking the complexity from C to 1 - C.
pub(crate) const CHECKERBOARD: [u8; 8] = [0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55];

/// Maximum number of bit transitions in an 8x8 tile: 7 per row over
/// 8 rows, horizontally and vertically.
const MAX_BIT_TRANSITIONS: u32 = 2 * 7 * 8;

/// 64 bits, the fundamental unit of data hiding in BPCS.
///
/// The cover image is broken up into an array of data chunks, each
/// representing an 8x8 section of one bitplane. The message is also
/// formatted as an array of data chunks, which then replace some
/// subset of the cover chunks.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct DataChunk {
    pub bytes: [u8; 8],
}

assert_eq_size!(DataChunk, u64);

/// Count the bit transitions, from 1 to 0 or from 0 to 1, in a byte.
fn count_bit_transitions(byte: u8) -> u32 {
    ((byte ^ (byte << 1)) & 0b1111_1110).count_ones()
}

/// Count the bit differences at corresponding positions of 2 bytes.
fn count_bit_differences(a: u8, b: u8) -> u32 {
    (a ^ b).count_ones()
}

impl DataChunk {
    pub fn from_bytes(bytes: [u8; 8]) -> DataChunk {
        DataChunk { bytes }
    }

    /// Raw transition count, horizontal plus vertical, in 0..=112.
    fn count_transitions(&self) -> u32 {
        let mut count = 0;
        for i in 0..8 {
            count += count_bit_transitions(self.bytes[i]);
        }
        for i in 0..7 {
            count += count_bit_differences(self.bytes[i], self.bytes[i + 1]);
        }
        count
    }

    /// Complexity of the chunk, in [0, 1].
    ///
    /// Measured by counting the horizontal and vertical bit
    /// transitions, then dividing by 112, the maximum possible in an
    /// 8x8 tile. Only 113 distinct values exist, so exact equality
    /// on the result is safe.
    pub fn complexity(&self) -> f32 {
        self.count_transitions() as f32 / MAX_BIT_TRANSITIONS as f32
    }

    /// Make a non complex chunk complex, or vice versa.
    ///
    /// Conjugating a previously conjugated chunk gives back the
    /// original chunk.
    pub fn conjugate(&mut self) {
        for (byte, mask) in self.bytes.iter_mut().zip(CHECKERBOARD) {
            *byte ^= mask;
        }
    }
}

/// Cumulative distribution of chunk complexities.
///
/// Where a histogram maps a complexity to the number of chunks with
/// exactly that complexity, the CDF maps a threshold to the number of
/// chunks with complexity greater than or equal to it.
pub(crate) struct Cdf {
    /// (complexity, count of chunks >= complexity), ascending.
    inner: Vec<(f32, usize)>,
}

impl Cdf {
    pub fn new(chunks: &[DataChunk]) -> Cdf {
        let mut histogram = [0_usize; MAX_BIT_TRANSITIONS as usize + 1];
        for chunk in chunks {
            histogram[chunk.count_transitions() as usize] += 1;
        }

        let mut inner = Vec::new();
        let mut cumulative = 0_usize;
        for transitions in (0..histogram.len()).rev() {
            if histogram[transitions] != 0 {
                cumulative += histogram[transitions];
                inner.push((
                    transitions as f32 / MAX_BIT_TRANSITIONS as f32,
                    cumulative,
                ));
            }
        }
        inner.reverse();

        Cdf { inner }
    }

    /// The count of chunks which have complexity >= threshold.
    pub fn query(&self, threshold: f32) -> usize {
        let index = self.inner.partition_point(|&(complexity, _)| complexity < threshold);
        self.inner.get(index).map_or(0, |&(_, count)| count)
    }

    /// The maximum complexity threshold that can be used if the
    /// specified number of chunks needs to be stored.
    ///
    /// A negative value indicates that many chunks can not fit at any
    /// threshold.
    pub fn max_threshold_to_store(&self, chunk_count: usize) -> f32 {
        const GRANULARITY: usize = 512;
        for i in 0..=GRANULARITY {
            let threshold = (GRANULARITY - i) as f32 / GRANULARITY as f32;
            if self.query(threshold) >= chunk_count {
                return threshold;
            }
        }
        -1.0
    }
}

/// The maximum threshold usable to store `message_chunk_count` chunks
/// in the given cover stream, clamped to [0, 0.5].
///
/// 0.5 is the decidability bound: below it a conjugated chunk can't be
/// told apart from an un-conjugated one. When the message can't fit at
/// any threshold we clamp to 0 and a partial message gets stored.
pub(crate) fn calculate_max_threshold(message_chunk_count: usize, cover: &[DataChunk]) -> f32 {
    let cdf = Cdf::new(cover);
    cdf.max_threshold_to_store(message_chunk_count).clamp(0.0, 0.5)
}
