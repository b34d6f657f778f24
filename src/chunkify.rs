// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - chunkify.rs
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

//! The reversible transform between a pixel buffer and an ordered
//! stream of 8x8 bitplane chunks.

use rand_mt::Mt64;

use crate::bitmap::Image;
use crate::bits::{get_bit, set_bit};
use crate::chunk::DataChunk;

/// The order in which the 8x8 tiles of a bitplane are visited.
///
/// A Fisher-Yates shuffle driven by a Mersenne Twister seeded from the
/// image dimensions. Two messages hidden in similar images should not
/// produce identical modification patterns at the start of the stream,
/// and keying the shuffle on the dimensions keeps the layout
/// reproducible without any out-of-band state.
pub(crate) fn tile_order(img: &Image) -> Vec<usize> {
    let count = img.chunks_per_bitplane();
    let seed = u64::from(img.width) * 1_000_003 + u64::from(img.height);
    let mut rng = Mt64::new(seed);

    let mut order: Vec<usize> = (0..count).collect();
    for i in (1..count).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    order
}

/// Break the image up into 8x8 bitplane chunks, tile-major within a
/// plane, plane-major overall following `priority`.
///
/// The caller is expected to have Gray-coded the pixel buffer. Pixels
/// in the partial right/bottom strip are not visited.
pub(crate) fn chunkify(img: &Image, priority: &[usize]) -> Vec<DataChunk> {
    let chunks_in_width = img.chunks_in_width();
    let order = tile_order(img);

    let mut chunks = Vec::with_capacity(priority.len() * order.len());
    for &bitplane_index in priority {
        for &tile_index in &order {
            let tile_x = tile_index % chunks_in_width;
            let tile_y = tile_index / chunks_in_width;

            let mut chunk = DataChunk::default();
            let mut out_bit = 0;
            for row in 0..8 {
                for col in 0..8 {
                    let pixel_x = tile_x * 8 + col;
                    let pixel_y = tile_y * 8 + row;
                    let pixel_index = pixel_y * img.width as usize + pixel_x;
                    let bit_index = pixel_index * 32 + bitplane_index;
                    set_bit(&mut chunk.bytes, out_bit, get_bit(&img.pixel_data, bit_index));
                    out_bit += 1;
                }
            }
            chunks.push(chunk);
        }
    }

    chunks
}

/// Write a chunk stream back into the pixel buffer. Exact inverse of
/// [`chunkify`] for the same image dimensions and priority.
pub(crate) fn de_chunkify(img: &mut Image, chunks: &[DataChunk], priority: &[usize]) {
    let chunks_in_width = img.chunks_in_width();
    let order = tile_order(img);

    let mut chunk_iter = chunks.iter();
    for &bitplane_index in priority {
        for &tile_index in &order {
            let tile_x = tile_index % chunks_in_width;
            let tile_y = tile_index / chunks_in_width;

            let chunk = chunk_iter.next().expect("chunk stream too short");
            let mut in_bit = 0;
            for row in 0..8 {
                for col in 0..8 {
                    let pixel_x = tile_x * 8 + col;
                    let pixel_y = tile_y * 8 + row;
                    let pixel_index = pixel_y * img.width as usize + pixel_x;
                    let bit_index = pixel_index * 32 + bitplane_index;
                    set_bit(&mut img.pixel_data, bit_index, get_bit(&chunk.bytes, in_bit));
                    in_bit += 1;
                }
            }
        }
    }
}
