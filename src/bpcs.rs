// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - bpcs.rs
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

//! The BPCS engine: hide, extract and measure.

use log::{debug, warn};

use crate::bitmap::Image;
use crate::bits::{binary_to_gray_code_inplace, gray_code_to_binary_inplace};
use crate::chunk::{calculate_max_threshold, DataChunk};
use crate::chunkify::{chunkify, de_chunkify};
use crate::message::{
    calculate_message_capacity_from_chunk_count, format_message, match_magic_chunk,
    unformat_message, MAGIC_14,
};
use crate::planes::BitPlaneCaps;
use crate::{Error, Result};

/// Statistics reported by [`hide_message`] and [`measure_capacity`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HideStats {
    /// Complexity threshold used (or measured against).
    pub threshold: f32,
    /// Total cover chunks replaced (or, for measure, available).
    pub chunks_used: usize,
    /// Whole 8x8 tiles per bitplane in the image.
    pub chunks_per_bitplane: usize,
    /// Per-bitplane breakdown of `chunks_used`, indexed by bitplane.
    pub chunks_used_per_bitplane: [usize; 32],
    /// Payload size requested, in bytes.
    pub message_size: usize,
    /// Payload bytes actually stored (or storable, for measure).
    ///
    /// Less than `message_size` when the cover overflowed. The stego
    /// image then carries a truncated payload and extraction returns
    /// that prefix.
    pub message_bytes_hidden: usize,
}

fn check_dimensions(img: &Image) -> Result<()> {
    if img.chunks_per_bitplane() == 0 {
        return Err(Error::InvalidImage);
    }
    if img.pixel_data.len() != img.width as usize * img.height as usize * 4 {
        return Err(Error::InvalidImage);
    }
    Ok(())
}

/// Payload bytes recoverable from an embedded prefix of the formatted
/// message. Partial groups are lost, the conjugation map of a group
/// only makes its chunks decodable as a whole.
fn bytes_recoverable(chunks_embedded: usize, message_size: usize) -> usize {
    let whole_groups = chunks_embedded / 8;
    message_size.min((whole_groups * 63).saturating_sub(23))
}

/// Hide `message` in `img`, modifying the pixel buffer in place.
///
/// When `threshold` is `None` the highest workable complexity
/// threshold is derived from the cover's complexity distribution.
/// A cover too small for the message is not an error: the statistics
/// report how much of it was stored.
pub fn hide_message(
    img: &mut Image,
    message: &[u8],
    caps: BitPlaneCaps,
    threshold: Option<f32>,
) -> Result<HideStats> {
    check_dimensions(img)?;

    let priority = caps.priority();
    let formatted = format_message(message, caps);

    binary_to_gray_code_inplace(&mut img.pixel_data);
    let mut cover = chunkify(img, &priority);

    let threshold = match threshold {
        Some(threshold) => threshold.clamp(0.0, 0.5),
        None => calculate_max_threshold(formatted.len(), &cover),
    };
    debug!(
        "hiding {} formatted chunks at threshold {}",
        formatted.len(),
        threshold
    );

    let mut stats = HideStats {
        threshold,
        chunks_per_bitplane: img.chunks_per_bitplane(),
        message_size: message.len(),
        ..Default::default()
    };

    let mut next_chunk = 0;
    for (index, cover_chunk) in cover.iter_mut().enumerate() {
        if next_chunk == formatted.len() {
            break;
        }
        if cover_chunk.complexity() >= threshold {
            *cover_chunk = formatted[next_chunk];
            next_chunk += 1;
            let bitplane = priority[index / stats.chunks_per_bitplane];
            stats.chunks_used_per_bitplane[bitplane] += 1;
            stats.chunks_used += 1;
        }
    }

    stats.message_bytes_hidden = if next_chunk == formatted.len() {
        message.len()
    } else {
        bytes_recoverable(next_chunk, message.len())
    };
    if stats.message_bytes_hidden < stats.message_size {
        warn!(
            "hiding capacity exceeded, stored {} of {} bytes",
            stats.message_bytes_hidden, stats.message_size
        );
    }

    de_chunkify(img, &cover, &priority);
    gray_code_to_binary_inplace(&mut img.pixel_data);

    Ok(stats)
}

/// Scan the complex chunks of a full-caps stream for the pair of
/// magic chunks and recover the bitplane caps they announce.
fn find_caps(stream: &[DataChunk]) -> Result<BitPlaneCaps> {
    let mut hi: Option<u8> = None;
    for chunk in stream.iter().filter(|chunk| chunk.complexity() >= 0.5) {
        match hi {
            None => {
                hi = match_magic_chunk(chunk, &MAGIC_14[..7]);
            }
            Some(caps_hi) => {
                if let Some(caps_lo) = match_magic_chunk(chunk, &MAGIC_14[7..]) {
                    match BitPlaneCaps::unpack(caps_hi, caps_lo) {
                        Ok(caps) => return Ok(caps),
                        // Corrupt caps byte, resume the scan.
                        Err(_) => hi = None,
                    }
                }
            }
        }
    }
    Err(Error::MagicNotFound)
}

/// Extract a hidden message from `img`.
///
/// The bitplane caps used at hide time are self-describing: the image
/// is first chunkified with all 32 planes, the magic chunks recover
/// the caps, and the chunk stream is then rebuilt with the real
/// priority before deframing.
pub fn unhide_message(img: &Image) -> Result<Vec<u8>> {
    check_dimensions(img)?;

    let mut work = img.clone();
    binary_to_gray_code_inplace(&mut work.pixel_data);

    let stream = chunkify(&work, &BitPlaneCaps::FULL.priority());
    let caps = find_caps(&stream)?;
    debug!("recovered bitplane caps {:?}", caps);

    let stream = if caps == BitPlaneCaps::FULL {
        stream
    } else {
        chunkify(&work, &caps.priority())
    };

    let formatted: Vec<DataChunk> = stream
        .into_iter()
        .filter(|chunk| chunk.complexity() >= 0.5)
        .collect();
    debug!("collected {} complex chunks", formatted.len());

    unformat_message(formatted)
}

/// Measure how many payload bytes `img` could hold at `threshold`,
/// restricted to the bitplanes selected by `caps`.
pub fn measure_capacity(threshold: f32, img: &Image, caps: BitPlaneCaps) -> Result<HideStats> {
    if !(0.0..=0.5).contains(&threshold) {
        return Err(Error::InvalidArgument(
            "threshold should be in range [0, 0.5]".into(),
        ));
    }
    check_dimensions(img)?;

    let mut work = img.clone();
    binary_to_gray_code_inplace(&mut work.pixel_data);

    let priority = caps.priority();
    let stream = chunkify(&work, &priority);

    let mut stats = HideStats {
        threshold,
        chunks_per_bitplane: work.chunks_per_bitplane(),
        ..Default::default()
    };
    for (index, chunk) in stream.iter().enumerate() {
        if chunk.complexity() >= threshold {
            let bitplane = priority[index / stats.chunks_per_bitplane];
            stats.chunks_used_per_bitplane[bitplane] += 1;
            stats.chunks_used += 1;
        }
    }

    stats.message_bytes_hidden = calculate_message_capacity_from_chunk_count(stats.chunks_used);
    Ok(stats)
}

#[cfg(test)]
mod test {
    use rand_mt::Mt64;

    use super::{find_caps, hide_message, measure_capacity, unhide_message};
    use crate::bitmap::Image;
    use crate::chunkify::chunkify;
    use crate::planes::BitPlaneCaps;
    use crate::Error;

    fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = Mt64::new(seed);
        (0..len).map(|_| rng.next_u64() as u8).collect()
    }

    /// An image where roughly half of the 8x8 tiles are random noise,
    /// the rest flat black.
    fn half_noisy_image(width: u32, height: u32, seed: u64) -> Image {
        let mut rng = Mt64::new(seed);
        let mut img = Image::new(width, height, vec![0_u8; width as usize * height as usize * 4]);
        for tile_y in 0..img.chunks_in_height() {
            for tile_x in 0..img.chunks_in_width() {
                if rng.next_u64() % 2 == 0 {
                    continue;
                }
                for row in 0..8 {
                    for col in 0..8 {
                        let x = tile_x * 8 + col;
                        let y = tile_y * 8 + row;
                        let offset = (y * width as usize + x) * 4;
                        let noise = rng.next_u64().to_le_bytes();
                        img.pixel_data[offset..offset + 4].copy_from_slice(&noise[..4]);
                    }
                }
            }
        }
        img
    }

    #[test]
    fn test_message_hiding() {
        let message = random_bytes(511, 1);
        let mut img = half_noisy_image(257, 135, 2);

        let stats = hide_message(&mut img, &message, BitPlaneCaps::FULL, None).unwrap();
        assert_eq!(stats.message_bytes_hidden, 511);
        assert!(stats.chunks_used >= 65);
        assert!(stats.threshold > 0.0 && stats.threshold <= 0.5);

        let extracted = unhide_message(&img).unwrap();
        assert_eq!(extracted, message);
    }

    #[test]
    fn test_untouched_regions() {
        // 103x97: the 7 rightmost columns and the bottom row lie
        // outside the 8-aligned area and must come through untouched.
        let message = random_bytes(300, 3);
        let cover = half_noisy_image(103, 97, 4);
        let mut img = cover.clone();

        hide_message(&mut img, &message, BitPlaneCaps::FULL, None).unwrap();
        assert_eq!(unhide_message(&img).unwrap(), message);

        for y in 0..97_usize {
            for x in 0..103_usize {
                if x < 96 && y < 96 {
                    continue;
                }
                let offset = (y * 103 + x) * 4;
                assert_eq!(
                    img.pixel_data[offset..offset + 4],
                    cover.pixel_data[offset..offset + 4]
                );
            }
        }
    }

    #[test]
    fn test_constrained_caps() {
        let message = random_bytes(511, 5);
        let cover = half_noisy_image(257, 135, 6);
        let mut img = cover.clone();

        let caps = BitPlaneCaps::new(7, 6, 5, 4).unwrap();
        let stats = hide_message(&mut img, &message, caps, None).unwrap();
        assert_eq!(stats.message_bytes_hidden, 511);

        // Caps come back without out-of-band information.
        assert_eq!(unhide_message(&img).unwrap(), message);

        // Bits above each channel's cap are never modified.
        let channel_caps = [7_u32, 6, 5, 4];
        for (index, (stego, original)) in
            img.pixel_data.iter().zip(&cover.pixel_data).enumerate()
        {
            let cap = channel_caps[index % 4];
            assert_eq!(stego >> cap, original >> cap);
        }
    }

    #[test]
    fn test_caps_recovered_for_sparse_planes() {
        let message = random_bytes(64, 7);
        let mut img = half_noisy_image(128, 128, 8);

        let caps = BitPlaneCaps::new(1, 1, 0, 0).unwrap();
        let stats = hide_message(&mut img, &message, caps, None).unwrap();
        assert_eq!(stats.message_bytes_hidden, 64);
        assert_eq!(unhide_message(&img).unwrap(), message);
    }

    #[test]
    fn test_overflow_reports_partial_storage() {
        // 64x64 of flat black holds 2048 chunks, 16105 bytes at
        // threshold 0. Ask for more and check the truncation is
        // reported and the prefix still extracts.
        let message = random_bytes(20000, 9);
        let mut img = Image::new(64, 64, vec![0_u8; 64 * 64 * 4]);

        let stats = hide_message(&mut img, &message, BitPlaneCaps::FULL, None).unwrap();
        assert_eq!(stats.threshold, 0.0);
        assert!(stats.message_bytes_hidden < message.len());
        assert_eq!(stats.message_bytes_hidden, 16105);

        let extracted = unhide_message(&img).unwrap();
        assert_eq!(extracted.len(), stats.message_bytes_hidden);
        assert_eq!(extracted, message[..stats.message_bytes_hidden]);
    }

    #[test]
    fn test_threshold_clamps_to_zero_on_flat_cover() {
        // A flat cover has no complex chunks at all, so any request
        // drives the threshold to 0 and everything still round-trips.
        let message = random_bytes(100, 10);
        let mut img = Image::new(64, 64, vec![0_u8; 64 * 64 * 4]);

        let stats = hide_message(&mut img, &message, BitPlaneCaps::FULL, None).unwrap();
        assert_eq!(stats.threshold, 0.0);
        assert_eq!(stats.message_bytes_hidden, 100);
        assert_eq!(unhide_message(&img).unwrap(), message);
    }

    #[test]
    fn test_extract_unprocessed_image() {
        let img = half_noisy_image(64, 64, 11);
        assert_eq!(unhide_message(&img), Err(Error::MagicNotFound));
    }

    #[test]
    fn test_too_small_image() {
        let mut img = Image::new(7, 9, vec![0_u8; 7 * 9 * 4]);
        assert_eq!(
            hide_message(&mut img, b"hi", BitPlaneCaps::FULL, None),
            Err(Error::InvalidImage)
        );
        assert_eq!(unhide_message(&img), Err(Error::InvalidImage));
        assert_eq!(
            measure_capacity(0.3, &img, BitPlaneCaps::FULL),
            Err(Error::InvalidImage)
        );
    }

    #[test]
    fn test_measure() {
        let img = half_noisy_image(257, 135, 12);

        let full = measure_capacity(0.3, &img, BitPlaneCaps::FULL).unwrap();
        assert!(full.chunks_used > 0);
        assert!(full.message_bytes_hidden > 0);
        assert_eq!(
            full.chunks_used,
            full.chunks_used_per_bitplane.iter().sum::<usize>()
        );

        // Cap-aware measure only counts the planes in play.
        let caps = BitPlaneCaps::new(4, 4, 4, 4).unwrap();
        let capped = measure_capacity(0.3, &img, caps).unwrap();
        assert!(capped.chunks_used < full.chunks_used);
        for bitplane in [0, 1, 2, 3, 8, 9, 10, 11, 16, 17, 18, 19, 24, 25, 26, 27] {
            assert_eq!(capped.chunks_used_per_bitplane[bitplane], 0);
        }

        assert_eq!(
            measure_capacity(0.6, &img, BitPlaneCaps::FULL),
            Err(Error::InvalidArgument(
                "threshold should be in range [0, 0.5]".into()
            ))
        );
    }

    #[test]
    fn test_find_caps_needs_magic() {
        let mut work = half_noisy_image(64, 64, 13);
        crate::bits::binary_to_gray_code_inplace(&mut work.pixel_data);
        let stream = chunkify(&work, &BitPlaneCaps::FULL.priority());
        assert_eq!(find_caps(&stream), Err(Error::MagicNotFound));
    }
}
