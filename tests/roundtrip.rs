// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - tests/roundtrip.rs
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

//! End-to-end hide/extract scenarios on synthetic images.

use rand_mt::Mt64;

use bpcs::{hide_message, measure_capacity, unhide_message, BitPlaneCaps, Image};

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = Mt64::new(seed);
    (0..len).map(|_| rng.next_u64() as u8).collect()
}

/// An image where roughly half of the 8x8 tiles are random noise, the
/// rest flat black.
fn half_noisy_image(width: u32, height: u32, seed: u64) -> Image {
    let mut rng = Mt64::new(seed);
    let mut img = Image::new(width, height, vec![0_u8; width as usize * height as usize * 4]);
    for tile_y in 0..(height / 8) as usize {
        for tile_x in 0..(width / 8) as usize {
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
fn round_trip_payload_sizes() {
    let cover = half_noisy_image(257, 135, 100);

    for (len, seed) in [(0, 1_u64), (1, 2), (63, 3), (64, 4), (511, 5), (2048, 6)] {
        let message = random_bytes(len, seed);
        let mut img = cover.clone();

        let stats = hide_message(&mut img, &message, BitPlaneCaps::FULL, None).unwrap();
        assert_eq!(stats.message_size, len);
        assert_eq!(stats.message_bytes_hidden, len);
        assert!(stats.threshold <= 0.5);

        assert_eq!(unhide_message(&img).unwrap(), message);
    }
}

#[test]
fn round_trip_caps_combinations() {
    let cover = half_noisy_image(257, 135, 200);
    let message = random_bytes(400, 201);

    for (rmax, gmax, bmax, amax) in [
        (8, 8, 8, 8),
        (7, 6, 5, 4),
        (2, 2, 2, 2),
        (5, 1, 1, 1),
        (0, 0, 1, 1),
        (8, 0, 0, 0),
    ] {
        let caps = BitPlaneCaps::new(rmax, gmax, bmax, amax).unwrap();
        let mut img = cover.clone();

        let stats = hide_message(&mut img, &message, caps, None).unwrap();
        assert_eq!(stats.message_bytes_hidden, message.len());

        // The caps are recovered from the magic chunks alone.
        assert_eq!(unhide_message(&img).unwrap(), message);
    }
}

#[test]
fn round_trip_explicit_threshold() {
    let cover = half_noisy_image(257, 135, 300);
    let message = random_bytes(256, 301);

    let mut img = cover.clone();
    let stats = hide_message(&mut img, &message, BitPlaneCaps::FULL, Some(0.3)).unwrap();
    assert_eq!(stats.threshold, 0.3);
    assert_eq!(stats.message_bytes_hidden, message.len());
    assert_eq!(unhide_message(&img).unwrap(), message);
}

#[test]
fn stego_image_stays_within_declared_planes() {
    let cover = half_noisy_image(129, 129, 400);
    let message = random_bytes(128, 401);

    let caps = BitPlaneCaps::new(2, 2, 2, 2).unwrap();
    let mut img = cover.clone();
    hide_message(&mut img, &message, caps, None).unwrap();

    for (index, (stego, original)) in img.pixel_data.iter().zip(&cover.pixel_data).enumerate() {
        // Top 6 bits of every channel are off-limits.
        assert_eq!(stego >> 2, original >> 2, "byte {} modified above cap", index);
    }
}

#[test]
fn measure_agrees_with_hide_on_eligible_chunks() {
    let cover = half_noisy_image(103, 97, 500);

    let measured = measure_capacity(0.5, &cover, BitPlaneCaps::FULL).unwrap();
    assert!(measured.chunks_used > 0);
    assert!(measured.message_bytes_hidden > 0);

    // An oversized message drives hide through every chunk measure
    // found eligible at the same threshold, and extraction returns
    // exactly the stored prefix.
    let message = random_bytes(measured.chunks_used * 8, 501);
    let mut img = cover.clone();
    let stats = hide_message(&mut img, &message, BitPlaneCaps::FULL, Some(0.5)).unwrap();
    assert_eq!(stats.chunks_used, measured.chunks_used);
    assert!(stats.message_bytes_hidden < message.len());

    let extracted = unhide_message(&img).unwrap();
    assert_eq!(extracted, message[..stats.message_bytes_hidden]);
}
