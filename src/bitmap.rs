/*
 * bpcs - bitmap.rs
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

/// A 32-bit RGBA pixel buffer in row-major order, 4 bytes per pixel.
///
/// Neither dimension is required to be a multiple of 8. The coder never
/// touches the pixels in the partial right/bottom strip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixel_data: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixel_data: Vec<u8>) -> Image {
        debug_assert_eq!(pixel_data.len(), width as usize * height as usize * 4);
        Image {
            width,
            height,
            pixel_data,
        }
    }

    /// Number of whole 8x8 tiles across.
    pub(crate) fn chunks_in_width(&self) -> usize {
        (self.width / 8) as usize
    }

    /// Number of whole 8x8 tiles down.
    pub(crate) fn chunks_in_height(&self) -> usize {
        (self.height / 8) as usize
    }

    pub(crate) fn chunks_per_bitplane(&self) -> usize {
        self.chunks_in_width() * self.chunks_in_height()
    }
}
