/*
 * bpcs - io.rs
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

//! Image file loading and saving.
//!
//! Everything loadable is upscaled to 32-bit RGBA: images without an
//! alpha channel get a fully opaque one, grayscale values are
//! duplicated across red, green and blue, paletted images are
//! depalettized. Saving only allows lossless formats, a lossy format
//! such as jpg would destroy the hidden message.

use crate::bitmap::Image;
use crate::{Error, Result};

/// Output formats that keep every pixel bit intact.
const OUTPUT_EXTENSIONS: [&str; 3] = ["bmp", "png", "tga"];

fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Whether the filename carries an extension [`save_image`] accepts.
pub fn supported_output(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| OUTPUT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decode an image file into a 32-bit RGBA buffer.
pub fn load_image(filename: &str) -> Result<Image> {
    let decoded = image::open(filename)
        .map_err(|err| Error::IoError(format!("unable to load \"{}\": {}", filename, err)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Image::new(width, height, rgba.into_raw()))
}

/// Encode a 32-bit RGBA buffer to a lossless raster file.
pub fn save_image(filename: &str, img: &Image) -> Result<()> {
    if !supported_output(filename) {
        return Err(Error::InvalidArgument(
            "output file extension must be one of bmp, png or tga".into(),
        ));
    }
    image::save_buffer(
        filename,
        &img.pixel_data,
        img.width,
        img.height,
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|err| Error::IoError(format!("failure writing \"{}\": {}", filename, err)))
}
