/*
 * bpcs - lib.rs
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

mod bitmap;
mod bits;
mod bpcs;
mod chunk;
mod chunkify;
mod io;
mod message;
mod planes;

pub use bitmap::Image;
pub use bpcs::{hide_message, measure_capacity, unhide_message, HideStats};
pub use io::{load_image, save_image, supported_output};
pub use planes::BitPlaneCaps;

/// Standard Result for bpcs
pub type Result<T> = std::result::Result<T, Error>;

/// Standard Error for bpcs
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Malformed or out-of-range argument
    InvalidArgument(String),
    /// IO Error
    IoError(String),
    /// Signature bytes mismatch: the image likely carries no message
    InvalidSignature,
    /// No pair of magic chunks found in the chunk stream
    MagicNotFound,
    /// Image is too small to hold any chunks
    InvalidImage,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::InvalidArgument(ref err) => write!(f, "{}", err),
            Self::IoError(ref err) => write!(f, "IO Error: {}", err),
            Self::InvalidSignature => write!(f, "invalid signature"),
            Self::MagicNotFound => write!(f, "magic chunks not found, can't determine bitplane usage"),
            Self::InvalidImage => write!(f, "image is too small to hold any chunks"),
        }
    }
}

impl std::error::Error for Error {}
