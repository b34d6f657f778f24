// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - planes.rs
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

//! Bitplane selection.
//!
//! Bit index `8*c + b` identifies bit `b` (0 = MSB, 7 = LSB) of
//! channel `c` (0 = R, 1 = G, 2 = B, 3 = A). A cap of `k` for a
//! channel puts its `k` LSBs in play; the `8 - k` MSBs are never
//! modified.

use crate::{Error, Result};

/// Per-channel bitplane caps, each in [0, 8].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BitPlaneCaps {
    rmax: u8,
    gmax: u8,
    bmax: u8,
    amax: u8,
}

impl BitPlaneCaps {
    /// All 32 bitplanes in play.
    pub const FULL: BitPlaneCaps = BitPlaneCaps {
        rmax: 8,
        gmax: 8,
        bmax: 8,
        amax: 8,
    };

    pub fn new(rmax: u8, gmax: u8, bmax: u8, amax: u8) -> Result<BitPlaneCaps> {
        if rmax > 8 || gmax > 8 || bmax > 8 || amax > 8 {
            return Err(Error::InvalidArgument(
                "bitplane caps should be in range [0, 8]".into(),
            ));
        }
        if rmax == 0 && gmax == 0 && bmax == 0 && amax == 0 {
            return Err(Error::InvalidArgument(
                "no bitplanes available (all caps are 0)".into(),
            ));
        }
        Ok(BitPlaneCaps {
            rmax,
            gmax,
            bmax,
            amax,
        })
    }

    /// The ordered list of bitplane indices in play.
    ///
    /// LSB first, one plane at a time, rotating R, G, B, A, and
    /// climbing toward the MSBs while the channel's cap allows. With
    /// full caps this yields the canonical order
    /// `7, 15, 23, 31, 6, 14, 22, 30, ... 0, 8, 16, 24`. For any caps
    /// the result is the canonical order filtered to the planes in
    /// play, which is what lets the extractor locate the magic chunks
    /// from a full-caps chunkification.
    pub(crate) fn priority(&self) -> Vec<usize> {
        let caps = [self.rmax, self.gmax, self.bmax, self.amax];
        let mut priority = Vec::with_capacity(32);
        for bit in 0..8_u8 {
            for (channel, &cap) in caps.iter().enumerate() {
                if bit < cap {
                    priority.push(channel * 8 + (7 - bit) as usize);
                }
            }
        }
        priority
    }

    /// Pack into the two caps bytes stored in the magic chunks.
    pub(crate) fn pack(&self) -> (u8, u8) {
        ((self.rmax << 4) | self.gmax, (self.bmax << 4) | self.amax)
    }

    /// Rebuild from the two caps bytes recovered from the magic
    /// chunks. Out-of-range nibbles are rejected.
    pub(crate) fn unpack(hi: u8, lo: u8) -> Result<BitPlaneCaps> {
        BitPlaneCaps::new(hi >> 4, hi & 0x0F, lo >> 4, lo & 0x0F)
    }
}

impl Default for BitPlaneCaps {
    fn default() -> BitPlaneCaps {
        BitPlaneCaps::FULL
    }
}

#[cfg(test)]
mod test {
    use super::BitPlaneCaps;

    #[test]
    fn test_canonical_priority() {
        let priority = BitPlaneCaps::FULL.priority();
        assert_eq!(
            priority,
            [
                7, 15, 23, 31, 6, 14, 22, 30, 5, 13, 21, 29, 4, 12, 20, 28, 3, 11, 19, 27, 2, 10,
                18, 26, 1, 9, 17, 25, 0, 8, 16, 24
            ]
        );
    }

    #[test]
    fn test_capped_priority() {
        let caps = BitPlaneCaps::new(7, 6, 5, 4).unwrap();
        let priority = caps.priority();
        assert_eq!(
            priority,
            [7, 15, 23, 31, 6, 14, 22, 30, 5, 13, 21, 29, 4, 12, 20, 28, 3, 11, 19, 2, 10, 1]
        );

        // A capped priority is the canonical order filtered.
        let canonical = BitPlaneCaps::FULL.priority();
        let filtered: Vec<usize> = canonical
            .into_iter()
            .filter(|p| priority.contains(p))
            .collect();
        assert_eq!(priority, filtered);

        let red_only = BitPlaneCaps::new(2, 0, 0, 0).unwrap();
        assert_eq!(red_only.priority(), [7, 6]);
    }

    #[test]
    fn test_validation() {
        assert!(BitPlaneCaps::new(9, 0, 0, 0).is_err());
        assert!(BitPlaneCaps::new(0, 0, 0, 0).is_err());
        assert!(BitPlaneCaps::new(0, 0, 0, 1).is_ok());
    }

    #[test]
    fn test_pack_unpack() {
        let caps = BitPlaneCaps::new(7, 6, 5, 4).unwrap();
        let (hi, lo) = caps.pack();
        assert_eq!(hi, 0x76);
        assert_eq!(lo, 0x54);
        assert_eq!(BitPlaneCaps::unpack(hi, lo).unwrap(), caps);

        // Nibbles above 8 can't be caps.
        assert!(BitPlaneCaps::unpack(0xA8, 0x88).is_err());
    }
}
