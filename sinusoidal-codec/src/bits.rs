// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Packet bit-unpacking.
//!
//! A packet is 56 bits (7 bytes): 4 voicing bits, a 7-bit `Wo` index, a
//! 5-bit energy index, and 10 Gray-coded LSP codebook indices of varying
//! width. Every field is Gray-coded; decoding is uniform across widths since
//! [`decode_gray`] is the identity on a 1-bit field.
//!
//! ```text
//!              6        5        4        3        2        1        0
//! Even packet |VVVVWWWW|WWWEEEEE|LLLLLLLL|LLLLLLLL|LLLLLLLL|LLLLLLLL|LLLL____|
//!  Odd packet |____VVVV|WWWWWWWE|EEEELLLL|LLLLLLLL|LLLLLLLL|LLLLLLLL|LLLLLLLL|
//! ```

use crate::fixed::decode_gray;
use crate::model::{LPC_ORD, NUM_FRAMES};
use crate::tables::{LSP_BITS, LSP_MASKS};

/// A fully unpacked packet, before LSP codebook lookup or parameter
/// interpolation.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    /// Voicing for each of the 4 subframes, `voiced[0]` first in bitstream
    /// order.
    pub voiced: [bool; NUM_FRAMES],
    /// Index into [`crate::tables::WO_LUT`] / [`crate::tables::PITCH_LUT`] /
    /// [`crate::tables::L_LUT`].
    pub wo_index: u32,
    /// Index into [`crate::tables::ENERGY_LUT`].
    pub e_index: u32,
    /// Indices into the LSP codebook, one per stage.
    pub lsp_indexes: [u32; LPC_ORD],
}

impl Packet {
    /// Unpack a 7-byte packet. `is_odd` selects the nibble-shifted packet
    /// alignment shown in the odd-packet diagram above; every packet this
    /// crate has been exercised against uses the even alignment, but the
    /// parameter is kept live (not hardwired to `false`) since it is real,
    /// distinct decoder behaviour.
    pub fn unpack(input: &[u8; 7], is_odd: bool) -> Self {
        let mut bits: u64 = 0;
        for &byte in input.iter() {
            bits = (bits << 8) + byte as u64;
        }
        if is_odd {
            bits <<= 4;
        }

        let voiced = [
            decode_gray(((bits >> 55) & 1) as u32) != 0,
            decode_gray(((bits >> 54) & 1) as u32) != 0,
            decode_gray(((bits >> 53) & 1) as u32) != 0,
            decode_gray(((bits >> 52) & 1) as u32) != 0,
        ];

        let wo_index = decode_gray(((bits >> 45) & 0x7f) as u32);
        let e_index = decode_gray(((bits >> 40) & 0x1f) as u32);

        let mut lsp_indexes = [0u32; LPC_ORD];
        let mut lsp = bits >> 4;
        for i in (0..LPC_ORD).rev() {
            lsp_indexes[i] = decode_gray((lsp as u32) & LSP_MASKS[i]);
            lsp >>= LSP_BITS[i];
        }

        Self { voiced, wo_index, e_index, lsp_indexes }
    }
}
