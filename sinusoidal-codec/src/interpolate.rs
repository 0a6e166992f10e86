// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-subframe parameter interpolation.
//!
//! A packet only carries fully-quantized parameters for its last subframe
//! (subframe 3); subframes 0-2 are reconstructed by interpolating between
//! the previous packet's final subframe and this packet's subframe 3.

use crate::fixed::{Q31, PI_Q28, TAU_Q28};
use crate::model::{Model, LPC_ORD};

/// Interpolate `Wo` (and derive `pitch`/`L` from it) for subframe `index`
/// (0, 1, or 2) between `prev` and `current`. Voicing for the interpolated
/// frame is the AND of `prev` and `current`'s voicing, so a single unvoiced
/// neighbour unvoices the whole span between them.
pub fn interpolate_wo(frame: &mut Model, prev: &Model, current: &Model, index: i32) {
    frame.voiced &= prev.voiced || current.voiced;

    if !frame.voiced {
        *frame = Model::unvoiced_fallback();
        return;
    }

    match (prev.voiced, current.voiced) {
        (false, true) => *frame = current.clone(),
        (true, false) => *frame = prev.clone(),
        (true, true) => {
            let weighted = (3 - index) as i64 * prev.wo as i64 + (index + 1) as i64 * current.wo as i64;
            frame.wo = (weighted >> 2) as Q31;
            frame.pitch = (TAU_Q28 as i64 / (frame.wo as i64 >> 9)) as Q31;
            frame.l = (PI_Q28 as i64 / frame.wo as i64) as usize;
        }
        (false, false) => unreachable!("handled above by the voiced check"),
    }
}

/// Interpolate frame energy. Skips the weighted blend entirely when both
/// neighbours agree (the reference's comment calls this out as an
/// optimization, even though the blend of two equal values is itself a
/// no-op; kept for direct correspondence).
pub fn interpolate_energy(prev: &Model, current: &Model, index: i32) -> Q31 {
    if prev.energy == current.energy {
        current.energy
    }
    else {
        let a = (3 - index) as i64 * (prev.energy as i64 >> 2);
        let b = (index + 1) as i64 * current.energy as i64 >> 2;
        (a + b) as Q31
    }
}

/// Interpolate the 10 LSPs linearly between `prev` and `current`. Weights
/// are `(3-n)/4` and `(n+1)/4` for `n` in `0..3`, applied as shifts.
pub fn interpolate_lsp(prev: &[Q31; LPC_ORD], current: &[Q31; LPC_ORD], n: i32) -> [Q31; LPC_ORD] {
    let mut out = [0 as Q31; LPC_ORD];

    for i in 0..LPC_ORD {
        let a = (3 - n) as i64 * (prev[i] as i64 >> 2);
        let b = (n + 1) as i64 * (current[i] as i64 >> 2);
        out[i] = (a + b) as Q31;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voiced_model(wo: Q31) -> Model {
        Model { wo, pitch: 1000, energy: 5000, l: 20, voiced: true }
    }

    #[test]
    fn interpolate_wo_averages_two_voiced_neighbours() {
        let prev = voiced_model(10_000_000);
        let current = voiced_model(20_000_000);
        let mut frame = current.clone();
        frame.voiced = true;

        interpolate_wo(&mut frame, &prev, &current, 1);
        assert!(frame.wo > prev.wo && frame.wo < current.wo);
    }

    #[test]
    fn interpolate_wo_falls_back_when_both_neighbours_unvoiced() {
        let prev = Model::unvoiced_fallback();
        let current = Model::unvoiced_fallback();
        let mut frame = current.clone();
        frame.voiced = true;

        interpolate_wo(&mut frame, &prev, &current, 0);
        assert!(!frame.voiced);
    }

    #[test]
    fn interpolate_energy_passes_through_equal_neighbours() {
        let prev = voiced_model(1);
        let mut current = voiced_model(1);
        current.energy = prev.energy;
        assert_eq!(interpolate_energy(&prev, &current, 0), prev.energy);
    }

    #[test]
    fn interpolate_lsp_at_the_endpoints_is_closest_to_that_neighbour() {
        let prev = [0 as Q31; LPC_ORD];
        let mut current = [0 as Q31; LPC_ORD];
        current[0] = 4000;

        let near_prev = interpolate_lsp(&prev, &current, 0);
        let near_current = interpolate_lsp(&prev, &current, 2);
        assert!(near_prev[0] < near_current[0]);
    }
}
