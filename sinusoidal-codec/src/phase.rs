// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Phase synthesis: builds the complex per-harmonic excitation -- a
//! pseudorandom spectrum for unvoiced frames, a CORDIC-seeded Chebyshev
//! recursion for voiced frames -- and filters it through the LPC spectral
//! envelope (the raw forward-FFT output `crate::amplitude::lpc_to_amplitudes`
//! produced as a side effect) into the per-harmonic complex amplitudes
//! `crate::synth::freq_domain_calc` places into the synthesis spectrum.
//!
//! The reference builds the filter (`H`) and excitation (`Ex`) as flat arrays
//! and multiplies them pairwise through a generic `complex_multiply(a, b,
//! dst, len)` helper called with `len = model->L`. Read literally that helper
//! walks `a[0], a[1]` (harmonic-0 slots `H` never writes) through `a[2L-2],
//! a[2L-1]` (one pair short of harmonic `L`, whose slot `H` *does* write) --
//! an off-by-one that the reference papers over by relying on `H` and `Ex`
//! being stack-allocated and implicitly carrying the previous call's values
//! in the slots it doesn't touch. That is well-defined on the reference's
//! bare-metal target (the same call sequence reuses the same stack bytes
//! every time) but has no safe-Rust equivalent and isn't a behaviour worth
//! reproducing. This implementation indexes `H`, `Ex`, and the returned
//! buffer directly by harmonic number instead of through a shifted generic
//! helper, so harmonic `m` always multiplies harmonic `m`'s filter by
//! harmonic `m`'s excitation.

use crate::fft::FFT_SIZE;
use crate::fixed::{add31, cordic, mul_shift, sub31, Q31, ONE_IN_Q27, PI_Q24, TAU_Q24};
use crate::model::{Model, N_SPF};

/// Width of the per-harmonic complex buffers (`H`, `Ex`, and the returned
/// `Af`): one `(re, im)` pair per harmonic `0..=MAX_L`, pair 0 unused.
pub const AF_LEN: usize = 2 * (N_SPF + 1);

/// PRNG seed the reference hardwires as the unvoiced excitation's initial
/// LFSR state.
pub const LFSR_SEED: u32 = 0xDEAD_BEEF;

/// Advance the taps-{0,1,2,4,6,31} linear-feedback shift register used as
/// the unvoiced excitation's broadband noise source.
fn next_random(lfsr: &mut u32) -> u32 {
    let bit = (*lfsr ^ (*lfsr >> 1) ^ (*lfsr >> 2) ^ (*lfsr >> 4) ^ (*lfsr >> 6) ^ (*lfsr >> 31)) & 1;
    *lfsr = (*lfsr >> 1) | (bit << 31);
    *lfsr
}

/// Advance the persistent phase accumulator by `80 * Wo` and fold the result
/// back into `[-pi, pi)`.
///
/// `Wo` is Q28 and the accumulator is Q24, but `Wo * 5` and `Wo * 80`
/// coincide bit-for-bit (`2^28 * 5 == 2^24 * 80`), so no explicit rescale is
/// needed -- only the raw integer multiply by 5, matching one subframe's
/// worth (`N_SPF` = 80 samples) of phase advance at `Wo` radians/sample.
pub fn advance_phase(prev_phase: Q31, wo: Q31) -> Q31 {
    let mut phase = prev_phase as i64 + wo as i64 * 5;
    while phase >= PI_Q24 as i64 {
        phase -= TAU_Q24 as i64;
    }
    phase as Q31
}

/// Build this subframe's per-harmonic complex amplitudes.
///
/// `raw_spectrum` is the forward FFT of the LPC coefficients, as produced by
/// [`crate::amplitude::lpc_to_amplitudes`]. `prev_phase` and `lfsr` are
/// decoder-persistent state, advanced/consumed in place.
pub fn phase_synth(
    model: &Model,
    raw_spectrum: &[i32; 2 * FFT_SIZE],
    prev_phase: &mut Q31,
    lfsr: &mut u32,
) -> [Q31; AF_LEN] {
    let mut h = [0 as Q31; AF_LEN];
    let mut ex = [0 as Q31; AF_LEN];

    // Shift to Q18, divide by Q9-scale pitch -> back to Q9.
    let step = ((FFT_SIZE as i64) << 18) / model.pitch as i64;
    let mut i = (FFT_SIZE / 2) as i64;

    for m in 1..=model.l {
        let b = ((i >> 9) as usize).min(FFT_SIZE - 1);
        h[2 * m] = raw_spectrum[2 * b] << 2;
        h[2 * m + 1] = -(raw_spectrum[2 * b + 1] << 2);
        i += step;
    }

    *prev_phase = advance_phase(*prev_phase, model.wo);

    if !model.voiced {
        for slot in ex.iter_mut().take(2 * model.l + 2) {
            *slot = next_random(lfsr) as Q31;
        }
    }
    else {
        // Q24 -> Q27, matching the CORDIC rotator's native angle scale.
        let phase = (*prev_phase as i64) << 3;

        ex[0] = ONE_IN_Q27; // cos(0)
        ex[1] = 0; // sin(0)

        let (cos, sin) = cordic(phase as i32);
        ex[2] = cos;
        ex[3] = sin;

        let two_cos = 2i64 * ex[2] as i64;
        for n in 2..=model.l {
            // sin(n*theta) = 2*sin((n-1)*theta)*cos(theta) - sin((n-2)*theta)
            ex[2 * n + 1] =
                (((ex[2 * n - 1] as i64 * two_cos) >> 27) - ex[2 * n - 3] as i64) as Q31;
            // cos(n*theta) = 2*cos((n-1)*theta)*cos(theta) - cos((n-2)*theta)
            ex[2 * n] = (((ex[2 * n - 2] as i64 * two_cos) >> 27) - ex[2 * n - 4] as i64) as Q31;
        }
    }

    let mut af = [0 as Q31; AF_LEN];
    for m in 1..=model.l {
        let (hr, hi) = (h[2 * m], h[2 * m + 1]);
        let (er, ei) = (ex[2 * m], ex[2 * m + 1]);
        af[2 * m] = sub31(mul_shift(hr, er, 31), mul_shift(hi, ei, 31));
        af[2 * m + 1] = add31(mul_shift(hr, ei, 31), mul_shift(hi, er, 31));
    }

    af
}
