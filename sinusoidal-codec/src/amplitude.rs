// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LP-to-amplitude mapping: forward FFT of the LPC coefficients, a spectral
//! post-filter, and binning the result onto the harmonic amplitude envelope
//! with adaptive smoothing against the previous frame.
//!
//! The reference smooths each harmonic's amplitude against `model->A[m]`
//! from the *same stack slot in a previous call* -- a local array that is
//! never initialized, so its value is whatever the previous invocation left
//! on the stack. That is well-defined in practice on the reference's target
//! (the same call sequence reuses the same stack frame every time) but is
//! undefined behaviour in the abstract machine and has no safe Rust
//! equivalent. This implementation makes the dependency explicit: the
//! smoothing amplitude is a field the caller threads through
//! (`crate::Decoder`'s `amplitudes` buffer), persisted across subframes and
//! packets exactly as the reference's stack reuse approximates.

use crate::fft::{RealFft, FFT_SIZE};
use crate::fixed::{Q31, ONE_HALF_IN_Q9, ONE_IN_Q12, TAU_Q11};
use crate::model::{Model, LPC_ORD, N_SPF};

/// `Wo` threshold below which the fundamental harmonic's amplitude is
/// attenuated (see [`apply_lpc_correction`]), Q28 (`pi * 150 / 4000`).
const PITCH_53_IN_Q28: Q31 = 31_624_307;

/// Saturating `(a * b) >> shift` with a 64-bit right-hand operand, saturated
/// to Q31 same as [`crate::fixed::mul_shift`] -- for the `energy *
/// bin_power` product where `bin_power` is a windowed sum of
/// inverse-magnitude terms and can exceed the 32-bit range.
fn mul_shift_wide(a: Q31, b: u64, shift: u32) -> Q31 {
    let wide = (a as i64).saturating_mul(b as i64) >> shift;
    crate::fixed::sat31(wide)
}

/// Spectral post-filter: turn the raw LPC spectrum into an inverse-magnitude
/// envelope with a noise floor subtracted out.
fn lpc_post_filter(raw_spectrum: &[i32; 2 * FFT_SIZE]) -> [u64; FFT_SIZE / 2 + 1] {
    let mut pw = [0u64; FFT_SIZE / 2 + 1];

    for i in 0..FFT_SIZE / 2 {
        let re = raw_spectrum[2 * i] as i64;
        let im = raw_spectrum[2 * i + 1] as i64;
        let re2 = (re * re) as u64;
        let im2 = (im * im) as u64;

        let mag_inv = (((re2 + im2) >> 9).min(i32::MAX as u64)).max(1);

        let mut value = u32::MAX as u64 / mag_inv;
        if value < ONE_IN_Q12 as u64 {
            value = 0;
        }
        else {
            value -= ONE_IN_Q12 as u64;
        }

        pw[i] = value;
    }

    pw
}

/// Forward-transform `lpc` (padded to [`FFT_SIZE`]), post-filter it, and bin
/// the result onto the harmonic amplitudes named by `model`. `raw_spectrum`
/// receives the forward FFT output for [`crate::phase::phase_synth`] to
/// reuse as its excitation filter. `amplitudes` is the decoder's persistent
/// per-harmonic amplitude buffer (see the module doc): entries for `m >
/// model.l` are left untouched, carrying forward to the next call exactly
/// as the reference's stack-reuse quirk does.
pub fn lpc_to_amplitudes<F: RealFft>(
    fft: &F,
    lpc: &[Q31; LPC_ORD + 1],
    model: &Model,
    energy: Q31,
    raw_spectrum: &mut [i32; 2 * FFT_SIZE],
    amplitudes: &mut [Q31; N_SPF + 1],
) {
    let mut padded = [0i32; FFT_SIZE];
    padded[..=LPC_ORD].copy_from_slice(lpc);

    fft.forward(&padded, raw_spectrum);

    let pw = lpc_post_filter(raw_spectrum);

    let start = model.wo / TAU_Q11;
    let step = 2 * start;

    let mut i = start;
    for m in 1..=model.l {
        let am = ((i + ONE_HALF_IN_Q9) >> 9) as usize;
        let mut bm = ((i + step + ONE_HALF_IN_Q9) >> 9) as usize;
        if bm > FFT_SIZE / 2 {
            bm = FFT_SIZE / 2;
        }

        let bin_power: u64 = if am < bm { pw[am..bm].iter().sum() } else { 0 };

        let mut am_value = mul_shift_wide(energy, bin_power, 16);

        if am_value > amplitudes[m] {
            am_value = (am_value >> 1) + (am_value >> 2);
        }
        if am_value < amplitudes[m] {
            am_value += am_value >> 1;
        }

        amplitudes[m] = am_value;

        i += step;
    }
}

/// Attenuate the fundamental for low-pitched (likely male) voices, where the
/// binned amplitude tends to overshoot.
pub fn apply_lpc_correction(model: &Model, amplitudes: &mut [Q31; N_SPF + 1]) {
    if model.wo < PITCH_53_IN_Q28 {
        amplitudes[1] >>= 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::Radix2Fft;

    #[test]
    fn mul_shift_wide_saturates_instead_of_wrapping() {
        // energy at its max LUT value times a large bin_power overflows Q31
        // well before the shift; the result must clamp, not wrap.
        let am_value = mul_shift_wide(94_244, 1_000_000_000_000, 16);
        assert_eq!(am_value, i32::MAX);
    }

    #[test]
    fn lpc_to_amplitudes_fills_only_harmonics_up_to_l() {
        let fft = Radix2Fft::new().unwrap();
        let mut lpc = [0 as Q31; LPC_ORD + 1];
        lpc[0] = crate::fixed::ONE_IN_Q23;

        let model = Model { wo: 20_000_000, pitch: 2000, energy: 5000, l: 5, voiced: true };
        let mut raw_spectrum = [0i32; 2 * FFT_SIZE];
        let mut amplitudes = [0 as Q31; N_SPF + 1];
        amplitudes[6] = 12345;

        lpc_to_amplitudes(&fft, &lpc, &model, model.energy, &mut raw_spectrum, &mut amplitudes);

        // Harmonic 6 is beyond L=5 and must be untouched (persistence quirk).
        assert_eq!(amplitudes[6], 12345);
    }

    #[test]
    fn apply_lpc_correction_attenuates_low_pitch() {
        let model = Model { wo: 1_000_000, pitch: 2000, energy: 5000, l: 5, voiced: true };
        let mut amplitudes = [0 as Q31; N_SPF + 1];
        amplitudes[1] = 1024;
        apply_lpc_correction(&model, &mut amplitudes);
        assert_eq!(amplitudes[1], 1024 >> 5);
    }

    #[test]
    fn apply_lpc_correction_leaves_high_pitch_alone() {
        let model = Model { wo: 100_000_000, pitch: 500, energy: 5000, l: 5, voiced: true };
        let mut amplitudes = [0 as Q31; N_SPF + 1];
        amplitudes[1] = 1024;
        apply_lpc_correction(&model, &mut amplitudes);
        assert_eq!(amplitudes[1], 1024);
    }
}
