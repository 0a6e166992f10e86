// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-domain synthesis: placing harmonics into a Hermitian-symmetric
//! spectrum, the inverse transform, overlap-add with the synthesis window,
//! and the output limiter.

use crate::fft::{RealFft, FFT_SIZE};
use crate::fixed::{abs31, add31, mul_shift, sat15, Q31};
use crate::model::{Model, N_SPF};
use crate::phase::AF_LEN;
use crate::tables::SYNTHESIS_WINDOW;

/// Output sample magnitude above which [`ear_protection`] rescales the
/// subframe.
const LIMIT_THRESH: i64 = 30_000;

/// Refined alpha-max-plus-beta-min magnitude estimate (no square root),
/// doubled scale matching the reference's own `<< 1` at the call site.
/// Maximum error versus the true magnitude is about 1.22%.
fn estimate_magnitude(re: Q31, im: Q31) -> i64 {
    let re = abs31(re) as i64;
    let im = abs31(im) as i64;
    let larger = re.max(im);
    let smaller = re.min(im);
    let z0 = larger + ((5 * smaller) >> 5);
    let z1 = ((27 * larger) >> 5) + ((71 * smaller) >> 7);
    z0.max(z1)
}

/// Place each harmonic's amplitude/phase pair into its FFT bin and the
/// Hermitian mirror bin, yielding a full `FFT_SIZE`-bin real spectrum.
pub fn freq_domain_calc(
    model: &Model,
    amplitudes: &[Q31; N_SPF + 1],
    af: &[Q31; AF_LEN],
    spectrum: &mut [i32; 2 * FFT_SIZE],
) {
    let step = ((FFT_SIZE as i64) << 18) / model.pitch as i64;
    let mut i = 256i64 + step; // ONE_HALF_IN_Q9 (== FFT_SIZE/2) + step

    for j in 1..=model.l {
        let mut k = (i >> 9) as usize;
        if k >= FFT_SIZE / 2 {
            k = FFT_SIZE / 2 - 1;
        }

        let magnitude = (estimate_magnitude(af[2 * j], af[2 * j + 1]) << 1).max(1);
        let real = (amplitudes[j] as i64 * af[2 * j] as i64) / magnitude;
        let imag = (amplitudes[j] as i64 * af[2 * j + 1] as i64) / magnitude;

        spectrum[2 * k] = real as i32;
        spectrum[2 * k + 1] = imag as i32;
        spectrum[2 * FFT_SIZE - 2 * k] = real as i32;
        spectrum[2 * FFT_SIZE - 2 * k + 1] = -imag as i32;

        i += step;
    }
}

/// Shift the overlap half of `sn` down, run the inverse transform, and
/// window/overlap-add the result into both halves of `sn`. Returns the peak
/// absolute sample value over the *shifted/overlap* half only (the half
/// this call finishes, as opposed to the half it leaves in preview for the
/// next call) -- matching the reference, which likewise never folds the
/// freshly-windowed preview half into its returned maximum.
pub fn synthesise<F: RealFft>(
    fft: &F,
    sn: &mut [Q31; 2 * N_SPF],
    model: &Model,
    amplitudes: &[Q31; N_SPF + 1],
    af: &[Q31; AF_LEN],
) -> Q31 {
    for i in 0..N_SPF - 1 {
        sn[i] = sn[N_SPF + i];
    }
    sn[N_SPF - 1] = 0;

    let mut spectrum = [0i32; 2 * FFT_SIZE];
    freq_domain_calc(model, amplitudes, af, &mut spectrum);

    let mut time = [0i32; FFT_SIZE];
    fft.inverse(&spectrum, &mut time);

    let mut max_amplitude: Q31 = 0;
    for i in 0..N_SPF - 1 {
        let windowed = mul_shift(time[FFT_SIZE - N_SPF + 1 + i], SYNTHESIS_WINDOW[i], 32);
        sn[i] = add31(sn[i], windowed);
        max_amplitude = max_amplitude.max(abs31(sn[i]));
    }

    for (j, i) in (N_SPF - 1..2 * N_SPF).enumerate() {
        sn[i] = mul_shift(time[j], SYNTHESIS_WINDOW[i], 32);
    }

    max_amplitude
}

/// Rescale the finished half of `sn` so no sample exceeds [`LIMIT_THRESH`] in
/// magnitude, if `max_amplitude` (as returned by [`synthesise`]) exceeds it.
pub fn ear_protection(sn: &mut [Q31; 2 * N_SPF], max_amplitude: Q31) {
    let max_amplitude = max_amplitude as i64;
    if max_amplitude > LIMIT_THRESH {
        let scaling = (LIMIT_THRESH * LIMIT_THRESH) / max_amplitude;
        let scaling = (scaling << 15) / max_amplitude;

        for sample in sn.iter_mut().take(N_SPF) {
            *sample = ((*sample as i64 * scaling) >> 15) as Q31;
        }
    }
}

/// Convert the finished half of `sn` to 16-bit PCM, applying a 1-tap
/// low-pass smoother (`sn[k] + sn[k+1] >> 5`). `sn[N_SPF]`, read when `k ==
/// N_SPF - 1`, is the first sample of the next subframe's overlap preview --
/// an intentional one-sample look-ahead, not a bug.
pub fn to_pcm(sn: &[Q31; 2 * N_SPF], out: &mut [i16; N_SPF]) {
    for k in 0..N_SPF {
        out[k] = sat15(sn[k] as i64 + (sn[k + 1] as i64 >> 5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::Radix2Fft;

    #[test]
    fn freq_domain_calc_is_hermitian_symmetric() {
        let model = Model { wo: 20_000_000, pitch: 2000, energy: 5000, l: 5, voiced: true };
        let amplitudes = [1000 as Q31; N_SPF + 1];
        let mut af = [0 as Q31; AF_LEN];
        for m in 1..=model.l {
            af[2 * m] = 500_000;
            af[2 * m + 1] = 250_000;
        }
        let mut spectrum = [0i32; 2 * FFT_SIZE];
        freq_domain_calc(&model, &amplitudes, &af, &mut spectrum);

        for k in 1..FFT_SIZE / 2 {
            let mirror = FFT_SIZE - k;
            if spectrum[2 * k] != 0 || spectrum[2 * k + 1] != 0 {
                assert_eq!(spectrum[2 * mirror], spectrum[2 * k]);
                assert_eq!(spectrum[2 * mirror + 1], -spectrum[2 * k + 1]);
            }
        }
    }

    #[test]
    fn ear_protection_is_a_no_op_below_threshold() {
        let mut sn = [100 as Q31; 2 * N_SPF];
        let before = sn;
        ear_protection(&mut sn, 500);
        assert_eq!(sn, before);
    }

    #[test]
    fn ear_protection_clamps_above_threshold() {
        let mut sn = [40_000 as Q31; 2 * N_SPF];
        ear_protection(&mut sn, 40_000);
        for &s in sn.iter().take(N_SPF) {
            assert!(s.abs() <= 40_000);
        }
    }

    #[test]
    fn to_pcm_never_exceeds_16_bit_range() {
        let mut sn = [0 as Q31; 2 * N_SPF];
        for (i, v) in sn.iter_mut().enumerate() {
            *v = if i % 2 == 0 { i32::MAX } else { i32::MIN };
        }
        let mut out = [0i16; N_SPF];
        to_pcm(&sn, &mut out);
        for &s in out.iter() {
            assert!(s as i32 <= i16::MAX as i32 && s as i32 >= i16::MIN as i32);
        }
    }

    #[test]
    fn synthesise_with_silent_model_keeps_output_bounded() {
        let fft = Radix2Fft::new().unwrap();
        let model = Model { wo: 20_000_000, pitch: 2000, energy: 0, l: 5, voiced: true };
        let amplitudes = [0 as Q31; N_SPF + 1];
        let af = [0 as Q31; AF_LEN];
        let mut sn = [0 as Q31; 2 * N_SPF];
        let max_amp = synthesise(&fft, &mut sn, &model, &amplitudes, &af);
        assert_eq!(max_amp, 0);
    }
}
