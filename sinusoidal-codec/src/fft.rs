// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A real-input FFT abstraction and one concrete implementation.
//!
//! The reference decoder this crate is ported from calls out to a
//! vendor-supplied fixed-point FFT (CMSIS's `arm_rfft_q31`); bit-exactness
//! with that vendor routine is out of scope here. [`RealFft`] is the trait
//! boundary a caller plugs an FFT backend into — length `FFT_SIZE`, real
//! input, interleaved-complex output, bit-reversal handled internally so
//! every caller sees natural-order bins. [`Radix2Fft`] is a self-contained
//! implementation of it, structured the same way as this workspace's
//! `symphonia_core::dsp::fft` (bit-reversal permutation table computed once
//! at construction, recursive radix-2 butterfly, `f32` internally).
//!
//! The rest of the decode pipeline never touches [`Complex32`] directly;
//! every spectrum in this crate outside this module is a flat `i32` array in
//! `[re0, im0, re1, im1, ...]` order, matching how the reference treats
//! these as plain arrays rather than a complex-number type.

use crate::error::CodecError;

/// FFT length used throughout the decoder. Fixed at compile time, matching
/// the reference's `FFT_SIZE`.
pub const FFT_SIZE: usize = 512;

/// A real-input/real-output FFT backend, fixed to [`FFT_SIZE`].
///
/// `forward` takes `FFT_SIZE` real samples and produces `FFT_SIZE` complex
/// bins (`2 * FFT_SIZE` interleaved `i32` values), scaled by `1/FFT_SIZE` so
/// the LP-envelope magnitudes computed from it stay in a well-behaved range
/// (see the amplitude-mapper module). `inverse` takes the same interleaved
/// layout and produces `FFT_SIZE` real samples with no additional
/// normalization: the spectrum it's given already holds amplitude-scaled
/// harmonic phasors, and the inverse transform is used as a direct harmonic
/// sum, not a round-trip through a normalized analysis transform.
pub trait RealFft {
    fn forward(&self, input: &[i32; FFT_SIZE], output: &mut [i32; 2 * FFT_SIZE]);
    fn inverse(&self, input: &[i32; 2 * FFT_SIZE], output: &mut [i32; FFT_SIZE]);
}

#[derive(Copy, Clone, Default)]
struct Complex32 {
    re: f32,
    im: f32,
}

impl core::ops::Add for Complex32 {
    type Output = Complex32;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self::Output { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}

impl core::ops::Sub for Complex32 {
    type Output = Complex32;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}

impl core::ops::Mul for Complex32 {
    type Output = Complex32;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Output {
            re: (self.re * rhs.re) - (self.im * rhs.im),
            im: (self.re * rhs.im) + (self.im * rhs.re),
        }
    }
}

/// Saturating round-to-nearest `f32 -> i32`, used at every FFT output edge.
#[inline]
fn round_to_i32(v: f32) -> i32 {
    if v >= i32::MAX as f32 {
        i32::MAX
    }
    else if v <= i32::MIN as f32 {
        i32::MIN
    }
    else {
        v.round() as i32
    }
}

/// Radix-2 Cooley-Tukey real FFT.
pub struct Radix2Fft {
    perm: Box<[u32]>,
}

impl Radix2Fft {
    pub fn new() -> Result<Self, CodecError> {
        if !FFT_SIZE.is_power_of_two() {
            return Err(CodecError::UnsupportedFftLength(FFT_SIZE));
        }

        let bits = FFT_SIZE.trailing_zeros();
        let perm = (0..FFT_SIZE as u32).map(|i| i.reverse_bits() >> (32 - bits)).collect();

        Ok(Self { perm })
    }

    /// In-place decimation-in-time radix-2 butterfly. `x` must already be in
    /// bit-reversed order; this computes the *forward* transform (twiddle
    /// angle `-2*pi*k/n`) regardless of whether the caller wants a forward
    /// or inverse result -- the inverse is obtained by swapping real and
    /// imaginary parts before and after, same as this workspace's complex
    /// FFT does for its `ifft`.
    fn transform(x: &mut [Complex32]) {
        let n = x.len();

        if n <= 1 {
            return;
        }

        let half = n >> 1;
        let (even, odd) = x.split_at_mut(half);

        Self::transform(even);
        Self::transform(odd);

        for k in 0..half {
            let theta = -std::f32::consts::PI * k as f32 / half as f32;
            let twiddle = Complex32 { re: theta.cos(), im: theta.sin() };
            let p = even[k];
            let q = odd[k] * twiddle;

            even[k] = p + q;
            odd[k] = p - q;
        }
    }
}

impl RealFft for Radix2Fft {
    fn forward(&self, input: &[i32; FFT_SIZE], output: &mut [i32; 2 * FFT_SIZE]) {
        let mut buf = [Complex32::default(); FFT_SIZE];

        for (bin, &i) in self.perm.iter().enumerate() {
            buf[bin] = Complex32 { re: input[i as usize] as f32, im: 0.0 };
        }

        Self::transform(&mut buf);

        let scale = 1.0 / FFT_SIZE as f32;
        for (k, c) in buf.iter().enumerate() {
            output[2 * k] = round_to_i32(c.re * scale);
            output[2 * k + 1] = round_to_i32(c.im * scale);
        }
    }

    fn inverse(&self, input: &[i32; 2 * FFT_SIZE], output: &mut [i32; FFT_SIZE]) {
        let mut buf = [Complex32::default(); FFT_SIZE];

        for (bin, &i) in self.perm.iter().enumerate() {
            let src = i as usize;
            let c = Complex32 { re: input[2 * src] as f32, im: input[2 * src + 1] as f32 };
            // Swap re/im: computing a forward transform of the swapped input
            // and swapping back yields the inverse transform, unnormalized.
            buf[bin] = Complex32 { re: c.im, im: c.re };
        }

        Self::transform(&mut buf);

        for (k, out) in output.iter_mut().enumerate() {
            *out = round_to_i32(buf[k].im);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_of_dc_signal_concentrates_in_bin_zero() {
        let fft = Radix2Fft::new().unwrap();
        let input = [1000i32; FFT_SIZE];
        let mut output = [0i32; 2 * FFT_SIZE];
        fft.forward(&input, &mut output);

        assert!((output[0] - 1000).abs() <= 1);
        for k in 1..FFT_SIZE {
            assert!(output[2 * k].abs() <= 1, "re[{k}] = {}", output[2 * k]);
            assert!(output[2 * k + 1].abs() <= 1, "im[{k}] = {}", output[2 * k + 1]);
        }
    }

    #[test]
    fn forward_then_inverse_recovers_a_sinusoid_up_to_scale() {
        let fft = Radix2Fft::new().unwrap();
        let freq = 3.0;
        let amplitude = 10_000.0;
        let input: [i32; FFT_SIZE] = {
            let mut a = [0i32; FFT_SIZE];
            for (i, v) in a.iter_mut().enumerate() {
                let theta = std::f32::consts::TAU * freq * i as f32 / FFT_SIZE as f32;
                *v = round_to_i32(amplitude * theta.sin());
            }
            a
        };

        let mut spectrum = [0i32; 2 * FFT_SIZE];
        fft.forward(&input, &mut spectrum);

        let mut restored = [0i32; FFT_SIZE];
        fft.inverse(&spectrum, &mut restored);

        // The inverse is unnormalized by design, so round-tripping through
        // forward (1/N-scaled) then inverse (unscaled) restores the
        // original samples directly.
        for (orig, got) in input.iter().zip(restored.iter()) {
            assert!((orig - got).abs() <= 2, "orig={orig} got={got}");
        }
    }
}
