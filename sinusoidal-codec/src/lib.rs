// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A fixed-point decoder for a low-bit-rate sinusoidal/harmonic speech codec.
//!
//! The decoder consumes 56-bit (7-byte) packets, each carrying parameters
//! for four 10 ms sub-frames (40 ms / 320 samples of speech at 8 kHz), and
//! reconstructs 16-bit signed PCM. It is a sinusoidal synthesizer driven by
//! line-spectral (LP) parameters plus a coarsely quantized pitch, voicing,
//! and energy -- not a waveform codec: there is no encoder, and no analysis
//! side, in this crate.
//!
//! Construct one [`Decoder`] per independent stream with [`Decoder::new`]
//! and call [`Decoder::decode`] once per received packet, in stream order.
//! There is no internal buffering or resynchronization: the caller owns
//! packet framing.
//!
//! ```
//! use sinusoidal_codec::Decoder;
//!
//! let mut decoder = Decoder::new().expect("FFT_SIZE is a supported length");
//! let mut pcm = [0i16; sinusoidal_codec::SAMPLES_PER_PACKET];
//! decoder.decode(&mut pcm, &[0u8; 7]);
//! ```

mod amplitude;
mod bits;
mod error;
mod fft;
mod fixed;
mod interpolate;
mod lsp;
mod model;
mod phase;
mod synth;
mod tables;

pub use error::CodecError;
pub use fft::{Radix2Fft, RealFft, FFT_SIZE};
pub use model::{Model, LPC_ORD, MAX_L, MAX_PITCH, NUM_FRAMES, N_SPF, SAMPLES_PER_PACKET};

use bits::Packet;
use fixed::Q31;
use log::trace;
use phase::{AF_LEN, LFSR_SEED};
use tables::{ENERGY_LUT, L_LUT, PITCH_LUT, WO_LUT};

/// A fully self-contained decoder instance: one bundled FFT backend plus the
/// three persistent cross-packet state elements the reference keeps as
/// process-global variables (the previous sub-frame's model, the previous
/// packet's line-spectral frequencies, and the phase accumulator), plus the
/// working buffers those stages carry forward between calls (the overlap-add
/// sample history, the per-harmonic amplitude envelope, and the excitation
/// LFSR). Multiple concurrent streams just need multiple `Decoder`s; there is
/// no shared mutable state to synchronize.
pub struct Decoder<F: RealFft = Radix2Fft> {
    fft: F,
    prev_model: Model,
    prev_lsfs: [Q31; LPC_ORD],
    prev_phase: Q31,
    amplitudes: [Q31; N_SPF + 1],
    lfsr: u32,
    sn: [Q31; 2 * N_SPF],
}

impl Decoder<Radix2Fft> {
    /// Construct a decoder using the bundled [`Radix2Fft`] backend.
    ///
    /// Fails only if [`FFT_SIZE`] is not a supported transform length for the
    /// chosen backend -- a compile-time-fixed constant, so in practice this
    /// can only fail if the crate itself is misconfigured, and a caller
    /// encountering it at startup should treat it as a fatal configuration
    /// error rather than something to retry.
    pub fn new() -> Result<Self, CodecError> {
        Self::with_fft(Radix2Fft::new()?)
    }
}

impl<F: RealFft> Decoder<F> {
    /// Construct a decoder around a caller-supplied FFT backend (length
    /// [`FFT_SIZE`], real-input, natural bin ordering).
    pub fn with_fft(fft: F) -> Result<Self, CodecError> {
        let mut prev_lsfs = [0 as Q31; LPC_ORD];
        for (i, lsf) in prev_lsfs.iter_mut().enumerate() {
            // Evenly spaced on [0, tau), so the first packet's interpolated
            // sub-frames don't click against an arbitrary starting spectrum.
            *lsf = (i as i64 * (fixed::TAU_Q26 as i64 / (LPC_ORD as i64 + 1))) as Q31;
        }

        Ok(Self {
            fft,
            prev_model: Model::startup_default(),
            prev_lsfs,
            prev_phase: 0,
            amplitudes: [0; N_SPF + 1],
            lfsr: LFSR_SEED,
            sn: [0; 2 * N_SPF],
        })
    }

    /// Decode one 7-byte packet into [`SAMPLES_PER_PACKET`] samples of 16-bit
    /// signed PCM at 8 kHz.
    ///
    /// `bits` is always unpacked with the even-packet bit alignment; the
    /// odd-packet nibble offset the bitstream format reserves for is exposed
    /// through [`bits::Packet::unpack`] internally but has no caller-visible
    /// entry point here, since every known packet source uses the even
    /// alignment (see the crate-level bitstream diagram).
    pub fn decode(&mut self, out: &mut [i16; SAMPLES_PER_PACKET], bits: &[u8; 7]) {
        let pkt = Packet::unpack(bits, false);

        let current = Model {
            wo: WO_LUT[pkt.wo_index as usize],
            pitch: PITCH_LUT[pkt.wo_index as usize] as Q31,
            energy: ENERGY_LUT[pkt.e_index as usize],
            l: L_LUT[pkt.wo_index as usize] as usize,
            voiced: pkt.voiced[NUM_FRAMES - 1],
        };

        let mut received_lsf = lsp::decode_lsps_scalar(&pkt.lsp_indexes);
        lsp::check_lsp_order(&mut received_lsf);
        lsp::bw_expand_lsps(&mut received_lsf);

        trace!(
            "decode: wo_index={} e_index={} voiced={:?} L={}",
            pkt.wo_index,
            pkt.e_index,
            pkt.voiced,
            current.l
        );

        let mut frames: [Model; NUM_FRAMES] = [
            current.clone(),
            current.clone(),
            current.clone(),
            current.clone(),
        ];
        let mut lsfs: [[Q31; LPC_ORD]; NUM_FRAMES] =
            [received_lsf, received_lsf, received_lsf, received_lsf];

        for i in 0..NUM_FRAMES - 1 {
            frames[i].voiced = pkt.voiced[i];
            interpolate::interpolate_wo(&mut frames[i], &self.prev_model, &current, i as i32);
            frames[i].energy =
                interpolate::interpolate_energy(&self.prev_model, &current, i as i32);
            lsfs[i] = interpolate::interpolate_lsp(&self.prev_lsfs, &received_lsf, i as i32);
        }

        let mut raw_spectrum = [0i32; 2 * FFT_SIZE];

        for (i, frame) in frames.iter().enumerate() {
            let lsp = lsp::lsf_to_lsp(&lsfs[i]);
            let lpc = lsp::lsp_to_lpc(&lsp);

            amplitude::lpc_to_amplitudes(
                &self.fft,
                &lpc,
                frame,
                frame.energy,
                &mut raw_spectrum,
                &mut self.amplitudes,
            );
            amplitude::apply_lpc_correction(frame, &mut self.amplitudes);

            let af: [Q31; AF_LEN] =
                phase::phase_synth(frame, &raw_spectrum, &mut self.prev_phase, &mut self.lfsr);

            let max_amplitude =
                synth::synthesise(&self.fft, &mut self.sn, frame, &self.amplitudes, &af);
            synth::ear_protection(&mut self.sn, max_amplitude);

            let mut chunk = [0i16; N_SPF];
            synth::to_pcm(&self.sn, &mut chunk);
            let start = i * N_SPF;
            out[start..start + N_SPF].copy_from_slice(&chunk);
        }

        self.prev_model = frames[NUM_FRAMES - 1].clone();
        self.prev_lsfs = received_lsf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_an_all_zero_packet_stays_within_pcm_range() {
        let mut decoder = Decoder::new().unwrap();
        let mut out = [0i16; SAMPLES_PER_PACKET];
        decoder.decode(&mut out, &[0u8; 7]);
        for &s in out.iter() {
            assert!(s as i32 <= i16::MAX as i32 && s as i32 >= i16::MIN as i32);
        }
    }

    #[test]
    fn decode_unvoiced_max_energy_obeys_the_limiter() {
        let mut decoder = Decoder::new().unwrap();
        let mut out = [0i16; SAMPLES_PER_PACKET];
        // Voicing bits all 0, e_index = 31 (Gray(31) == 0b10000), Wo/LSP indices 0.
        let bits: [u8; 7] = [0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00];
        decoder.decode(&mut out, &bits);
        for &s in out.iter() {
            assert!((s as i32).abs() <= 30_000);
        }
    }

    #[test]
    fn decode_voiced_low_pitch_selects_max_harmonics_and_attenuates_the_fundamental() {
        let mut decoder = Decoder::new().unwrap();
        let mut out = [0i16; SAMPLES_PER_PACKET];
        // Voicing bits all 1 (bits 55..52), Wo index 0, everything else 0.
        let bits: [u8; 7] = [0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        decoder.decode(&mut out, &bits);
        assert_eq!(decoder.prev_model.wo, WO_LUT[0]);
        assert_eq!(decoder.prev_model.l, L_LUT[0] as usize);
        assert_eq!(L_LUT[0], 79);
    }

    #[test]
    fn decode_voiced_high_pitch_selects_fewer_harmonics() {
        let mut decoder = Decoder::new().unwrap();
        let mut out = [0i16; SAMPLES_PER_PACKET];
        // Voicing bits all 1, Wo index 127 (Gray(127) == 0b1000000 == 64): bits
        // 51..45 hold the Gray-coded index, so set the raw field to Gray(127).
        let gray127 = 127u32 ^ (127u32 >> 1);
        let mut bits = [0u8; 7];
        let mut word: u64 = 0b1111 << 52; // all four voicing bits
        word |= (gray127 as u64) << 45;
        for (i, b) in bits.iter_mut().enumerate() {
            *b = ((word >> ((6 - i) * 8)) & 0xff) as u8;
        }
        decoder.decode(&mut out, &bits);
        assert_eq!(decoder.prev_model.l, L_LUT[127] as usize);
        assert_eq!(L_LUT[127], 10);
    }

    #[test]
    fn decoding_the_same_packet_twice_from_the_same_state_is_deterministic() {
        let mut decoder = Decoder::new().unwrap();
        let bits: [u8; 7] = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xd0];

        let mut first = [0i16; SAMPLES_PER_PACKET];
        decoder.decode(&mut first, &bits);

        // Snapshot persistent state, decode again, restore, decode a third
        // time: the second and third decodes (same snapshot) must match.
        let snapshot_model = decoder.prev_model.clone();
        let snapshot_lsfs = decoder.prev_lsfs;
        let snapshot_phase = decoder.prev_phase;
        let snapshot_amplitudes = decoder.amplitudes;
        let snapshot_lfsr = decoder.lfsr;
        let snapshot_sn = decoder.sn;

        let mut second = [0i16; SAMPLES_PER_PACKET];
        decoder.decode(&mut second, &bits);

        decoder.prev_model = snapshot_model;
        decoder.prev_lsfs = snapshot_lsfs;
        decoder.prev_phase = snapshot_phase;
        decoder.amplitudes = snapshot_amplitudes;
        decoder.lfsr = snapshot_lfsr;
        decoder.sn = snapshot_sn;

        let mut third = [0i16; SAMPLES_PER_PACKET];
        decoder.decode(&mut third, &bits);

        assert_eq!(second, third);
    }

    #[test]
    fn back_to_back_identical_packets_join_without_a_large_discontinuity() {
        let mut decoder = Decoder::new().unwrap();
        let bits: [u8; 7] = [0xf0, 0x55, 0x22, 0x33, 0x44, 0x55, 0x60];

        let mut first = [0i16; SAMPLES_PER_PACKET];
        decoder.decode(&mut first, &bits);
        let mut second = [0i16; SAMPLES_PER_PACKET];
        decoder.decode(&mut second, &bits);

        let boundary_jump = (second[0] as i32 - first[SAMPLES_PER_PACKET - 1] as i32).abs();
        assert!(boundary_jump < 2000, "boundary jump too large: {boundary_jump}");
    }

    proptest! {
        #[test]
        fn prop_decode_any_packet_stays_within_pcm_range(bytes in proptest::array::uniform7(0u8..=255)) {
            let mut decoder = Decoder::new().unwrap();
            let mut out = [0i16; SAMPLES_PER_PACKET];
            decoder.decode(&mut out, &bytes);
            for &s in out.iter() {
                prop_assert!(s as i32 <= i16::MAX as i32 && s as i32 >= i16::MIN as i32);
            }
        }
    }
}
