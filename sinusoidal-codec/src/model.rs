// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-subframe decode parameters ("MODEL" in the reference).
//!
//! Two reference `MODEL` fields are not reproduced here: `count` (a frame
//! counter the reference itself documents as unused) and `H`, which despite
//! being part of the reference's `MODEL` struct is shadowed at every call
//! site by a same-named local of different size and is never read through
//! `model->H` anywhere in the decode path -- a dead field in the original.

use crate::fixed::{Q31, ONE_IN_Q12, TAU_Q28};

/// Samples per subframe.
pub const N_SPF: usize = 80;
/// LPC / LSP order.
pub const LPC_ORD: usize = 10;
/// Subframes per packet.
pub const NUM_FRAMES: usize = 4;
/// Samples per packet (`NUM_FRAMES * N_SPF`).
pub const SAMPLES_PER_PACKET: usize = NUM_FRAMES * N_SPF;

/// Ceiling on the pitch period, Q9 -- also the startup/unvoiced default.
pub const MAX_PITCH: Q31 = 81920;
/// Ceiling on the harmonic count -- also the startup/unvoiced default.
pub const MAX_L: usize = 79;
/// Pitch period (in samples) implied by the startup/unvoiced default `Wo`.
const P_MAX: i64 = 160;

/// `Wo` shared by both default models below: `tau / P_MAX` in Q28.
const DEFAULT_WO: Q31 = (TAU_Q28 as i64 / P_MAX) as Q31;

/// Per-subframe decode parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Fundamental frequency, Q28 radians/sample.
    pub wo: Q31,
    /// Pitch period in samples, Q9.
    pub pitch: Q31,
    /// Frame energy, as looked up from [`crate::tables::ENERGY_LUT`].
    pub energy: Q31,
    /// Harmonic count, `floor(pi / Wo)`.
    pub l: usize,
    /// Whether this subframe is voiced.
    pub voiced: bool,
}

impl Model {
    /// Seeds a freshly constructed [`crate::Decoder`]'s `prev_model`, before
    /// any packet has been decoded -- silence, with the startup energy the
    /// reference also uses as the amplitude post-filter's noise floor.
    pub fn startup_default() -> Self {
        Self { wo: DEFAULT_WO, pitch: MAX_PITCH, energy: ONE_IN_Q12, l: MAX_L, voiced: false }
    }

    /// The model substituted for an interpolated subframe when neither
    /// neighbouring subframe is voiced.
    pub fn unvoiced_fallback() -> Self {
        Self { wo: DEFAULT_WO, pitch: MAX_PITCH, energy: 0, l: MAX_L, voiced: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_and_unvoiced_defaults_share_wo_pitch_and_l() {
        let a = Model::startup_default();
        let b = Model::unvoiced_fallback();
        assert_eq!(a.wo, b.wo);
        assert_eq!(a.pitch, b.pitch);
        assert_eq!(a.l, b.l);
        assert_ne!(a.energy, b.energy);
    }
}
