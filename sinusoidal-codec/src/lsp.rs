// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line spectral frequency/pair (LSF/LSP) decoding and LSP-to-LPC
//! conversion.
//!
//! LSFs arrive from the bitstream as 10 Gray-coded codebook indices; this
//! module turns those indices into line spectral pairs (via the CORDIC
//! rotator, §4.1) and then into the 10 linear prediction coefficients that
//! drive the spectral envelope.

use crate::fixed::{add31, cordic, Q31, ONE_IN_Q23, POINT_ONE_IN_Q27};
use crate::model::LPC_ORD;
use crate::tables::{CODEBOOK, LSP_OFFSETS};

/// Minimum separation enforced between adjacent LSPs below index 4, Q27
/// (`50 * pi / 4000`).
pub const MIN_SEP_LOW: Q31 = 5_270_718;
/// Minimum separation enforced between adjacent LSPs at and above index 4,
/// Q27 (`100 * pi / 4000`).
pub const MIN_SEP_HIGH: Q31 = 10_541_436;

/// Look up the 10 codebook-quantized line spectral frequencies named by
/// `indexes`, Q27.
pub fn decode_lsps_scalar(indexes: &[u32; LPC_ORD]) -> [Q31; LPC_ORD] {
    let mut lsp = [0 as Q31; LPC_ORD];

    for i in 0..LPC_ORD {
        lsp[i] = CODEBOOK[LSP_OFFSETS[i] + indexes[i] as usize];
    }

    lsp
}

/// Repair LSP ordering: quantisation can occasionally produce adjacent
/// entries out of their required ascending order. When that happens, pull
/// the pair apart symmetrically by `0.1` (Q27) and restart the scan, since
/// the repair can itself disturb an earlier pair. The `i = 1` reset plus the
/// loop's own increment means a repair at index `i` resumes checking at `i +
/// 1`, not from the very start -- matching the reference's `for` loop, whose
/// increment still runs after the reset.
pub fn check_lsp_order(lsp: &mut [Q31; LPC_ORD]) {
    let mut i = 1usize;

    while i < LPC_ORD {
        if lsp[i] < lsp[i - 1] {
            let old = lsp[i - 1];
            lsp[i - 1] = lsp[i].wrapping_sub(POINT_ONE_IN_Q27);
            lsp[i] = old.wrapping_add(POINT_ONE_IN_Q27);
            i = 1;
        }

        i += 1;
    }
}

/// Enforce a minimum gap between adjacent LSPs (a larger gap above index 4,
/// since the ear is less sensitive to close harmonics at higher
/// frequencies), forward-scanning so a correction at `i` can only ever
/// increase the gap ahead of it.
pub fn bw_expand_lsps(lsp: &mut [Q31; LPC_ORD]) {
    for i in 1..LPC_ORD {
        let thresh = if i >= 4 { MIN_SEP_HIGH } else { MIN_SEP_LOW };

        if lsp[i].wrapping_sub(lsp[i - 1]) < thresh {
            lsp[i] = add31(lsp[i - 1], thresh);
        }
    }
}

/// Line spectral frequencies to line spectral pairs: rotate each LSF by the
/// CORDIC and keep the cosine, rescaled from the rotator's native Q27 output
/// (which carries the CORDIC gain `K`) down to Q23.
pub fn lsf_to_lsp(lsf: &[Q31; LPC_ORD]) -> [Q31; LPC_ORD] {
    let mut lsp = [0 as Q31; LPC_ORD];

    for (dst, &theta) in lsp.iter_mut().zip(lsf.iter()) {
        let (cos, _sin) = cordic(theta);
        *dst = cos >> 4;
    }

    lsp
}

/// Expand either the even- or odd-indexed half of an LSP set into one of the
/// two symmetric/antisymmetric polynomials whose sum and difference give the
/// LPC coefficients. `coeffs` is a stride-2 view: callers pass `&lsp[0..]`
/// for the "P" polynomial and `&lsp[1..]` for the "Q" polynomial.
fn lsp_to_polynomial(coeffs: &[Q31], poly: &mut [Q31; LPC_ORD / 2 + 1]) {
    use crate::fixed::mul_shift;

    poly[0] = ONE_IN_Q23;
    poly[1] = coeffs[0].wrapping_neg().wrapping_mul(2);

    for i in 2..=LPC_ORD / 2 {
        let b = coeffs[2 * i - 2].wrapping_neg().wrapping_mul(2);
        poly[i] = mul_shift(b, poly[i - 1], 23).wrapping_add(poly[i - 2].wrapping_mul(2));

        for j in (2..i).rev() {
            let term = mul_shift(b, poly[j - 1], 23).wrapping_add(poly[j - 2]);
            poly[j] = poly[j].wrapping_add(term);
        }

        poly[1] = poly[1].wrapping_add(b);
    }
}

/// Convert 10 line spectral pairs (Q23) into 11 linear prediction
/// coefficients (Q23, `lpc[0] == 1.0`).
pub fn lsp_to_lpc(lsp: &[Q31; LPC_ORD]) -> [Q31; LPC_ORD + 1] {
    let half = LPC_ORD / 2;
    let mut p = [0 as Q31; LPC_ORD / 2 + 1];
    let mut q = [0 as Q31; LPC_ORD / 2 + 1];

    lsp_to_polynomial(&lsp[0..], &mut p);
    lsp_to_polynomial(&lsp[1..], &mut q);

    for i in (1..=half).rev() {
        p[i] = p[i].wrapping_add(p[i - 1]);
        q[i] = q[i].wrapping_sub(q[i - 1]);
    }

    let mut lpc = [0 as Q31; LPC_ORD + 1];
    lpc[0] = ONE_IN_Q23;

    let mut j = LPC_ORD;
    for i in 1..=half {
        lpc[i] = p[i].wrapping_add(q[i]) >> 1;
        lpc[j] = p[i].wrapping_sub(q[i]) >> 1;
        j -= 1;
    }

    lpc
}
