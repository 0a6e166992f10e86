// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors a [`crate::Decoder`] can report.
///
/// There is no parse-failure mode once a `Decoder` exists: `decode` always
/// produces a full frame of samples from any 7-byte input, malformed or not,
/// since every bitfield is simply masked to its width. The only fallible path
/// is construction, when the chosen FFT backend rejects the (compile-time
/// fixed) transform length.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unsupported FFT length: {0}")]
    UnsupportedFftLength(usize),
}
