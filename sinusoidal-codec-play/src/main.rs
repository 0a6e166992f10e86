// sinusoidal-codec
// Copyright (c) 2026 The sinusoidal-codec Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![forbid(unsafe_code)]

//! Decode a flat file of 7-byte packets through [`sinusoidal_codec`] and
//! write the resulting 16-bit PCM (little-endian, 8 kHz, mono) to a file or
//! stdout.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use sinusoidal_codec::{Decoder, SAMPLES_PER_PACKET};

/// A flat file of 7-byte packets, decoded one at a time into raw PCM.
struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut output = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let value = it.next().context("--output requires a path")?;
                output = Some(PathBuf::from(value));
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            path if input.is_none() => input = Some(PathBuf::from(path)),
            other => bail!("unexpected argument: {other}"),
        }
    }

    let input = input.context("missing required <PACKETS> argument")?;
    Ok(Args { input, output })
}

fn print_usage() {
    eprintln!("Usage: sinusoidal-codec-play [-o OUTPUT] <PACKETS>");
    eprintln!();
    eprintln!("Decode a flat file of 7-byte packets into raw 16-bit PCM.");
    eprintln!("With no -o, PCM is written to stdout.");
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut reader = BufReader::new(file);

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut decoder = Decoder::new().context("failed to construct decoder")?;

    let mut packet = [0u8; 7];
    let mut out = [0i16; SAMPLES_PER_PACKET];
    let mut pcm_bytes = [0u8; SAMPLES_PER_PACKET * 2];
    let mut packets_decoded = 0usize;

    loop {
        match reader.read_exact(&mut packet) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err).context("failed to read packet"),
        }

        decoder.decode(&mut out, &packet);

        for (sample, chunk) in out.iter().zip(pcm_bytes.chunks_exact_mut(2)) {
            chunk.copy_from_slice(&sample.to_le_bytes());
        }
        writer.write_all(&pcm_bytes).context("failed to write PCM output")?;

        packets_decoded += 1;
    }

    if packets_decoded == 0 {
        warn!("input contained no complete 7-byte packets");
    }
    else {
        info!(
            "decoded {} packet(s), {} sample(s)",
            packets_decoded,
            packets_decoded * SAMPLES_PER_PACKET
        );
    }

    writer.flush().context("failed to flush PCM output")?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
