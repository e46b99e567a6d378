// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod output;

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use log::{error, info};

use vgsnd::core::{FileIo, Stream, VgsndError};
use vgsnd::RenderOptions;

/// Probe, decode, or play a video game audio file.
#[derive(Parser)]
#[command(name = "vgsnd-play", version, about = "Probe, decode, or play video game audio files")]
struct Cli {
    /// The input file path.
    input: PathBuf,

    /// Subsong index to open (1-based), for containers with more than one
    /// track.
    #[arg(long)]
    subsong: Option<u32>,

    /// Print stream metadata and exit without decoding.
    #[arg(long, conflicts_with_all = ["wav_out", "loop_count", "loop_forever"])]
    probe_only: bool,

    /// Decode to a WAV file instead of playing it.
    #[arg(long, value_name = "PATH")]
    wav_out: Option<PathBuf>,

    /// Number of times to repeat the loop body before ending (or fading).
    #[arg(long, default_value_t = 2.0)]
    loop_count: f64,

    /// Loop forever rather than honoring `--loop-count`.
    #[arg(long)]
    loop_forever: bool,

    /// Fade-out length in seconds, applied near the end of playback.
    #[arg(long, default_value_t = 10.0)]
    fade_seconds: f64,

    /// Silent delay in seconds inserted before the fade begins.
    #[arg(long, default_value_t = 0.0)]
    fade_delay_seconds: f64,

    /// Ignore the container's loop points and play straight through once.
    #[arg(long)]
    ignore_loop: bool,
}

fn main() {
    pretty_env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        error!("{}", err);
        exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), VgsndError> {
    let io = FileIo::open(&cli.input)?;

    let mut stream = match cli.subsong {
        Some(index) => vgsnd::open_subsong(Box::new(io), index)?,
        None => vgsnd::open(Box::new(io))?,
    };

    if cli.probe_only {
        print_info(&stream);
        return Ok(());
    }

    let opts = RenderOptions {
        loop_forever: cli.loop_forever,
        loop_count: cli.loop_count,
        fade_seconds: cli.fade_seconds,
        fade_delay_seconds: cli.fade_delay_seconds,
        ignore_loop: cli.ignore_loop,
        ..RenderOptions::default()
    };
    opts.apply(&mut stream);

    match &cli.wav_out {
        Some(path) => decode_to_wav(&mut stream, path),
        None => play(&mut stream),
    }
}

fn print_info(stream: &Stream) {
    let info = stream.describe();
    info!("container: {}", info.meta_name);
    info!("codec: {}", info.codec_name);
    info!("layout: {}", info.layout_name);
    info!("channels: {}", info.channels);
    info!("sample rate: {} Hz", info.sample_rate);
    info!("samples: {}", info.num_samples);
    info!("bitrate: {} bps", info.bitrate_bps);
}

fn decode_to_wav(stream: &mut Stream, path: &PathBuf) -> Result<(), VgsndError> {
    let spec = hound::WavSpec {
        channels: stream.channels as u16,
        sample_rate: stream.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|err| VgsndError::Io(Box::new(err)))?;

    let mut buf = vec![0i16; 4096 * stream.channels as usize];
    loop {
        let written = stream.render(&mut buf)?;
        if written == 0 {
            break;
        }
        for &sample in &buf[..written] {
            writer.write_sample(sample).map_err(|err| VgsndError::Io(Box::new(err)))?;
        }
    }

    writer.finalize().map_err(|err| VgsndError::Io(Box::new(err)))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn play(stream: &mut Stream) -> Result<(), VgsndError> {
    let channels = stream.channels as u16;
    let sample_rate = stream.sample_rate;

    let mut audio_output = output::try_open(channels, sample_rate).map_err(|err| {
        VgsndError::Invalid(match err {
            output::AudioOutputError::OpenStreamError => "failed to open audio output",
            output::AudioOutputError::PlayStreamError => "failed to start audio output",
            output::AudioOutputError::StreamClosedError => "audio output closed unexpectedly",
        })
    })?;

    let mut buf = vec![0i16; 4096 * channels as usize];
    loop {
        let written = stream.render(&mut buf)?;
        if written == 0 {
            break;
        }
        if audio_output.write(&buf[..written]).is_err() {
            break;
        }
    }

    audio_output.flush();
    Ok(())
}
