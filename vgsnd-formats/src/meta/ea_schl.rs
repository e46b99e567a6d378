// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Electronic Arts `SCHl` container metadata.
//!
//! The real EA header is a variable tag-length-value chain (EA's own
//! "patch" format); this parser instead reads a fixed-field subset
//! sufficient for the codecs this workspace
//! implements (EA-XA v1/v2, NGC_DSP, 16-bit PCM): codec id, channel
//! count, sample rate, sample count, and loop points, laid out
//! immediately after the `SCHl` tag and size field. Treat the exact field
//! offsets as this crate's own representative convention rather than a
//! byte-for-byte match to real EA audio assets.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::{CodecKind, PcmFormat};
use vgsnd_core::dispatch::ParseResult;
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::LayoutKind;
use vgsnd_core::stream::{LoopRange, Stream};

use crate::layout::EaSchlLayout;

const TAG_SCHL: u32 = 0x5343486C; // "SCHl"

pub fn try_parse(mut reader: ByteReader) -> Result<ParseResult> {
    if reader.len() < 0x20 || reader.read_u32be_at(0x00)? != TAG_SCHL {
        return Ok(ParseResult::NoMatch(reader));
    }

    let header_size = reader.read_u32be_at(0x04)? as u64;
    let codec_id = reader.read_u8_at(0x08)?;
    let channel_count = reader.read_u8_at(0x09)?;
    if channel_count == 0 {
        return Ok(ParseResult::NoMatch(reader));
    }

    let (codec, ngc_dsp_hist_prefix) = match codec_id {
        0 => (CodecKind::EaXaV1 { stereo: channel_count == 2 }, false),
        1 => (CodecKind::EaXaV2, false),
        2 => (CodecKind::NintendoDsp, true),
        3 => (CodecKind::Pcm(PcmFormat::S16BE), false),
        _ => return Ok(ParseResult::NoMatch(reader)),
    };

    let sample_rate = reader.read_u32be_at(0x0C)?;
    let num_samples = reader.read_u32be_at(0x10)? as i64;
    let loop_start = reader.read_i32be_at(0x14)?;
    let loop_end = reader.read_i32be_at(0x18)?;

    let loop_range = if loop_start >= 0 && (loop_start as i64) < num_samples {
        Some(LoopRange { start: loop_start as i64, end: loop_end.max(0) as i64 })
    }
    else {
        None
    };

    let channels = channel_count as usize;
    let mut channel_states = Vec::with_capacity(channels);
    for i in 0..channels {
        let mut ch = ChannelState::new();
        ch.channel_index = i as u8;
        ch.offset = header_size;
        ch.channel_start_offset = header_size;
        channel_states.push(ch);
    }

    let codec_kernel = vgsnd_codecs_adpcm::kernel_for(codec, channel_count)
        .or_else(|| vgsnd_codecs_pcm::kernel_for(codec))
        .ok_or(vgsnd_core::errors::VgsndError::Unsupported(
            vgsnd_core::errors::UnsupportedKind::Codec,
            "EA SCHl codec",
        ))?;

    let blocked_layout = EaSchlLayout { channels, ngc_dsp_hist_prefix };

    let stream = Stream::new(
        channel_count,
        sample_rate,
        num_samples,
        loop_range,
        codec,
        LayoutKind::BlockedEaSchl,
        "Electronic Arts SCHl",
        0,
        0,
        channel_states,
        reader,
        codec_kernel,
        Some(Box::new(blocked_layout)),
    )?;

    Ok(ParseResult::Matched(Box::new(stream)))
}
