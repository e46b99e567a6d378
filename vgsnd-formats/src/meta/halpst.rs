// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HAL Laboratory `HALPST` container metadata.
//!
//! `" HAL"` + `"PST\0"` magic, a channel count at `+0xc`, and (for more
//! than two channels) a header stretched to fit one 0x38-byte per-channel
//! coefficient block per channel, rounded up to 0x20. HALPST carries no
//! explicit loop field: the loop point is implicit in whichever block's
//! "next offset" doesn't advance, so this parser walks the block chain
//! once to find it and a second time to accumulate the sample position it
//! corresponds to.

use vgsnd_codecs_adpcm::dsp::dsp_nibbles_to_samples;
use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::CodecKind;
use vgsnd_core::dispatch::ParseResult;
use vgsnd_core::errors::{truncated_error, Result};
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::LayoutKind;
use vgsnd_core::stream::{LoopRange, Stream};

use crate::layout::HalpstLayout;

const MAGIC_HAL: u32 = 0x2048_414C; // " HAL"
const MAGIC_PST: u32 = 0x5053_5400; // "PST\0"
const MAX_BLOCKS_WALKED: u32 = 1_000_000;

pub fn try_parse(mut reader: ByteReader) -> Result<ParseResult> {
    if reader.len() < 0x20 || reader.read_u32be_at(0x00)? != MAGIC_HAL || reader.read_u32be_at(0x04)? != MAGIC_PST {
        return Ok(ParseResult::NoMatch(reader));
    }

    let channel_count = reader.read_u32be_at(0x0C)?;
    if channel_count == 0 || channel_count > 64 {
        return Ok(ParseResult::NoMatch(reader));
    }
    let channels = channel_count as usize;

    let header_length: u64 = if channel_count > 2 {
        let raw = 0x10 + 0x38 * channel_count as u64;
        (raw + 0x1F) / 0x20 * 0x20
    }
    else {
        0x80
    };

    let samples_l = dsp_nibbles_to_samples(reader.read_u32be_at(0x18)?) + 1;
    for i in 1..channels {
        let samples_r = dsp_nibbles_to_samples(reader.read_u32be_at(0x18 + 0x38 * i as u64)?) + 1;
        if samples_l != samples_r {
            return Ok(ParseResult::NoMatch(reader));
        }
    }

    let sample_rate = reader.read_u32be_at(0x08)?;

    let loop_range = find_loop(&mut reader, header_length, samples_l as i64)?;

    let mut channel_states = Vec::with_capacity(channels);
    for i in 0..channels {
        let mut ch = ChannelState::new();
        ch.channel_index = i as u8;
        ch.offset = header_length;
        ch.channel_start_offset = header_length;
        for j in 0..16 {
            ch.adpcm_coef[j] = reader.read_i16be_at(0x20 + 0x38 * i as u64 + j as u64 * 2)?;
        }
        channel_states.push(ch);
    }

    let codec = CodecKind::NintendoDsp;
    let codec_kernel =
        vgsnd_codecs_adpcm::kernel_for(codec, channel_count as u8).expect("NintendoDsp is always covered");
    let blocked_layout = HalpstLayout;

    let stream = Stream::new(
        channel_count as u8,
        sample_rate,
        samples_l as i64,
        loop_range,
        codec,
        LayoutKind::BlockedHalpst,
        "HAL Laboratory HALPST",
        0,
        0,
        channel_states,
        reader,
        codec_kernel,
        Some(Box::new(blocked_layout)),
    )?;

    Ok(ParseResult::Matched(Box::new(stream)))
}

/// Walks the block chain's `+8` next-offset field until it stops
/// advancing; that terminal value (if non-negative) is the byte offset of
/// the block the stream loops back to. A second walk over the same chain
/// accumulates each traversed block's `+4` nibble count into a sample
/// position for that offset.
fn find_loop(reader: &mut ByteReader, header_length: u64, num_samples: i64) -> Result<Option<LoopRange>> {
    let mut offset = header_length;
    let mut last_offset = 0u64;
    let mut steps = 0u32;

    while offset > last_offset {
        last_offset = offset;
        let next = reader.read_u32be_at(offset + 8)? as i32;
        if next < 0 {
            return Ok(None);
        }
        offset = next as u64;

        steps += 1;
        if steps > MAX_BLOCKS_WALKED {
            return truncated_error("HALPST block chain did not terminate");
        }
    }

    let loop_offset = offset;
    let mut cursor = header_length;
    let mut start_nibble: u64 = 0;
    steps = 0;

    while cursor != loop_offset {
        start_nibble += reader.read_u32be_at(cursor + 4)? as u64 + 1;
        cursor = reader.read_u32be_at(cursor + 8)? as u64;

        steps += 1;
        if steps > MAX_BLOCKS_WALKED {
            return truncated_error("HALPST block chain did not reach its loop target");
        }
    }

    let start_sample = dsp_nibbles_to_samples(start_nibble as u32) as i64;
    if start_sample >= num_samples {
        return Ok(None);
    }

    Ok(Some(LoopRange { start: start_sample, end: num_samples }))
}
