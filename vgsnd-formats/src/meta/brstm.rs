// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nintendo Wii BRSTM container metadata.
//!
//! `RSTM` magic + a `0xFEFF0100` byte-order/version word, then a `HEAD`
//! chunk (located via an offset at `+0x10`) carrying codec/channel/sample
//! fields and, for DSP-coded streams, a chain of two offset indirections
//! to reach the coefficient table.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::{CodecKind, PcmFormat};
use vgsnd_core::dispatch::ParseResult;
use vgsnd_core::errors::{invalid_error, Result};
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::LayoutKind;
use vgsnd_core::stream::{LoopRange, Stream};

const RSTM_MAGIC: u32 = 0x5253544D; // "RSTM"
const RSTM_BOM_VERSION: u32 = 0xFEFF_0100;
const HEAD_MAGIC: u32 = 0x48454144; // "HEAD"

pub fn try_parse(mut reader: ByteReader) -> Result<ParseResult> {
    if reader.len() < 0x20 || reader.read_u32be_at(0x00)? != RSTM_MAGIC {
        return Ok(ParseResult::NoMatch(reader));
    }
    if reader.read_u32be_at(0x04)? != RSTM_BOM_VERSION {
        return Ok(ParseResult::NoMatch(reader));
    }

    let head_offset = reader.read_u32be_at(0x10)? as u64;
    if reader.read_u32be_at(head_offset)? != HEAD_MAGIC {
        return Ok(ParseResult::NoMatch(reader));
    }

    let codec_number = reader.read_u8_at(head_offset + 0x20)?;
    let loop_flag = reader.read_u8_at(head_offset + 0x21)? != 0;
    let channel_count = reader.read_u8_at(head_offset + 0x22)?;

    let codec = match codec_number {
        0 => CodecKind::Pcm(PcmFormat::U8),
        1 => CodecKind::Pcm(PcmFormat::S16BE),
        2 => CodecKind::NintendoDsp,
        _ => return Ok(ParseResult::NoMatch(reader)),
    };

    if channel_count == 0 || channel_count > 2 {
        return invalid_error("BRSTM only supports mono or stereo streams");
    }

    let num_samples = reader.read_u32be_at(head_offset + 0x2C)? as i64;
    let sample_rate = reader.read_u16be_at(head_offset + 0x24)? as u32;
    let loop_start_sample = reader.read_u32be_at(head_offset + 0x28)? as i64;

    let interleave = reader.read_u32be_at(head_offset + 0x38)?;
    let interleave_last = reader.read_u32be_at(head_offset + 0x48)?;
    let start_offset = reader.read_u32be_at(head_offset + 0x30)? as u64;

    let channels = channel_count as usize;
    let mut channel_states = Vec::with_capacity(channels);

    if matches!(codec, CodecKind::NintendoDsp) {
        let coef_offset1 = reader.read_u32be_at(head_offset + 0x1C)? as u64;
        let coef_offset2 = reader.read_u32be_at(head_offset + 0x10 + coef_offset1)? as u64;
        let coef_offset = head_offset + coef_offset2 + 0x10;

        for i in 0..channels {
            let mut ch = ChannelState::new();
            ch.channel_index = i as u8;
            ch.offset = start_offset + i as u64 * interleave as u64;
            ch.channel_start_offset = ch.offset;

            let table_offset = coef_offset + i as u64 * 0x38;
            for j in 0..16 {
                ch.adpcm_coef[j] = reader.read_i16be_at(table_offset + j as u64 * 2)?;
            }
            channel_states.push(ch);
        }
    }
    else {
        for i in 0..channels {
            let mut ch = ChannelState::new();
            ch.channel_index = i as u8;
            ch.offset = start_offset + i as u64 * interleave as u64;
            ch.channel_start_offset = ch.offset;
            channel_states.push(ch);
        }
    }

    let loop_range = if loop_flag && loop_start_sample < num_samples {
        Some(LoopRange { start: loop_start_sample, end: num_samples })
    }
    else {
        None
    };

    let codec_kernel = vgsnd_codecs_adpcm::kernel_for(codec, channel_count)
        .or_else(|| vgsnd_codecs_pcm::kernel_for(codec))
        .ok_or(vgsnd_core::errors::VgsndError::Unsupported(
            vgsnd_core::errors::UnsupportedKind::Codec,
            "BRSTM codec",
        ))?;

    let stream = Stream::new(
        channel_count,
        sample_rate,
        num_samples,
        loop_range,
        codec,
        LayoutKind::InterleaveShortLast,
        "Nintendo BRSTM",
        interleave,
        interleave_last,
        channel_states,
        reader,
        codec_kernel,
        None,
    )?;

    Ok(ParseResult::Matched(Box::new(stream)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    fn build_minimal_pcm16_brstm(channels: u8, sample_rate: u16, num_samples: u32) -> Vec<u8> {
        build_pcm16_brstm(channels, sample_rate, num_samples, 0x1000, 0x1000)
    }

    fn build_pcm16_brstm(
        channels: u8,
        sample_rate: u16,
        num_samples: u32,
        interleave: u32,
        interleave_last: u32,
    ) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x100];
        bytes[0x00..0x04].copy_from_slice(&RSTM_MAGIC.to_be_bytes());
        bytes[0x04..0x08].copy_from_slice(&RSTM_BOM_VERSION.to_be_bytes());
        bytes[0x10..0x14].copy_from_slice(&0x40u32.to_be_bytes()); // head_offset

        let head = 0x40u64 as usize;
        bytes[head..head + 4].copy_from_slice(b"HEAD");
        bytes[head + 0x20] = 1; // PCM16BE
        bytes[head + 0x21] = 0; // no loop
        bytes[head + 0x22] = channels;
        bytes[head + 0x24..head + 0x26].copy_from_slice(&sample_rate.to_be_bytes());
        bytes[head + 0x28..head + 0x2C].copy_from_slice(&0u32.to_be_bytes());
        bytes[head + 0x2C..head + 0x30].copy_from_slice(&num_samples.to_be_bytes());
        bytes[head + 0x30..head + 0x34].copy_from_slice(&0xA0u32.to_be_bytes()); // start_offset
        bytes[head + 0x38..head + 0x3C].copy_from_slice(&interleave.to_be_bytes());
        bytes[head + 0x48..head + 0x4C].copy_from_slice(&interleave_last.to_be_bytes());
        bytes
    }

    #[test]
    fn recognizes_a_minimal_pcm16_header() {
        let bytes = build_minimal_pcm16_brstm(2, 48000, 5000);
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::Matched(stream) => {
                let info = stream.describe();
                assert_eq!(info.channels, 2);
                assert_eq!(info.sample_rate, 48000);
                assert_eq!(info.num_samples, 5000);
            }
            ParseResult::NoMatch(_) => panic!("expected a match"),
        }
    }

    #[test]
    fn rejects_a_mismatched_magic() {
        let bytes = vec![0u8; 0x40];
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::NoMatch(_) => {}
            ParseResult::Matched(_) => panic!("expected no match"),
        }
    }

    #[test]
    fn stale_zero_interleave_last_reuses_interleave_for_final_block() {
        // interleave_last == 0 is a stale/absent field, not a literal
        // zero-size final block: the final block must reuse `interleave`
        // (DESIGN.md's Open Question decisions, §1) instead of truncating
        // the stream to nothing once the last full block is exhausted.
        let num_samples = 10u32;
        let bytes = build_pcm16_brstm(1, 48000, num_samples, 0x1000, 0);
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::Matched(mut stream) => {
                let mut out = vec![0i16; num_samples as usize];
                let written = stream.render(&mut out).unwrap();
                assert_eq!(written, num_samples as usize);
            }
            ParseResult::NoMatch(_) => panic!("expected a match"),
        }
    }

    #[test]
    fn rejects_channel_counts_above_stereo() {
        let mut bytes = build_minimal_pcm16_brstm(2, 48000, 5000);
        bytes[0x40 + 0x22] = 3;
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        assert!(try_parse(reader).is_err());
    }
}
