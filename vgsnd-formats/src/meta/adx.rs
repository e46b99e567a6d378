// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CRI ADX container metadata.
//!
//! Signature is `80 00` at the very start, with the stream's start offset
//! embedded at `+0x02` and a `(c)CRI` tag immediately preceding it. Three
//! header generations (`0x0300`/`0x0400`/`0x0500` version signatures) carry
//! loop points at slightly different offsets; encrypted streams
//! (`0x0408`/`0x0409`) additionally need their rolling XOR key recovered
//! from the built-in key table before the scale header can be trusted.

use vgsnd_codecs_adpcm::adx::{
    coefficients_from_cutoff, detect_key, AdxKey, FIXED_COEF_TABLE,
};
use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::{AdxVariant, CodecKind};
use vgsnd_core::dispatch::ParseResult;
use vgsnd_core::errors::{invalid_error, Result};
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::LayoutKind;
use vgsnd_core::stream::{LoopRange, Stream};

const CRI_TAG_LO: u16 = 0x2863; // "(c"
const CRI_TAG_HI: u32 = 0x2943_5249; // ")CRI"

pub fn try_parse(mut reader: ByteReader) -> Result<ParseResult> {
    if reader.len() < 0x20 || reader.read_u16be_at(0x00)? != 0x8000 {
        return Ok(ParseResult::NoMatch(reader));
    }

    let start_offset = reader.read_u16be_at(0x02)? as u64 + 4;
    if start_offset < 6
        || reader.read_u16be_at(start_offset - 6)? != CRI_TAG_LO
        || reader.read_u32be_at(start_offset - 4)? != CRI_TAG_HI
    {
        return Ok(ParseResult::NoMatch(reader));
    }

    let mut variant = match reader.read_u8_at(0x04)? {
        2 => AdxVariant::Fixed,
        3 => AdxVariant::Standard,
        4 => AdxVariant::Exponential,
        _ => return Ok(ParseResult::NoMatch(reader)),
    };

    let frame_size = reader.read_u8_at(0x05)? as u32;
    if reader.read_u8_at(0x06)? != 4 {
        return Ok(ParseResult::NoMatch(reader));
    }

    let channel_count = reader.read_u8_at(0x07)?;
    if channel_count == 0 {
        return invalid_error("ADX channel count is zero");
    }

    let mut version_signature = reader.read_u16be_at(0x12)?;
    let mut encryption_key: Option<AdxKey> = None;

    if version_signature == 0x0408 {
        if let Some(key) = find_key(&mut reader, AdxVariant::Enc8, start_offset, frame_size, channel_count)? {
            variant = AdxVariant::Enc8;
            version_signature = 0x0400;
            encryption_key = Some(key);
        }
    }
    else if version_signature == 0x0409 {
        if let Some(key) = find_key(&mut reader, AdxVariant::Enc9, start_offset, frame_size, channel_count)? {
            variant = AdxVariant::Enc9;
            version_signature = 0x0400;
            encryption_key = Some(key);
        }
    }

    let mut loop_range = None;
    let mut hist_offset = None;

    match version_signature {
        0x0300 => {
            let base_size = 0x14u64;
            let loops_size = 0x18u64;
            if start_offset >= 6 + base_size + loops_size {
                loop_range = read_loop_points(&mut reader, base_size)?;
            }
        }
        0x0400 => {
            let base_size = 0x18u64;
            let hist_size = if channel_count > 1 { 4 * channel_count as u64 } else { 8 };
            hist_offset = Some(base_size);

            let ainf_offset = base_size + hist_size + 4;
            let ainf_size = if reader.read_tag_at(ainf_offset)? == *b"AINF" {
                reader.read_u32be_at(ainf_offset + 4)? as u64
            }
            else {
                0
            };

            let loops_size = 0x18u64;
            if start_offset.saturating_sub(ainf_size) >= 6 + base_size + hist_size + loops_size {
                loop_range = read_loop_points(&mut reader, base_size + hist_size)?;
            }
        }
        0x0500 => {}
        _ => return Ok(ParseResult::NoMatch(reader)),
    }

    let num_samples = reader.read_u32be_at(0x0C)? as i64;
    let sample_rate = reader.read_u32be_at(0x08)?;

    let mut fixed_coef = [0i16; 8];
    let mut tunable_coef = (0i16, 0i16);
    if variant == AdxVariant::Fixed {
        fixed_coef = FIXED_COEF_TABLE;
    }
    else {
        let cutoff = reader.read_u16be_at(0x10)? as u32;
        tunable_coef = coefficients_from_cutoff(cutoff, sample_rate);
    }

    let channels = channel_count as usize;
    let mut channel_states = Vec::with_capacity(channels);
    for i in 0..channels {
        let mut ch = ChannelState::new();
        ch.channel_index = i as u8;
        ch.offset = start_offset + i as u64 * frame_size as u64;
        ch.channel_start_offset = ch.offset;

        if variant == AdxVariant::Fixed {
            ch.adpcm_coef[..8].copy_from_slice(&fixed_coef);
        }
        else {
            ch.adpcm_coef[0] = tunable_coef.0;
            ch.adpcm_coef[1] = tunable_coef.1;
        }

        if let Some(off) = hist_offset {
            ch.hist1 = reader.read_i16be_at(off + i as u64 * 4)? as i32;
            ch.hist2 = reader.read_i16be_at(off + i as u64 * 4 + 2)? as i32;
        }

        channel_states.push(ch);
    }

    if let Some(key) = encryption_key {
        let mut xor_state = key.xor;
        for ch in channel_states.iter_mut() {
            ch.adx_channels = channel_count;
            ch.adx_mult = key.mult;
            ch.adx_add = key.add;
            ch.adx_xor = xor_state;
            xor_state = vgsnd_codecs_adpcm::adx::adx_next_key(xor_state, key.mult, key.add);
        }
    }

    let codec = CodecKind::CriAdx(variant);
    let layout = if channel_count == 1 { LayoutKind::None } else { LayoutKind::Interleave };
    let codec_kernel = vgsnd_codecs_adpcm::kernel_for(codec, channel_count)
        .expect("CriAdx is always covered by vgsnd-codecs-adpcm");

    let stream = Stream::new(
        channel_count,
        sample_rate,
        num_samples,
        loop_range,
        codec,
        layout,
        "CRI ADX",
        frame_size,
        frame_size,
        channel_states,
        reader,
        codec_kernel,
        None,
    )?;

    Ok(ParseResult::Matched(Box::new(stream)))
}

fn read_loop_points(reader: &mut ByteReader, loops_offset: u64) -> Result<Option<LoopRange>> {
    let loop_flag = reader.read_u32be_at(loops_offset + 0x04)? != 0;
    if !loop_flag {
        return Ok(None);
    }
    let start = reader.read_u32be_at(loops_offset + 0x08)? as i64;
    let end = reader.read_u32be_at(loops_offset + 0x10)? as i64;
    if start >= end {
        return Ok(None);
    }
    Ok(Some(LoopRange { start, end }))
}

fn find_key(
    reader: &mut ByteReader,
    variant: AdxVariant,
    start_offset: u64,
    frame_size: u32,
    channel_count: u8,
) -> Result<Option<AdxKey>> {
    const MAX_FRAMES_SCANNED: u64 = 64;

    let mut scales = Vec::new();
    for k in 0..MAX_FRAMES_SCANNED {
        let offset = start_offset + k * channel_count as u64 * frame_size as u64;
        match reader.read_u16be_at(offset) {
            Ok(scale) => scales.push(scale),
            Err(_) => break,
        }
    }

    Ok(detect_key(variant, &scales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    fn build_minimal_adx(channels: u8, sample_rate: u32, num_samples: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x20];
        bytes[0x00] = 0x80;
        bytes[0x01] = 0x00;
        // start_offset - 4 = 0x20, so the u16 at +0x02 is 0x1C.
        bytes[0x02..0x04].copy_from_slice(&0x001Cu16.to_be_bytes());
        bytes[0x04] = 3; // standard
        bytes[0x05] = 0x12; // frame size
        bytes[0x06] = 4; // bits per sample
        bytes[0x07] = channels;
        bytes[0x08..0x0C].copy_from_slice(&sample_rate.to_be_bytes());
        bytes[0x0C..0x10].copy_from_slice(&num_samples.to_be_bytes());
        bytes[0x10..0x12].copy_from_slice(&500u16.to_be_bytes()); // cutoff
        bytes[0x12..0x14].copy_from_slice(&0x0500u16.to_be_bytes()); // version: no loop
        bytes[0x1A..0x1C].copy_from_slice(b"(c");
        bytes[0x1C..0x20].copy_from_slice(b")CRI");
        bytes
    }

    #[test]
    fn recognizes_a_minimal_mono_header() {
        let bytes = build_minimal_adx(1, 32000, 1000);
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::Matched(stream) => {
                let info = stream.describe();
                assert_eq!(info.channels, 1);
                assert_eq!(info.sample_rate, 32000);
                assert_eq!(info.num_samples, 1000);
            }
            ParseResult::NoMatch(_) => panic!("expected a match"),
        }
    }

    #[test]
    fn rejects_a_non_adx_signature() {
        let bytes = vec![0u8; 0x40];
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::NoMatch(_) => {}
            ParseResult::Matched(_) => panic!("expected no match"),
        }
    }

    #[test]
    fn rejects_a_truncated_buffer() {
        let bytes = vec![0x80u8, 0x00];
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::NoMatch(_) => {}
            ParseResult::Matched(_) => panic!("expected no match"),
        }
    }
}
