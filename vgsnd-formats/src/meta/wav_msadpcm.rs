// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RIFF/WAVE container metadata, covering `WAVE_FORMAT_PCM` (1),
//! `WAVE_FORMAT_ADPCM` (2, Microsoft ADPCM) and `WAVE_FORMAT_IMA_ADPCM`
//! (17/0x11).
//!
//! `RIFF` + `WAVE` form, then a flat chunk walk for `fmt `, `fact`, and
//! `data`, adapted to this crate's random-access [`ByteReader`] instead of
//! a forward-only stream reader. WAVE's `fmt `/`data` layout is the public
//! Microsoft/IBM RIFF standard, read directly against that published
//! layout. MS-ADPCM's `cbSize`-extension fields (`wSamplesPerBlock`, the
//! coefficient table) are resolved here so the codec kernel receives them
//! already parsed rather than re-reading the container itself.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::{CodecKind, PcmFormat};
use vgsnd_core::dispatch::ParseResult;
use vgsnd_core::errors::{invalid_error, truncated_error, Result};
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::LayoutKind;
use vgsnd_core::stream::{LoopRange, Stream};

const RIFF_MAGIC: u32 = 0x5249_4646; // "RIFF"
const WAVE_FORM: u32 = 0x5741_5645; // "WAVE"
const CHUNK_FMT: u32 = 0x666D_7420; // "fmt "
const CHUNK_FACT: u32 = 0x6661_6374; // "fact"
const CHUNK_DATA: u32 = 0x6461_7461; // "data"

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_ADPCM: u16 = 0x0002;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
const WAVE_FORMAT_IMA_ADPCM: u16 = 0x0011;

struct FmtChunk {
    format_tag: u16,
    channels: u8,
    sample_rate: u32,
    bits_per_sample: u16,
    block_align: u32,
    samples_per_block: u32,
}

pub fn try_parse(mut reader: ByteReader) -> Result<ParseResult> {
    if reader.len() < 12 || reader.read_u32be_at(0x00)? != RIFF_MAGIC {
        return Ok(ParseResult::NoMatch(reader));
    }
    if reader.read_u32be_at(0x08)? != WAVE_FORM {
        return Ok(ParseResult::NoMatch(reader));
    }

    let riff_len = reader.read_u32le_at(0x04)? as u64;
    let end = if riff_len > 4 { (8 + riff_len - 4).min(reader.len()) } else { reader.len() };

    let mut offset = 12u64;
    let mut fmt: Option<FmtChunk> = None;
    let mut fact_samples: Option<u32> = None;
    let mut data_offset: Option<u64> = None;
    let mut data_size: Option<u64> = None;

    while offset + 8 <= end {
        let chunk_id = reader.read_u32be_at(offset)?;
        let chunk_size = reader.read_u32le_at(offset + 4)? as u64;
        let body = offset + 8;

        match chunk_id {
            CHUNK_FMT => fmt = Some(read_fmt_chunk(&mut reader, body, chunk_size)?),
            CHUNK_FACT => {
                if chunk_size >= 4 {
                    fact_samples = Some(reader.read_u32le_at(body)?);
                }
            }
            CHUNK_DATA => {
                data_offset = Some(body);
                data_size = Some(chunk_size);
            }
            _ => {}
        }

        // RIFF chunks are word-aligned; a chunk with an odd size is
        // followed by one byte of padding before the next chunk header.
        offset = body + chunk_size + (chunk_size & 1);
    }

    let Some(fmt) = fmt else {
        return Ok(ParseResult::NoMatch(reader));
    };
    let Some(data_offset) = data_offset else {
        return Ok(ParseResult::NoMatch(reader));
    };
    let data_size = data_size.unwrap_or(0);

    if fmt.channels == 0 {
        return invalid_error("WAVE channel count is zero");
    }

    let codec = match fmt.format_tag {
        WAVE_FORMAT_PCM => match fmt.bits_per_sample {
            8 => CodecKind::Pcm(PcmFormat::U8),
            16 => CodecKind::Pcm(PcmFormat::S16LE),
            24 => CodecKind::Pcm(PcmFormat::S24LE),
            _ => return Ok(ParseResult::NoMatch(reader)),
        },
        WAVE_FORMAT_IEEE_FLOAT if fmt.bits_per_sample == 32 => CodecKind::Pcm(PcmFormat::F32LE),
        WAVE_FORMAT_ADPCM => {
            if fmt.block_align == 0 || fmt.samples_per_block == 0 {
                return invalid_error("WAVE MS-ADPCM block geometry is zero");
            }
            CodecKind::MsAdpcm { samples_per_block: fmt.samples_per_block, block_align: fmt.block_align }
        }
        WAVE_FORMAT_IMA_ADPCM => CodecKind::ImaAdpcm,
        _ => return Ok(ParseResult::NoMatch(reader)),
    };

    let bytes_per_frame = match codec {
        CodecKind::Pcm(format) => format.bytes_per_sample() as u64 * fmt.channels as u64,
        CodecKind::MsAdpcm { block_align, .. } => block_align as u64,
        CodecKind::ImaAdpcm => 1,
        _ => 1,
    };

    let num_samples = match codec {
        CodecKind::Pcm(_) => (data_size / bytes_per_frame.max(1)) as i64,
        CodecKind::MsAdpcm { samples_per_block, block_align } => {
            let blocks = data_size / block_align.max(1) as u64;
            fact_samples.map(|s| s as i64).unwrap_or((blocks * samples_per_block as u64) as i64)
        }
        CodecKind::ImaAdpcm => fact_samples
            .map(|s| s as i64)
            .unwrap_or(((data_size * 2) / fmt.channels.max(1) as u64) as i64),
        _ => 0,
    };

    let channels = fmt.channels as usize;
    let mut channel_states = Vec::with_capacity(channels);

    match codec {
        CodecKind::MsAdpcm { .. } => {
            // MS-ADPCM's block header/nibble stream interleaves every
            // channel's data in the same bytes (see `ms::MsAdpcmKernel`),
            // so every channel starts at the same block offset.
            for i in 0..channels {
                let mut ch = ChannelState::new();
                ch.channel_index = i as u8;
                ch.offset = data_offset;
                ch.channel_start_offset = data_offset;
                channel_states.push(ch);
            }
        }
        CodecKind::ImaAdpcm => {
            // A flat, header-less nibble stream (see `ima::ImaKernel`);
            // this crate doesn't track WAVE_FORMAT_IMA_ADPCM's own
            // per-block reset headers, so only the container's initial
            // predictor state (implicitly zero) is used.
            let interleave = (data_size / channels.max(1) as u64) as u32;
            for i in 0..channels {
                let mut ch = ChannelState::new();
                ch.channel_index = i as u8;
                ch.offset = data_offset + i as u64 * interleave as u64;
                ch.channel_start_offset = ch.offset;
                channel_states.push(ch);
            }
        }
        _ => {
            for i in 0..channels {
                let mut ch = ChannelState::new();
                ch.channel_index = i as u8;
                ch.offset = data_offset + i as u64 * bytes_per_frame_for_pcm_channel(&codec);
                ch.channel_start_offset = ch.offset;
                channel_states.push(ch);
            }
        }
    }

    let codec_kernel = vgsnd_codecs_adpcm::kernel_for(codec, fmt.channels)
        .or_else(|| vgsnd_codecs_pcm::kernel_for(codec))
        .ok_or(vgsnd_core::errors::VgsndError::Unsupported(
            vgsnd_core::errors::UnsupportedKind::Codec,
            "WAVE codec",
        ))?;

    let interleave = match codec {
        CodecKind::MsAdpcm { block_align, .. } => block_align,
        CodecKind::Pcm(format) => format.bytes_per_sample(),
        CodecKind::ImaAdpcm => (data_size / channels.max(1) as u64) as u32,
        _ => bytes_per_frame as u32,
    };

    let loop_range: Option<LoopRange> = None;

    let stream = Stream::new(
        fmt.channels,
        fmt.sample_rate,
        num_samples,
        loop_range,
        codec,
        LayoutKind::Interleave,
        "RIFF WAVE",
        interleave,
        interleave,
        channel_states,
        reader,
        codec_kernel,
        None,
    )?;

    Ok(ParseResult::Matched(Box::new(stream)))
}

fn bytes_per_frame_for_pcm_channel(codec: &CodecKind) -> u64 {
    match codec {
        CodecKind::Pcm(format) => format.bytes_per_sample() as u64,
        _ => 1,
    }
}

fn read_fmt_chunk(reader: &mut ByteReader, offset: u64, size: u64) -> Result<FmtChunk> {
    if size < 16 {
        return truncated_error("WAVE fmt chunk shorter than the minimum PCMWAVEFORMAT");
    }

    let format_tag = reader.read_u16le_at(offset)?;
    let channels = reader.read_u16le_at(offset + 2)? as u8;
    let sample_rate = reader.read_u32le_at(offset + 4)?;
    let block_align = reader.read_u16le_at(offset + 12)? as u32;
    let bits_per_sample = reader.read_u16le_at(offset + 14)?;

    let samples_per_block = if format_tag == WAVE_FORMAT_ADPCM && size >= 20 {
        reader.read_u16le_at(offset + 18)? as u32
    }
    else {
        0
    };

    Ok(FmtChunk { format_tag, channels, sample_rate, bits_per_sample, block_align, samples_per_block })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    fn push_chunk(bytes: &mut Vec<u8>, id: &[u8; 4], body: &[u8]) {
        bytes.extend_from_slice(id);
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(body);
        if body.len() % 2 == 1 {
            bytes.push(0);
        }
    }

    fn build_pcm16_wav(channels: u16, sample_rate: u32, frames: u32) -> Vec<u8> {
        let mut fmt_body = Vec::new();
        fmt_body.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        fmt_body.extend_from_slice(&channels.to_le_bytes());
        fmt_body.extend_from_slice(&sample_rate.to_le_bytes());
        fmt_body.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes()); // byte rate
        fmt_body.extend_from_slice(&(channels * 2).to_le_bytes()); // block align
        fmt_body.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        let data_body = vec![0u8; (frames * channels as u32 * 2) as usize];

        let mut riff_body = Vec::new();
        riff_body.extend_from_slice(b"WAVE");
        push_chunk(&mut riff_body, b"fmt ", &fmt_body);
        push_chunk(&mut riff_body, b"data", &data_body);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(riff_body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&riff_body);
        bytes
    }

    fn build_ms_adpcm_wav(channels: u16, block_align: u16, samples_per_block: u16, blocks: u32) -> Vec<u8> {
        let mut fmt_body = Vec::new();
        fmt_body.extend_from_slice(&WAVE_FORMAT_ADPCM.to_le_bytes());
        fmt_body.extend_from_slice(&channels.to_le_bytes());
        fmt_body.extend_from_slice(&22050u32.to_le_bytes());
        fmt_body.extend_from_slice(&0u32.to_le_bytes());
        fmt_body.extend_from_slice(&block_align.to_le_bytes());
        fmt_body.extend_from_slice(&4u16.to_le_bytes()); // bits per sample
        fmt_body.extend_from_slice(&2u16.to_le_bytes()); // cbSize
        fmt_body.extend_from_slice(&samples_per_block.to_le_bytes());

        let data_body = vec![0u8; block_align as usize * blocks as usize];

        let mut riff_body = Vec::new();
        riff_body.extend_from_slice(b"WAVE");
        push_chunk(&mut riff_body, b"fmt ", &fmt_body);
        push_chunk(&mut riff_body, b"data", &data_body);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(riff_body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&riff_body);
        bytes
    }

    #[test]
    fn recognizes_a_minimal_stereo_pcm16_wav() {
        let bytes = build_pcm16_wav(2, 44100, 1000);
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::Matched(stream) => {
                let info = stream.describe();
                assert_eq!(info.channels, 2);
                assert_eq!(info.sample_rate, 44100);
                assert_eq!(info.num_samples, 1000);
            }
            ParseResult::NoMatch(_) => panic!("expected a match"),
        }
    }

    #[test]
    fn recognizes_a_minimal_mono_ms_adpcm_wav() {
        let bytes = build_ms_adpcm_wav(1, 256, 500, 4);
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        match try_parse(reader).unwrap() {
            ParseResult::Matched(stream) => {
                let info = stream.describe();
                assert_eq!(info.channels, 1);
                assert_eq!(info.num_samples, 2000);
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
    fn rejects_zero_block_geometry_for_ms_adpcm() {
        let bytes = build_ms_adpcm_wav(1, 256, 0, 4);
        let reader = ByteReader::new(Box::new(SliceIo::new(bytes)));
        assert!(try_parse(reader).is_err());
    }
}
