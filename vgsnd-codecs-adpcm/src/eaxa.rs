// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Electronic Arts EA-XA, versions 1 and 2.
//!
//! Both versions share the 20-entry coefficient/shift table; v1 adds a
//! `+128` rounding term to the predictor before its final shift that v2
//! omits, and only v2 recognizes the `0xEE` "raw PCM" frame escape. v1's
//! stereo framing shares one block between both channels (coefficient
//! index half from each channel's nibble of the header byte, sample data
//! alternating nibbles per channel within the same bytes) — handled here
//! with the same channel-0-decodes-both-columns approach as this crate's
//! `ms` module.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::CodecKernel;
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;

use crate::common::clamp16;

const TABLE: [i32; 20] = [0, 240, 460, 392, 0, 0, -208, -220, 0, 1, 3, 4, 7, 8, 10, 11, 0, -1, -3, -4];

pub const SAMPLES_PER_FRAME: u32 = 28;
pub const MONO_FRAME_SIZE: usize = 15;
pub const STEREO_FRAME_SIZE: usize = 30;

fn sign_extend_4(nibble: u8, shift: u32) -> i32 {
    (((nibble as i32) << 28) >> shift) as i32
}

/// EA-XA v1. `stereo` selects the 30-byte joint-block framing (set for a
/// two-channel stream) versus the 15-byte per-channel framing (mono, or
/// a layout that has already split channels into independent regions).
pub struct EaXaV1Kernel {
    pub stereo: bool,
}

impl CodecKernel for EaXaV1Kernel {
    fn decode(
        &self,
        ch: &mut ChannelState,
        source: &mut ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> Result<()> {
        if self.stereo {
            if ch.channel_index != 0 {
                return Ok(());
            }
            return decode_stereo_joint(ch, source, out, out_stride, first_sample, samples_to_do, true);
        }
        decode_mono(ch, source, out, out_stride, first_sample, samples_to_do, true)
    }
}

pub struct EaXaV2Kernel;

impl CodecKernel for EaXaV2Kernel {
    fn decode(
        &self,
        ch: &mut ChannelState,
        source: &mut ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> Result<()> {
        let frame_offset = ch.offset;
        let mut header = [0u8; 1];
        source.read_at(&mut header, frame_offset)?;

        if header[0] == 0xEE {
            let mut hist = [0u8; 4];
            source.read_at(&mut hist, frame_offset + 1)?;
            ch.hist1 = i16::from_be_bytes([hist[0], hist[1]]) as i32;
            ch.hist2 = i16::from_be_bytes([hist[2], hist[3]]) as i32;

            let intra = first_sample as usize;
            for i in 0..samples_to_do as usize {
                let mut sample = [0u8; 2];
                source.read_at(&mut sample, frame_offset + 5 + ((intra + i) * 2) as u64)?;
                out[i * out_stride] = i16::from_be_bytes(sample);
            }
            return Ok(());
        }

        decode_mono(ch, source, out, out_stride, first_sample, samples_to_do, false)
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_mono(
    ch: &mut ChannelState,
    source: &mut ByteReader,
    out: &mut [i16],
    out_stride: usize,
    first_sample: u32,
    samples_to_do: u32,
    add_rounding: bool,
) -> Result<()> {
    let frame_offset = ch.offset;
    let mut header = [0u8; 1];
    source.read_at(&mut header, frame_offset)?;

    let index = (header[0] >> 4) as usize;
    let coef1 = TABLE[index];
    let coef2 = TABLE[index + 4];
    let shift = (header[0] & 0x0F) as u32 + 8;

    let intra = first_sample as usize;
    let mut hist1 = ch.hist1;
    let mut hist2 = ch.hist2;

    for i in intra..intra + samples_to_do as usize {
        let mut byte = [0u8; 1];
        source.read_at(&mut byte, frame_offset + 1 + (i / 2) as u64)?;
        let nibble = if i % 2 == 0 { byte[0] >> 4 } else { byte[0] & 0x0F };

        let mut sample = sign_extend_4(nibble, shift);
        sample += coef1 * hist1 + coef2 * hist2;
        if add_rounding {
            sample += 128;
        }
        sample >>= 8;
        let sample = clamp16(sample);
        out[(i - intra) * out_stride] = sample;

        hist2 = hist1;
        hist1 = sample as i32;
    }

    ch.hist1 = hist1;
    ch.hist2 = hist2;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn decode_stereo_joint(
    ch: &mut ChannelState,
    source: &mut ByteReader,
    out: &mut [i16],
    out_stride: usize,
    first_sample: u32,
    samples_to_do: u32,
    add_rounding: bool,
) -> Result<()> {
    let block_offset = ch.offset;
    let mut header = [0u8; 2];
    source.read_at(&mut header, block_offset)?;

    let index0 = (header[0] >> 4) as usize;
    let index1 = (header[0] & 0x0F) as usize;
    let coef0 = (TABLE[index0], TABLE[index0 + 4]);
    let coef1 = (TABLE[index1], TABLE[index1 + 4]);
    let shift0 = (header[1] >> 4) as u32 + 8;
    let shift1 = (header[1] & 0x0F) as u32 + 8;

    let intra = first_sample as usize;
    let mut hist1_0 = ch.hist1;
    let mut hist2_0 = ch.hist2;
    let mut hist1_1 = ch.hist3;
    let mut hist2_1 = ch.hist4;

    for i in intra..intra + samples_to_do as usize {
        let mut byte = [0u8; 1];
        source.read_at(&mut byte, block_offset + 2 + i as u64)?;

        let n0 = byte[0] >> 4;
        let n1 = byte[0] & 0x0F;

        let mut s0 = sign_extend_4(n0, shift0);
        s0 += coef0.0 * hist1_0 + coef0.1 * hist2_0;
        if add_rounding {
            s0 += 128;
        }
        let s0 = clamp16(s0 >> 8);

        let mut s1 = sign_extend_4(n1, shift1);
        s1 += coef1.0 * hist1_1 + coef1.1 * hist2_1;
        if add_rounding {
            s1 += 128;
        }
        let s1 = clamp16(s1 >> 8);

        out[(i - intra) * out_stride] = s0;
        out[(i - intra) * out_stride + 1] = s1;

        hist2_0 = hist1_0;
        hist1_0 = s0 as i32;
        hist2_1 = hist1_1;
        hist1_1 = s1 as i32;
    }

    ch.hist1 = hist1_0;
    ch.hist2 = hist2_0;
    ch.hist3 = hist1_1;
    ch.hist4 = hist2_1;
    Ok(())
}
