// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sony PlayStation 4-bit ADPCM ("VAG"/PS-ADPCM).
//!
//! A 16-byte frame: `shift`/`filter` header byte, a loop-flag byte, then
//! 28 signed nibbles (low nibble first). The flag byte's documented
//! values (`0x06` loop start, `0x03`/`0x01` loop end) are exposed here as
//! [`scan_loop_points`] for containers (XVAG) that carry no explicit loop
//! metadata of their own and fall back to scanning the PCM data itself.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::CodecKernel;
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;

use crate::common::{clamp16, nibble_low_first, signed_nibble};

pub const FRAME_SIZE: usize = 16;
pub const SAMPLES_PER_FRAME: u32 = 28;

const COEF_TABLE: [(i32, i32); 5] = [(0, 0), (60, 0), (115, -52), (98, -55), (122, -60)];

const FLAG_LOOP_START: u8 = 0x06;
const FLAG_LOOP_END: u8 = 0x03;
const FLAG_LOOP_END_ALT: u8 = 0x01;

pub struct PsxKernel;

impl CodecKernel for PsxKernel {
    fn decode(
        &self,
        ch: &mut ChannelState,
        source: &mut ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> Result<()> {
        let frame_index = (first_sample / SAMPLES_PER_FRAME) as u64;
        let intra = (first_sample % SAMPLES_PER_FRAME) as usize;
        let frame_offset = ch.offset + frame_index * FRAME_SIZE as u64;

        let mut frame = [0u8; FRAME_SIZE];
        source.read_at(&mut frame, frame_offset)?;

        let shift = (frame[0] & 0x0F) as i32;
        let filter = ((frame[0] >> 4) as usize).min(COEF_TABLE.len() - 1);
        let (c1, c2) = COEF_TABLE[filter];

        let mut hist1 = ch.hist1;
        let mut hist2 = ch.hist2;

        for i in intra..intra + samples_to_do as usize {
            let nibble = nibble_low_first(&frame[2..], i);
            let signed = signed_nibble(nibble);

            let mut sample = (signed << 12) >> shift;
            sample += (c1 * hist1 + c2 * hist2) >> 6;
            let sample = clamp16(sample);
            out[(i - intra) * out_stride] = sample;

            hist2 = hist1;
            hist1 = sample as i32;
        }

        ch.hist1 = hist1;
        ch.hist2 = hist2;
        Ok(())
    }
}

/// Scans every frame's flag byte in `source` (channel 0 only, `num_frames`
/// frames starting at `channel_start_offset`) for PS-ADPCM's loop-start
/// (`0x06`) and loop-end (`0x03`/`0x01`) markers, returning
/// `(loop_start_frame, loop_end_frame)` if both were found in order.
///
/// A stream whose very last frame's
/// flag byte is `0x00` is treated as non-looping even if an earlier frame
/// carried a stray loop marker, since some encoders leave marker bytes set
/// from a source file without intending the derived stream to loop.
pub fn scan_loop_points(
    source: &mut ByteReader,
    channel_start_offset: u64,
    num_frames: u64,
) -> Result<Option<(u32, u32)>> {
    if num_frames == 0 {
        return Ok(None);
    }

    let last_flag = source.read_u8_at(channel_start_offset + (num_frames - 1) * FRAME_SIZE as u64 + 1)?;
    if last_flag == 0x00 {
        return Ok(None);
    }

    let mut loop_start = None;
    let mut loop_end = None;
    for frame in 0..num_frames {
        let flag = source.read_u8_at(channel_start_offset + frame * FRAME_SIZE as u64 + 1)?;
        if flag == FLAG_LOOP_START && loop_start.is_none() {
            loop_start = Some(frame as u32);
        }
        if (flag == FLAG_LOOP_END || flag == FLAG_LOOP_END_ALT) && loop_start.is_some() && loop_end.is_none() {
            loop_end = Some(frame as u32);
        }
    }

    match (loop_start, loop_end) {
        (Some(s), Some(e)) => Ok(Some((s, e))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    #[test]
    fn silent_frame_with_filter_zero_stays_silent() {
        let frame = vec![0u8; FRAME_SIZE]; // shift 0, filter 0, all-zero nibbles
        let mut source = ByteReader::new(Box::new(SliceIo::new(frame)));
        let mut ch = ChannelState::new();

        let kernel = PsxKernel;
        let mut out = [1i16; 4];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 4).unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn loop_points_detected_from_flag_bytes() {
        let num_frames = 4u64;
        let mut bytes = vec![0u8; FRAME_SIZE * num_frames as usize];
        bytes[1] = 0x00; // frame 0: no flag
        bytes[FRAME_SIZE + 1] = FLAG_LOOP_START; // frame 1: loop start
        bytes[FRAME_SIZE * 3 + 1] = FLAG_LOOP_END_ALT; // frame 3: loop end

        let mut source = ByteReader::new(Box::new(SliceIo::new(bytes)));
        let result = scan_loop_points(&mut source, 0, num_frames).unwrap();
        assert_eq!(result, Some((1, 3)));
    }

    #[test]
    fn trailing_zero_flag_suppresses_detection() {
        let num_frames = 2u64;
        let mut bytes = vec![0u8; FRAME_SIZE * num_frames as usize];
        bytes[1] = FLAG_LOOP_START;
        bytes[FRAME_SIZE + 1] = 0x00; // last frame's flag is 0 -> no loop

        let mut source = ByteReader::new(Box::new(SliceIo::new(bytes)));
        let result = scan_loop_points(&mut source, 0, num_frames).unwrap();
        assert_eq!(result, None);
    }
}
