// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw PCM, G.711 mu-law/a-law, and SDX2 codec kernels.
//!
//! These are the "every other kernel follows the same discipline" family:
//! one sample in, one sample out, no cross-frame block structure beyond a
//! running predictor for SDX2. `alaw_to_linear`/`mulaw_to_linear` implement
//! the standard G.711 decode tables.

mod sdx2;

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::{CodecKernel, CodecKind, PcmFormat};
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;

/// Builds the kernel implementing `codec`, or `None` if `codec` belongs to
/// a different `vgsnd-codecs-*` crate.
pub fn kernel_for(codec: CodecKind) -> Option<Box<dyn CodecKernel>> {
    match codec {
        CodecKind::Pcm(format) => Some(Box::new(PcmKernel { format })),
        CodecKind::MuLaw => Some(Box::new(MuLawKernel)),
        CodecKind::ALaw => Some(Box::new(ALawKernel)),
        CodecKind::Sdx2 => Some(Box::new(sdx2::Sdx2Kernel)),
        _ => None,
    }
}

fn clamp16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Raw PCM at a fixed bit depth/endianness/signedness. One sample occupies
/// exactly `format.bytes_per_sample()` bytes per channel; there is no block
/// structure, so `ch.offset` already points at this channel's first sample
/// and samples are simply consecutive.
pub struct PcmKernel {
    pub format: PcmFormat,
}

impl CodecKernel for PcmKernel {
    fn decode(
        &self,
        ch: &mut ChannelState,
        source: &mut ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> Result<()> {
        let width = self.format.bytes_per_sample() as u64;
        let base = ch.offset + first_sample as u64 * width;

        for i in 0..samples_to_do as u64 {
            let offset = base + i * width;
            let sample = match self.format {
                PcmFormat::U8 => {
                    let mut b = [0u8; 1];
                    source.read_at(&mut b, offset)?;
                    ((b[0] as i16) - 128) << 8
                }
                PcmFormat::S16LE => {
                    let mut b = [0u8; 2];
                    source.read_at(&mut b, offset)?;
                    i16::from_le_bytes(b)
                }
                PcmFormat::S16BE => {
                    let mut b = [0u8; 2];
                    source.read_at(&mut b, offset)?;
                    i16::from_be_bytes(b)
                }
                PcmFormat::S24LE => {
                    let mut b = [0u8; 3];
                    source.read_at(&mut b, offset)?;
                    let v = i32::from_le_bytes([0, b[0], b[1], b[2]]);
                    let v = v.wrapping_shl(8).wrapping_shr(8); // sign-extend 24 -> 32
                    clamp16(v >> 8)
                }
                PcmFormat::S24BE => {
                    let mut b = [0u8; 3];
                    source.read_at(&mut b, offset)?;
                    let v = i32::from_be_bytes([b[0], b[1], b[2], 0]);
                    clamp16(v >> 16)
                }
                PcmFormat::F32LE => {
                    let mut b = [0u8; 4];
                    source.read_at(&mut b, offset)?;
                    float_to_i16(f32::from_le_bytes(b))
                }
                PcmFormat::F32BE => {
                    let mut b = [0u8; 4];
                    source.read_at(&mut b, offset)?;
                    float_to_i16(f32::from_be_bytes(b))
                }
            };
            out[i as usize * out_stride] = sample;
        }

        Ok(())
    }
}

fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

const XLAW_QUANT_MASK: u8 = 0x0f;
const XLAW_SEG_MASK: u8 = 0x70;
const XLAW_SEG_SHIFT: u32 = 4;

// Adaptation of alaw2linear from g711.c by SUN Microsystems (unrestricted
// use license).
fn alaw_to_linear(mut a_val: u8) -> i16 {
    a_val ^= 0x55;

    let mut t = i16::from((a_val & XLAW_QUANT_MASK) << 4);
    let seg = (a_val & XLAW_SEG_MASK) >> XLAW_SEG_SHIFT;

    match seg {
        0 => t += 0x8,
        1 => t += 0x108,
        _ => t = (t + 0x108) << (seg - 1),
    }

    if a_val & 0x80 == 0x80 {
        t
    }
    else {
        -t
    }
}

// Adaptation of ulaw2linear from g711.c by SUN Microsystems.
fn mulaw_to_linear(mut mu_val: u8) -> i16 {
    const BIAS: i16 = 0x84;

    mu_val = !mu_val;

    let mut t = i16::from((mu_val & XLAW_QUANT_MASK) << 3) + BIAS;
    t <<= (mu_val & XLAW_SEG_MASK) >> XLAW_SEG_SHIFT;

    if mu_val & 0x80 == 0x80 {
        t - BIAS
    }
    else {
        BIAS - t
    }
}

pub struct MuLawKernel;

impl CodecKernel for MuLawKernel {
    fn decode(
        &self,
        ch: &mut ChannelState,
        source: &mut ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> Result<()> {
        let base = ch.offset + first_sample as u64;
        for i in 0..samples_to_do as u64 {
            let mut b = [0u8; 1];
            source.read_at(&mut b, base + i)?;
            out[i as usize * out_stride] = mulaw_to_linear(b[0]);
        }
        Ok(())
    }
}

pub struct ALawKernel;

impl CodecKernel for ALawKernel {
    fn decode(
        &self,
        ch: &mut ChannelState,
        source: &mut ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> Result<()> {
        let base = ch.offset + first_sample as u64;
        for i in 0..samples_to_do as u64 {
            let mut b = [0u8; 1];
            source.read_at(&mut b, base + i)?;
            out[i as usize * out_stride] = alaw_to_linear(b[0]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    #[test]
    fn s16le_round_trips_through_the_kernel() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&1234i16.to_le_bytes());
        frame.extend_from_slice(&(-9876i16).to_le_bytes());
        let mut source = ByteReader::new(Box::new(SliceIo::new(frame)));
        let mut ch = ChannelState::new();

        let kernel = PcmKernel { format: PcmFormat::S16LE };
        let mut out = [0i16; 2];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 2).unwrap();
        assert_eq!(out, [1234, -9876]);
    }

    #[test]
    fn u8_centers_on_128() {
        let frame = vec![128u8, 255u8, 0u8];
        let mut source = ByteReader::new(Box::new(SliceIo::new(frame)));
        let mut ch = ChannelState::new();

        let kernel = PcmKernel { format: PcmFormat::U8 };
        let mut out = [0i16; 3];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 3).unwrap();
        assert_eq!(out, [0, 127 << 8, -128 << 8]);
    }

    #[test]
    fn mulaw_silence_byte_decodes_near_zero() {
        let frame = vec![0xFFu8];
        let mut source = ByteReader::new(Box::new(SliceIo::new(frame)));
        let mut ch = ChannelState::new();

        let kernel = MuLawKernel;
        let mut out = [1i16; 1];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 1).unwrap();
        assert!(out[0].abs() < 16);
    }

    #[test]
    fn alaw_silence_byte_decodes_near_zero() {
        let frame = vec![0xD5u8];
        let mut source = ByteReader::new(Box::new(SliceIo::new(frame)));
        let mut ch = ChannelState::new();

        let kernel = ALawKernel;
        let mut out = [1i16; 1];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 1).unwrap();
        assert!(out[0].abs() < 16);
    }

    #[test]
    fn kernel_for_covers_every_codec_this_crate_owns() {
        assert!(kernel_for(CodecKind::Pcm(PcmFormat::S16LE)).is_some());
        assert!(kernel_for(CodecKind::MuLaw).is_some());
        assert!(kernel_for(CodecKind::ALaw).is_some());
        assert!(kernel_for(CodecKind::Sdx2).is_some());
    }

    #[test]
    fn kernel_for_rejects_foreign_codecs() {
        assert!(kernel_for(CodecKind::NintendoDsp).is_none());
    }
}
