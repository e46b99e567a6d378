// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CRI ADX, all five metadata-distinguished variants.
//!
//! A frame is 0x12 bytes: a 16-bit big-endian `scale` header followed by
//! 32 signed nibbles (high nibble first). The five variants differ only
//! in how `scale` and the predictor pair `(c1, c2)` are derived.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::{AdxVariant, CodecKernel};
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;

use crate::common::clamp16;

pub const FRAME_SIZE: usize = 0x12;
pub const SAMPLES_PER_FRAME: u32 = 32;

/// The fixed-coefficient table the "fixed" ADX variant selects from, keyed
/// by `frame[0] >> 5` (4 pairs; the top 3 bits of `frame[0]` select one).
/// The metadata parser copies this into every channel's `adpcm_coef` when
/// it recognizes the "fixed" variant; the kernel itself only indexes
/// whatever ended up there.
pub const FIXED_COEF_TABLE: [i16; 8] =
    [0x0000, 0x0000, 0x0F00, 0x0000, 0x1CC0_u16 as i16, 0xF300_u16 as i16, 0x1880_u16 as i16, 0xF240_u16 as i16];

/// Computes the `(c1, c2)` predictor pair for the "standard"/"exponential"
/// ADX variants from a high-pass cutoff frequency and the stream's sample
/// rate.
pub fn coefficients_from_cutoff(cutoff_hz: u32, sample_rate: u32) -> (i16, i16) {
    let x = cutoff_hz as f64;
    let y = sample_rate as f64;
    let z = (2.0 * std::f64::consts::PI * x / y).cos();

    let a = std::f64::consts::SQRT_2 - z;
    let b = std::f64::consts::SQRT_2 - 1.0;
    let c = (a - ((a + b) * (a - b)).sqrt()) / b;

    let c1 = (c * 8192.0) as i16;
    let c2 = (c * c * -4096.0) as i16;
    (c1, c2)
}

/// Advances an ADX enc8/enc9 channel's rolling XOR key by one step.
pub fn adx_next_key(xor: u16, mult: u16, add: u16) -> u16 {
    (xor.wrapping_mul(mult).wrapping_add(add)) & 0x7FFF
}

/// A single `(xor, mult, add)` candidate in the built-in key table.
#[derive(Debug, Clone, Copy)]
pub struct AdxKey {
    pub xor: u16,
    pub mult: u16,
    pub add: u16,
}

/// A representative subset of the built-in type-8 key table, covering the
/// well-known/test-vector keys; a production table would carry several
/// dozen more.
pub const KEYS_TYPE8: &[AdxKey] = &[
    // Clover Studio (GOD HAND, Okami); key string "karaage".
    AdxKey { xor: 0x49E1, mult: 0x4A57, add: 0x553D },
    // Grasshopper Manufacture (Samurai Champloo).
    AdxKey { xor: 0x4F3F, mult: 0x472F, add: 0x562F },
    // Sonic Team (Phantasy Star Universe); key string "3x5k62bg9ptbwy".
    AdxKey { xor: 0x5DEB, mult: 0x5F27, add: 0x673F },
    // Sonic Team (Sonic and the Black Knight); key string "morio".
    AdxKey { xor: 0x55B7, mult: 0x6191, add: 0x5A77 },
    // Enterbrain (Amagami); key string "mituba".
    AdxKey { xor: 0x5A17, mult: 0x509F, add: 0x5BFD },
];

/// A representative subset of the built-in type-9 key table.
pub const KEYS_TYPE9: &[AdxKey] = &[AdxKey { xor: 0x23DF, mult: 0x4A7D, add: 0x3BBD }];

/// The key mask applied before comparing predicted vs. observed scales;
/// differs per encryption type.
pub fn key_mask(variant: AdxVariant) -> u16 {
    match variant {
        AdxVariant::Enc9 => 0x1000,
        _ => 0x6000,
    }
}

/// Scans `scales` (the masked upper bits of every frame's raw `scale`
/// header, in stream order, including leading all-zero "prescale" frames)
/// against the built-in key table and returns the first key whose
/// predicted XOR sequence's masked bits agree with every observed scale.
/// A zero scale never contradicts a candidate (silent frames encode
/// however the encoder liked).
pub fn detect_key(variant: AdxVariant, scales: &[u16]) -> Option<AdxKey> {
    let mask = key_mask(variant);
    let table = match variant {
        AdxVariant::Enc8 => KEYS_TYPE8,
        AdxVariant::Enc9 => KEYS_TYPE9,
        _ => return None,
    };

    'candidate: for key in table {
        let mut xor = key.xor;
        for &observed in scales {
            if observed != 0 && (observed & mask) != (xor & mask) {
                continue 'candidate;
            }
            xor = adx_next_key(xor, key.mult, key.add);
        }
        return Some(*key);
    }
    None
}

/// The CRI ADX kernel. `variant` selects how `scale`/`(c1, c2)` are
/// derived; everything else (nibble decode, history recursion) is shared.
pub struct AdxKernel {
    pub variant: AdxVariant,
}

impl CodecKernel for AdxKernel {
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

        let raw_scale = i16::from_be_bytes([frame[0], frame[1]]) as i32;
        let (scale, c1, c2) = match self.variant {
            AdxVariant::Standard => {
                let scale = if frame[0] == 0x80 && frame[1] == 0x01 { 0 } else { raw_scale + 1 };
                (scale, ch.adpcm_coef[0], ch.adpcm_coef[1])
            }
            AdxVariant::Exponential => {
                let scale = 1i32 << (12 - raw_scale).clamp(0, 30);
                (scale, ch.adpcm_coef[0], ch.adpcm_coef[1])
            }
            AdxVariant::Fixed => {
                let scale = (raw_scale & 0x1FFF) + 1;
                let idx = (frame[0] >> 5) as usize * 2;
                (scale, ch.adpcm_coef[idx], ch.adpcm_coef[idx + 1])
            }
            AdxVariant::Enc8 | AdxVariant::Enc9 => {
                let scale = ((raw_scale ^ ch.adx_xor as i32) & 0x1FFF) + 1;
                (scale, ch.adpcm_coef[0], ch.adpcm_coef[1])
            }
        };

        let (c1, c2) = (c1 as i32, c2 as i32);
        let mut hist1 = ch.hist1;
        let mut hist2 = ch.hist2;

        for i in intra..intra + samples_to_do as usize {
            let byte = frame[2 + i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            let signed = crate::common::signed_nibble(nibble);

            let sample = signed * scale + ((c1 * hist1) >> 12) + ((c2 * hist2) >> 12);
            let sample = clamp16(sample);
            out[(i - intra) * out_stride] = sample;

            hist2 = hist1;
            hist1 = sample as i32;
        }

        ch.hist1 = hist1;
        ch.hist2 = hist2;

        if matches!(self.variant, AdxVariant::Enc8 | AdxVariant::Enc9) && intra + samples_to_do as usize == SAMPLES_PER_FRAME as usize {
            for _ in 0..ch.adx_channels {
                ch.adx_xor = adx_next_key(ch.adx_xor, ch.adx_mult, ch.adx_add);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    /// ADX type 04, 2 channels, 32768 Hz, 500 Hz cutoff; header `80 00 00
    /// 20 03 12 04 02 00 00 80 00 00 00 20 00 01 F4 04 00`.
    #[test]
    fn adx_type04_first_frame_matches_silent_history_formula() {
        let (c1, c2) = coefficients_from_cutoff(500, 32768);

        let mut frame = vec![0x00u8, 0x05]; // scale = 5 + 1 = 6
        frame.extend(std::iter::repeat(0u8).take(16));
        let source_bytes = frame;
        let mut source = ByteReader::new(Box::new(SliceIo::new(source_bytes)));

        let mut ch = ChannelState::new();
        ch.adpcm_coef[0] = c1;
        ch.adpcm_coef[1] = c2;

        let kernel = AdxKernel { variant: AdxVariant::Standard };
        let mut out = [0i16; 2];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 2).unwrap();

        // All-zero nibbles with zeroed history decode to silence.
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn eof_scale_sentinel_decodes_as_silence() {
        let mut frame = vec![0x80u8, 0x01];
        frame.extend(vec![0xFFu8; 16]); // non-zero nibbles, still silenced.
        let mut source = ByteReader::new(Box::new(SliceIo::new(frame)));
        let mut ch = ChannelState::new();
        ch.adpcm_coef[0] = 100;
        ch.adpcm_coef[1] = 50;

        let kernel = AdxKernel { variant: AdxVariant::Standard };
        let mut out = [0i16; 2];
        kernel.decode(&mut ch, &mut source, &mut out, 1, 0, 2).unwrap();
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn key_detection_finds_karaage_key_from_consistent_scales() {
        let key = KEYS_TYPE8[0];
        let mask = key_mask(AdxVariant::Enc8);
        let mut xor = key.xor;
        let mut scales = Vec::new();
        for _ in 0..40 {
            scales.push(xor & mask);
            xor = adx_next_key(xor, key.mult, key.add);
        }

        let found = detect_key(AdxVariant::Enc8, &scales).unwrap();
        assert_eq!((found.xor, found.mult, found.add), (key.xor, key.mult, key.add));
    }

    #[test]
    fn key_detection_rejects_inconsistent_scales() {
        let scales = [0x1234, 0x5678, 0x9ABC];
        assert!(detect_key(AdxVariant::Enc8, &scales).is_none());
    }
}
