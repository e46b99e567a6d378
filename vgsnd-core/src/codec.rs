// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The codec identity enum.
//!
//! `CodecKind` ties `samples_per_frame`/`frame_size_bytes` to a single
//! lookup instead of switching on the codec at every call site. Concrete
//! per-sample decode lives in the
//! `vgsnd-codecs-*` crates; this enum is just the identity + the frame
//! geometry every layout driver needs regardless of which crate implements
//! the decode.

/// Identifies the sample decoder a [`crate::stream::Stream`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    /// CRI ADX, 5 sub-variants distinguished by `AdxVariant`.
    CriAdx(AdxVariant),
    /// Nintendo GameCube/Wii DSP ADPCM.
    NintendoDsp,
    /// Standard IMA ADPCM (WAV-style nibble order).
    ImaAdpcm,
    /// Microsoft ADPCM. `samples_per_block` is derived once at parse time
    /// from the container's `nBlockAlign`/channel count; `block_align`
    /// must equal the `Stream`'s `interleave` field so the generic
    /// interleave layout driver treats one whole block as one "frame".
    MsAdpcm { samples_per_block: u32, block_align: u32 },
    /// Sony PlayStation 4-bit ADPCM.
    PsxAdpcm,
    /// Electronic Arts EA-XA, version 1. `stereo` selects its two distinct
    /// framings: a 30-byte frame shared jointly by both channels (stereo),
    /// or a 15-byte frame decoded independently per channel (mono, or
    /// pre-split multichannel).
    EaXaV1 { stereo: bool },
    /// Electronic Arts EA-XA, version 2 (adds the 0xEE raw-PCM escape).
    /// Always a 15-byte frame decoded independently per channel.
    EaXaV2,
    /// Namco Siren14 (ITU G.722.1 Annex C derivative). `frame_size_bytes`
    /// is 40/60/120 depending on the container's declared bitrate.
    Siren14 { frame_size_bytes: u32 },
    /// Raw signed/unsigned PCM at a given bit depth, endianness and
    /// signedness are carried in `PcmFormat`.
    Pcm(PcmFormat),
    /// ITU-T G.711 mu-law.
    MuLaw,
    /// ITU-T G.711 a-law.
    ALaw,
    /// Squareroot-delta-exact (SDX2).
    Sdx2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxVariant {
    Standard,
    Exponential,
    Fixed,
    Enc8,
    Enc9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmFormat {
    U8,
    S16LE,
    S16BE,
    S24LE,
    S24BE,
    F32LE,
    F32BE,
}

impl CodecKind {
    /// Samples decoded per fixed-size frame, or `None` when the codec's
    /// frame geometry is header-driven and must be read from the stream
    /// (Siren14, MS-ADPCM's variable block size).
    pub fn samples_per_frame(&self) -> Option<u32> {
        match self {
            CodecKind::CriAdx(_) => Some(32),
            CodecKind::NintendoDsp => Some(14),
            // Flat, unblocked nibble stream: 2 samples (nibbles) per byte.
            CodecKind::ImaAdpcm => Some(2),
            CodecKind::PsxAdpcm => Some(28),
            CodecKind::EaXaV1 { .. } | CodecKind::EaXaV2 => Some(28),
            CodecKind::MsAdpcm { samples_per_block, .. } => Some(*samples_per_block),
            CodecKind::Siren14 { .. } => Some(640),
            CodecKind::Pcm(_) | CodecKind::MuLaw | CodecKind::ALaw | CodecKind::Sdx2 => Some(1),
        }
    }

    /// Frame size in bytes per channel, or `None` when header-driven.
    pub fn frame_size_bytes(&self) -> Option<u32> {
        match self {
            CodecKind::CriAdx(_) => Some(18),
            CodecKind::NintendoDsp => Some(8),
            CodecKind::ImaAdpcm => Some(1),
            CodecKind::PsxAdpcm => Some(16),
            CodecKind::EaXaV1 { stereo } => Some(if *stereo { 30 } else { 15 }),
            CodecKind::EaXaV2 => Some(15),
            CodecKind::MsAdpcm { block_align, .. } => Some(*block_align),
            CodecKind::Siren14 { frame_size_bytes } => Some(*frame_size_bytes),
            CodecKind::Pcm(fmt) => Some(fmt.bytes_per_sample()),
            CodecKind::MuLaw | CodecKind::ALaw => Some(1),
            CodecKind::Sdx2 => Some(1),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::CriAdx(AdxVariant::Standard) => "CRI ADX",
            CodecKind::CriAdx(AdxVariant::Exponential) => "CRI ADX (exponential)",
            CodecKind::CriAdx(AdxVariant::Fixed) => "CRI ADX (fixed coefficients)",
            CodecKind::CriAdx(AdxVariant::Enc8) => "CRI ADX (encrypted, type 8)",
            CodecKind::CriAdx(AdxVariant::Enc9) => "CRI ADX (encrypted, type 9)",
            CodecKind::NintendoDsp => "Nintendo GameCube/Wii DSP ADPCM",
            CodecKind::ImaAdpcm => "IMA ADPCM",
            CodecKind::MsAdpcm { .. } => "Microsoft ADPCM",
            CodecKind::PsxAdpcm => "Sony PSX ADPCM",
            CodecKind::EaXaV1 { .. } => "Electronic Arts EA-XA v1",
            CodecKind::EaXaV2 => "Electronic Arts EA-XA v2",
            CodecKind::Siren14 { .. } => "Namco Siren14",
            CodecKind::Pcm(_) => "PCM",
            CodecKind::MuLaw => "G.711 mu-law",
            CodecKind::ALaw => "G.711 a-law",
            CodecKind::Sdx2 => "SDX2",
        }
    }
}

/// The per-call contract every sample decoder in `vgsnd-codecs-*`
/// implements.
///
/// `first_sample` is the sample offset *into the current block/frame*, not
/// the stream position — the layout driver in [`crate::stream::Stream`]
/// computes it. Implementations write `samples_to_do` samples to
/// `out[0], out[out_stride], out[2*out_stride], ...` and update `ch`'s
/// histories so the next call resumes bit-exactly. Short reads at EOF
/// decode as silence; kernels never fail on EOF.
pub trait CodecKernel: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &self,
        ch: &mut crate::channel::ChannelState,
        source: &mut crate::io::ByteReader,
        out: &mut [i16],
        out_stride: usize,
        first_sample: u32,
        samples_to_do: u32,
    ) -> crate::errors::Result<()>;
}

impl PcmFormat {
    pub fn bytes_per_sample(&self) -> u32 {
        match self {
            PcmFormat::U8 => 1,
            PcmFormat::S16LE | PcmFormat::S16BE => 2,
            PcmFormat::S24LE | PcmFormat::S24BE => 3,
            PcmFormat::F32LE | PcmFormat::F32BE => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adx_frame_geometry_is_32_samples_per_18_byte_frame() {
        let c = CodecKind::CriAdx(AdxVariant::Standard);
        assert_eq!(c.samples_per_frame(), Some(32));
        assert_eq!(c.frame_size_bytes(), Some(18));
    }

    #[test]
    fn ms_adpcm_and_siren14_geometry_comes_from_the_stream_not_a_constant() {
        let ms = CodecKind::MsAdpcm { samples_per_block: 1012, block_align: 512 };
        assert_eq!(ms.samples_per_frame(), Some(1012));
        assert_eq!(ms.frame_size_bytes(), Some(512));

        let siren = CodecKind::Siren14 { frame_size_bytes: 120 };
        assert_eq!(siren.samples_per_frame(), Some(640));
        assert_eq!(siren.frame_size_bytes(), Some(120));
    }
}
