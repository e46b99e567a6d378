// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel decode state.
//!
//! [`ChannelState`] is fixed-size (no heap allocation) so that a loop
//! snapshot is a plain `Clone`, not a managed resource. Every codec kernel
//! takes `&mut ChannelState` explicitly; nothing here is shared between
//! channels or aliased.

/// Decode state private to one channel of one [`crate::stream::Stream`].
#[derive(Debug, Clone, Copy)]
pub struct ChannelState {
    /// Next read position in the byte source for this channel.
    pub offset: u64,
    /// First sample's offset for this channel; the restore target for a
    /// seek to the very start of the stream.
    pub channel_start_offset: u64,

    /// ADPCM predictor histories (DSP/MS-ADPCM use 2, VADPCM up to 2 of a
    /// deeper per-codebook history; Level-5 0x555 uses its own table below).
    /// Stereo MS-ADPCM's joint block decode (see `vgsnd-codecs-adpcm`'s
    /// `ms` module) repurposes `hist3`/`hist4` as channel 1's history and
    /// `adpcm_step_index` as channel 1's scale, since only channel 0's
    /// `ChannelState` is writable from its own kernel call.
    pub hist1: i32,
    pub hist2: i32,
    pub hist3: i32,
    pub hist4: i32,

    /// DSP / GC-AFC / MS-ADPCM style coefficient pairs: `[c1_0, c2_0, c1_1,
    /// c2_1, ...]`, up to 8 pairs.
    pub adpcm_coef: [i16; 16],
    /// N64 VADPCM codebooks: up to 8 predictors, order 2, 8 entries each.
    pub vadpcm_coefs: [i16; 128],
    /// Level-5 0x555 ADPCM's 3-by-32 coefficient table.
    pub adpcm_coef_3by32: [i32; 96],

    /// IMA-family running state.
    pub adpcm_step_index: i32,
    /// ADX-family running scale (also reused as a generic "last scale"
    /// slot for other fixed-scale codecs).
    pub adpcm_scale: i32,

    /// CRI ADX encryption rolling key (enc8/enc9 variants).
    pub adx_xor: u16,
    pub adx_mult: u16,
    pub adx_add: u16,
    /// Channel count of the ADX stream this key belongs to; the key
    /// advances once per 32 samples *times* this value, not once per
    /// channel.
    pub adx_channels: u8,

    /// Westwood AUD-style framing cursor: offset of the current frame
    /// header and samples remaining inside it.
    pub ws_frame_header_offset: u64,
    pub ws_samples_left: i32,

    /// This channel's position (0-based) among the stream's channels. Most
    /// kernels never read this; MS-ADPCM's block header couples every
    /// channel's preamble in one shared read (see `vgsnd-codecs-adpcm`'s
    /// `ms` module), so its kernel uses this to do that joint parse once,
    /// from channel 0's call, instead of per-channel.
    pub channel_index: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        ChannelState {
            offset: 0,
            channel_start_offset: 0,
            hist1: 0,
            hist2: 0,
            hist3: 0,
            hist4: 0,
            adpcm_coef: [0; 16],
            vadpcm_coefs: [0; 128],
            adpcm_coef_3by32: [0; 96],
            adpcm_step_index: 0,
            adpcm_scale: 0,
            adx_xor: 0,
            adx_mult: 0,
            adx_add: 0,
            adx_channels: 1,
            ws_frame_header_offset: 0,
            ws_samples_left: 0,
            channel_index: 0,
        }
    }
}

impl ChannelState {
    pub fn new() -> ChannelState {
        ChannelState::default()
    }

    /// Resets histories and running codec state, but not `offset` or
    /// `channel_start_offset` (callers reposition those separately).
    pub fn reset_decode_state(&mut self) {
        let offset = self.offset;
        let channel_start_offset = self.channel_start_offset;
        let adpcm_coef = self.adpcm_coef;
        let vadpcm_coefs = self.vadpcm_coefs;
        let adpcm_coef_3by32 = self.adpcm_coef_3by32;
        let adx_mult = self.adx_mult;
        let adx_add = self.adx_add;
        let adx_channels = self.adx_channels;
        let channel_index = self.channel_index;
        *self = ChannelState::default();
        self.offset = offset;
        self.channel_start_offset = channel_start_offset;
        self.adpcm_coef = adpcm_coef;
        self.vadpcm_coefs = vadpcm_coefs;
        self.adpcm_coef_3by32 = adpcm_coef_3by32;
        self.adx_mult = adx_mult;
        self.adx_add = adx_add;
        self.adx_channels = adx_channels;
        self.channel_index = channel_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_zeroed() {
        let ch = ChannelState::new();
        assert_eq!(ch.hist1, 0);
        assert_eq!(ch.adpcm_coef, [0i16; 16]);
        assert_eq!(ch.adx_channels, 1);
    }

    #[test]
    fn reset_decode_state_preserves_coefficients_and_offsets() {
        let mut ch = ChannelState::new();
        ch.offset = 0x100;
        ch.channel_start_offset = 0x40;
        ch.adpcm_coef[0] = 2048;
        ch.hist1 = 1234;
        ch.adx_xor = 0xBEEF;

        ch.reset_decode_state();

        assert_eq!(ch.offset, 0x100);
        assert_eq!(ch.channel_start_offset, 0x40);
        assert_eq!(ch.adpcm_coef[0], 2048);
        assert_eq!(ch.hist1, 0);
        assert_eq!(ch.adx_xor, 0);
    }
}
