// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The open-state value and the render engine that drives it.
//!
//! A [`Stream`] is built once by a metadata parser (`vgsnd-formats`) and
//! from then on mutated only through [`Stream::render`]/[`Stream::reset`]/
//! [`Stream::seek_to`]. It owns its [`ByteReader`], its per-channel decode
//! state, and the codec/layout trait objects the parser selected; nothing
//! here reaches back into global state.

use log::trace;

use crate::channel::ChannelState;
use crate::codec::CodecKind;
use crate::errors::{invalid_error, Result};
use crate::io::ByteReader;
use crate::layout::{BlockedLayout, LayoutKind};

/// `[start, end)` sample range, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRange {
    pub start: i64,
    pub end: i64,
}

/// Fade-out configuration applied in the final samples of a stream that
/// isn't looping (or has reached its loop target).
#[derive(Debug, Clone, Copy)]
pub struct FadeConfig {
    pub fade_samples: i64,
    pub fade_delay_samples: i64,
}

/// A deep copy of every piece of state a loop boundary must restore:
/// per-channel decode state, the current block cursor, and the
/// intra-block sample position. Modeled as an explicit struct rather than
/// a `memcpy` of opaque buffers, so a loop restore is a plain field copy.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    channel_states: Vec<ChannelState>,
    current_block_offset: u64,
    current_block_size: u32,
    current_block_samples: u32,
    samples_into_block: u32,
}

/// Mutable playback cursor. Everything here is restored from a
/// [`PlaybackSnapshot`] at a loop boundary.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub current_sample: i64,
    pub samples_into_block: u32,
    pub current_block_offset: u64,
    pub current_block_size: u32,
    pub current_block_samples: u32,
    pub hit_loop: bool,
    pub loop_count: u32,
    pub loop_target: Option<u32>,
    loop_snapshot: Option<PlaybackSnapshot>,
}

impl PlaybackState {
    fn new() -> PlaybackState {
        PlaybackState {
            current_sample: 0,
            samples_into_block: 0,
            current_block_offset: 0,
            current_block_size: 0,
            current_block_samples: 0,
            hit_loop: false,
            loop_count: 0,
            loop_target: None,
            loop_snapshot: None,
        }
    }
}

/// The open-state value produced by a metadata parser and driven by
/// [`Stream::render`].
pub struct Stream {
    pub channels: u8,
    pub sample_rate: u32,
    pub num_samples: i64,
    pub loop_range: Option<LoopRange>,
    pub codec: CodecKind,
    pub layout: LayoutKind,
    pub meta_name: &'static str,
    pub interleave: u32,
    pub interleave_last: u32,
    pub stream_index: u32,
    pub num_subsongs: u32,
    pub fade: Option<FadeConfig>,

    channel_states: Vec<ChannelState>,
    start_channel_states: Vec<ChannelState>,
    playback: PlaybackState,
    source: ByteReader,
    codec_kernel: Box<dyn crate::codec::CodecKernel>,
    blocked_layout: Option<Box<dyn BlockedLayout>>,
}

/// Human-readable summary of a [`Stream`].
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub codec_name: &'static str,
    pub layout_name: &'static str,
    pub meta_name: &'static str,
    pub channels: u8,
    pub sample_rate: u32,
    pub num_samples: i64,
    pub bitrate_bps: u64,
}

impl Stream {
    /// Constructs a new `Stream`. Called only by metadata parsers once
    /// they have fully resolved every field; there is no partially
    /// initialized state a caller can observe.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channels: u8,
        sample_rate: u32,
        num_samples: i64,
        loop_range: Option<LoopRange>,
        codec: CodecKind,
        layout: LayoutKind,
        meta_name: &'static str,
        interleave: u32,
        interleave_last: u32,
        channel_states: Vec<ChannelState>,
        source: ByteReader,
        codec_kernel: Box<dyn crate::codec::CodecKernel>,
        blocked_layout: Option<Box<dyn BlockedLayout>>,
    ) -> Result<Stream> {
        if channels == 0 {
            return invalid_error("channel count must be at least 1");
        }
        if channel_states.len() != channels as usize {
            return invalid_error("channel state count must match channel count");
        }
        if let Some(lr) = loop_range {
            if !(0 <= lr.start && lr.start < lr.end && lr.end <= num_samples) {
                return invalid_error("loop range out of bounds");
            }
        }
        if !(300..=96_000).contains(&sample_rate) {
            return invalid_error("sample rate out of sane range");
        }

        let mut playback = PlaybackState::new();
        playback.current_block_offset = channel_states[0].offset;

        let mut stream = Stream {
            channels,
            sample_rate,
            num_samples,
            loop_range,
            codec,
            layout,
            meta_name,
            interleave,
            interleave_last,
            stream_index: 1,
            num_subsongs: 1,
            fade: None,
            start_channel_states: channel_states.clone(),
            channel_states,
            playback,
            source,
            codec_kernel,
            blocked_layout,
        };
        stream.refresh_block_geometry()?;
        Ok(stream)
    }

    pub fn describe(&self) -> StreamInfo {
        let stream_size = self.source.len().saturating_sub(self.channel_states[0].channel_start_offset);
        let bitrate_bps = if self.num_samples > 0 {
            stream_size.saturating_mul(8).saturating_mul(self.sample_rate as u64) / self.num_samples as u64
        }
        else {
            0
        };

        StreamInfo {
            codec_name: self.codec.name(),
            layout_name: self.layout.name(),
            meta_name: self.meta_name,
            channels: self.channels,
            sample_rate: self.sample_rate,
            num_samples: self.num_samples,
            bitrate_bps,
        }
    }

    /// Restores every per-channel state and the playback cursor to
    /// start-of-stream.
    pub fn reset(&mut self) -> Result<()> {
        self.channel_states = self.start_channel_states.clone();
        self.playback = PlaybackState::new();
        self.playback.current_block_offset = self.channel_states[0].offset;
        self.refresh_block_geometry()
    }

    /// Seeks to `sample`. Always replays through the actual decode path (no
    /// shortcut) so all per-channel state stays bit-exact; a backward seek
    /// resets first.
    pub fn seek_to(&mut self, sample: i64) -> Result<()> {
        if sample < self.playback.current_sample {
            self.reset()?;
        }
        let mut scratch = vec![0i16; self.channels as usize * 4096];
        while self.playback.current_sample < sample {
            let want = ((sample - self.playback.current_sample) as usize).min(4096);
            let got = self.render(&mut scratch[..want * self.channels as usize])?;
            if got == 0 {
                break;
            }
        }
        Ok(())
    }

    pub fn set_loop_target(&mut self, n: u32) {
        self.playback.loop_target = Some(n);
    }

    fn refresh_block_geometry(&mut self) -> Result<()> {
        match self.layout {
            LayoutKind::None => {
                self.playback.current_block_samples = self.num_samples as u32;
                self.playback.current_block_size = u32::MAX;
            }
            LayoutKind::Interleave => {
                let spf = self.codec.samples_per_frame().unwrap_or(1);
                let fsb = self.codec.frame_size_bytes().unwrap_or(1);
                let frames_per_block = if fsb > 0 { self.interleave / fsb } else { 0 };
                self.playback.current_block_samples = frames_per_block * spf;
                self.playback.current_block_size = self.interleave;
            }
            LayoutKind::InterleaveShortLast => {
                let spf = self.codec.samples_per_frame().unwrap_or(1);
                let fsb = self.codec.frame_size_bytes().unwrap_or(1);
                let remaining = self.num_samples - self.playback.current_sample;
                let full_block_samples = (self.interleave / fsb.max(1)) * spf;
                if remaining as u32 > full_block_samples {
                    self.playback.current_block_samples = full_block_samples;
                    self.playback.current_block_size = self.interleave;
                }
                else {
                    // A stale `interleave_last == 0` means "no short last
                    // block": reuse `interleave` for the final block too.
                    // See DESIGN.md's Open Question decisions, §1.
                    let last_block_size =
                        if self.interleave_last > 0 { self.interleave_last } else { self.interleave };
                    let frames_per_block = if fsb > 0 { last_block_size / fsb } else { 0 };
                    self.playback.current_block_samples = frames_per_block * spf;
                    self.playback.current_block_size = last_block_size;
                }
            }
            LayoutKind::BlockedHalpst | LayoutKind::BlockedEaSchl => {
                let driver = self
                    .blocked_layout
                    .as_ref()
                    .expect("blocked layout kind requires a block driver");
                let advance = driver.block_update(
                    &mut self.source,
                    self.playback.current_block_offset,
                    &self.channel_states,
                )?;
                for (ch, update) in self.channel_states.iter_mut().zip(advance.channels.iter()) {
                    ch.offset = update.offset;
                }
                self.playback.current_block_size =
                    advance.channels.first().map(|u| u.size).unwrap_or(0);
                self.playback.current_block_samples = advance.samples_in_block;
            }
        }
        Ok(())
    }

    fn advance_to_next_block(&mut self) -> Result<()> {
        match self.layout {
            LayoutKind::None => {
                // A single unbounded region; nothing to advance.
            }
            LayoutKind::Interleave | LayoutKind::InterleaveShortLast => {
                let advance_by = self.playback.current_block_size as u64;
                for ch in self.channel_states.iter_mut() {
                    ch.offset += advance_by;
                }
                self.playback.current_block_offset += advance_by * self.channels as u64;
            }
            LayoutKind::BlockedHalpst | LayoutKind::BlockedEaSchl => {
                self.playback.current_block_offset += self.playback.current_block_size as u64;
            }
        }
        self.playback.samples_into_block = 0;
        self.refresh_block_geometry()
    }

    /// Writes interleaved `i16` samples to `out`, returning the count of
    /// samples (not frames) written. Honours loop points and fade; never
    /// fails on EOF, only on a hard `Io` error.
    pub fn render(&mut self, out: &mut [i16]) -> Result<usize> {
        let channels = self.channels as usize;
        let requested_frames = out.len() / channels;
        let mut written_frames = 0usize;

        while written_frames < requested_frames {
            if self.playback.current_sample >= self.num_samples {
                break;
            }

            // Loop-start snapshot hook: happens exactly once, the instant
            // we reach loop.start with an active loop still ahead of us.
            if let Some(lr) = self.loop_range {
                if !self.playback.hit_loop
                    && self.playback.current_sample == lr.start
                    && self.playback.loop_target.map_or(true, |n| n > 0)
                {
                    self.playback.loop_snapshot = Some(PlaybackSnapshot {
                        channel_states: self.channel_states.clone(),
                        current_block_offset: self.playback.current_block_offset,
                        current_block_size: self.playback.current_block_size,
                        current_block_samples: self.playback.current_block_samples,
                        samples_into_block: self.playback.samples_into_block,
                    });
                    self.playback.hit_loop = true;
                    trace!("loop snapshot taken at sample {}", lr.start);
                }
            }

            if self.playback.current_block_samples == 0 {
                self.advance_to_next_block()?;
                if self.playback.current_block_samples == 0 {
                    break;
                }
            }

            let remaining_in_block = self.playback.current_block_samples - self.playback.samples_into_block;
            let mut samples_to_do = remaining_in_block.min((requested_frames - written_frames) as u32);

            // Frame-boundary limit: a codec kernel call never spans more
            // than one of the codec's own fixed-size frames, so a kernel
            // can read a single frame header/buffer per call instead of
            // looping internally.
            if let Some(spf) = self.codec.samples_per_frame() {
                if spf > 0 {
                    let into_frame = self.playback.samples_into_block % spf;
                    samples_to_do = samples_to_do.min(spf - into_frame);
                }
            }

            if let Some(lr) = self.loop_range {
                let to_loop_end = (lr.end - self.playback.current_sample).max(0) as u32;
                if self.playback.current_sample < lr.end {
                    samples_to_do = samples_to_do.min(to_loop_end.max(1));
                }
            }
            if samples_to_do == 0 {
                break;
            }

            for (idx, ch) in self.channel_states.iter_mut().enumerate() {
                let window = &mut out[written_frames * channels + idx..];
                self.codec_kernel.decode(
                    ch,
                    &mut self.source,
                    window,
                    channels,
                    self.playback.samples_into_block,
                    samples_to_do,
                )?;
            }

            self.playback.samples_into_block += samples_to_do;
            self.playback.current_sample += samples_to_do as i64;
            written_frames += samples_to_do as usize;

            if self.playback.samples_into_block >= self.playback.current_block_samples {
                self.advance_to_next_block()?;
            }

            if let Some(lr) = self.loop_range {
                if self.playback.current_sample == lr.end {
                    let exhausted_target =
                        self.playback.loop_target.map_or(false, |n| self.playback.loop_count + 1 >= n);
                    if !exhausted_target {
                        if let Some(snap) = self.playback.loop_snapshot.clone() {
                            self.channel_states = snap.channel_states;
                            self.playback.current_block_offset = snap.current_block_offset;
                            self.playback.current_block_size = snap.current_block_size;
                            self.playback.current_block_samples = snap.current_block_samples;
                            self.playback.samples_into_block = snap.samples_into_block;
                        }
                        self.playback.current_sample = lr.start;
                        self.playback.loop_count += 1;
                        trace!("loop restored to sample {}, loop #{}", lr.start, self.playback.loop_count);
                    }
                }
            }
        }

        self.apply_fade(out, written_frames, channels);

        Ok(written_frames * channels)
    }

    fn apply_fade(&self, out: &mut [i16], written_frames: usize, channels: usize) {
        let Some(fade) = self.fade else { return };
        if self.loop_range.is_some() && self.playback.loop_target.is_none() {
            // Infinite looping streams never reach a fade region.
            return;
        }
        let fade_start = self.num_samples - fade.fade_delay_samples - fade.fade_samples;
        if fade.fade_samples <= 0 {
            return;
        }
        let frame_start = self.playback.current_sample - written_frames as i64;
        for f in 0..written_frames {
            let sample_index = frame_start + f as i64;
            if sample_index < fade_start || sample_index >= self.num_samples - fade.fade_delay_samples {
                continue;
            }
            let k = sample_index - fade_start;
            let gain = (fade.fade_samples - k) as f32 / fade.fade_samples as f32;
            for c in 0..channels {
                let s = out[f * channels + c] as f32 * gain;
                out[f * channels + c] = s.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PcmFormat;
    use crate::io::{ByteReader, SliceIo};

    struct IdentityPcmKernel;

    impl crate::codec::CodecKernel for IdentityPcmKernel {
        fn decode(
            &self,
            ch: &mut ChannelState,
            source: &mut ByteReader,
            out: &mut [i16],
            out_stride: usize,
            _first_sample: u32,
            samples_to_do: u32,
        ) -> Result<()> {
            for i in 0..samples_to_do as usize {
                let mut buf = [0u8; 2];
                let n = source.read_at(&mut buf, ch.offset)?;
                let sample = if n == 2 { i16::from_le_bytes(buf) } else { 0 };
                out[i * out_stride] = sample;
                ch.offset += 2;
            }
            Ok(())
        }
    }

    fn make_stream(pcm: &[i16], channels: u8, loop_range: Option<LoopRange>) -> Stream {
        let mut bytes = Vec::with_capacity(pcm.len() * 2);
        for s in pcm {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        let num_samples = (pcm.len() / channels as usize) as i64;
        let source = ByteReader::new(Box::new(SliceIo::new(bytes)));
        let channel_states: Vec<ChannelState> = (0..channels)
            .map(|c| {
                let mut cs = ChannelState::new();
                cs.offset = c as u64 * 2;
                cs.channel_start_offset = cs.offset;
                cs
            })
            .collect();

        Stream::new(
            channels,
            44100,
            num_samples,
            loop_range,
            CodecKind::Pcm(PcmFormat::S16LE),
            LayoutKind::Interleave,
            "test",
            2 * channels as u32,
            0,
            channel_states,
            source,
            Box::new(IdentityPcmKernel),
            None,
        )
        .unwrap()
    }

    #[test]
    fn render_full_length_matches_source() {
        let pcm = [1i16, 2, 3, 4, 5, 6, 7, 8];
        let mut stream = make_stream(&pcm, 1, None);
        let mut out = vec![0i16; 8];
        let n = stream.render(&mut out).unwrap();
        assert_eq!(n, 8);
        assert_eq!(out, pcm);
    }

    #[test]
    fn split_render_matches_single_render() {
        let pcm: Vec<i16> = (0..100).collect();
        let mut a = make_stream(&pcm, 1, None);
        let mut whole = vec![0i16; 100];
        a.render(&mut whole).unwrap();

        let mut b = make_stream(&pcm, 1, None);
        let mut first = vec![0i16; 40];
        let mut second = vec![0i16; 60];
        b.render(&mut first).unwrap();
        b.render(&mut second).unwrap();

        let mut combined = first;
        combined.extend(second);
        assert_eq!(whole, combined);
    }

    #[test]
    fn seek_to_matches_continuous_render() {
        let pcm: Vec<i16> = (0..200).collect();
        let mut a = make_stream(&pcm, 1, None);
        let mut skip = vec![0i16; 50];
        a.render(&mut skip).unwrap();
        let mut rest_a = vec![0i16; 30];
        a.render(&mut rest_a).unwrap();

        let mut b = make_stream(&pcm, 1, None);
        b.seek_to(50).unwrap();
        let mut rest_b = vec![0i16; 30];
        b.render(&mut rest_b).unwrap();

        assert_eq!(rest_a, rest_b);
    }

    #[test]
    fn fade_applies_gain_exactly_once_per_sample() {
        // Single-sample-per-frame PCM forces many outer-loop iterations
        // per `render()` call (the frame-boundary limiter caps
        // `samples_to_do` at 1); fade must still only scale each sample
        // once, not once per remaining iteration.
        const AMPLITUDE: i16 = 10_000;
        let pcm = vec![AMPLITUDE; 20];
        let mut stream = make_stream(&pcm, 1, None);
        stream.fade = Some(FadeConfig { fade_samples: 10, fade_delay_samples: 0 });

        let mut out = vec![0i16; 20];
        let written = stream.render(&mut out).unwrap();
        assert_eq!(written, 20);

        // First 10 samples are outside the fade window.
        assert_eq!(&out[..10], &[AMPLITUDE; 10][..]);

        // Last 10 samples ramp linearly from gain 1.0 down to gain 0.1.
        for k in 0..10i64 {
            let gain = (10 - k) as f32 / 10.0;
            let expected = (AMPLITUDE as f32 * gain).round() as i16;
            assert_eq!(out[10 + k as usize], expected, "sample at fade offset {k}");
        }
    }

    #[test]
    fn loop_restores_deep_state_not_just_cursor() {
        let pcm: Vec<i16> = (0..40).collect();
        let loop_range = LoopRange { start: 10, end: 20 };
        let mut stream = make_stream(&pcm, 1, Some(loop_range));
        stream.set_loop_target(2);

        // First pass through [10, 20), then looped back: samples 10..20
        // should repeat bit-for-bit relative to sample 10 on both passes.
        let mut out = vec![0i16; 30];
        stream.render(&mut out).unwrap();

        assert_eq!(&out[10..20], &pcm[10..20]);
        assert_eq!(&out[20..30], &pcm[10..20]);
    }
}
