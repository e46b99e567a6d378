// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-facing playback configuration.
//!
//! Host preferences (loop count, fade, thread priority, ...) are threaded
//! through as an explicit struct rather than
//! read from global state inside the core.

use crate::stream::{FadeConfig, Stream};

/// Host playback preferences, applied to a freshly opened [`Stream`] via
/// [`RenderOptions::apply`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Loop forever rather than honoring `loop_count`/ending naturally.
    pub loop_forever: bool,
    /// Number of times to play the loop body before falling through to
    /// the natural ending (or fade). Fractional counts fade out partway
    /// through the final repeat, matching common host behaviour.
    pub loop_count: f64,
    /// Fade-out length, in seconds, applied near the end of playback.
    pub fade_seconds: f64,
    /// Silent delay, in seconds, inserted before the fade begins.
    pub fade_delay_seconds: f64,
    /// Ignore any loop points the container declares and play straight
    /// through once.
    pub ignore_loop: bool,
    /// Host scheduling hint for the thread driving `render`, `0..=6`.
    /// The core never reads this; it has no internal threads of its own.
    pub thread_priority: u8,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions {
            loop_forever: false,
            loop_count: 2.0,
            fade_seconds: 10.0,
            fade_delay_seconds: 0.0,
            ignore_loop: false,
            thread_priority: 3,
        }
    }
}

impl RenderOptions {
    /// Applies these preferences to a freshly opened `stream`: sets the
    /// loop target (or clears loop handling if `ignore_loop`/no loop
    /// metadata is present) and configures the fade window.
    pub fn apply(&self, stream: &mut Stream) {
        if stream.loop_range.is_none() || self.ignore_loop {
            stream.loop_range = None;
        }
        else if !self.loop_forever {
            let whole_loops = self.loop_count.floor().max(1.0) as u32;
            stream.set_loop_target(whole_loops);
        }

        let fade_samples = (self.fade_seconds * stream.sample_rate as f64).round() as i64;
        let fade_delay_samples = (self.fade_delay_seconds * stream.sample_rate as f64).round() as i64;
        stream.fade = if !self.loop_forever && fade_samples > 0 {
            Some(FadeConfig { fade_samples, fade_delay_samples })
        }
        else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelState;
    use crate::codec::{CodecKind, PcmFormat};
    use crate::errors::Result;
    use crate::io::{ByteReader, SliceIo};
    use crate::layout::LayoutKind;

    struct SilentKernel;
    impl crate::codec::CodecKernel for SilentKernel {
        fn decode(
            &self,
            _ch: &mut ChannelState,
            _source: &mut ByteReader,
            _out: &mut [i16],
            _out_stride: usize,
            _first_sample: u32,
            _samples_to_do: u32,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn ignore_loop_clears_loop_range() {
        let source = ByteReader::new(Box::new(SliceIo::new(vec![0u8; 64])));
        let mut stream = Stream::new(
            1,
            44100,
            100,
            Some(crate::stream::LoopRange { start: 10, end: 90 }),
            CodecKind::Pcm(PcmFormat::S16LE),
            LayoutKind::None,
            "test",
            0,
            0,
            vec![ChannelState::new()],
            source,
            Box::new(SilentKernel),
            None,
        )
        .unwrap();

        let opts = RenderOptions { ignore_loop: true, ..RenderOptions::default() };
        opts.apply(&mut stream);
        assert!(stream.loop_range.is_none());
    }
}
