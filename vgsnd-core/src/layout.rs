// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layout identity and the block-update contract every blocked layout
//! implements.
//!
//! A layout only needs to answer one question on demand: "given the
//! current block is exhausted, where does the next one start for each
//! channel, and how big is it?" Everything else (loop snapshot/restore,
//! sample-count bookkeeping, fade) lives once in
//! [`crate::stream::Stream::render`] rather than being re-implemented per
//! layout, which is the failure mode the reference decoders have (a
//! render loop duplicated per container family).

use crate::channel::ChannelState;
use crate::errors::Result;
use crate::io::ByteReader;

/// Identifies which block-layout driver a [`crate::stream::Stream`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// One contiguous per-channel region; only frame-boundary limiting
    /// applies.
    None,
    /// Fixed-size interleave, identical block size on every channel.
    Interleave,
    /// Fixed-size interleave whose final block may be shorter.
    InterleaveShortLast,
    /// HALPST: singly linked list of blocks via an explicit next-offset;
    /// the tail points backwards to mark the loop target.
    BlockedHalpst,
    /// EA SCHl: walk `SCDl` data chunks, skipping `SCEl` end markers and
    /// padding up to the next `SCHl`.
    BlockedEaSchl,
}

/// Per-channel result of resolving a block boundary: where to read the
/// next frame from and how many samples the new block holds.
#[derive(Debug, Clone, Copy)]
pub struct BlockUpdate {
    pub offset: u64,
    pub size: u32,
}

/// The result of advancing to the next block, one entry per channel plus
/// the sample count of the new block (constant across channels).
pub struct BlockAdvance {
    pub channels: Vec<BlockUpdate>,
    pub samples_in_block: u32,
}

/// Computes the advance to the next block for a blocked layout.
///
/// `current_offset` is the offset of the block that was just exhausted
/// (the same for every channel in every blocked flavour implemented here:
/// they all share one block header, not one header per channel). Flat
/// layouts ([`LayoutKind::None`], [`LayoutKind::Interleave`],
/// [`LayoutKind::InterleaveShortLast`]) never call this; their advance is
/// computed inline in `Stream::render` from `interleave`/`interleave_last`.
pub trait BlockedLayout {
    fn block_update(
        &self,
        source: &mut ByteReader,
        current_offset: u64,
        channel_states: &[ChannelState],
    ) -> Result<BlockAdvance>;
}

impl LayoutKind {
    pub fn is_blocked(&self) -> bool {
        matches!(self, LayoutKind::BlockedHalpst | LayoutKind::BlockedEaSchl)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayoutKind::None => "flat",
            LayoutKind::Interleave => "interleave",
            LayoutKind::InterleaveShortLast => "interleave (short last block)",
            LayoutKind::BlockedHalpst => "HALPST blocked",
            LayoutKind::BlockedEaSchl => "EA SCHl blocked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceIo;

    #[test]
    fn only_blocked_variants_report_is_blocked() {
        assert!(!LayoutKind::None.is_blocked());
        assert!(!LayoutKind::Interleave.is_blocked());
        assert!(!LayoutKind::InterleaveShortLast.is_blocked());
        assert!(LayoutKind::BlockedHalpst.is_blocked());
        assert!(LayoutKind::BlockedEaSchl.is_blocked());
    }

    /// A minimal `BlockedLayout` that advances every channel by a fixed
    /// stride, to exercise the trait contract in isolation from any real
    /// container's header shape.
    struct FixedStrideLayout {
        stride: u64,
        samples: u32,
    }

    impl BlockedLayout for FixedStrideLayout {
        fn block_update(
            &self,
            _source: &mut ByteReader,
            current_offset: u64,
            channel_states: &[ChannelState],
        ) -> Result<BlockAdvance> {
            let channels = channel_states
                .iter()
                .enumerate()
                .map(|(i, _)| BlockUpdate { offset: current_offset + i as u64 * self.stride, size: self.stride as u32 })
                .collect();
            Ok(BlockAdvance { channels, samples_in_block: self.samples })
        }
    }

    #[test]
    fn block_update_reports_one_offset_per_channel() {
        let layout = FixedStrideLayout { stride: 0x40, samples: 14 };
        let mut source = ByteReader::new(Box::new(SliceIo::new(vec![0u8; 256])));
        let states = vec![ChannelState::new(), ChannelState::new()];
        let advance = layout.block_update(&mut source, 0x100, &states).unwrap();

        assert_eq!(advance.samples_in_block, 14);
        assert_eq!(advance.channels.len(), 2);
        assert_eq!(advance.channels[0].offset, 0x100);
        assert_eq!(advance.channels[1].offset, 0x140);
    }
}
