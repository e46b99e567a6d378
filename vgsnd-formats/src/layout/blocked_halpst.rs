// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HALPST block layout: a singly linked list of blocks. Each block starts
//! with a 0x20-byte header whose `+0x04` field is the block's nibble
//! count and whose `+0x08` field is the absolute offset of the next
//! block; the last block's next-offset points backwards (at or before the
//! current block), which is how a HALPST stream's loop target is found
//! without a dedicated loop field. Per-channel data follows the header,
//! sized by `nibbles_to_bytes` on each channel's share of the block.
//!
//! The per-channel region layout follows from the header fields: equal
//! nibble counts per channel, contiguous regions in channel order.

use vgsnd_codecs_adpcm::dsp::dsp_nibbles_to_samples;
use vgsnd_core::channel::ChannelState;
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::{BlockAdvance, BlockUpdate, BlockedLayout};

const BLOCK_HEADER_SIZE: u64 = 0x20;

fn nibbles_to_bytes(nibbles: u32) -> u32 {
    (nibbles + 1) / 2
}

pub struct HalpstLayout;

impl BlockedLayout for HalpstLayout {
    fn block_update(
        &self,
        source: &mut ByteReader,
        current_offset: u64,
        channel_states: &[ChannelState],
    ) -> Result<BlockAdvance> {
        let channels = channel_states.len();
        let nibbles_per_channel = source.read_u32be_at(current_offset + 0x04)?;
        let next_offset = source.read_u32be_at(current_offset + 0x08)? as u64;

        // A next-offset that doesn't advance marks the terminal block;
        // vgsnd_core::stream::Stream treats this the same as any other
        // block whose declared sample count is reached, so we report the
        // block's own geometry either way and let the caller notice it
        // isn't progressing via `refresh_block_geometry`'s EOF check.
        let per_channel_bytes = nibbles_to_bytes(nibbles_per_channel);
        let samples_in_block = dsp_nibbles_to_samples(nibbles_per_channel);

        let mut updates = Vec::with_capacity(channels);
        for i in 0..channels {
            updates.push(BlockUpdate {
                offset: if next_offset > current_offset {
                    next_offset + BLOCK_HEADER_SIZE + per_channel_bytes as u64 * i as u64
                } else {
                    current_offset + BLOCK_HEADER_SIZE + per_channel_bytes as u64 * i as u64
                },
                size: per_channel_bytes,
            });
        }

        Ok(BlockAdvance {
            channels: updates,
            samples_in_block,
        })
    }
}
