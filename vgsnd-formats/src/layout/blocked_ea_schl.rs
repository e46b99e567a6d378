// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EA SCHl block layout: a tag-walk over `SCDl` (data), `SCEl` (end
//! marker), and `SCHl` (a subsequent subsong's header, butted directly
//! against the previous subsong's last `SCEl` in "continuous multi-subfile"
//! EA streams) chunks, followed by the "default" per-channel offset table:
//! a `u32` sample count, then one `u32` byte-offset per channel (relative
//! to just past the offset table itself), then the channels' data.
//!
//! Scope: this driver always reads the block's internal fields
//! big-endian. EA shipped both big- and little-endian variants depending
//! on platform (little on PC titles); only the big-endian (GameCube/
//! console) case is covered here, consistent with this crate's
//! NGC_DSP-first scope. The PSX and EA_MT10 interleaved-sub-block branches
//! are out of scope too.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::errors::{truncated_error, Result};
use vgsnd_core::io::ByteReader;
use vgsnd_core::layout::{BlockAdvance, BlockUpdate, BlockedLayout};

const TAG_SCDL: u32 = 0x5343446C; // "SCDl"
const TAG_SCEL: u32 = 0x5343456C; // "SCEl"
const TAG_SCHL: u32 = 0x5343486C; // "SCHl"

/// Whether this stream's per-channel data is prefixed by a 2-byte
/// DSP-style history pair (`hist1`/`hist3`) ahead of each channel's
/// samples, as EA's NGC_DSP variant does.
pub struct EaSchlLayout {
    pub channels: usize,
    pub ngc_dsp_hist_prefix: bool,
}

impl BlockedLayout for EaSchlLayout {
    fn block_update(
        &self,
        source: &mut ByteReader,
        current_offset: u64,
        _channel_states: &[ChannelState],
    ) -> Result<BlockAdvance> {
        let mut offset = current_offset;

        loop {
            let tag = source.read_u32be_at(offset)?;
            match tag {
                t if t == TAG_SCDL => break,
                t if t == TAG_SCEL => {
                    // A fixed 4-byte marker; immediately followed either by
                    // more padding or the next subsong's SCHl.
                    offset += 4;
                    loop {
                        let probe = source.read_u32be_at(offset)?;
                        if probe == TAG_SCHL || probe == TAG_SCDL {
                            break;
                        }
                        offset += 1;
                    }
                }
                t if t == TAG_SCHL => {
                    // A following subsong's header; its own size field at
                    // +4 tells us how far to skip to reach its first SCDl.
                    let header_size = source.read_u32be_at(offset + 4)?;
                    offset += header_size as u64;
                }
                _ => return truncated_error("EA SCHl block tag not recognized"),
            }
        }

        let block_samples = source.read_u32be_at(offset + 0x08)?;
        let offsets_table = offset + 0x0C;
        let data_base = offsets_table + 4 * self.channels as u64;

        let mut updates = Vec::with_capacity(self.channels);
        for i in 0..self.channels {
            let channel_start = source.read_u32be_at(offsets_table + 4 * i as u64)? as u64;
            let mut channel_offset = data_base + channel_start;

            // The next channel's starting offset, or (for the last
            // channel) the block's own size field, bounds this channel's
            // region so we can report a usable size even though the
            // format has no explicit per-channel length field.
            let region_end = if i + 1 < self.channels {
                data_base + source.read_u32be_at(offsets_table + 4 * (i as u64 + 1))? as u64
            } else {
                let block_size = source.read_u32be_at(offset + 0x04)? as u64 & 0x7FFF_FFFF;
                offset + block_size
            };

            if self.ngc_dsp_hist_prefix {
                channel_offset += 4;
            }

            updates.push(BlockUpdate {
                offset: channel_offset,
                size: (region_end.saturating_sub(channel_offset)) as u32,
            });
        }

        Ok(BlockAdvance {
            channels: updates,
            samples_in_block: block_samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    #[test]
    fn walks_directly_to_an_scdl_chunk_and_resolves_channel_offsets() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"SCDl");
        bytes.extend_from_slice(&40u32.to_be_bytes()); // block size
        bytes.extend_from_slice(&100u32.to_be_bytes()); // block samples
        bytes.extend_from_slice(&0u32.to_be_bytes()); // channel 0 start
        bytes.extend_from_slice(&16u32.to_be_bytes()); // channel 1 start
        bytes.extend(vec![0u8; 32]); // channel data
        let mut source = ByteReader::new(Box::new(SliceIo::new(bytes)));
        let channels = vec![ChannelState::new(), ChannelState::new()];
        let layout = EaSchlLayout { channels: 2, ngc_dsp_hist_prefix: false };

        let advance = layout.block_update(&mut source, 0, &channels).unwrap();
        assert_eq!(advance.samples_in_block, 100);
        assert_eq!(advance.channels.len(), 2);
        assert_eq!(advance.channels[0].offset, 0x14);
        assert_eq!(advance.channels[0].size, 16);
        assert_eq!(advance.channels[1].offset, 0x14 + 16);
    }

    #[test]
    fn skips_an_scel_end_marker_and_padding_before_the_next_schl() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"SCEl");
        bytes.push(0); // one byte of padding before the next recognizable tag
        bytes.extend_from_slice(b"SCHl");
        bytes.extend_from_slice(&16u32.to_be_bytes()); // header size, skip past it
        bytes.extend_from_slice(b"SCDl");
        bytes.extend_from_slice(&24u32.to_be_bytes());
        bytes.extend_from_slice(&50u32.to_be_bytes()); // block samples
        bytes.extend_from_slice(&0u32.to_be_bytes()); // channel 0 start
        bytes.extend(vec![0u8; 8]);
        let mut source = ByteReader::new(Box::new(SliceIo::new(bytes)));
        let channels = vec![ChannelState::new()];
        let layout = EaSchlLayout { channels: 1, ngc_dsp_hist_prefix: false };

        let advance = layout.block_update(&mut source, 0, &channels).unwrap();
        assert_eq!(advance.samples_in_block, 50);
        assert_eq!(advance.channels.len(), 1);
    }

    #[test]
    fn ngc_dsp_hist_prefix_shifts_the_channel_offset_past_the_history_pair() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"SCDl");
        bytes.extend_from_slice(&32u32.to_be_bytes());
        bytes.extend_from_slice(&14u32.to_be_bytes()); // block samples
        bytes.extend_from_slice(&0u32.to_be_bytes()); // channel 0 start
        bytes.extend(vec![0u8; 20]); // 4 bytes hist prefix + 16 bytes payload
        let mut source = ByteReader::new(Box::new(SliceIo::new(bytes)));
        let channels = vec![ChannelState::new()];
        let layout = EaSchlLayout { channels: 1, ngc_dsp_hist_prefix: true };

        let advance = layout.block_update(&mut source, 0, &channels).unwrap();
        assert_eq!(advance.channels[0].offset, 0x10 + 4);
    }
}
