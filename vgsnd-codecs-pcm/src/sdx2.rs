// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Squareroot-delta-exact (SDX2), an Electronic Arts prediction scheme: one
//! signed byte per sample encodes a squared, sign-carrying delta against a
//! running prediction.

use vgsnd_core::channel::ChannelState;
use vgsnd_core::codec::CodecKernel;
use vgsnd_core::errors::Result;
use vgsnd_core::io::ByteReader;

use crate::clamp16;

pub struct Sdx2Kernel;

impl CodecKernel for Sdx2Kernel {
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
        let mut hist1 = ch.hist1;

        for i in 0..samples_to_do as u64 {
            let mut b = [0u8; 1];
            source.read_at(&mut b, base + i)?;
            let byte = b[0] as i8 as i32;

            let delta = byte * byte.abs() * 2;
            hist1 = if byte & 1 != 0 { -hist1 + delta } else { hist1 + delta };

            let sample = clamp16(hist1);
            out[i as usize * out_stride] = sample;
            hist1 = sample as i32;
        }

        ch.hist1 = hist1;
        Ok(())
    }
}
