// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ADPCM family codec kernels, one module per variant, plus
//! [`kernel_for`] to build the right boxed [`CodecKernel`] for a
//! [`CodecKind`] this crate covers.

pub mod adx;
mod common;
pub mod dsp;
pub mod eaxa;
pub mod ima;
pub mod ms;
pub mod psx;

use vgsnd_core::codec::{CodecKernel, CodecKind};

/// Builds the kernel implementing `codec`, or `None` if `codec` belongs
/// to a different `vgsnd-codecs-*` crate. `channels` is needed for
/// MS-ADPCM and EA-XA v1, whose stereo framing jointly decodes both
/// channels from one call.
pub fn kernel_for(codec: CodecKind, channels: u8) -> Option<Box<dyn CodecKernel>> {
    match codec {
        CodecKind::CriAdx(variant) => Some(Box::new(adx::AdxKernel { variant })),
        CodecKind::NintendoDsp => Some(Box::new(dsp::DspKernel)),
        CodecKind::ImaAdpcm => Some(Box::new(ima::ImaKernel)),
        CodecKind::MsAdpcm { .. } => Some(Box::new(ms::MsAdpcmKernel { channels })),
        CodecKind::PsxAdpcm => Some(Box::new(psx::PsxKernel)),
        CodecKind::EaXaV1 { stereo } => Some(Box::new(eaxa::EaXaV1Kernel { stereo })),
        CodecKind::EaXaV2 => Some(Box::new(eaxa::EaXaV2Kernel)),
        _ => None,
    }
}
