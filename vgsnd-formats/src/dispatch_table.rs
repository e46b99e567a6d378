// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The concrete, ordered parser table this workspace ships.
//!
//! Strongly-signatured formats (a fixed magic at a fixed offset) come
//! first; `wav_msadpcm` goes last since `RIFF`/`WAVE` is itself a
//! strong signature but its codec tag inside `fmt ` is the broadest
//! catch-all this table recognizes.

use vgsnd_core::dispatch::ParseFn;

use crate::meta;

/// Every container metadata parser this crate implements, in dispatch
/// order. Pass to [`vgsnd_core::dispatch::open`]/`open_subsong`.
pub static PARSERS: &[ParseFn] = &[
    meta::adx::try_parse,
    meta::brstm::try_parse,
    meta::halpst::try_parse,
    meta::ea_schl::try_parse,
    meta::wav_msadpcm::try_parse,
];
