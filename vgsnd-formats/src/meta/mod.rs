// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Container metadata parsers, one module per format, each exposing a
//! `try_parse` function matching [`vgsnd_core::dispatch::ParseFn`].

pub mod adx;
pub mod brstm;
pub mod ea_schl;
pub mod halpst;
pub mod wav_msadpcm;
