// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocked-layout drivers: each implements [`vgsnd_core::layout::BlockedLayout`]
//! for one container's block-header shape. The flat layouts (`None`,
//! `Interleave`, `InterleaveShortLast`) need no driver at all — their
//! advance is computed inline in `vgsnd_core::stream::Stream`.

pub mod blocked_ea_schl;
pub mod blocked_halpst;

pub use blocked_ea_schl::EaSchlLayout;
pub use blocked_halpst::HalpstLayout;
