// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Container metadata parsers, block-layout drivers, and the concrete
//! dispatch table tying them to [`vgsnd_core::dispatch::open`].
//!
//! `vgsnd-core` defines the parser/layout *traits*; this crate supplies
//! the concrete implementations for the containers this workspace
//! recognizes, plus [`PARSERS`], the ordered table a facade crate hands to
//! the dispatcher.

pub mod dispatch_table;
pub mod layout;
pub mod meta;

pub use dispatch_table::PARSERS;
