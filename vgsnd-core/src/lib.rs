// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared stream-source, dispatch, and render-engine plumbing used by every
//! `vgsnd-codecs-*` and `vgsnd-formats` crate.
//!
//! This crate carries the three subsystems the rest of the workspace is
//! built around: the buffered byte reader ([`io`]), the open-state value
//! and its render loop ([`stream`], [`channel`], [`codec`], [`layout`]),
//! and the format dispatcher ([`dispatch`]).

pub mod channel;
pub mod codec;
pub mod dispatch;
pub mod errors;
pub mod io;
pub mod layout;
pub mod render_options;
pub mod stream;

pub use channel::ChannelState;
pub use codec::{AdxVariant, CodecKernel, CodecKind, PcmFormat};
pub use dispatch::{open, open_subsong, ParseFn, ParseResult};
pub use errors::{VgsndError, UnsupportedKind};
pub use io::{ByteReader, FileIo, Io, SliceIo};
pub use layout::{BlockAdvance, BlockUpdate, BlockedLayout, LayoutKind};
pub use render_options::RenderOptions;
pub use stream::{FadeConfig, LoopRange, Stream, StreamInfo};
