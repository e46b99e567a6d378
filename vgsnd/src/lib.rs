// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # vgsnd
//!
//! A pure Rust library for decoding video game audio formats: CRI ADX,
//! Nintendo GameCube/Wii DSP and HALPST/BRSTM streams, Microsoft/IMA/PSX
//! ADPCM, Electronic Arts EA-XA, Namco Siren14, raw PCM, and the G.711/SDX2
//! family, all behind one dispatcher and one render engine.
//!
//! # Usage
//!
//! 1. Open a byte source: wrap a `std::fs::File` in [`core::FileIo`], or an
//!    in-memory buffer in [`core::SliceIo`].
//! 2. Call [`open`] (or [`open_subsong`] for multi-track containers) to get
//!    a [`core::Stream`]. The dispatcher tries every registered container
//!    parser in turn; the first one whose signature matches builds the
//!    `Stream`.
//! 3. Apply host preferences ([`RenderOptions`]) — loop count, fade, or
//!    "ignore the container's loop metadata entirely" — with
//!    [`RenderOptions::apply`].
//! 4. Call [`core::Stream::render`] repeatedly into an interleaved `i16`
//!    buffer until it returns `0`. [`core::Stream::seek_to`] and
//!    [`core::Stream::reset`] are available for random access.
//!
//! ```no_run
//! use vgsnd::core::FileIo;
//!
//! let io = FileIo::open("song.adx")?;
//! let mut stream = vgsnd::open(Box::new(io))?;
//! let opts = vgsnd::RenderOptions::default();
//! opts.apply(&mut stream);
//!
//! let mut buf = vec![0i16; 4096 * stream.channels as usize];
//! loop {
//!     let written = stream.render(&mut buf)?;
//!     if written == 0 {
//!         break;
//!     }
//!     // ... hand `buf[..written]` to an audio sink ...
//! }
//! # Ok::<(), vgsnd::core::VgsndError>(())
//! ```

/// Re-exports the shared I/O, render-engine, and error types every
/// `vgsnd-codecs-*`/`vgsnd-formats` crate is built on, so a caller never
/// needs a direct `vgsnd-core` dependency.
pub mod core {
    pub use vgsnd_core::{
        ByteReader, ChannelState, CodecKernel, CodecKind, FadeConfig, FileIo, Io, LoopRange,
        ParseFn, ParseResult, SliceIo, Stream, StreamInfo, UnsupportedKind, VgsndError,
    };
}

pub use vgsnd_core::errors::Result;
pub use vgsnd_core::render_options::RenderOptions;
pub use vgsnd_formats::PARSERS;

/// The file-extension hints every parser in [`PARSERS`] is typically
/// associated with. Purely advisory: the dispatcher only ever trusts
/// signature bytes, never a file name, but a host UI can use this list to
/// populate an "open file" filter.
pub const EXTENSIONS: &[&str] = &["adx", "brstm", "hps", "sng", "wav"];

/// Opens `io` against every container parser this crate ships
/// ([`PARSERS`]), returning the first one whose signature matches.
pub fn open(io: Box<dyn vgsnd_core::io::Io>) -> Result<vgsnd_core::stream::Stream> {
    vgsnd_core::dispatch::open(io, PARSERS)
}

/// As [`open`], but selects subsong `index` (1-based) once the container
/// is opened.
pub fn open_subsong(io: Box<dyn vgsnd_core::io::Io>, index: u32) -> Result<vgsnd_core::stream::Stream> {
    vgsnd_core::dispatch::open_subsong(io, index, PARSERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgsnd_core::io::SliceIo;

    #[test]
    fn open_reports_unrecognized_for_garbage_input() {
        let io = SliceIo::new(vec![0u8; 64]);
        let err = open(Box::new(io)).unwrap_err();
        assert!(matches!(err, vgsnd_core::VgsndError::Unrecognized));
    }

    #[test]
    fn extensions_list_is_non_empty() {
        assert!(!EXTENSIONS.is_empty());
    }
}
