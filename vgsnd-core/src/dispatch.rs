// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Format detection: run metadata parsers in order against a freshly
//! opened byte source until one claims it.
//!
//! The dispatcher is a static, ordered list of `try_parse` functions — a
//! plain `&'static [ParseFn]` slice rather than a dynamic, self-registering
//! codec registry: this workspace ships a closed, known set of container
//! parsers, not an open plugin ecosystem.

use log::debug;

use crate::errors::{Result, VgsndError};
use crate::io::{ByteReader, Io};
use crate::stream::Stream;

/// What a parser did with the [`ByteReader`] it was handed.
///
/// On a signature mismatch the reader is handed back so the next parser
/// can try the same byte source; a parser must never leave a partially
/// initialized `Stream` behind on either path.
pub enum ParseResult {
    /// The signature didn't match; here's your reader back.
    NoMatch(ByteReader),
    /// Fully resolved; the parser consumed the reader as the `Stream`'s
    /// own source (or opened whatever siblings it needed separately).
    Matched(Box<Stream>),
}

/// One container sniffer. Validates a signature early and returns
/// quickly on mismatch; only returns `Err` once it has positively
/// recognized the format but failed to build a valid `Stream`.
pub type ParseFn = fn(ByteReader) -> Result<ParseResult>;

/// Opens `io` against every parser in `parsers`, in order, returning the
/// first match.
///
/// Strongly-signatured formats belong earlier in `parsers` than
/// ambiguous or extension-only ones.
pub fn open(io: Box<dyn Io>, parsers: &[ParseFn]) -> Result<Stream> {
    open_with_buffer(ByteReader::new(io), parsers)
}

/// As [`open`], but selects subsong `index` (1-based) in a multi-song
/// container.
///
/// The parsers this workspace ships are all single-subsong today;
/// `stream_index`/`num_subsongs` are threaded through for containers that
/// do carry more than one.
pub fn open_subsong(io: Box<dyn Io>, index: u32, parsers: &[ParseFn]) -> Result<Stream> {
    let mut stream = open(io, parsers)?;
    if index == 0 || index > stream.num_subsongs {
        return Err(VgsndError::Invalid("subsong index out of range"));
    }
    stream.stream_index = index;
    Ok(stream)
}

fn open_with_buffer(mut reader: ByteReader, parsers: &[ParseFn]) -> Result<Stream> {
    for parser in parsers {
        match parser(reader)? {
            ParseResult::NoMatch(returned) => {
                reader = returned;
            }
            ParseResult::Matched(stream) => {
                debug!("dispatcher matched {:?}", stream.meta_name);
                return Ok(*stream);
            }
        }
    }
    Err(VgsndError::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelState;
    use crate::codec::{CodecKernel, PcmFormat};
    use crate::io::SliceIo;
    use crate::layout::LayoutKind;

    struct SilentKernel;

    impl CodecKernel for SilentKernel {
        fn decode(
            &self,
            ch: &mut ChannelState,
            _source: &mut ByteReader,
            out: &mut [i16],
            out_stride: usize,
            _first_sample: u32,
            samples_to_do: u32,
        ) -> Result<()> {
            for i in 0..samples_to_do as usize {
                out[i * out_stride] = 0;
            }
            ch.offset += samples_to_do as u64;
            Ok(())
        }
    }

    fn matching_parser(reader: ByteReader) -> Result<ParseResult> {
        let stream = Stream::new(
            1,
            8000,
            10,
            None,
            crate::codec::CodecKind::Pcm(PcmFormat::S16LE),
            LayoutKind::None,
            "stub",
            0,
            0,
            vec![ChannelState::new()],
            reader,
            Box::new(SilentKernel),
            None,
        )?;
        Ok(ParseResult::Matched(Box::new(stream)))
    }

    fn never_matches(reader: ByteReader) -> Result<ParseResult> {
        Ok(ParseResult::NoMatch(reader))
    }

    #[test]
    fn open_tries_parsers_in_order_and_stops_at_first_match() {
        let io: Box<dyn Io> = Box::new(SliceIo::new(vec![0u8; 32]));
        let parsers: &[ParseFn] = &[never_matches, matching_parser, never_matches];
        let stream = open(io, parsers).unwrap();
        assert_eq!(stream.meta_name, "stub");
    }

    #[test]
    fn open_returns_unrecognized_when_every_parser_misses() {
        let io: Box<dyn Io> = Box::new(SliceIo::new(vec![0u8; 32]));
        let parsers: &[ParseFn] = &[never_matches, never_matches];
        assert!(matches!(open(io, parsers), Err(VgsndError::Unrecognized)));
    }

    #[test]
    fn open_subsong_rejects_out_of_range_index() {
        let io: Box<dyn Io> = Box::new(SliceIo::new(vec![0u8; 32]));
        let parsers: &[ParseFn] = &[matching_parser];
        assert!(open_subsong(io, 0, parsers).is_err());

        let io: Box<dyn Io> = Box::new(SliceIo::new(vec![0u8; 32]));
        assert!(open_subsong(io, 2, parsers).is_err());
    }

    #[test]
    fn open_subsong_accepts_the_single_subsong() {
        let io: Box<dyn Io> = Box::new(SliceIo::new(vec![0u8; 32]));
        let parsers: &[ParseFn] = &[matching_parser];
        let stream = open_subsong(io, 1, parsers).unwrap();
        assert_eq!(stream.stream_index, 1);
    }
}
