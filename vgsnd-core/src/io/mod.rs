// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements the random-access, buffered byte reader every
//! container parser and codec kernel reads through.
//!
//! [`Io`] is the pluggable capability a host provides (a file, an in-memory
//! buffer, ...); [`ByteReader`] wraps it with a single contiguous read
//! cache and the typed little/big-endian accessors parsers and kernels use.

use std::fs::File;
use std::io::Read as StdRead;
use std::path::Path;

use log::trace;

use crate::errors::{truncated_error, Result, VgsndError};

/// Default size, in bytes, of a [`ByteReader`]'s read cache.
pub const DEFAULT_BUFFER_SIZE: usize = 0x400;

/// A random-access byte source a host provides to [`crate::dispatch::open`].
///
/// Implementations never need to be `Send`/`Sync` across threads
/// themselves; the render engine is single-threaded (see the
/// crate-level concurrency notes).
pub trait Io {
    /// Reads up to `dst.len()` bytes starting at `offset`, returning the
    /// number of bytes actually read. A request that starts or extends
    /// beyond `size()` simply returns fewer bytes; this is not an error.
    fn read(&mut self, dst: &mut [u8], offset: u64) -> std::io::Result<usize>;

    /// Total size of the underlying source, in bytes.
    fn size(&self) -> u64;

    /// A diagnostic name (file path, archive entry, ...). Never used for
    /// dispatch decisions, only for logging and sibling-file resolution.
    fn name(&self) -> &str;

    /// Opens a file alongside this one (for companion-header formats such
    /// as `.sgh`/`.sgb` or `.whed`/`.wmus`). Returns `None` if the host
    /// cannot locate or open it; this is not an error, parsers treat a
    /// missing sibling as "this format doesn't apply here".
    fn open_sibling(&self, name: &str, buffer_size: usize) -> Option<ByteReader>;
}

/// An [`Io`] backed by a local file. The common case for CLI tools and
/// desktop host integrations.
pub struct FileIo {
    file: File,
    size: u64,
    path: std::path::PathBuf,
}

impl FileIo {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<FileIo> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();
        Ok(FileIo { file, size, path })
    }
}

impl Io for FileIo {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> std::io::Result<usize> {
        use std::io::{Seek, SeekFrom};
        if offset >= self.size {
            return Ok(0);
        }
        self.file.seek(SeekFrom::Start(offset))?;
        let mut total = 0;
        while total < dst.len() {
            match self.file.read(&mut dst[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("")
    }

    fn open_sibling(&self, name: &str, buffer_size: usize) -> Option<ByteReader> {
        let sibling = self.path.parent()?.join(name);
        let io = FileIo::open(sibling).ok()?;
        Some(ByteReader::with_buffer_size(Box::new(io), buffer_size))
    }
}

/// An [`Io`] backed by an in-memory buffer (tests, embedded assets).
pub struct SliceIo {
    data: Vec<u8>,
    name: String,
}

impl SliceIo {
    pub fn new(data: impl Into<Vec<u8>>) -> SliceIo {
        SliceIo { data: data.into(), name: String::new() }
    }
}

impl Io for SliceIo {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> std::io::Result<usize> {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return Ok(0);
        }
        let n = dst.len().min(self.data.len() - offset);
        dst[..n].copy_from_slice(&self.data[offset..offset + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn open_sibling(&self, _name: &str, _buffer_size: usize) -> Option<ByteReader> {
        None
    }
}

/// A buffered, random-access reader over an [`Io`] backend.
///
/// Maintains a single contiguous cache `[cache_base, cache_base +
/// cache_valid)`; a read fully inside the cache is a memcpy, otherwise the
/// cache is refilled starting at the requested offset.
pub struct ByteReader {
    io: Box<dyn Io>,
    pos: u64,
    buffer_size: usize,
    cache: Vec<u8>,
    cache_base: u64,
    cache_valid: usize,
}

impl ByteReader {
    pub fn new(io: Box<dyn Io>) -> ByteReader {
        Self::with_buffer_size(io, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(io: Box<dyn Io>, buffer_size: usize) -> ByteReader {
        let buffer_size = buffer_size.max(16);
        ByteReader { io, pos: 0, buffer_size, cache: vec![0; buffer_size], cache_base: 0, cache_valid: 0 }
    }

    pub fn len(&self) -> u64 {
        self.io.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> &str {
        self.io.name()
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn seek(&mut self, offset: u64) {
        self.pos = offset;
    }

    pub fn open_sibling(&self, name: &str, buffer_size: usize) -> Option<ByteReader> {
        self.io.open_sibling(name, buffer_size)
    }

    /// Reads `dst.len()` bytes at the current position, advancing it. Short
    /// reads at EOF are not errors; the returned count may be less than
    /// `dst.len()`.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        let n = self.read_at(dst, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// As [`Self::read`] but at an explicit offset; does not move the
    /// cursor.
    pub fn read_at(&mut self, dst: &mut [u8], offset: u64) -> Result<usize> {
        let cache_end = self.cache_base + self.cache_valid as u64;
        if dst.is_empty() {
            return Ok(0);
        }

        // Fast path: entirely inside the cache.
        if offset >= self.cache_base && offset + dst.len() as u64 <= cache_end {
            let start = (offset - self.cache_base) as usize;
            dst.copy_from_slice(&self.cache[start..start + dst.len()]);
            return Ok(dst.len());
        }

        let mut written = 0;
        let mut cur = offset;

        // Copy the intersecting prefix from the cache, if any.
        if cur >= self.cache_base && cur < cache_end {
            let start = (cur - self.cache_base) as usize;
            let avail = self.cache_valid - start;
            let n = avail.min(dst.len());
            dst[..n].copy_from_slice(&self.cache[start..start + n]);
            written += n;
            cur += n as u64;
        }

        while written < dst.len() {
            trace!("byte reader cache miss at offset {} ({} bytes buffer)", cur, self.buffer_size);
            self.cache_base = cur;
            let n = self.io.read(&mut self.cache, cur).map_err(VgsndError::from)?;
            self.cache_valid = n;
            if n == 0 {
                break;
            }
            let take = n.min(dst.len() - written);
            dst[written..written + take].copy_from_slice(&self.cache[..take]);
            written += take;
            cur += take as u64;
        }

        Ok(written)
    }

    /// Reads exactly `dst.len()` bytes or returns `Err(Truncated)`.
    pub fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        let n = self.read(dst)?;
        if n != dst.len() {
            return truncated_error("short read");
        }
        Ok(())
    }

    pub fn read_exact_at(&mut self, dst: &mut [u8], offset: u64) -> Result<()> {
        let n = self.read_at(dst, offset)?;
        if n != dst.len() {
            return truncated_error("short read");
        }
        Ok(())
    }

    pub fn ignore_bytes(&mut self, count: u64) {
        self.pos += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn read_fully_inside_cache_is_a_single_refill() {
        let mut r = ByteReader::with_buffer_size(Box::new(SliceIo::new(data(64))), 16);
        let mut buf = [0u8; 4];
        r.read_at(&mut buf, 0).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
        // still within the same 16-byte cache window: no second underlying read needed.
        r.read_at(&mut buf, 8).unwrap();
        assert_eq!(buf, [8, 9, 10, 11]);
    }

    #[test]
    fn read_straddling_cache_boundary_refills_transparently() {
        let mut r = ByteReader::with_buffer_size(Box::new(SliceIo::new(data(64))), 16);
        let mut buf = [0u8; 8];
        // Forces a cache miss and a cross-boundary read.
        r.read_at(&mut buf, 12).unwrap();
        assert_eq!(buf, [12, 13, 14, 15, 16, 17, 18, 19]);
    }

    #[test]
    fn read_past_eof_returns_a_short_count_not_an_error() {
        let mut r = ByteReader::with_buffer_size(Box::new(SliceIo::new(data(10))), 16);
        let mut buf = [0xAAu8; 8];
        let n = r.read_at(&mut buf, 6).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], &[6, 7, 8, 9]);
    }

    #[test]
    fn read_entirely_past_eof_returns_zero() {
        let mut r = ByteReader::with_buffer_size(Box::new(SliceIo::new(data(10))), 16);
        let mut buf = [0u8; 4];
        let n = r.read_at(&mut buf, 20).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn read_exact_fails_truncated_on_short_read() {
        let mut r = ByteReader::with_buffer_size(Box::new(SliceIo::new(data(4))), 16);
        let mut buf = [0u8; 8];
        assert!(matches!(r.read_exact_at(&mut buf, 0), Err(VgsndError::Truncated(_))));
    }

    #[test]
    fn sequential_reads_advance_the_cursor() {
        let mut r = ByteReader::new(Box::new(SliceIo::new(data(16))));
        let mut a = [0u8; 4];
        let mut b = [0u8; 4];
        r.read(&mut a).unwrap();
        r.read(&mut b).unwrap();
        assert_eq!(a, [0, 1, 2, 3]);
        assert_eq!(b, [4, 5, 6, 7]);
        assert_eq!(r.pos(), 8);
    }

    #[test]
    fn typed_accessors_round_trip_endianness() {
        let bytes = vec![0x01, 0x02, 0x03, 0x04];
        let mut r = ByteReader::new(Box::new(SliceIo::new(bytes)));
        assert_eq!(r.read_u32be_at(0).unwrap(), 0x0102_0304);
        assert_eq!(r.read_u32le_at(0).unwrap(), 0x0403_0201);
    }

    #[test]
    fn read_tag_matches_fourcc_literal() {
        let mut r = ByteReader::new(Box::new(SliceIo::new(b"RIFF".to_vec())));
        assert_eq!(&r.read_tag().unwrap(), b"RIFF");
    }
}

// Typed accessors. Each pair reads `N` bytes at the cursor (or an explicit
// offset) and advances the cursor on the non-`_at` form.
macro_rules! accessor {
    ($read:ident, $read_at:ident, $ty:ty, $n:expr, $from:ident) => {
        impl ByteReader {
            pub fn $read(&mut self) -> Result<$ty> {
                let mut buf = [0u8; $n];
                self.read_exact(&mut buf)?;
                Ok(<$ty>::$from(buf))
            }

            pub fn $read_at(&mut self, offset: u64) -> Result<$ty> {
                let mut buf = [0u8; $n];
                self.read_exact_at(&mut buf, offset)?;
                Ok(<$ty>::$from(buf))
            }
        }
    };
}

accessor!(read_u8, read_u8_at, u8, 1, from_le_bytes);
accessor!(read_i8, read_i8_at, i8, 1, from_le_bytes);
accessor!(read_u16le, read_u16le_at, u16, 2, from_le_bytes);
accessor!(read_u16be, read_u16be_at, u16, 2, from_be_bytes);
accessor!(read_i16le, read_i16le_at, i16, 2, from_le_bytes);
accessor!(read_i16be, read_i16be_at, i16, 2, from_be_bytes);
accessor!(read_u32le, read_u32le_at, u32, 4, from_le_bytes);
accessor!(read_u32be, read_u32be_at, u32, 4, from_be_bytes);
accessor!(read_i32le, read_i32le_at, i32, 4, from_le_bytes);
accessor!(read_i32be, read_i32be_at, i32, 4, from_be_bytes);
accessor!(read_u64le, read_u64le_at, u64, 8, from_le_bytes);
accessor!(read_u64be, read_u64be_at, u64, 8, from_be_bytes);
accessor!(read_i64le, read_i64le_at, i64, 8, from_le_bytes);
accessor!(read_i64be, read_i64be_at, i64, 8, from_be_bytes);

impl ByteReader {
    /// Reads a 24-bit little-endian unsigned integer.
    pub fn read_u24le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 3];
        self.read_exact(&mut buf)?;
        Ok(u32::from(buf[0]) | (u32::from(buf[1]) << 8) | (u32::from(buf[2]) << 16))
    }

    /// Reads a 24-bit big-endian unsigned integer.
    pub fn read_u24be(&mut self) -> Result<u32> {
        let mut buf = [0u8; 3];
        self.read_exact(&mut buf)?;
        Ok((u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]))
    }

    /// Reads a 4-byte ASCII tag for literal fourCC comparison, e.g.
    /// `reader.read_tag()? == *b"RIFF"`.
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_tag_at(&mut self, offset: u64) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    }
}
