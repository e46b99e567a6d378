// vgsnd
// Copyright (c) 2026 The vgsnd Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type used throughout every
//! crate in this workspace.

use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::result;

/// A codec or container feature that is recognized but not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    Codec,
    Layout,
}

/// `VgsndError` enumerates every way opening or rendering a stream can fail.
///
/// Variants map directly onto the error model: a dispatcher miss is
/// [`VgsndError::Unrecognized`], a chunk that ends early is
/// [`VgsndError::Truncated`], and so on. See the crate-level documentation
/// for the propagation policy (parsers return `None` on signature mismatch
/// and `Err` only once they've committed to a format).
#[derive(Debug)]
pub enum VgsndError {
    /// No registered parser recognized the byte source.
    Unrecognized,
    /// A chunk or frame ended before its declared size.
    Truncated(&'static str),
    /// A structural invariant was violated (bad coefficient table,
    /// impossible channel count, reversed loop range, ...).
    Invalid(&'static str),
    /// The container was recognized but the codec or layout it names isn't
    /// built into this workspace.
    Unsupported(UnsupportedKind, &'static str),
    /// The underlying `Io` backend reported a hard error (not EOF).
    Io(Box<dyn StdError + Send + Sync>),
    /// An encrypted ADX file whose key wasn't in the built-in table and
    /// wasn't supplied by the caller.
    KeyRequired,
}

impl fmt::Display for VgsndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VgsndError::Unrecognized => write!(f, "unrecognized stream format"),
            VgsndError::Truncated(what) => write!(f, "truncated stream: {}", what),
            VgsndError::Invalid(reason) => write!(f, "invalid stream: {}", reason),
            VgsndError::Unsupported(UnsupportedKind::Codec, name) => {
                write!(f, "unsupported codec: {}", name)
            }
            VgsndError::Unsupported(UnsupportedKind::Layout, name) => {
                write!(f, "unsupported layout: {}", name)
            }
            VgsndError::Io(err) => write!(f, "io error: {}", err),
            VgsndError::KeyRequired => write!(f, "encryption key required"),
        }
    }
}

impl StdError for VgsndError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            VgsndError::Io(err) => Some(err.deref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VgsndError {
    fn from(err: std::io::Error) -> VgsndError {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => VgsndError::Truncated("unexpected end of file"),
            _ => VgsndError::Io(Box::new(err)),
        }
    }
}

pub type Result<T> = result::Result<T, VgsndError>;

/// Convenience function to create a truncated-stream error.
pub fn truncated_error<T>(what: &'static str) -> Result<T> {
    Err(VgsndError::Truncated(what))
}

/// Convenience function to create an invalid-stream error.
pub fn invalid_error<T>(reason: &'static str) -> Result<T> {
    Err(VgsndError::Invalid(reason))
}

/// Convenience function to create an unsupported-codec error.
pub fn unsupported_codec<T>(name: &'static str) -> Result<T> {
    Err(VgsndError::Unsupported(UnsupportedKind::Codec, name))
}

/// Convenience function to create an unsupported-layout error.
pub fn unsupported_layout<T>(name: &'static str) -> Result<T> {
    Err(VgsndError::Unsupported(UnsupportedKind::Layout, name))
}

/// Convenience function to create a key-required error.
pub fn key_required_error<T>() -> Result<T> {
    Err(VgsndError::KeyRequired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_eof_io_error_maps_to_truncated() {
        let io_err = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        let err = VgsndError::from(io_err);
        assert!(matches!(err, VgsndError::Truncated(_)));
    }

    #[test]
    fn other_io_errors_pass_through_as_io() {
        let io_err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = VgsndError::from(io_err);
        assert!(matches!(err, VgsndError::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn non_io_variants_have_no_source() {
        assert!(VgsndError::Unrecognized.source().is_none());
        assert!(VgsndError::KeyRequired.source().is_none());
    }

    #[test]
    fn display_messages_name_the_failure_kind() {
        assert_eq!(VgsndError::Unrecognized.to_string(), "unrecognized stream format");
        assert_eq!(VgsndError::KeyRequired.to_string(), "encryption key required");
        assert_eq!(
            VgsndError::Unsupported(UnsupportedKind::Codec, "atrac9").to_string(),
            "unsupported codec: atrac9"
        );
    }
}
