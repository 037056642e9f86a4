// Sideband
// Copyright (c) 2025 The Project Sideband Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::result;

/// `SidebandError` provides an enumeration of all possible errors reported by Sideband.
#[derive(Debug)]
pub enum SidebandError {
    /// An IO error occurred while reading or writing a stream.
    IoError(Box<dyn StdError + Send + Sync>),
    /// The stream contained malformed data and could not be decoded.
    DecodeError(&'static str),
    /// An unsupported signal or container feature was encountered.
    Unsupported(&'static str),
    /// A default or user-defined limit was reached while decoding. Limits are used to prevent
    /// denial-of-service attacks from malicious streams.
    LimitError(&'static str),
    /// The end of the source was reached.
    EndOfFile,
    Other(&'static str),
}

impl fmt::Display for SidebandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SidebandError::IoError(ref err) => {
                write!(f, "io error: {}", err)
            }
            SidebandError::DecodeError(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            SidebandError::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            SidebandError::LimitError(constraint) => {
                write!(f, "limit reached: {}", constraint)
            }
            SidebandError::EndOfFile => {
                write!(f, "unexpected end of file")
            }
            SidebandError::Other(msg) => {
                write!(f, "other error: {}", msg)
            }
        }
    }
}

impl StdError for SidebandError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            SidebandError::IoError(ref err) => Some(err.deref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SidebandError {
    fn from(err: std::io::Error) -> SidebandError {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => SidebandError::EndOfFile,
            _ => SidebandError::IoError(Box::new(err)),
        }
    }
}

pub type Result<T> = result::Result<T, SidebandError>;

/// Convenience function to create a decode error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(SidebandError::DecodeError(desc))
}

/// Convenience function to create an unsupported feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(SidebandError::Unsupported(feature))
}

/// Convenience function to create a limit error.
pub fn limit_error<T>(constraint: &'static str) -> Result<T> {
    Err(SidebandError::LimitError(constraint))
}

/// Convenience function to create an end-of-stream error.
pub fn end_of_stream_error<T>() -> Result<T> {
    Err(SidebandError::EndOfFile)
}
