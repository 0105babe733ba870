// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::result;

/// `Line21Error` provides an enumeration of all possible errors reported by Line21.
#[derive(Debug)]
pub enum Line21Error {
    /// An IO error occurred while reading or writing a stream.
    IoError(Box<dyn StdError + Send + Sync>),
    /// The stream contained malformed data and could not be decoded.
    DecodeError(&'static str),
    /// An unsupported input parameter or feature was encountered.
    Unsupported(&'static str),
    /// A default or user-defined limit was reached while decoding. Limits are used to prevent
    /// denial-of-service attacks from malicious streams.
    LimitError(&'static str),
    /// The end of the stream was reached.
    EndOfStream,
    Other(&'static str),
}

impl fmt::Display for Line21Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Line21Error::IoError(ref err) => {
                write!(f, "io error: {}", err)
            }
            Line21Error::DecodeError(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Line21Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Line21Error::LimitError(constraint) => {
                write!(f, "limit reached: {}", constraint)
            }
            Line21Error::EndOfStream => {
                write!(f, "unexpected end of stream")
            }
            Line21Error::Other(msg) => {
                write!(f, "other error: {}", msg)
            }
        }
    }
}

impl StdError for Line21Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Line21Error::IoError(ref err) => Some(err.deref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Line21Error {
    fn from(err: std::io::Error) -> Line21Error {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Line21Error::EndOfStream,
            _ => Line21Error::IoError(Box::new(err)),
        }
    }
}

pub type Result<T> = result::Result<T, Line21Error>;

/// Convenience function to create a decode error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(Line21Error::DecodeError(desc))
}

/// Convenience function to create an unsupported feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Line21Error::Unsupported(feature))
}

/// Convenience function to create a limit error.
pub fn limit_error<T>(constraint: &'static str) -> Result<T> {
    Err(Line21Error::LimitError(constraint))
}

/// Convenience function to create an end-of-stream error.
pub fn end_of_stream_error<T>() -> Result<T> {
    Err(Line21Error::EndOfStream)
}
