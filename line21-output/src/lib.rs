// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subtitle output sinks.
//!
//! Every sink independently consumes the classified rows of each frame; the caption-oriented
//! sinks (SRT, SCC, plain text, HTML) run their own channel demultiplexer and per-channel state
//! machines, while the raw, debug, and XDS sinks work on the undemultiplexed row stream.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Line21 crates. Please see the workspace manifest for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

use line21_cea608::classify::FrameRows;
use line21_core::errors::{unsupported_error, Result};

pub mod debug;
pub mod html;
pub mod raw;
pub mod scc;
pub mod srt;
pub mod txt;
pub mod writer;
pub mod xds;

pub use writer::OutputTarget;

/// A consumer of the broadcast frame-row stream.
pub trait Sink: Send {
    /// Consumes the rows of one frame. Frames arrive strictly in index order.
    fn process(&mut self, rows: &FrameRows) -> Result<()>;

    /// Called once after the last frame; closes output files.
    fn finish(&mut self) -> Result<()>;
}

/// The output format names accepted by [`make_sink`].
pub const FORMAT_NAMES: [&str; 7] = ["srt", "scc", "txt", "html", "xds", "raw", "debug"];

/// Creates the sink for a format name.
pub fn make_sink(format: &str, target: &OutputTarget) -> Result<Box<dyn Sink>> {
    match format {
        "srt" => Ok(Box::new(srt::SrtSink::new(target))),
        "scc" => Ok(Box::new(scc::SccSink::new(target))),
        "txt" | "text" => Ok(Box::new(txt::TxtSink::new(target))),
        "html" => Ok(Box::new(html::HtmlSink::new(target))),
        "xds" => Ok(Box::new(xds::XdsSink::new(target))),
        "raw" => Ok(Box::new(raw::RawSink::new(target))),
        "debug" => Ok(Box::new(debug::DebugSink::new(target))),
        _ => unsupported_error("output: unknown format name"),
    }
}
