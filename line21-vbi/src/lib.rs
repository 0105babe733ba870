// Line21
// Copyright (c) 2026 The Project Line21 Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analog recovery of line-21 data bursts from rasterized scanlines.
//!
//! The vertical blanking interval (VBI) of an NTSC picture carries closed-caption data as an
//! analog waveform on scanline 21 of each field. Given grayscale frames cropped to the top of
//! the picture, [`VbiDecoder`] scans a window of lines per frame, synchronizes to the sinusoidal
//! clock run-in, and slices two payload bytes out of each matched line.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Line21 crates. Please see the workspace manifest for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

use log::debug;

use line21_core::errors::Result;
use line21_core::raster::RasterFrame;
use line21_core::row::DecodedRow;

pub mod slice;
pub mod sync;

use slice::slice_bytes;
use sync::{sync_to_preamble, TemplateBank};

/// Matches scoring at or below this are noise and are discarded.
pub const PREAMBLE_SCORE_THRESHOLD: f32 = 0.7;

/// Recovers line-21 byte pairs from raster frames.
///
/// The decoder scans `search_lines` scanlines starting at `start_line` in each frame. At most
/// two lines per frame carry data, one per interlaced field; once a first line has matched, the
/// scan stops after the immediately following line since the second field's line is adjacent.
pub struct VbiDecoder {
    templates: TemplateBank,
    start_line: usize,
    search_lines: usize,
}

impl VbiDecoder {
    /// Creates a decoder for frames of the given width.
    ///
    /// The sine template bank is computed here, once, and shared read-only across all frames.
    pub fn try_new(width: usize, start_line: usize, search_lines: usize) -> Result<VbiDecoder> {
        Ok(VbiDecoder { templates: TemplateBank::new(width)?, start_line, search_lines })
    }

    /// Scans one frame and returns the byte pairs recovered from it.
    pub fn decode_frame(&self, frame: &RasterFrame) -> Vec<DecodedRow> {
        let mut rows = Vec::new();
        let mut first_hit: Option<usize> = None;

        for scan in 0..self.search_lines {
            if let Some(hit) = first_hit {
                // The second field's line is adjacent to the first; anything further is noise.
                if hit + 1 < scan {
                    break;
                }
            }

            let row_index = self.start_line + scan;
            if row_index >= frame.height() {
                break;
            }

            let m = match sync_to_preamble(frame.line(row_index), &self.templates) {
                Some(m) => m,
                None => continue,
            };

            if m.score <= PREAMBLE_SCORE_THRESHOLD {
                continue;
            }

            if first_hit.is_none() {
                first_hit = Some(scan);
            }

            match slice_bytes(&m) {
                Some(sliced) => rows.push(DecodedRow {
                    row_index: row_index as u16,
                    byte1: sliced.byte1,
                    byte1_parity_ok: sliced.byte1_parity_ok,
                    byte2: sliced.byte2,
                    byte2_parity_ok: sliced.byte2_parity_ok,
                }),
                None => debug!("row {}: start bits did not verify", row_index),
            }
        }

        rows
    }
}
